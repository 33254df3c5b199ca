use super::*;
use crate::controls::creation::CreationMailbox;
use crate::form::schema::SelectSpec;

fn purchases(create: Option<&CreationMailbox>) -> ListSpec {
    let mut items = SelectSpec::new("item", vec![SelectOption::new(1, "Milk"), SelectOption::new(2, "Bread")]);
    if let Some(mailbox) = create {
        items = items.with_create(mailbox.capability("item"));
    }
    ListSpec::new(vec![
        FieldDescriptor::number("quantity", "Quantity"),
        FieldDescriptor::number("unitPrice", "Unit price"),
        FieldDescriptor::number("price", "Price"),
        FieldDescriptor::select("itemId", "Item", items),
    ])
    .with_derivation(product_derivation("quantity", "unitPrice", "price"))
}

fn filled(editor: &mut ListEditor, quantity: f64, unit_price: f64, item: RecordId) {
    editor.write("quantity", FieldValue::Number(quantity)).unwrap();
    editor.write("unitPrice", FieldValue::Number(unit_price)).unwrap();
    editor.choose("itemId", item).unwrap();
}

#[test]
fn derivation_computes_price_in_either_order() {
    let mut editor = ListEditor::new(&purchases(None));
    editor.write("quantity", FieldValue::Number(3.0)).unwrap();
    editor.write("unitPrice", FieldValue::Number(2.0)).unwrap();
    assert_eq!(editor.staged().get("price"), &FieldValue::Number(6.0));

    let mut editor = ListEditor::new(&purchases(None));
    editor.write("unitPrice", FieldValue::Number(2.0)).unwrap();
    editor.write("quantity", FieldValue::Number(3.0)).unwrap();
    assert_eq!(editor.staged().get("price"), &FieldValue::Number(6.0));
}

#[test]
fn derivation_yields_zero_with_one_operand() {
    let mut editor = ListEditor::new(&purchases(None));
    editor.write("quantity", FieldValue::Number(3.0)).unwrap();
    assert_eq!(editor.staged().get("price"), &FieldValue::Number(0.0));
}

#[test]
fn clearing_an_operand_resets_the_product() {
    let mut editor = ListEditor::new(&purchases(None));
    editor.write("quantity", FieldValue::Number(3.0)).unwrap();
    editor.write("unitPrice", FieldValue::Number(2.0)).unwrap();
    editor.write("unitPrice", FieldValue::Empty).unwrap();
    assert_eq!(editor.staged().get("price"), &FieldValue::Number(0.0));
    assert!(!editor.staged().is_populated("unitPrice"));
}

#[test]
fn write_rejects_unknown_key_and_wrong_kind() {
    let mut editor = ListEditor::new(&purchases(None));
    assert_eq!(editor.write("nope", FieldValue::Number(1.0)), Err(FormError::UnknownField("nope".into())));
    assert!(matches!(
        editor.write("quantity", FieldValue::Text("3".into())),
        Err(FormError::KindMismatch { .. })
    ));
}

#[test]
fn add_requires_every_column() {
    let mut editor = ListEditor::new(&purchases(None));
    let mut rows = Vec::new();
    editor.write("quantity", FieldValue::Number(3.0)).unwrap();
    editor.write("unitPrice", FieldValue::Number(2.0)).unwrap();
    assert!(!editor.is_complete());
    assert!(!editor.add_item(&mut rows));
    assert!(rows.is_empty());

    editor.choose("itemId", 1).unwrap();
    assert!(editor.add_item(&mut rows));
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("price"), &FieldValue::Number(6.0));
    assert_eq!(editor.staged().populated_count(), 0);
}

#[test]
fn edit_then_save_overwrites_in_place() {
    let mut editor = ListEditor::new(&purchases(None));
    let mut rows = Vec::new();
    filled(&mut editor, 1.0, 1.0, 1);
    editor.add_item(&mut rows);
    filled(&mut editor, 2.0, 5.0, 2);
    editor.add_item(&mut rows);

    editor.edit_item(&rows, 0).unwrap();
    assert_eq!(editor.mode(), ListMode::Editing(0));
    assert_eq!(editor.staged().get("quantity"), &FieldValue::Number(1.0));
    assert!(!editor.add_item(&mut rows), "add is a no-op while editing");

    editor.write("quantity", FieldValue::Number(4.0)).unwrap();
    assert!(editor.save_item(&mut rows));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("price"), &FieldValue::Number(4.0));
    assert_eq!(editor.mode(), ListMode::Adding);
}

#[test]
fn save_outside_edit_mode_does_nothing() {
    let mut editor = ListEditor::new(&purchases(None));
    let mut rows = Vec::new();
    filled(&mut editor, 1.0, 1.0, 1);
    assert!(!editor.save_item(&mut rows));
}

#[test]
fn edit_missing_row_errors() {
    let mut editor = ListEditor::new(&purchases(None));
    assert_eq!(editor.edit_item(&[], 3), Err(FormError::IndexOutOfRange { index: 3, len: 0 }));
}

#[test]
fn removing_edited_row_leaves_edit_mode() {
    let mut editor = ListEditor::new(&purchases(None));
    let mut rows = Vec::new();
    filled(&mut editor, 1.0, 1.0, 1);
    editor.add_item(&mut rows);
    editor.edit_item(&rows, 0).unwrap();

    editor.remove_item(&mut rows, 0).unwrap();
    assert!(rows.is_empty());
    assert_eq!(editor.mode(), ListMode::Adding);
    assert_eq!(editor.staged().populated_count(), 0);
}

#[test]
fn removing_earlier_row_shifts_edit_index() {
    let mut editor = ListEditor::new(&purchases(None));
    let mut rows = Vec::new();
    for item in [1, 2, 1] {
        filled(&mut editor, 1.0, 1.0, item);
        editor.add_item(&mut rows);
    }
    editor.edit_item(&rows, 2).unwrap();
    editor.remove_item(&mut rows, 0).unwrap();
    assert_eq!(editor.mode(), ListMode::Editing(1));
    assert!(editor.remove_item(&mut rows, 5).is_err());
}

#[test]
fn view_labels_rows_and_commit_action() {
    let mut editor = ListEditor::new(&purchases(None));
    let mut rows = Vec::new();
    filled(&mut editor, 3.0, 2.0, 2);
    let view = editor.view(&rows);
    assert!(view.can_commit);
    assert_eq!(view.editing, None);
    assert_eq!(view.headers, vec!["QUANTITY", "UNIT PRICE", "PRICE", "ITEM"]);

    editor.add_item(&mut rows);
    editor.edit_item(&rows, 0).unwrap();
    let view = editor.view(&rows);
    assert_eq!(view.editing, Some(0));
    assert_eq!(view.rows, vec![vec!["3.00", "2.00", "6.00", "Bread"]]);
    assert!(view.staged[3].select.is_some());
}

#[test]
fn created_item_lands_in_staged_row() {
    let mailbox = CreationMailbox::new();
    let mut editor = ListEditor::new(&purchases(Some(&mailbox)));
    editor.select("itemId").unwrap().trigger_create().unwrap();
    assert!(!editor.poll_creations());

    mailbox.settle(9);
    editor.refresh_options("item", &[SelectOption::new(9, "Eggs")]);
    assert!(editor.poll_creations());
    assert_eq!(editor.staged().get("itemId"), &FieldValue::Id(9));
}

#[test]
fn dismissed_creation_keeps_staged_value() {
    let mailbox = CreationMailbox::new();
    let mut editor = ListEditor::new(&purchases(Some(&mailbox)));
    editor.choose("itemId", 1).unwrap();
    editor.select("itemId").unwrap().trigger_create().unwrap();
    mailbox.dismiss();
    assert!(!editor.poll_creations());
    assert_eq!(editor.staged().get("itemId"), &FieldValue::Id(1));
}

#[test]
fn select_on_scalar_column_errors() {
    let mut editor = ListEditor::new(&purchases(None));
    assert!(matches!(editor.select("quantity"), Err(FormError::KindMismatch { .. })));
}
