use super::*;
use crate::net::test_helpers::FakeStore;
use serde_json::json;
use time::macros::date;

fn config() -> ApiConfig {
    ApiConfig::new("http://localhost:3000")
}

fn store() -> FakeStore {
    let store = FakeStore::new();
    store
        .seed(Collection::Categories, json!({ "id": 1, "name": "Dairy", "entity": "item" }))
        .seed(Collection::Categories, json!({ "id": 2, "name": "Trips", "entity": "receipt" }))
        .seed(
            Collection::Items,
            json!({ "id": 3, "name": "Milk", "categoryId": 1, "category": { "id": 1, "name": "Dairy" } }),
        )
        .seed(
            Collection::Receipts,
            json!({
                "id": 10,
                "name": "Weekly",
                "store": "Corner",
                "creationDate": "2024-03-01T00:00:00Z",
                "purchases": [{
                    "id": 1,
                    "quantity": "2",
                    "unitPrice": "1.25",
                    "price": "2.50",
                    "itemId": 3,
                    "item": { "id": 3, "name": "Milk", "category": { "id": 1, "name": "Dairy" } }
                }],
                "categories": [{ "id": 2, "name": "Trips", "entity": "receipt" }]
            }),
        );
    store
}

async fn list_page(store: &FakeStore) -> ReceiptsPage {
    let mut page = ReceiptsPage::new(&config()).unwrap();
    page.reload(store).await.unwrap();
    page
}

async fn blank_editor(store: &FakeStore) -> ReceiptEditor {
    let mut editor = ReceiptEditor::create(&config()).unwrap();
    editor.reload(store).await.unwrap();
    editor
}

fn staged_item(editor: &mut ReceiptEditor) -> FieldValue {
    editor.form.list("purchases").unwrap().staged().get("itemId").clone()
}

// =========================================================================
// list page
// =========================================================================

#[tokio::test]
async fn grid_formats_dates_and_totals() {
    let store = store();
    let page = list_page(&store).await;
    let grid = page.grid();

    let headers: Vec<&str> = grid.headers.iter().map(|h| h.header.as_str()).collect();
    assert_eq!(headers, ["Id", "Name", "Category", "Creation Date", "Store", "Total", ""]);
    let row = &grid.rows[0];
    assert_eq!(row.cells[3], CellView::Text("2024-03-01".into()));
    assert_eq!(row.cells[4], CellView::Text("Corner".into()));
    assert_eq!(row.cells[5], CellView::Text("$2.50".into()));
    let CellView::Select(chips) = &row.cells[2] else {
        panic!("expected category picker");
    };
    assert_eq!(chips.selected, [SelectOption::new(2, "Trips")]);
    assert!(!chips.open);
}

#[tokio::test]
async fn reload_offers_receipt_categories_only() {
    let store = store();
    let page = list_page(&store).await;
    assert_eq!(page.categories(), [SelectOption::new(2, "Trips")]);
}

#[tokio::test]
async fn detail_panel_summarizes_purchases() {
    let store = store();
    let mut page = list_page(&store).await;
    assert!(page.detail().is_none());
    page.show_detail(10);

    let detail = page.detail().unwrap();
    assert_eq!(detail.title, "Weekly");
    assert_eq!(detail.subtitle, "Corner - 2024-03-01");
    assert_eq!(
        detail.lines,
        [PurchaseLine {
            quantity: "2.00x".into(),
            item: "Milk".into(),
            category: Some("Dairy".into()),
            unit_price: "* 1.25".into(),
            price: "$2.50".into(),
        }]
    );
    assert_eq!(detail.total, "$2.50");

    page.close_detail();
    assert!(page.detail().is_none());
}

#[tokio::test]
async fn disconnect_removes_category() {
    let store = store();
    let mut page = list_page(&store).await;
    page.run(&store, ReceiptsPage::disconnect_category(10, 2)).await.unwrap();
    assert!(page.page.rows[0].categories.is_empty());
}

// =========================================================================
// inline category creation
// =========================================================================

#[tokio::test]
async fn created_category_is_connected_to_the_receipt() {
    let store = store();
    let mut page = list_page(&store).await;
    page.open_category_cell(10);

    let session = page.trigger_category_create().unwrap().unwrap();
    assert_eq!(page.mailbox().pending_subject().as_deref(), Some("category"));
    let dialog = page.page.dialog_mut().unwrap();
    assert_eq!(dialog.id, session);
    assert_eq!(dialog.title, "Create Category");
    dialog.form.write("name", FieldValue::Text("Groceries".into())).unwrap();

    let pending = page.page.begin_submit().unwrap();
    let finished = page.run(&store, pending).await.unwrap();
    assert!(matches!(finished, Finished::Applied(Some(_))));
    assert!(page.page.dialog().is_none());
    assert!(!page.mailbox().is_pending());
    assert_eq!(store.record(Collection::Categories, 11).unwrap()["entity"], "receipt");

    let connect = page.poll_category_cell().unwrap();
    assert_eq!(
        connect.request,
        MutationRequest::Connect { relation: Relation::ReceiptCategory, owner: 10, related: 11 }
    );
    page.run(&store, connect).await.unwrap();
    let names: Vec<&str> = page.page.rows[0].categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Trips", "Groceries"]);
}

#[tokio::test]
async fn dismissed_category_dialog_leaves_receipt_unchanged() {
    let store = store();
    let mut page = list_page(&store).await;
    page.open_category_cell(10);
    page.trigger_category_create().unwrap().unwrap();

    page.close_category_dialog();
    assert!(page.page.dialog().is_none());
    assert!(page.poll_category_cell().is_none());
    let cell = page.category_cell().unwrap();
    assert!(!cell.is_pending());
    assert_eq!(page.page.rows[0].categories.len(), 1);
}

#[tokio::test]
async fn category_create_needs_an_open_cell() {
    let store = store();
    let mut page = list_page(&store).await;
    assert_eq!(page.trigger_category_create().unwrap(), None);
    assert!(page.page.dialog().is_none());
}

#[tokio::test]
async fn chosen_category_connects_directly() {
    let store = store();
    let mut page = list_page(&store).await;
    page.open_category_cell(10);
    let pending = page.choose_category(2).unwrap().unwrap();
    assert!(page.category_cell().is_none());
    assert_eq!(pending.session, None);
}

// =========================================================================
// editor
// =========================================================================

#[tokio::test]
async fn blank_editor_is_dated_today() {
    let store = store();
    let editor = blank_editor(&store).await;
    assert_eq!(editor.title(), "Create Receipt");
    assert_eq!(editor.description(), "Create a receipt from a shopping trip.");
    assert_eq!(editor.form.value("creationDate").as_date(), Some(OffsetDateTime::now_utc().date()));
    assert!(editor.form.value("purchases").as_rows().is_empty());
}

#[tokio::test]
async fn save_requires_name_and_store() {
    let store = store();
    let mut editor = blank_editor(&store).await;
    assert!(editor.save(&store).await.is_none());
    assert_eq!(editor.form.errors_for("name"), ["Name is required".to_owned()]);
    assert_eq!(editor.form.errors_for("store"), ["Store is required".to_owned()]);
    assert!(editor.saved_prompt().is_none());
}

#[tokio::test]
async fn purchase_price_derives_and_saves() {
    let store = store();
    let mut editor = blank_editor(&store).await;
    editor.form.write("name", FieldValue::Text("Weekend".into())).unwrap();
    editor.form.write("store", FieldValue::Text("Walmart".into())).unwrap();
    editor.form.write("creationDate", FieldValue::Date(date!(2024 - 03 - 05))).unwrap();
    {
        let mut purchases = editor.form.list("purchases").unwrap();
        purchases.write("unitPrice", FieldValue::Number(2.0)).unwrap();
        purchases.write("quantity", FieldValue::Number(3.0)).unwrap();
        assert_eq!(purchases.staged().get("price"), &FieldValue::Number(6.0));
        purchases.choose("itemId", 3).unwrap();
        assert!(purchases.add_item());
    }

    let pending = editor.begin_save().unwrap();
    assert_eq!(
        pending.request,
        MutationRequest::Create {
            collection: Collection::Receipts,
            body: json!({
                "name": "Weekend",
                "store": "Walmart",
                "creationDate": "2024-03-05T00:00:00Z",
                "purchases": [{ "quantity": 3.0, "unitPrice": 2.0, "price": 6.0, "itemId": 3 }]
            }),
        }
    );
    let result = pending.request.execute(&store).await;
    assert!(matches!(editor.finish_save(&pending, result), Finished::Applied(Some(_))));

    let prompt = editor.saved_prompt().unwrap();
    assert_eq!(prompt.title, "Receipt created successfully");
    assert_eq!(store.records(Collection::Receipts).len(), 2);
}

#[tokio::test]
async fn continue_here_resets_the_form() {
    let store = store();
    let mut editor = blank_editor(&store).await;
    editor.form.write("name", FieldValue::Text("Weekend".into())).unwrap();
    editor.form.write("store", FieldValue::Text("Walmart".into())).unwrap();
    assert!(matches!(editor.save(&store).await, Some(Finished::Applied(_))));
    let first_session = editor.session();

    editor.continue_here().unwrap();
    assert!(editor.saved_prompt().is_none());
    assert_ne!(editor.session(), first_session);
    assert_eq!(editor.form.value("name"), &FieldValue::Text(String::new()));
    assert!(!editor.form.is_in_flight());
    editor.form.list("purchases").unwrap().choose("itemId", 3).unwrap();
}

#[tokio::test]
async fn save_result_after_reset_is_dropped() {
    let store = store();
    let mut editor = blank_editor(&store).await;
    editor.form.write("name", FieldValue::Text("Weekend".into())).unwrap();
    editor.form.write("store", FieldValue::Text("Walmart".into())).unwrap();
    let pending = editor.begin_save().unwrap();

    editor.continue_here().unwrap();
    let result = pending.request.execute(&store).await;
    assert_eq!(editor.finish_save(&pending, result), Finished::Stale);
    assert!(editor.saved_prompt().is_none());
}

#[tokio::test]
async fn save_failure_reenables_submit() {
    let store = store();
    let mut editor = blank_editor(&store).await;
    editor.form.write("name", FieldValue::Text("Weekend".into())).unwrap();
    editor.form.write("store", FieldValue::Text("Walmart".into())).unwrap();

    store.fail_next(ApiError::Status { status: 422, body: "bad".into() });
    assert!(matches!(editor.save(&store).await, Some(Finished::Failed(_))));
    assert!(editor.last_error.is_some());
    assert!(!editor.form.is_in_flight());
    assert!(editor.saved_prompt().is_none());
}

#[tokio::test]
async fn save_answered_without_record_is_a_failure() {
    let store = store();
    let mut editor = blank_editor(&store).await;
    editor.form.write("name", FieldValue::Text("Weekend".into())).unwrap();
    editor.form.write("store", FieldValue::Text("Walmart".into())).unwrap();
    let pending = editor.begin_save().unwrap();

    let finished = editor.finish_save(&pending, Ok(None));
    assert_eq!(finished, Finished::Failed(ApiError::Rejected("create")));
    assert!(editor.saved_prompt().is_none());
    assert!(!editor.form.is_in_flight());
    assert_eq!(editor.last_error.as_deref(), Some("service rejected the create"));
}

#[tokio::test]
async fn edit_loads_stored_receipt() {
    let store = store();
    let mut editor = ReceiptEditor::load(&store, 10, &config()).await.unwrap();
    assert_eq!(editor.mode(), EditorMode::Edit(10));
    assert_eq!(editor.title(), "Edit Receipt");
    assert_eq!(editor.form.value("name"), &FieldValue::Text("Weekly".into()));
    assert_eq!(editor.form.value("creationDate").as_date(), Some(date!(2024 - 03 - 01)));

    let rows = editor.form.value("purchases").as_rows().to_vec();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("unitPrice"), &FieldValue::Number(1.25));
    assert_eq!(rows[0].get("itemId"), &FieldValue::Id(3));

    editor.form.write("store", FieldValue::Text("Market".into())).unwrap();
    let pending = editor.begin_save().unwrap();
    assert!(matches!(pending.request, MutationRequest::Update { id: 10, .. }));
    let result = pending.request.execute(&store).await;
    editor.finish_save(&pending, result);
    assert_eq!(store.record(Collection::Receipts, 10).unwrap()["store"], "Market");
    assert_eq!(editor.saved_prompt().unwrap().title, "Receipt updated successfully");
}

#[tokio::test]
async fn edit_missing_receipt_is_not_found() {
    let store = store();
    let result = ReceiptEditor::load(&store, 99, &config()).await;
    assert!(matches!(result, Err(PageError::NotFound { id: 99, .. })));
}

// =========================================================================
// inline item creation
// =========================================================================

#[tokio::test]
async fn created_item_lands_in_staged_purchase() {
    let store = store();
    let mut editor = blank_editor(&store).await;
    let session = editor.trigger_item_create().unwrap();

    let dialog = editor.items.page.dialog_mut().unwrap();
    assert_eq!(dialog.id, session);
    assert_eq!(dialog.title, "Create Item");
    dialog.form.write("name", FieldValue::Text("Eggs".into())).unwrap();
    dialog.form.relation("categoryId").unwrap().connect(1).unwrap();

    let pending = editor.begin_item_submit().unwrap();
    let finished = editor.run_item(&store, pending).await.unwrap();
    assert!(matches!(finished, Finished::Applied(Some(_))));
    assert!(editor.items.page.dialog().is_none());

    assert_eq!(staged_item(&mut editor), FieldValue::Id(11));
    let labels: Vec<String> = editor.items.page.rows.iter().map(|i| i.name.clone()).collect();
    assert_eq!(labels, ["Milk", "Eggs"]);
}

#[tokio::test]
async fn dismissed_item_dialog_keeps_purchase_item() {
    let store = store();
    let mut editor = blank_editor(&store).await;
    editor.form.list("purchases").unwrap().choose("itemId", 3).unwrap();
    editor.trigger_item_create().unwrap();

    editor.close_item_dialog();
    assert!(editor.items.page.dialog().is_none());
    assert_eq!(staged_item(&mut editor), FieldValue::Id(3));
    let mut purchases = editor.form.list("purchases").unwrap();
    assert!(!purchases.select("itemId").unwrap().is_pending());
}
