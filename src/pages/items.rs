//! Items page.
//!
//! Items are created with a connect-or-create category field and edited with
//! a plain category select. The grid's category cell is an inline select that
//! reconnects the item directly, without a dialog.

#[cfg(test)]
#[path = "items_test.rs"]
mod items_test;

use uuid::Uuid;

use super::controller::{
    CellEditor, CollectionPage, DialogKind, DialogSession, Finished, MutationRequest, PageError, PendingMutation,
    actions_column, id_column,
};
use crate::config::ApiConfig;
use crate::controls::SelectControl;
use crate::form::{
    FieldDescriptor, FieldSchema, FieldValue, FormEngine, RecordId, RelationSpec, Rules, SelectOption, SelectSpec,
    Snapshot,
};
use crate::grid::{CellValue, CellView, ColumnDescriptor, GridPage, render};
use crate::net::{Category, Collection, DataAccess, Item, Relation, category_options, fetch_all};

pub const CATEGORY_SUBJECT: &str = "category";

fn name_field() -> FieldDescriptor {
    FieldDescriptor::text("name", "Name").with_placeholder("Leche Alpura 1.8 lt")
}

fn item_rules() -> Rules {
    Rules::new().required_text("name", "Name is required")
}

/// Create form: name plus a category that is either connected by id
/// (`categoryId`) or created inline (`category: {name}`).
///
/// # Errors
///
/// Propagates schema and form construction errors.
pub fn create_item_form(categories: &[SelectOption]) -> Result<FormEngine, PageError> {
    let category = RelationSpec::new(
        "category",
        SelectSpec::new(CATEGORY_SUBJECT, categories.to_vec()),
        vec![FieldDescriptor::text("name", "Name").with_placeholder("New category name")],
    );
    let schema = FieldSchema::new(vec![name_field(), FieldDescriptor::relation("categoryId", "Category", category)])?;
    Ok(FormEngine::new(schema, Snapshot::new(), item_rules())?)
}

/// "Create Item" dialog.
///
/// # Errors
///
/// Propagates form construction errors.
pub fn create_item_dialog(categories: &[SelectOption]) -> Result<DialogSession, PageError> {
    Ok(DialogSession::new(
        DialogKind::Create,
        Collection::Items,
        "Create Item",
        "Create an item you bought.",
        create_item_form(categories)?,
    ))
}

pub struct ItemsPage {
    pub page: CollectionPage<Item>,
    categories: Vec<SelectOption>,
    cell: Option<CellEditor>,
}

impl ItemsPage {
    /// # Errors
    ///
    /// Returns `Grid` for an unsupported configured page size.
    pub fn new(config: &ApiConfig) -> Result<Self, PageError> {
        Ok(Self { page: CollectionPage::new(Collection::Items, config)?, categories: Vec::new(), cell: None })
    }

    #[must_use]
    pub fn categories(&self) -> &[SelectOption] {
        &self.categories
    }

    /// Reload items and the item categories offered by every select.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors.
    pub async fn reload(&mut self, api: &dyn DataAccess) -> Result<(), PageError> {
        self.page.reload(api).await?;
        self.reload_categories(api).await
    }

    async fn reload_categories(&mut self, api: &dyn DataAccess) -> Result<(), PageError> {
        let categories: Vec<Category> = fetch_all(api, Collection::Categories, &[("entity", "item")]).await?;
        self.categories = category_options(&categories);
        if let Some(session) = self.page.dialog_mut() {
            session.form.refresh_options(CATEGORY_SUBJECT, &self.categories);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates form construction errors.
    pub fn open_create(&mut self) -> Result<Uuid, PageError> {
        Ok(self.page.open_dialog(create_item_dialog(&self.categories)?))
    }

    /// # Errors
    ///
    /// Returns `NotFound` when `id` is not among the loaded rows.
    pub fn open_edit(&mut self, id: RecordId) -> Result<Uuid, PageError> {
        let item = self
            .page
            .rows
            .iter()
            .find(|i| i.id == id)
            .ok_or(PageError::NotFound { collection: Collection::Items, id })?;
        let schema = FieldSchema::new(vec![
            name_field(),
            FieldDescriptor::select(
                "categoryId",
                "Category",
                SelectSpec::new(CATEGORY_SUBJECT, self.categories.clone()),
            ),
        ])?;
        let defaults = Snapshot::new()
            .with("name", FieldValue::Text(item.name.clone()))
            .with("categoryId", item.category_id().map_or(FieldValue::Empty, FieldValue::Id));
        let form = FormEngine::new(schema, defaults, item_rules())?;
        let session = DialogSession::new(DialogKind::Edit(id), Collection::Items, "Edit Item", "Edit an item you bought.", form);
        Ok(self.page.open_dialog(session))
    }

    /// Execute `pending` through the page; a successful write also refreshes
    /// the category options, since item creation may have added one.
    ///
    /// # Errors
    ///
    /// Propagates reload errors after a successful mutation.
    pub async fn run(&mut self, api: &dyn DataAccess, pending: PendingMutation) -> Result<Finished, PageError> {
        let finished = self.page.run(api, pending).await?;
        if matches!(finished, Finished::Applied(_)) {
            self.reload_categories(api).await?;
        }
        Ok(finished)
    }

    // -------------------------------------------------------------------------
    // inline category cell
    // -------------------------------------------------------------------------

    /// Open the category select on the row of item `id`.
    pub fn open_category_cell(&mut self, id: RecordId) {
        let mut control = SelectControl::single(SelectSpec::new(CATEGORY_SUBJECT, self.categories.clone()));
        control.open();
        self.cell = Some(CellEditor { row: id, control });
    }

    pub fn category_cell(&mut self) -> Option<&mut SelectControl> {
        self.cell.as_mut().map(|cell| &mut cell.control)
    }

    pub fn close_category_cell(&mut self) {
        self.cell = None;
    }

    /// Choose a category in the open cell. The connect is sent right away.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOption` for a category that is not offered.
    pub fn choose_category(&mut self, category: RecordId) -> Result<Option<PendingMutation>, PageError> {
        let Some(cell) = self.cell.as_mut() else {
            return Ok(None);
        };
        cell.control.choose(category)?;
        let owner = cell.row;
        self.cell = None;
        Ok(Some(PendingMutation::detached(MutationRequest::Connect {
            relation: Relation::ItemCategory,
            owner,
            related: category,
        })))
    }

    // -------------------------------------------------------------------------
    // grid
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn columns(&self) -> Vec<ColumnDescriptor<Item>> {
        let closed = SelectControl::single(SelectSpec::new(CATEGORY_SUBJECT, self.categories.clone()));
        let open = self.cell.as_ref().and_then(|cell| {
            let item = self.page.rows.iter().find(|i| i.id == cell.row)?;
            Some((cell.row, cell.control.view(&bound_category(item))))
        });
        vec![
            id_column(|i: &Item| i.id),
            ColumnDescriptor::accessor("name", "Name", |i: &Item| i.name.as_str().into()),
            ColumnDescriptor::accessor("category", "Category", |i: &Item| {
                CellValue::from(i.category.as_ref().map(|c| c.name.clone()))
            })
            .with_cell(move |item: &Item, _| match &open {
                Some((row, view)) if *row == item.id => CellView::Select(view.clone()),
                _ => CellView::Select(closed.view(&bound_category(item))),
            }),
            actions_column(),
        ]
    }

    #[must_use]
    pub fn grid(&self) -> GridPage {
        render(&self.page.rows, &self.columns(), &self.page.grid)
    }
}

fn bound_category(item: &Item) -> FieldValue {
    item.category_id().map_or(FieldValue::Empty, FieldValue::Id)
}
