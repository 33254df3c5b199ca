//! Receipts: the list page and the create/edit editor.
//!
//! DESIGN
//! ======
//! Both screens hand inline creations off through a page-owned
//! `CreationMailbox`. The list page's category cell can ask for a new
//! category; the editor's purchase rows can ask for a new item. Each opens a
//! secondary dialog, and the dialog's outcome settles the mailbox: the new
//! record's id when it was created, an explicit empty value when the dialog
//! was closed. The waiting select picks the result up on its next poll.
//!
//! The editor is not a dialog. A successful save shows a prompt instead of
//! closing, and "continue here" resets the form for the next receipt.

#[cfg(test)]
#[path = "receipts_test.rs"]
mod receipts_test;

use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::categories::create_category_dialog;
use super::controller::{
    CellEditor, CollectionPage, Finished, MutationRequest, PageError, PendingMutation, actions_column, created_id,
    id_column,
};
use super::items::{ItemsPage, create_item_dialog};
use crate::config::ApiConfig;
use crate::controls::{CreationMailbox, CreationOutcome, SelectControl, SelectView, product_derivation};
use crate::form::value::format_date;
use crate::form::{
    FieldDescriptor, FieldSchema, FieldValue, FormEngine, ListItemRecord, ListSpec, RecordId, Rules, SelectOption,
    SelectSpec, Snapshot, SubmitOutcome,
};
use crate::grid::{CellValue, CellView, ColumnDescriptor, GridPage, render};
use crate::net::{
    ApiError, Category, Collection, DataAccess, Receipt, Relation, category_options, fetch_all, format_currency,
    item_options,
};

pub const CATEGORY_SUBJECT: &str = "category";
pub const ITEM_SUBJECT: &str = "item";

/// Entity tag of receipt categories.
pub const RECEIPT_ENTITY: &str = "receipt";

// =============================================================================
// LIST PAGE
// =============================================================================

pub struct ReceiptsPage {
    pub page: CollectionPage<Receipt>,
    categories: Vec<SelectOption>,
    mailbox: CreationMailbox,
    cell: Option<CellEditor>,
    detail: Option<RecordId>,
}

impl ReceiptsPage {
    /// # Errors
    ///
    /// Returns `Grid` for an unsupported configured page size.
    pub fn new(config: &ApiConfig) -> Result<Self, PageError> {
        Ok(Self {
            page: CollectionPage::new(Collection::Receipts, config)?,
            categories: Vec::new(),
            mailbox: CreationMailbox::new(),
            cell: None,
            detail: None,
        })
    }

    #[must_use]
    pub fn categories(&self) -> &[SelectOption] {
        &self.categories
    }

    #[must_use]
    pub fn mailbox(&self) -> &CreationMailbox {
        &self.mailbox
    }

    /// Reload receipts and the receipt categories.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors.
    pub async fn reload(&mut self, api: &dyn DataAccess) -> Result<(), PageError> {
        self.page.reload(api).await?;
        self.reload_categories(api).await
    }

    async fn reload_categories(&mut self, api: &dyn DataAccess) -> Result<(), PageError> {
        let categories: Vec<Category> = fetch_all(api, Collection::Categories, &[("entity", RECEIPT_ENTITY)]).await?;
        self.categories = category_options(&categories);
        if let Some(cell) = self.cell.as_mut() {
            cell.control.set_options(self.categories.clone());
        }
        Ok(())
    }

    /// Execute `pending`. When it answers the category dialog, the waiting
    /// category cell is settled with the created id.
    ///
    /// # Errors
    ///
    /// Propagates reload errors after a successful mutation.
    pub async fn run(&mut self, api: &dyn DataAccess, pending: PendingMutation) -> Result<Finished, PageError> {
        let for_dialog = pending.session.is_some() && pending.session == self.page.dialog().map(|d| d.id);
        let finished = self.page.run(api, pending).await?;
        if let Finished::Applied(record) = &finished {
            self.reload_categories(api).await?;
            if for_dialog && self.mailbox.is_pending() {
                settle(&self.mailbox, record.as_ref());
            }
        }
        Ok(finished)
    }

    // -------------------------------------------------------------------------
    // category cell
    // -------------------------------------------------------------------------

    /// Open the category picker on receipt `id`. It offers "create new".
    pub fn open_category_cell(&mut self, id: RecordId) {
        let spec = SelectSpec::new(CATEGORY_SUBJECT, self.categories.clone())
            .with_create(self.mailbox.capability(CATEGORY_SUBJECT));
        let mut control = SelectControl::multi(spec);
        control.open();
        self.cell = Some(CellEditor { row: id, control });
    }

    pub fn category_cell(&mut self) -> Option<&mut SelectControl> {
        self.cell.as_mut().map(|cell| &mut cell.control)
    }

    pub fn close_category_cell(&mut self) {
        self.cell = None;
    }

    /// Connect an offered category to the receipt of the open cell.
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
        Ok(Some(connect_category(owner, category)))
    }

    /// "Create new" in the open cell: hand off to the category dialog.
    /// Returns the dialog session id.
    ///
    /// # Errors
    ///
    /// Propagates form construction errors.
    pub fn trigger_category_create(&mut self) -> Result<Option<Uuid>, PageError> {
        let Some(cell) = self.cell.as_mut() else {
            return Ok(None);
        };
        cell.control.trigger_create()?;
        Ok(Some(self.page.open_dialog(create_category_dialog(RECEIPT_ENTITY)?)))
    }

    /// Close the category dialog without creating; the cell gets an empty
    /// value.
    pub fn close_category_dialog(&mut self) {
        self.page.close_dialog();
        self.mailbox.dismiss();
    }

    /// Pick up a settled creation in the open cell. A created category is
    /// connected right away; a dismissed one leaves the receipt unchanged.
    pub fn poll_category_cell(&mut self) -> Option<PendingMutation> {
        let cell = self.cell.as_mut()?;
        match cell.control.poll_creation()? {
            CreationOutcome::Resolved(category) => {
                let owner = cell.row;
                self.cell = None;
                Some(connect_category(owner, category))
            }
            CreationOutcome::Empty => {
                debug!(receipt = cell.row, "category creation dismissed");
                None
            }
        }
    }

    #[must_use]
    pub fn disconnect_category(receipt: RecordId, category: RecordId) -> PendingMutation {
        PendingMutation::detached(MutationRequest::Disconnect {
            relation: Relation::ReceiptCategory,
            owner: receipt,
            related: category,
        })
    }

    // -------------------------------------------------------------------------
    // detail panel
    // -------------------------------------------------------------------------

    pub fn show_detail(&mut self, id: RecordId) {
        self.detail = Some(id);
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    /// Side panel for the selected receipt, once it is among the loaded rows.
    #[must_use]
    pub fn detail(&self) -> Option<ReceiptDetail> {
        let id = self.detail?;
        self.page.rows.iter().find(|r| r.id == id).map(ReceiptDetail::new)
    }

    // -------------------------------------------------------------------------
    // grid
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn columns(&self) -> Vec<ColumnDescriptor<Receipt>> {
        let categories = self.categories.clone();
        let open = self.cell.as_ref().and_then(|cell| {
            let receipt = self.page.rows.iter().find(|r| r.id == cell.row)?;
            Some((cell.row, cell.control.view(&connected(receipt))))
        });
        vec![
            id_column(|r: &Receipt| r.id),
            ColumnDescriptor::accessor("name", "Name", |r: &Receipt| r.name.as_str().into()),
            ColumnDescriptor::accessor("categories", "Category", |r: &Receipt| {
                CellValue::from(r.categories.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", "))
            })
            .with_cell(move |receipt: &Receipt, _| match &open {
                Some((row, view)) if *row == receipt.id => CellView::Select(view.clone()),
                _ => CellView::Select(category_chips(&categories, receipt)),
            }),
            ColumnDescriptor::accessor("creationDate", "Creation Date", |r: &Receipt| {
                CellValue::Date(r.creation_date.date())
            }),
            ColumnDescriptor::accessor("store", "Store", |r: &Receipt| r.store.as_str().into()),
            ColumnDescriptor::accessor("total", "Total", |r: &Receipt| CellValue::Number(r.total()))
                .with_cell(|r: &Receipt, _| CellView::Text(format_currency(r.total()))),
            actions_column(),
        ]
    }

    #[must_use]
    pub fn grid(&self) -> GridPage {
        render(&self.page.rows, &self.columns(), &self.page.grid)
    }
}

fn connect_category(owner: RecordId, category: RecordId) -> PendingMutation {
    PendingMutation::detached(MutationRequest::Connect { relation: Relation::ReceiptCategory, owner, related: category })
}

fn connected(receipt: &Receipt) -> FieldValue {
    FieldValue::Ids(receipt.categories.iter().map(|c| c.id).collect())
}

/// Closed picker showing the connected categories as chips. Connected
/// categories missing from the options keep their own names.
fn category_chips(options: &[SelectOption], receipt: &Receipt) -> SelectView {
    let mut options = options.to_vec();
    for category in &receipt.categories {
        if !options.iter().any(|o| o.value == category.id) {
            options.push(category.option());
        }
    }
    SelectControl::multi(SelectSpec::new(CATEGORY_SUBJECT, options)).view(&connected(receipt))
}

/// Settle a pending creation with the id of `record`, or dismiss it when the
/// service answered without one.
fn settle(mailbox: &CreationMailbox, record: Option<&Value>) {
    let delivered = match created_id(record) {
        Some(id) => mailbox.settle(id),
        None => mailbox.dismiss(),
    };
    if !delivered {
        debug!("no select was waiting for the created record");
    }
}

// =============================================================================
// DETAIL
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseLine {
    /// `2.00x`
    pub quantity: String,
    pub item: String,
    pub category: Option<String>,
    /// `* 1.25`
    pub unit_price: String,
    pub price: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReceiptDetail {
    pub title: String,
    /// `store - YYYY-MM-DD`
    pub subtitle: String,
    pub lines: Vec<PurchaseLine>,
    pub total: String,
}

impl ReceiptDetail {
    #[must_use]
    pub fn new(receipt: &Receipt) -> Self {
        let lines = receipt
            .purchases
            .iter()
            .map(|p| PurchaseLine {
                quantity: format!("{:.2}x", p.quantity),
                item: p.item.as_ref().map(|i| i.name.clone()).unwrap_or_default(),
                category: p.item.as_ref().and_then(|i| i.category.as_ref()).map(|c| c.name.clone()),
                unit_price: format!("* {}", p.unit_price),
                price: format_currency(p.price),
            })
            .collect();
        Self {
            title: receipt.name.clone(),
            subtitle: format!("{} - {}", receipt.store, format_date(receipt.creation_date.date())),
            lines,
            total: format_currency(receipt.total()),
        }
    }
}

// =============================================================================
// EDITOR
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(RecordId),
}

impl EditorMode {
    fn verb(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Edit(_) => "Edit",
        }
    }
}

/// Shown after a successful save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedPrompt {
    pub title: String,
    pub description: String,
}

fn receipt_schema(items: &[SelectOption], mailbox: &CreationMailbox) -> Result<FieldSchema, PageError> {
    let item = SelectSpec::new(ITEM_SUBJECT, items.to_vec()).with_create(mailbox.capability(ITEM_SUBJECT));
    let purchases = ListSpec::new(vec![
        FieldDescriptor::number("quantity", "Quantity").with_placeholder("Enter quantity"),
        FieldDescriptor::number("unitPrice", "Unit Price").with_placeholder("Enter unit price"),
        FieldDescriptor::number("price", "Price").with_placeholder("Enter price"),
        FieldDescriptor::select("itemId", "Item ID", item),
    ])
    .with_derivation(product_derivation("quantity", "unitPrice", "price"));
    Ok(FieldSchema::new(vec![
        FieldDescriptor::text("name", "Name").with_placeholder("Trip to Walmart"),
        FieldDescriptor::text("store", "Store").with_placeholder("Walmart"),
        FieldDescriptor::date("creationDate", "Creation Date"),
        FieldDescriptor::list("purchases", "Purchases", purchases),
    ])?)
}

fn receipt_rules() -> Rules {
    Rules::new()
        .required_text("name", "Name is required")
        .required_text("store", "Store is required")
        .required_date("creationDate", "Creation date is required")
        .prune_empty_rows("purchases")
}

fn blank_defaults() -> Snapshot {
    Snapshot::new()
        .with("name", FieldValue::Text(String::new()))
        .with("store", FieldValue::Text(String::new()))
        .with("creationDate", FieldValue::Date(OffsetDateTime::now_utc().date()))
        .with("purchases", FieldValue::List(Vec::new()))
}

fn receipt_defaults(receipt: &Receipt) -> Snapshot {
    let rows: Vec<ListItemRecord> = receipt
        .purchases
        .iter()
        .map(|p| {
            let item = p.item_id.or(p.item.as_ref().map(|i| i.id));
            [
                ("quantity", FieldValue::Number(p.quantity)),
                ("unitPrice", FieldValue::Number(p.unit_price)),
                ("price", FieldValue::Number(p.price)),
                ("itemId", item.map_or(FieldValue::Empty, FieldValue::Id)),
            ]
            .into_iter()
            .collect()
        })
        .collect();
    Snapshot::new()
        .with("name", FieldValue::Text(receipt.name.clone()))
        .with("store", FieldValue::Text(receipt.store.clone()))
        .with("creationDate", FieldValue::Date(receipt.creation_date.date()))
        .with("purchases", FieldValue::List(rows))
}

/// Full-page receipt form with its secondary "Create Item" dialog.
pub struct ReceiptEditor {
    mode: EditorMode,
    session: Uuid,
    defaults: Snapshot,
    pub form: FormEngine,
    mailbox: CreationMailbox,
    /// Item options and the item dialog.
    pub items: ItemsPage,
    saved: bool,
    pub last_error: Option<String>,
}

impl ReceiptEditor {
    /// Blank editor dated today.
    ///
    /// # Errors
    ///
    /// Propagates page and form construction errors.
    pub fn create(config: &ApiConfig) -> Result<Self, PageError> {
        Self::build(EditorMode::Create, blank_defaults(), config)
    }

    /// Editor seeded from the stored receipt `id`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing receipt, `Api` for fetch or parse
    /// failures.
    pub async fn load(api: &dyn DataAccess, id: RecordId, config: &ApiConfig) -> Result<Self, PageError> {
        let record = api
            .get(Collection::Receipts, id)
            .await?
            .ok_or(PageError::NotFound { collection: Collection::Receipts, id })?;
        let receipt: Receipt = serde_json::from_value(record).map_err(|e| ApiError::Parse(e.to_string()))?;
        let mut editor = Self::build(EditorMode::Edit(id), receipt_defaults(&receipt), config)?;
        editor.reload(api).await?;
        Ok(editor)
    }

    fn build(mode: EditorMode, defaults: Snapshot, config: &ApiConfig) -> Result<Self, PageError> {
        let mailbox = CreationMailbox::new();
        let form = FormEngine::new(receipt_schema(&[], &mailbox)?, defaults.clone(), receipt_rules())?;
        Ok(Self {
            mode,
            session: Uuid::new_v4(),
            defaults,
            form,
            mailbox,
            items: ItemsPage::new(config)?,
            saved: false,
            last_error: None,
        })
    }

    #[must_use]
    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    #[must_use]
    pub fn session(&self) -> Uuid {
        self.session
    }

    #[must_use]
    pub fn title(&self) -> String {
        format!("{} Receipt", self.mode.verb())
    }

    #[must_use]
    pub fn description(&self) -> String {
        format!("{} a receipt from a shopping trip.", self.mode.verb())
    }

    /// Reload items and item categories, and refresh the purchase selects.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors.
    pub async fn reload(&mut self, api: &dyn DataAccess) -> Result<(), PageError> {
        self.items.reload(api).await?;
        self.refresh_items();
        Ok(())
    }

    fn refresh_items(&mut self) {
        self.form.refresh_options(ITEM_SUBJECT, &item_options(&self.items.page.rows));
    }

    // -------------------------------------------------------------------------
    // item dialog
    // -------------------------------------------------------------------------

    /// "Create new" on the staged purchase's item select. Opens the
    /// "Create Item" dialog and returns its session id.
    ///
    /// # Errors
    ///
    /// Propagates form errors.
    pub fn trigger_item_create(&mut self) -> Result<Uuid, PageError> {
        self.form.list("purchases")?.select("itemId")?.trigger_create()?;
        let dialog = create_item_dialog(self.items.categories())?;
        Ok(self.items.page.open_dialog(dialog))
    }

    /// Close the item dialog without creating; the purchase keeps its item.
    pub fn close_item_dialog(&mut self) {
        self.items.page.close_dialog();
        self.mailbox.dismiss();
        self.form.poll_creations();
    }

    /// Submit the item dialog's form.
    pub fn begin_item_submit(&mut self) -> Option<PendingMutation> {
        self.items.page.begin_submit()
    }

    /// Execute an item mutation. A created item is settled into the waiting
    /// purchase row.
    ///
    /// # Errors
    ///
    /// Propagates reload errors after a successful mutation.
    pub async fn run_item(&mut self, api: &dyn DataAccess, pending: PendingMutation) -> Result<Finished, PageError> {
        let for_dialog = pending.session.is_some() && pending.session == self.items.page.dialog().map(|d| d.id);
        let finished = self.items.run(api, pending).await?;
        if let Finished::Applied(record) = &finished {
            self.refresh_items();
            if for_dialog && self.mailbox.is_pending() {
                settle(&self.mailbox, record.as_ref());
            }
            self.form.poll_creations();
        }
        Ok(finished)
    }

    // -------------------------------------------------------------------------
    // save
    // -------------------------------------------------------------------------

    /// Submit the receipt form.
    pub fn begin_save(&mut self) -> Option<PendingMutation> {
        let SubmitOutcome::Committed(snapshot) = self.form.submit() else {
            return None;
        };
        let body = snapshot.to_json();
        let request = match self.mode {
            EditorMode::Create => MutationRequest::Create { collection: Collection::Receipts, body },
            EditorMode::Edit(id) => MutationRequest::Update { collection: Collection::Receipts, id, body },
        };
        Some(PendingMutation { session: Some(self.session), request })
    }

    /// Apply the save result. Results for an earlier form session are dropped.
    pub fn finish_save(&mut self, pending: &PendingMutation, result: Result<Option<Value>, ApiError>) -> Finished {
        if pending.session != Some(self.session) {
            debug!(session = ?pending.session, "dropping save result for a reset form");
            return Finished::Stale;
        }
        match pending.request.check(result) {
            Ok(record) => {
                info!(action = pending.request.label(), "receipt saved");
                self.saved = true;
                self.last_error = None;
                Finished::Applied(record)
            }
            Err(err) => {
                warn!(code = err.error_code(), error = %err, "receipt save failed");
                self.form.commit_failed();
                self.last_error = Some(err.to_string());
                Finished::Failed(err)
            }
        }
    }

    /// Submit, execute and apply in one step. `None` when the form did not
    /// commit.
    pub async fn save(&mut self, api: &dyn DataAccess) -> Option<Finished> {
        let pending = self.begin_save()?;
        let result = pending.request.execute(api).await;
        Some(self.finish_save(&pending, result))
    }

    #[must_use]
    pub fn saved_prompt(&self) -> Option<SavedPrompt> {
        if !self.saved {
            return None;
        }
        let done = match self.mode {
            EditorMode::Create => "created",
            EditorMode::Edit(_) => "updated",
        };
        Some(SavedPrompt {
            title: format!("Receipt {done} successfully"),
            description: format!("Receipt was {done} successfully! What do you want to do next?"),
        })
    }

    /// "Continue here": dismiss the prompt and reset the form to its
    /// defaults under a new session.
    ///
    /// # Errors
    ///
    /// Propagates form construction errors.
    pub fn continue_here(&mut self) -> Result<(), PageError> {
        let schema = receipt_schema(&item_options(&self.items.page.rows), &self.mailbox)?;
        self.form = FormEngine::new(schema, self.defaults.clone(), receipt_rules())?;
        self.session = Uuid::new_v4();
        self.saved = false;
        self.last_error = None;
        Ok(())
    }
}
