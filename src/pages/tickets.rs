//! Tickets page: a read-mostly grid with a detail panel and a create dialog.
//!
//! A ticket is a lighter receipt. Each purchase carries a price, the day it
//! was bought and the item; there is no quantity and no derivation.

#[cfg(test)]
#[path = "tickets_test.rs"]
mod tickets_test;

use time::OffsetDateTime;
use uuid::Uuid;

use super::controller::{CollectionPage, DialogKind, DialogSession, Finished, PageError, PendingMutation, id_column};
use crate::config::ApiConfig;
use crate::form::value::format_date;
use crate::form::{
    FieldDescriptor, FieldSchema, FieldValue, FormEngine, ListSpec, RecordId, Rules, SelectOption, SelectSpec,
    Snapshot,
};
use crate::grid::{CellValue, CellView, ColumnDescriptor, GridPage, render};
use crate::net::{Collection, DataAccess, Item, Ticket, fetch_all, format_currency, item_options};

pub const ITEM_SUBJECT: &str = "item";

/// Create form: name, store, date and a purchases list of price, purchase
/// date and item.
///
/// # Errors
///
/// Propagates schema and form construction errors.
pub fn ticket_form(items: &[SelectOption]) -> Result<FormEngine, PageError> {
    let purchases = ListSpec::new(vec![
        FieldDescriptor::number("price", "Price").with_placeholder("Enter price"),
        FieldDescriptor::date("purchaseDate", "Purchase Date"),
        FieldDescriptor::select("itemId", "Item ID", SelectSpec::new(ITEM_SUBJECT, items.to_vec()))
            .with_placeholder("Enter item ID"),
    ]);
    let schema = FieldSchema::new(vec![
        FieldDescriptor::text("name", "Name").with_placeholder("Trip to Walmart"),
        FieldDescriptor::text("store", "Store").with_placeholder("Walmart"),
        FieldDescriptor::date("creationDate", "Creation Date").with_placeholder("22/03/24"),
        FieldDescriptor::list("purchases", "Purchases", purchases),
    ])?;
    let defaults = Snapshot::new()
        .with("name", FieldValue::Text(String::new()))
        .with("store", FieldValue::Text(String::new()))
        .with("creationDate", FieldValue::Date(OffsetDateTime::now_utc().date()))
        .with("purchases", FieldValue::List(Vec::new()));
    let rules = Rules::new()
        .required_text("name", "Name is required")
        .required_text("store", "Store is required")
        .required_date("creationDate", "Creation date is required");
    Ok(FormEngine::new(schema, defaults, rules)?)
}

pub struct TicketsPage {
    pub page: CollectionPage<Ticket>,
    items: Vec<SelectOption>,
    detail: Option<RecordId>,
}

impl TicketsPage {
    /// # Errors
    ///
    /// Returns `Grid` for an unsupported configured page size.
    pub fn new(config: &ApiConfig) -> Result<Self, PageError> {
        Ok(Self { page: CollectionPage::new(Collection::Tickets, config)?, items: Vec::new(), detail: None })
    }

    #[must_use]
    pub fn items(&self) -> &[SelectOption] {
        &self.items
    }

    /// Reload tickets and the item options of the purchases list.
    ///
    /// # Errors
    ///
    /// Propagates fetch errors.
    pub async fn reload(&mut self, api: &dyn DataAccess) -> Result<(), PageError> {
        self.page.reload(api).await?;
        self.reload_items(api).await
    }

    async fn reload_items(&mut self, api: &dyn DataAccess) -> Result<(), PageError> {
        let items: Vec<Item> = fetch_all(api, Collection::Items, &[]).await?;
        self.items = item_options(&items);
        if let Some(session) = self.page.dialog_mut() {
            session.form.refresh_options(ITEM_SUBJECT, &self.items);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Propagates form construction errors.
    pub fn open_create(&mut self) -> Result<Uuid, PageError> {
        let session = DialogSession::new(
            DialogKind::Create,
            Collection::Tickets,
            "Create Ticket",
            "Create a ticket from a shopping trip.",
            ticket_form(&self.items)?,
        );
        Ok(self.page.open_dialog(session))
    }

    /// Execute `pending`; a write also refreshes the item options.
    ///
    /// # Errors
    ///
    /// Propagates reload errors after a successful mutation.
    pub async fn run(&mut self, api: &dyn DataAccess, pending: PendingMutation) -> Result<Finished, PageError> {
        let finished = self.page.run(api, pending).await?;
        if matches!(finished, Finished::Applied(_)) {
            self.reload_items(api).await?;
        }
        Ok(finished)
    }

    pub fn show_detail(&mut self, id: RecordId) {
        self.detail = Some(id);
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    #[must_use]
    pub fn detail(&self) -> Option<TicketDetail> {
        let id = self.detail?;
        self.page.rows.iter().find(|t| t.id == id).map(TicketDetail::new)
    }

    #[must_use]
    pub fn columns() -> Vec<ColumnDescriptor<Ticket>> {
        vec![
            id_column(|t: &Ticket| t.id),
            ColumnDescriptor::accessor("name", "Name", |t: &Ticket| t.name.as_str().into()),
            ColumnDescriptor::accessor("creationDate", "Creation Date", |t: &Ticket| {
                t.creation_date.map_or(CellValue::Empty, |d| CellValue::Date(d.date()))
            }),
            ColumnDescriptor::accessor("store", "Store", |t: &Ticket| t.store.as_str().into()),
            ColumnDescriptor::accessor("total", "Total", |t: &Ticket| CellValue::Number(t.total()))
                .with_cell(|t: &Ticket, _| CellView::Text(format_currency(t.total()))),
        ]
    }

    #[must_use]
    pub fn grid(&self) -> GridPage {
        render(&self.page.rows, &Self::columns(), &self.page.grid)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketLine {
    pub item: String,
    /// Category chip next to the item name.
    pub category: Option<String>,
    pub price: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketDetail {
    pub title: String,
    /// `store - YYYY-MM-DD`, with the date left blank when unknown.
    pub subtitle: String,
    pub lines: Vec<TicketLine>,
    pub total: String,
}

impl TicketDetail {
    #[must_use]
    pub fn new(ticket: &Ticket) -> Self {
        let lines = ticket
            .purchases
            .iter()
            .map(|p| TicketLine {
                item: p.item.as_ref().map(|i| i.name.clone()).unwrap_or_default(),
                category: p.item.as_ref().and_then(|i| i.category.as_ref()).map(|c| c.name.clone()),
                price: format_currency(p.price),
            })
            .collect();
        let date = ticket.creation_date.map(|d| format_date(d.date())).unwrap_or_default();
        Self {
            title: ticket.name.clone(),
            subtitle: format!("{} - {date}", ticket.store),
            lines,
            total: format_currency(ticket.total()),
        }
    }
}
