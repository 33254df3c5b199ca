//! Data access for the admin service: the `DataAccess` seam, its reqwest
//! implementation, and typed records.

pub mod api;
pub mod types;

#[cfg(test)]
pub mod test_helpers;

pub use api::{ApiError, DataAccess, HttpClient, fetch_all};
pub use types::{
    Category, Collection, Item, Purchase, Receipt, Relation, Ticket, TicketPurchase, category_options, format_currency,
    item_options,
};
