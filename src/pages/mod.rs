//! Page controllers for the admin screens.
//!
//! Each page owns its fetched rows, its grid state and at most one open
//! dialog. Mutations are split into a `begin_*` step that yields a
//! `PendingMutation` and a finish step that applies the result, so a caller
//! can run the remote call wherever it likes and late results can be
//! recognised and dropped.

pub mod categories;
pub mod controller;
pub mod items;
pub mod receipts;
pub mod tickets;

pub use categories::{CategoriesPage, category_form, create_category_dialog};
pub use controller::{
    CellEditor, CollectionPage, DELETE_TITLE, DELETE_WARNING, DeleteConfirmation, DialogKind, DialogSession,
    Finished, MutationRequest, PageError, PendingMutation, actions_column, created_id, id_column,
};
pub use items::{ItemsPage, create_item_dialog, create_item_form};
pub use receipts::{EditorMode, PurchaseLine, ReceiptDetail, ReceiptEditor, ReceiptsPage, SavedPrompt};
pub use tickets::{TicketDetail, TicketLine, TicketsPage, ticket_form};
