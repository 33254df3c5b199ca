//! Complex form controls: select with inline creation, structured list
//! editor, relation dual editor.
//!
//! Controls never own the bound form value. They keep their own transient
//! state (open flag, staged row, active branch) and write through whatever
//! the form engine hands them.

pub mod creation;
pub mod list;
pub mod relation;
pub mod select;

pub use creation::{Continuation, CreateCapability, CreationMailbox, Settlement};
pub use list::{ListEditor, ListMode, ListView, StagedCell, StagedItem, product_derivation};
pub use relation::{RelationEditor, RelationField, RelationMode, RelationView};
pub use select::{CreationOutcome, SelectControl, SelectView};
