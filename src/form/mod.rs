//! Schema-driven form engine.
//!
//! DESIGN
//! ======
//! A `FieldSchema` is validated once at construction and never changes for
//! the lifetime of a dialog session. `FormEngine` seeds a `Snapshot` from
//! caller defaults, routes control events into it, and turns a successful
//! validation into exactly one commit event.

pub mod engine;
pub mod error;
pub mod schema;
pub mod validate;
pub mod value;
pub mod view;

pub use engine::{FormEngine, ListHandle, RelationHandle, SubmitOutcome};
pub use error::FormError;
pub use schema::{
    Derivation, FieldDescriptor, FieldKind, FieldSchema, ListSpec, RelationSpec, SchemaError, SelectOption,
    SelectSpec,
};
pub use validate::{AcceptAll, FieldErrors, Rules, Validation, Validator};
pub use value::{FieldValue, ListItemRecord, RecordId, Snapshot, ValueMap};
pub use view::{ControlView, FormView, SubmitView, WidgetView};
