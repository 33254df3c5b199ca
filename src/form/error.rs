//! Errors raised by form and control operations.
//!
//! These describe integration mistakes (wrong key, wrong value kind, stale
//! row index). User input problems are never errors; they come back from the
//! validator as per-field messages.

use super::value::RecordId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("field {key} is {kind} and cannot take this value")]
    KindMismatch { key: String, kind: &'static str },

    #[error("option {value} is not offered for {subject}")]
    UnknownOption { subject: String, value: RecordId },

    #[error("row {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{subject} has no create capability")]
    NoCreateCapability { subject: String },

    #[error("field {key} belongs to the inactive relation branch")]
    InactiveBranch { key: String },
}
