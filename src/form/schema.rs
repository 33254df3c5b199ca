//! Field descriptors and schema validation.
//!
//! DESIGN
//! ======
//! The field-kind set is closed: `FieldKind` is a sum type and every consumer
//! matches on it exhaustively, so adding a kind is a compile error until each
//! renderer handles it. Nested descriptors (list columns, relation create
//! fields) are restricted to the scalar kinds plus single select.
//!
//! ERROR HANDLING
//! ==============
//! `FieldSchema::new` rejects misconfigured schemas up front so mistakes show
//! up when a page builds its dialog, not when a user types into it.

#[cfg(test)]
#[path = "schema_test.rs"]
mod schema_test;

use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use super::value::{FieldValue, RecordId, format_date};
use crate::controls::creation::CreateCapability;
use crate::controls::list::StagedItem;

/// One choice offered by a select control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectOption {
    pub value: RecordId,
    pub label: String,
}

impl SelectOption {
    #[must_use]
    pub fn new(value: RecordId, label: impl Into<String>) -> Self {
        Self { value, label: label.into() }
    }
}

/// Options and optional inline creation for a select field.
#[derive(Clone, Debug, Default)]
pub struct SelectSpec {
    /// Noun shown on the trigger ("category", "item").
    pub subject: String,
    pub options: Vec<SelectOption>,
    pub create: Option<CreateCapability>,
}

impl SelectSpec {
    #[must_use]
    pub fn new(subject: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self { subject: subject.into(), options, create: None }
    }

    #[must_use]
    pub fn with_create(mut self, create: CreateCapability) -> Self {
        self.create = Some(create);
        self
    }
}

/// Staged-row derivation hook: `(key, new_value, staged) -> replacement`.
pub type Derivation = Rc<dyn Fn(&str, &FieldValue, &StagedItem) -> Option<StagedItem>>;

/// Columns of a structured list field.
#[derive(Clone)]
pub struct ListSpec {
    pub fields: Vec<FieldDescriptor>,
    pub derive: Option<Derivation>,
}

impl ListSpec {
    #[must_use]
    pub fn new(fields: Vec<FieldDescriptor>) -> Self {
        Self { fields, derive: None }
    }

    #[must_use]
    pub fn with_derivation(mut self, derive: Derivation) -> Self {
        self.derive = Some(derive);
        self
    }
}

impl fmt::Debug for ListSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListSpec")
            .field("fields", &self.fields)
            .field("derive", &self.derive.is_some())
            .finish()
    }
}

/// Connect-or-create relation. The descriptor key holds the connect id,
/// `create_key` holds the nested create payload.
#[derive(Clone, Debug)]
pub struct RelationSpec {
    pub create_key: String,
    pub connect: SelectSpec,
    pub create_fields: Vec<FieldDescriptor>,
}

impl RelationSpec {
    #[must_use]
    pub fn new(create_key: impl Into<String>, connect: SelectSpec, create_fields: Vec<FieldDescriptor>) -> Self {
        Self { create_key: create_key.into(), connect, create_fields }
    }
}

#[derive(Clone, Debug)]
pub enum FieldKind {
    Text,
    Number,
    Date,
    Select(SelectSpec),
    MultiSelect(SelectSpec),
    StructuredList(ListSpec),
    RelationDual(RelationSpec),
}

impl FieldKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Date => "date",
            Self::Select(_) => "select",
            Self::MultiSelect(_) => "multiSelect",
            Self::StructuredList(_) => "structuredList",
            Self::RelationDual(_) => "relationDual",
        }
    }

    /// Starting value when defaults do not provide one.
    #[must_use]
    pub fn empty_value(&self) -> FieldValue {
        match self {
            Self::MultiSelect(_) => FieldValue::Ids(Vec::new()),
            Self::StructuredList(_) => FieldValue::List(Vec::new()),
            Self::Text | Self::Number | Self::Date | Self::Select(_) | Self::RelationDual(_) => FieldValue::Empty,
        }
    }

    /// Kinds allowed as list columns and relation create fields.
    fn is_nestable(&self) -> bool {
        matches!(self, Self::Text | Self::Number | Self::Date | Self::Select(_))
    }
}

#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub placeholder: Option<String>,
}

impl FieldDescriptor {
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self { key: key.into(), label: label.into(), kind, placeholder: None }
    }

    #[must_use]
    pub fn text(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Text)
    }

    #[must_use]
    pub fn number(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Number)
    }

    #[must_use]
    pub fn date(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(key, label, FieldKind::Date)
    }

    #[must_use]
    pub fn select(key: impl Into<String>, label: impl Into<String>, spec: SelectSpec) -> Self {
        Self::new(key, label, FieldKind::Select(spec))
    }

    #[must_use]
    pub fn multi_select(key: impl Into<String>, label: impl Into<String>, spec: SelectSpec) -> Self {
        Self::new(key, label, FieldKind::MultiSelect(spec))
    }

    #[must_use]
    pub fn list(key: impl Into<String>, label: impl Into<String>, spec: ListSpec) -> Self {
        Self::new(key, label, FieldKind::StructuredList(spec))
    }

    #[must_use]
    pub fn relation(key: impl Into<String>, label: impl Into<String>, spec: RelationSpec) -> Self {
        Self::new(key, label, FieldKind::RelationDual(spec))
    }

    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Whether `value` has the shape this field stores. `Empty` always fits.
    #[must_use]
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (&self.kind, value) {
            (_, FieldValue::Empty)
            | (FieldKind::Text, FieldValue::Text(_))
            | (FieldKind::Number, FieldValue::Number(_))
            | (FieldKind::Date, FieldValue::Date(_))
            | (FieldKind::Select(_) | FieldKind::RelationDual(_), FieldValue::Id(_))
            | (FieldKind::MultiSelect(_), FieldValue::Ids(_))
            | (FieldKind::StructuredList(_), FieldValue::List(_)) => true,
            _ => false,
        }
    }

    /// Cell text for a committed list row.
    #[must_use]
    pub fn display(&self, value: &FieldValue) -> String {
        match (&self.kind, value) {
            (_, FieldValue::Empty) => String::new(),
            (_, FieldValue::Text(text)) => text.clone(),
            (_, FieldValue::Number(n)) => format!("{n:.2}"),
            (_, FieldValue::Date(date)) => format_date(*date),
            (FieldKind::Select(spec) | FieldKind::MultiSelect(spec), FieldValue::Id(id)) => option_label(spec, *id),
            (FieldKind::Select(spec) | FieldKind::MultiSelect(spec), FieldValue::Ids(ids)) => ids
                .iter()
                .map(|id| option_label(spec, *id))
                .collect::<Vec<_>>()
                .join(", "),
            (_, FieldValue::Id(id)) => format!("#{id}"),
            (_, FieldValue::Ids(ids)) => ids.iter().map(|id| format!("#{id}")).collect::<Vec<_>>().join(", "),
            (_, FieldValue::List(rows)) => format!("{} rows", rows.len()),
            (_, FieldValue::Record(map)) => map
                .values()
                .map(|v| self.display(v))
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

/// Label for `id`, or `#id` when the option list has not caught up yet.
pub(crate) fn option_label(spec: &SelectSpec, id: RecordId) -> String {
    spec.options
        .iter()
        .find(|o| o.value == id)
        .map_or_else(|| format!("#{id}"), |o| o.label.clone())
}

// =============================================================================
// SCHEMA
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("field key must not be empty")]
    EmptyKey,

    #[error("duplicate field key: {0}")]
    DuplicateKey(String),

    #[error("field {key} ({kind}) declares no nested fields")]
    EmptyNested { key: String, kind: &'static str },

    #[error("field {key} cannot nest {nested} of kind {kind}")]
    UnsupportedNested { key: String, nested: String, kind: &'static str },
}

/// Validated, immutable list of field descriptors.
#[derive(Clone, Debug)]
pub struct FieldSchema {
    fields: Vec<FieldDescriptor>,
}

impl FieldSchema {
    /// Validate and freeze a schema.
    ///
    /// # Errors
    ///
    /// Returns an error for empty or duplicate keys (the relation create key
    /// counts as a key), complex kinds without nested fields, and nested
    /// fields of a kind that cannot be nested.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for field in &fields {
            claim_key(&mut seen, &field.key)?;
            match &field.kind {
                FieldKind::StructuredList(spec) => check_nested(field, &spec.fields)?,
                FieldKind::RelationDual(spec) => {
                    claim_key(&mut seen, &spec.create_key)?;
                    check_nested(field, &spec.create_fields)?;
                }
                FieldKind::Text | FieldKind::Number | FieldKind::Date | FieldKind::Select(_) | FieldKind::MultiSelect(_) => {}
            }
        }
        Ok(Self { fields })
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key == key)
    }

    #[must_use]
    pub fn position(&self, key: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.key == key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn claim_key(seen: &mut HashSet<String>, key: &str) -> Result<(), SchemaError> {
    if key.is_empty() {
        return Err(SchemaError::EmptyKey);
    }
    if !seen.insert(key.to_owned()) {
        return Err(SchemaError::DuplicateKey(key.to_owned()));
    }
    Ok(())
}

fn check_nested(parent: &FieldDescriptor, nested: &[FieldDescriptor]) -> Result<(), SchemaError> {
    if nested.is_empty() {
        return Err(SchemaError::EmptyNested { key: parent.key.clone(), kind: parent.kind.name() });
    }
    let mut seen = HashSet::new();
    for field in nested {
        claim_key(&mut seen, &field.key)?;
        if !field.kind.is_nestable() {
            return Err(SchemaError::UnsupportedNested {
                key: parent.key.clone(),
                nested: field.key.clone(),
                kind: field.kind.name(),
            });
        }
    }
    Ok(())
}
