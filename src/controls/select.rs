//! Searchable single/multi select with optional inline creation.

#[cfg(test)]
#[path = "select_test.rs"]
mod select_test;

use tracing::debug;

use super::creation::{Continuation, Settlement};
use crate::form::error::FormError;
use crate::form::schema::{SelectOption, SelectSpec, option_label};
use crate::form::value::{FieldValue, RecordId};

/// What a settled inline creation means for the bound value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreationOutcome {
    /// Bind the newly created record.
    Resolved(RecordId),
    /// The creation was dismissed; the bound value stays as it was.
    Empty,
}

#[derive(Debug)]
pub struct SelectControl {
    spec: SelectSpec,
    multiple: bool,
    open: bool,
    query: String,
    pending: Option<Continuation>,
}

impl SelectControl {
    #[must_use]
    pub fn single(spec: SelectSpec) -> Self {
        Self { spec, multiple: false, open: false, query: String::new(), pending: None }
    }

    #[must_use]
    pub fn multi(spec: SelectSpec) -> Self {
        Self { multiple: true, ..Self::single(spec) }
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.spec.subject
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn can_create(&self) -> bool {
        self.spec.create.is_some()
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn options(&self) -> &[SelectOption] {
        &self.spec.options
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.query.clear();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Replace the offered options, e.g. after the owning page reloads them.
    pub fn set_options(&mut self, options: Vec<SelectOption>) {
        self.spec.options = options;
    }

    /// Options whose label contains the query, case-insensitively.
    #[must_use]
    pub fn visible_options(&self) -> Vec<&SelectOption> {
        let needle = self.query.trim().to_lowercase();
        self.spec
            .options
            .iter()
            .filter(|o| needle.is_empty() || o.label.to_lowercase().contains(&needle))
            .collect()
    }

    /// Pick an offered option and close the list.
    ///
    /// # Errors
    ///
    /// Returns `UnknownOption` when `value` is not among the options.
    pub fn choose(&mut self, value: RecordId) -> Result<RecordId, FormError> {
        if !self.spec.options.iter().any(|o| o.value == value) {
            return Err(FormError::UnknownOption { subject: self.spec.subject.clone(), value });
        }
        self.close();
        Ok(value)
    }

    /// Close the list and hand off to the create capability. The bound value
    /// is not touched until the continuation settles.
    ///
    /// # Errors
    ///
    /// Returns `NoCreateCapability` when the control was built without one.
    pub fn trigger_create(&mut self) -> Result<(), FormError> {
        let Some(create) = &self.spec.create else {
            return Err(FormError::NoCreateCapability { subject: self.spec.subject.clone() });
        };
        let continuation = create.create();
        self.close();
        if let Some(previous) = self.pending.replace(continuation) {
            debug!(subject = %self.spec.subject, ticket = %previous.ticket(), "abandoning earlier creation");
        }
        Ok(())
    }

    /// Non-blocking check of the pending creation. `None` while nothing has
    /// settled, or when the creation was superseded by another one.
    pub fn poll_creation(&mut self) -> Option<CreationOutcome> {
        let settlement = self.pending.as_mut()?.try_settle()?;
        self.pending = None;
        match settlement {
            Settlement::Created(id) => Some(CreationOutcome::Resolved(id)),
            Settlement::Dismissed => Some(CreationOutcome::Empty),
            Settlement::Superseded => None,
        }
    }

    /// Bound value after adding `id`. Multi-select keeps set semantics.
    #[must_use]
    pub fn apply(&self, current: &FieldValue, id: RecordId) -> FieldValue {
        if !self.multiple {
            return FieldValue::Id(id);
        }
        let mut ids = current.as_ids().to_vec();
        if !ids.contains(&id) {
            ids.push(id);
        }
        FieldValue::Ids(ids)
    }

    /// Bound value after removing `id`, by value equality.
    #[must_use]
    pub fn remove(&self, current: &FieldValue, id: RecordId) -> FieldValue {
        if self.multiple {
            return FieldValue::Ids(current.as_ids().iter().copied().filter(|v| *v != id).collect());
        }
        match current {
            FieldValue::Id(v) if *v == id => FieldValue::Empty,
            other => other.clone(),
        }
    }

    #[must_use]
    pub fn view(&self, bound: &FieldValue) -> SelectView {
        let selected: Vec<SelectOption> = match bound {
            FieldValue::Id(id) => vec![self.labelled(*id)],
            FieldValue::Ids(ids) => ids.iter().map(|id| self.labelled(*id)).collect(),
            _ => Vec::new(),
        };
        let trigger_label = if self.multiple || selected.is_empty() {
            format!("+ {}", title_case(&self.spec.subject))
        } else {
            selected[0].label.clone()
        };
        SelectView {
            subject: self.spec.subject.clone(),
            multiple: self.multiple,
            open: self.open,
            query: self.query.clone(),
            trigger_label,
            options: self.visible_options().into_iter().cloned().collect(),
            selected,
            can_create: self.can_create(),
            pending: self.is_pending(),
        }
    }

    fn labelled(&self, id: RecordId) -> SelectOption {
        SelectOption::new(id, option_label(&self.spec, id))
    }
}

/// Render model of a select control.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectView {
    pub subject: String,
    pub multiple: bool,
    pub open: bool,
    pub query: String,
    /// Button text: the selected label, or "+ Subject".
    pub trigger_label: String,
    /// Options matching the current query.
    pub options: Vec<SelectOption>,
    /// Current selection; rendered as removable chips for multi-select.
    pub selected: Vec<SelectOption>,
    /// Whether a "create new" action is offered.
    pub can_create: bool,
    /// Whether an inline creation is waiting to settle.
    pub pending: bool,
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            chars
                .next()
                .map(|first| first.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}
