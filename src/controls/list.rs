//! Structured list editor: repeatable nested rows bound to one form field.
//!
//! DESIGN
//! ======
//! The editor keeps a staged item (the row being typed) and an add/edit mode.
//! Committed rows live in the form snapshot and are passed in by the caller,
//! so the editor never holds a second copy of them.
//!
//! A row may only be committed when every column is populated. An optional
//! derivation hook sees each staged write and may return a replacement row,
//! which is how computed columns (price = quantity * unit price) stay in sync
//! regardless of input order.

#[cfg(test)]
#[path = "list_test.rs"]
mod list_test;

use std::collections::BTreeMap;
use std::rc::Rc;

use super::select::{CreationOutcome, SelectControl, SelectView};
use crate::form::error::FormError;
use crate::form::schema::{Derivation, FieldDescriptor, FieldKind, ListSpec, SelectOption};
use crate::form::value::{FieldValue, ListItemRecord, RecordId, ValueMap};

static EMPTY: FieldValue = FieldValue::Empty;

/// Values of the row currently being entered.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StagedItem {
    values: ValueMap,
}

impl StagedItem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> &FieldValue {
        self.values.get(key).unwrap_or(&EMPTY)
    }

    pub fn set(&mut self, key: impl Into<String>, value: FieldValue) {
        self.values.insert(key.into(), value);
    }

    #[must_use]
    pub fn is_populated(&self, key: &str) -> bool {
        !self.get(key).is_empty()
    }

    #[must_use]
    pub fn populated_count(&self) -> usize {
        self.values.values().filter(|v| !v.is_empty()).count()
    }

    #[must_use]
    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    fn from_record(record: &ListItemRecord) -> Self {
        Self { values: record.values().clone() }
    }

    fn into_record(self) -> ListItemRecord {
        ListItemRecord::new(self.values)
    }
}

/// Whether the staged item is a new row or a copy of an existing one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListMode {
    #[default]
    Adding,
    Editing(usize),
}

pub struct ListEditor {
    fields: Vec<FieldDescriptor>,
    derive: Option<Derivation>,
    staged: StagedItem,
    mode: ListMode,
    selects: BTreeMap<String, SelectControl>,
}

impl ListEditor {
    #[must_use]
    pub fn new(spec: &ListSpec) -> Self {
        let selects = spec
            .fields
            .iter()
            .filter_map(|f| match &f.kind {
                FieldKind::Select(select) => Some((f.key.clone(), SelectControl::single(select.clone()))),
                _ => None,
            })
            .collect();
        Self {
            fields: spec.fields.clone(),
            derive: spec.derive.clone(),
            staged: StagedItem::new(),
            mode: ListMode::Adding,
            selects,
        }
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn staged(&self) -> &StagedItem {
        &self.staged
    }

    #[must_use]
    pub fn mode(&self) -> ListMode {
        self.mode
    }

    /// Every column of the staged item carries a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.fields.iter().all(|f| self.staged.is_populated(&f.key))
    }

    /// Write one staged value, running the derivation hook.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown columns or values of the wrong kind.
    pub fn write(&mut self, key: &str, value: FieldValue) -> Result<(), FormError> {
        let field = self.field(key)?;
        if !field.accepts(&value) {
            return Err(FormError::KindMismatch { key: key.to_owned(), kind: field.kind.name() });
        }
        let derived = self.derive.as_ref().and_then(|derive| derive(key, &value, &self.staged));
        match derived {
            Some(replacement) => self.staged = replacement,
            None => self.staged.set(key, value),
        }
        Ok(())
    }

    /// Choose an option in a select column of the staged item.
    ///
    /// # Errors
    ///
    /// Returns an error when `key` is not a select column or the option is unknown.
    pub fn choose(&mut self, key: &str, id: RecordId) -> Result<(), FormError> {
        let id = self.select(key)?.choose(id)?;
        self.write(key, FieldValue::Id(id))
    }

    /// Select control backing a select column.
    ///
    /// # Errors
    ///
    /// Returns an error when `key` is not a select column.
    pub fn select(&mut self, key: &str) -> Result<&mut SelectControl, FormError> {
        let kind = self.field(key)?.kind.name();
        self.selects
            .get_mut(key)
            .ok_or_else(|| FormError::KindMismatch { key: key.to_owned(), kind })
    }

    /// Refresh options of every select column for `subject`.
    pub fn refresh_options(&mut self, subject: &str, options: &[SelectOption]) {
        for control in self.selects.values_mut().filter(|c| c.subject() == subject) {
            control.set_options(options.to_vec());
        }
    }

    /// Apply settled inline creations to the staged item.
    /// Returns true when a staged value changed.
    pub fn poll_creations(&mut self) -> bool {
        let resolved: Vec<(String, RecordId)> = self
            .selects
            .iter_mut()
            .filter_map(|(key, control)| match control.poll_creation() {
                Some(CreationOutcome::Resolved(id)) => Some((key.clone(), id)),
                Some(CreationOutcome::Empty) | None => None,
            })
            .collect();
        let changed = !resolved.is_empty();
        for (key, id) in resolved {
            let _ = self.write(&key, FieldValue::Id(id));
        }
        changed
    }

    /// Commit the staged item as a new row when complete, then clear it.
    /// Does nothing in edit mode; use `save_item` there.
    pub fn add_item(&mut self, rows: &mut Vec<ListItemRecord>) -> bool {
        if self.mode != ListMode::Adding || !self.is_complete() {
            return false;
        }
        rows.push(std::mem::take(&mut self.staged).into_record());
        true
    }

    /// Load row `index` into the staged item and enter edit mode.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for a missing row.
    pub fn edit_item(&mut self, rows: &[ListItemRecord], index: usize) -> Result<(), FormError> {
        let row = rows
            .get(index)
            .ok_or(FormError::IndexOutOfRange { index, len: rows.len() })?;
        self.staged = StagedItem::from_record(row);
        self.mode = ListMode::Editing(index);
        Ok(())
    }

    /// Overwrite the edited row in place and leave edit mode. Only valid in
    /// edit mode with a complete staged item.
    pub fn save_item(&mut self, rows: &mut [ListItemRecord]) -> bool {
        let ListMode::Editing(index) = self.mode else {
            return false;
        };
        if !self.is_complete() || index >= rows.len() {
            return false;
        }
        rows[index] = std::mem::take(&mut self.staged).into_record();
        self.mode = ListMode::Adding;
        true
    }

    /// Remove row `index`, whatever the mode.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for a missing row.
    pub fn remove_item(&mut self, rows: &mut Vec<ListItemRecord>, index: usize) -> Result<ListItemRecord, FormError> {
        if index >= rows.len() {
            return Err(FormError::IndexOutOfRange { index, len: rows.len() });
        }
        let removed = rows.remove(index);
        match self.mode {
            ListMode::Editing(editing) if editing == index => self.cancel_edit(),
            ListMode::Editing(editing) if editing > index => self.mode = ListMode::Editing(editing - 1),
            ListMode::Editing(_) | ListMode::Adding => {}
        }
        Ok(removed)
    }

    /// Leave edit mode and discard the staged item.
    pub fn cancel_edit(&mut self) {
        self.staged = StagedItem::new();
        self.mode = ListMode::Adding;
    }

    #[must_use]
    pub fn view(&self, rows: &[ListItemRecord]) -> ListView {
        let staged = self
            .fields
            .iter()
            .map(|f| StagedCell {
                key: f.key.clone(),
                label: f.label.clone(),
                placeholder: f.placeholder.clone(),
                value: self.staged.get(&f.key).clone(),
                select: self.selects.get(&f.key).map(|c| c.view(self.staged.get(&f.key))),
            })
            .collect();
        let rows = rows
            .iter()
            .map(|row| self.fields.iter().map(|f| f.display(row.get(&f.key))).collect())
            .collect();
        ListView {
            headers: self.fields.iter().map(|f| f.label.to_uppercase()).collect(),
            staged,
            rows,
            editing: match self.mode {
                ListMode::Editing(index) => Some(index),
                ListMode::Adding => None,
            },
            can_commit: self.is_complete(),
        }
    }

    fn field(&self, key: &str) -> Result<&FieldDescriptor, FormError> {
        self.fields
            .iter()
            .find(|f| f.key == key)
            .ok_or_else(|| FormError::UnknownField(key.to_owned()))
    }
}

/// One input of the staged row.
#[derive(Clone, Debug, PartialEq)]
pub struct StagedCell {
    pub key: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub value: FieldValue,
    pub select: Option<SelectView>,
}

/// Render model of a structured list editor.
#[derive(Clone, Debug, PartialEq)]
pub struct ListView {
    pub headers: Vec<String>,
    pub staged: Vec<StagedCell>,
    /// Display text of committed rows, one entry per column.
    pub rows: Vec<Vec<String>>,
    /// Row being edited; the commit action reads "Save" when set.
    pub editing: Option<usize>,
    pub can_commit: bool,
}

/// Keep `target = a * b` in sync. Writing either operand recomputes the
/// product; when either operand is missing or zero the product is 0.
#[must_use]
pub fn product_derivation(a: &str, b: &str, target: &str) -> Derivation {
    let (a, b, target) = (a.to_owned(), b.to_owned(), target.to_owned());
    Rc::new(move |key: &str, value: &FieldValue, staged: &StagedItem| {
        let partner = if key == a {
            &b
        } else if key == b {
            &a
        } else {
            return None;
        };
        let operand = value.as_number().filter(|n| *n != 0.0);
        let other = staged.get(partner).as_number().filter(|n| *n != 0.0);
        let product = match (operand, other) {
            (Some(x), Some(y)) => x * y,
            _ => 0.0,
        };
        Some(
            staged
                .clone()
                .with(key, value.clone())
                .with(target.as_str(), FieldValue::Number(product)),
        )
    })
}
