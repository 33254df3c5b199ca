//! Form engine: owns the snapshot of one dialog session.
//!
//! DESIGN
//! ======
//! Control state is kept index-aligned with the schema. Every kind is handled
//! by an exhaustive `match`, both when events are routed and when the view is
//! rendered.
//!
//! The snapshot is the only bound state. Complex controls get short-lived
//! handles (`ListHandle`, `RelationHandle`) that borrow their editor together
//! with the slice of the snapshot they write.
//!
//! SUBMIT
//! ======
//! An accepted submit yields `SubmitOutcome::Committed` once and marks the
//! form in flight. Further submits return `Busy` until the owner reports the
//! commit failed or drops the session.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::debug;

use super::error::FormError;
use super::schema::{FieldDescriptor, FieldKind, FieldSchema, SelectOption};
use super::validate::{FieldErrors, Validation, Validator};
use super::value::{FieldValue, ListItemRecord, RecordId, Snapshot};
use super::view::{ControlView, FormView, SubmitView, WidgetView};
use crate::controls::list::{ListEditor, ListMode, ListView, StagedItem};
use crate::controls::relation::{RelationEditor, RelationMode, RelationView};
use crate::controls::select::{CreationOutcome, SelectControl};

enum ControlState {
    Text,
    Number,
    Date,
    Select(SelectControl),
    MultiSelect(SelectControl),
    List(ListEditor),
    Relation(RelationEditor),
}

impl ControlState {
    fn new(field: &FieldDescriptor, snapshot: &Snapshot) -> Self {
        match &field.kind {
            FieldKind::Text => Self::Text,
            FieldKind::Number => Self::Number,
            FieldKind::Date => Self::Date,
            FieldKind::Select(spec) => Self::Select(SelectControl::single(spec.clone())),
            FieldKind::MultiSelect(spec) => Self::MultiSelect(SelectControl::multi(spec.clone())),
            FieldKind::StructuredList(spec) => Self::List(ListEditor::new(spec)),
            FieldKind::RelationDual(spec) => Self::Relation(RelationEditor::new(&field.key, spec, snapshot)),
        }
    }
}

/// Result of one submit attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitOutcome {
    /// The single commit event carrying the validated snapshot.
    Committed(Snapshot),
    /// Validation failed; errors are also stored on the controls.
    Rejected(FieldErrors),
    /// A previous commit has not been answered yet.
    Busy,
}

pub struct FormEngine {
    schema: FieldSchema,
    controls: Vec<ControlState>,
    snapshot: Snapshot,
    validator: Box<dyn Validator>,
    errors: FieldErrors,
    in_flight: bool,
}

impl FormEngine {
    /// Build a form and seed its snapshot. Keys missing from `defaults` start
    /// at their kind's empty value.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for default keys the schema does not declare and
    /// `KindMismatch` for defaults of the wrong shape.
    pub fn new(schema: FieldSchema, defaults: Snapshot, validator: impl Validator + 'static) -> Result<Self, FormError> {
        for (key, value) in defaults.iter() {
            match schema.get(key) {
                Some(field) if !field.accepts(value) => {
                    return Err(FormError::KindMismatch { key: key.clone(), kind: field.kind.name() });
                }
                Some(_) => {}
                None if is_create_key(&schema, key) => {
                    if !matches!(value, FieldValue::Empty | FieldValue::Record(_)) {
                        return Err(FormError::KindMismatch { key: key.clone(), kind: "relationDual" });
                    }
                }
                None => return Err(FormError::UnknownField(key.clone())),
            }
        }

        let mut snapshot = defaults;
        for field in schema.fields() {
            if !snapshot.contains(&field.key) {
                snapshot.set(field.key.clone(), field.kind.empty_value());
            }
        }
        let controls: Vec<ControlState> = schema
            .fields()
            .iter()
            .map(|field| ControlState::new(field, &snapshot))
            .collect();
        for control in &controls {
            if let ControlState::Relation(editor) = control {
                editor.project(&mut snapshot);
            }
        }

        Ok(Self {
            schema,
            controls,
            snapshot,
            validator: Box::new(validator),
            errors: FieldErrors::new(),
            in_flight: false,
        })
    }

    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    #[must_use]
    pub fn value(&self, key: &str) -> &FieldValue {
        self.snapshot.get(key)
    }

    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[must_use]
    pub fn errors_for(&self, key: &str) -> &[String] {
        self.errors.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Write a text, number or date field.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField`, or `KindMismatch` for complex kinds and
    /// values of the wrong shape.
    pub fn write(&mut self, key: &str, value: FieldValue) -> Result<(), FormError> {
        let index = self.index(key)?;
        let field = &self.schema.fields()[index];
        let scalar = matches!(self.controls[index], ControlState::Text | ControlState::Number | ControlState::Date);
        if !scalar || !field.accepts(&value) {
            return Err(FormError::KindMismatch { key: key.to_owned(), kind: field.kind.name() });
        }
        self.snapshot.set(key, value);
        self.errors.remove(key);
        Ok(())
    }

    /// Choose an option of a select or multi-select field. Choosing a value
    /// a multi-select already holds changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `KindMismatch` for non-select fields or `UnknownOption`.
    pub fn choose(&mut self, key: &str, id: RecordId) -> Result<(), FormError> {
        let index = self.index(key)?;
        let next = match &mut self.controls[index] {
            ControlState::Select(control) | ControlState::MultiSelect(control) => {
                let id = control.choose(id)?;
                control.apply(self.snapshot.get(key), id)
            }
            ControlState::Text
            | ControlState::Number
            | ControlState::Date
            | ControlState::List(_)
            | ControlState::Relation(_) => return Err(self.mismatch(index)),
        };
        self.snapshot.set(key, next);
        self.errors.remove(key);
        Ok(())
    }

    /// Remove `id` from a select or multi-select field.
    ///
    /// # Errors
    ///
    /// Returns `KindMismatch` for non-select fields.
    pub fn deselect(&mut self, key: &str, id: RecordId) -> Result<(), FormError> {
        let index = self.index(key)?;
        let next = match &self.controls[index] {
            ControlState::Select(control) | ControlState::MultiSelect(control) => {
                control.remove(self.snapshot.get(key), id)
            }
            ControlState::Text
            | ControlState::Number
            | ControlState::Date
            | ControlState::List(_)
            | ControlState::Relation(_) => return Err(self.mismatch(index)),
        };
        self.snapshot.set(key, next);
        Ok(())
    }

    /// Select control of a select, multi-select or relation field, for
    /// open/query/create events.
    ///
    /// # Errors
    ///
    /// Returns `KindMismatch` for fields without a top-level select.
    pub fn select(&mut self, key: &str) -> Result<&mut SelectControl, FormError> {
        let index = self.index(key)?;
        if !matches!(
            self.controls[index],
            ControlState::Select(_) | ControlState::MultiSelect(_) | ControlState::Relation(_)
        ) {
            return Err(self.mismatch(index));
        }
        match &mut self.controls[index] {
            ControlState::Select(control) | ControlState::MultiSelect(control) => Ok(control),
            ControlState::Relation(editor) => Ok(editor.select()),
            ControlState::Text | ControlState::Number | ControlState::Date | ControlState::List(_) => {
                Err(FormError::UnknownField(key.to_owned()))
            }
        }
    }

    /// Handle onto a structured list field.
    ///
    /// # Errors
    ///
    /// Returns `KindMismatch` when `key` is not a structured list.
    pub fn list(&mut self, key: &str) -> Result<ListHandle<'_>, FormError> {
        let index = self.index(key)?;
        if !matches!(self.controls[index], ControlState::List(_)) {
            return Err(self.mismatch(index));
        }
        self.errors.remove(key);
        let rows = self.snapshot.list_mut(key);
        match &mut self.controls[index] {
            ControlState::List(editor) => Ok(ListHandle { editor, rows }),
            _ => Err(FormError::UnknownField(key.to_owned())),
        }
    }

    /// Handle onto a relation dual field.
    ///
    /// # Errors
    ///
    /// Returns `KindMismatch` when `key` is not a relation field.
    pub fn relation(&mut self, key: &str) -> Result<RelationHandle<'_>, FormError> {
        let index = self.index(key)?;
        if !matches!(self.controls[index], ControlState::Relation(_)) {
            return Err(self.mismatch(index));
        }
        self.errors.remove(key);
        match &mut self.controls[index] {
            ControlState::Relation(editor) => Ok(RelationHandle { editor, snapshot: &mut self.snapshot }),
            _ => Err(FormError::UnknownField(key.to_owned())),
        }
    }

    /// Apply every settled inline creation. Returns true when a bound or
    /// staged value changed.
    pub fn poll_creations(&mut self) -> bool {
        let mut changed = false;
        for (field, control) in self.schema.fields().iter().zip(self.controls.iter_mut()) {
            match control {
                ControlState::Select(select) | ControlState::MultiSelect(select) => {
                    if let Some(CreationOutcome::Resolved(id)) = select.poll_creation() {
                        let next = select.apply(self.snapshot.get(&field.key), id);
                        self.snapshot.set(field.key.clone(), next);
                        self.errors.remove(&field.key);
                        changed = true;
                    }
                }
                ControlState::List(editor) => changed |= editor.poll_creations(),
                ControlState::Relation(editor) => changed |= editor.poll_creation(&mut self.snapshot),
                ControlState::Text | ControlState::Number | ControlState::Date => {}
            }
        }
        changed
    }

    /// Replace the options of every select for `subject`, including list
    /// columns and relation connect selects.
    pub fn refresh_options(&mut self, subject: &str, options: &[SelectOption]) {
        for control in &mut self.controls {
            match control {
                ControlState::Select(select) | ControlState::MultiSelect(select) => {
                    if select.subject() == subject {
                        select.set_options(options.to_vec());
                    }
                }
                ControlState::List(editor) => editor.refresh_options(subject, options),
                ControlState::Relation(editor) => {
                    let select = editor.select();
                    if select.subject() == subject {
                        select.set_options(options.to_vec());
                    }
                }
                ControlState::Text | ControlState::Number | ControlState::Date => {}
            }
        }
    }

    /// Validate and, on success, emit the single commit event.
    pub fn submit(&mut self) -> SubmitOutcome {
        if self.in_flight {
            debug!("submit ignored while a commit is in flight");
            return SubmitOutcome::Busy;
        }
        for control in &self.controls {
            if let ControlState::Relation(editor) = control {
                editor.project(&mut self.snapshot);
            }
        }
        match self.validator.validate(&self.snapshot) {
            Validation::Valid(cleaned) => {
                self.errors.clear();
                self.in_flight = true;
                SubmitOutcome::Committed(cleaned)
            }
            Validation::Invalid(errors) => {
                debug!(fields = errors.len(), "submit rejected");
                self.errors = errors.clone();
                SubmitOutcome::Rejected(errors)
            }
        }
    }

    /// The owner could not persist the committed snapshot; re-enable submit.
    pub fn commit_failed(&mut self) {
        self.in_flight = false;
    }

    #[must_use]
    pub fn render(&self) -> FormView {
        let controls = self
            .schema
            .fields()
            .iter()
            .zip(&self.controls)
            .map(|(field, control)| {
                let value = self.snapshot.get(&field.key);
                let widget = match control {
                    ControlState::Text => WidgetView::Text { value: value.as_text().unwrap_or_default().to_owned() },
                    ControlState::Number => WidgetView::Number { value: value.as_number() },
                    ControlState::Date => WidgetView::Date { value: value.as_date() },
                    ControlState::Select(select) => WidgetView::Select(select.view(value)),
                    ControlState::MultiSelect(select) => WidgetView::MultiSelect(select.view(value)),
                    ControlState::List(editor) => WidgetView::StructuredList(editor.view(value.as_rows())),
                    ControlState::Relation(editor) => WidgetView::RelationDual(editor.view()),
                };
                ControlView {
                    key: field.key.clone(),
                    label: field.label.clone(),
                    placeholder: field.placeholder.clone(),
                    errors: self.errors_for(&field.key).to_vec(),
                    widget,
                }
            })
            .collect();
        FormView { controls, submit: SubmitView { label: "Submit".to_owned(), busy: self.in_flight } }
    }

    fn index(&self, key: &str) -> Result<usize, FormError> {
        self.schema
            .position(key)
            .ok_or_else(|| FormError::UnknownField(key.to_owned()))
    }

    fn mismatch(&self, index: usize) -> FormError {
        let field = &self.schema.fields()[index];
        FormError::KindMismatch { key: field.key.clone(), kind: field.kind.name() }
    }
}

fn is_create_key(schema: &FieldSchema, key: &str) -> bool {
    schema
        .fields()
        .iter()
        .any(|f| matches!(&f.kind, FieldKind::RelationDual(spec) if spec.create_key == key))
}

// =============================================================================
// HANDLES
// =============================================================================

/// Structured list editor bound to its committed rows.
pub struct ListHandle<'a> {
    editor: &'a mut ListEditor,
    rows: &'a mut Vec<ListItemRecord>,
}

impl ListHandle<'_> {
    /// # Errors
    ///
    /// Returns an error for unknown columns or values of the wrong kind.
    pub fn write(&mut self, key: &str, value: FieldValue) -> Result<(), FormError> {
        self.editor.write(key, value)
    }

    /// # Errors
    ///
    /// Returns an error when `key` is not a select column or the option is unknown.
    pub fn choose(&mut self, key: &str, id: RecordId) -> Result<(), FormError> {
        self.editor.choose(key, id)
    }

    /// # Errors
    ///
    /// Returns an error when `key` is not a select column.
    pub fn select(&mut self, key: &str) -> Result<&mut SelectControl, FormError> {
        self.editor.select(key)
    }

    pub fn add_item(&mut self) -> bool {
        self.editor.add_item(self.rows)
    }

    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for a missing row.
    pub fn edit_item(&mut self, index: usize) -> Result<(), FormError> {
        self.editor.edit_item(self.rows.as_slice(), index)
    }

    pub fn save_item(&mut self) -> bool {
        self.editor.save_item(self.rows)
    }

    /// # Errors
    ///
    /// Returns `IndexOutOfRange` for a missing row.
    pub fn remove_item(&mut self, index: usize) -> Result<ListItemRecord, FormError> {
        self.editor.remove_item(self.rows, index)
    }

    pub fn cancel_edit(&mut self) {
        self.editor.cancel_edit();
    }

    #[must_use]
    pub fn staged(&self) -> &StagedItem {
        self.editor.staged()
    }

    #[must_use]
    pub fn mode(&self) -> ListMode {
        self.editor.mode()
    }

    #[must_use]
    pub fn rows(&self) -> &[ListItemRecord] {
        self.rows.as_slice()
    }

    #[must_use]
    pub fn view(&self) -> ListView {
        self.editor.view(self.rows.as_slice())
    }
}

/// Relation dual editor bound to the form snapshot.
pub struct RelationHandle<'a> {
    editor: &'a mut RelationEditor,
    snapshot: &'a mut Snapshot,
}

impl RelationHandle<'_> {
    pub fn set_mode(&mut self, mode: RelationMode) {
        self.editor.set_mode(mode, self.snapshot);
    }

    /// # Errors
    ///
    /// Returns `InactiveBranch` outside connect mode, or `UnknownOption`.
    pub fn connect(&mut self, id: RecordId) -> Result<(), FormError> {
        self.editor.connect(id, self.snapshot)
    }

    /// # Errors
    ///
    /// Returns `InactiveBranch` outside create mode, `UnknownField` or `KindMismatch`.
    pub fn write_create(&mut self, key: &str, value: FieldValue) -> Result<(), FormError> {
        self.editor.write_create(key, value, self.snapshot)
    }

    pub fn select(&mut self) -> &mut SelectControl {
        self.editor.select()
    }

    #[must_use]
    pub fn mode(&self) -> RelationMode {
        self.editor.mode()
    }

    #[must_use]
    pub fn view(&self) -> RelationView {
        self.editor.view()
    }
}
