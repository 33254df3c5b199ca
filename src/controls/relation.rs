//! Connect-or-create editor for a relation field.
//!
//! The editor projects exactly one branch into the snapshot: in connect mode
//! the descriptor key holds the chosen id and the create key is empty; in
//! create mode the create key holds the nested payload and the connect key is
//! empty. Values typed into the inactive branch are kept for display only.

#[cfg(test)]
#[path = "relation_test.rs"]
mod relation_test;

use super::select::{CreationOutcome, SelectControl, SelectView};
use crate::form::error::FormError;
use crate::form::schema::{FieldDescriptor, RelationSpec};
use crate::form::value::{FieldValue, RecordId, Snapshot, ValueMap};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RelationMode {
    #[default]
    Connect,
    Create,
}

#[derive(Debug)]
pub struct RelationEditor {
    connect_key: String,
    create_key: String,
    create_fields: Vec<FieldDescriptor>,
    mode: RelationMode,
    connect: SelectControl,
    connect_value: FieldValue,
    create_draft: ValueMap,
}

impl RelationEditor {
    /// Seed both branch displays from `snapshot`. The editor starts in
    /// connect mode unless the snapshot only carries a create payload.
    #[must_use]
    pub fn new(connect_key: &str, spec: &RelationSpec, snapshot: &Snapshot) -> Self {
        let create_draft = match snapshot.get(&spec.create_key) {
            FieldValue::Record(map) => map.clone(),
            _ => ValueMap::new(),
        };
        let connect_value = snapshot.get(connect_key).clone();
        let mode = if connect_value.is_empty() && create_draft.values().any(|v| !v.is_empty()) {
            RelationMode::Create
        } else {
            RelationMode::Connect
        };
        Self {
            connect_key: connect_key.to_owned(),
            create_key: spec.create_key.clone(),
            create_fields: spec.create_fields.clone(),
            mode,
            connect: SelectControl::single(spec.connect.clone()),
            connect_value,
            create_draft,
        }
    }

    #[must_use]
    pub fn mode(&self) -> RelationMode {
        self.mode
    }

    #[must_use]
    pub fn create_key(&self) -> &str {
        &self.create_key
    }

    /// Switch branch and re-project into `snapshot`.
    pub fn set_mode(&mut self, mode: RelationMode, snapshot: &mut Snapshot) {
        self.mode = mode;
        self.project(snapshot);
    }

    /// Choose an existing record.
    ///
    /// # Errors
    ///
    /// Returns `InactiveBranch` outside connect mode, or `UnknownOption`.
    pub fn connect(&mut self, id: RecordId, snapshot: &mut Snapshot) -> Result<(), FormError> {
        if self.mode != RelationMode::Connect {
            return Err(FormError::InactiveBranch { key: self.connect_key.clone() });
        }
        let id = self.connect.choose(id)?;
        self.connect_value = FieldValue::Id(id);
        self.project(snapshot);
        Ok(())
    }

    /// Write one nested create field.
    ///
    /// # Errors
    ///
    /// Returns `InactiveBranch` outside create mode, `UnknownField` for a key
    /// that is not a create field, or `KindMismatch`.
    pub fn write_create(&mut self, key: &str, value: FieldValue, snapshot: &mut Snapshot) -> Result<(), FormError> {
        if self.mode != RelationMode::Create {
            return Err(FormError::InactiveBranch { key: self.create_key.clone() });
        }
        let field = self
            .create_fields
            .iter()
            .find(|f| f.key == key)
            .ok_or_else(|| FormError::UnknownField(key.to_owned()))?;
        if !field.accepts(&value) {
            return Err(FormError::KindMismatch { key: key.to_owned(), kind: field.kind.name() });
        }
        self.create_draft.insert(key.to_owned(), value);
        self.project(snapshot);
        Ok(())
    }

    /// Write the active branch and clear the other.
    pub fn project(&self, snapshot: &mut Snapshot) {
        match self.mode {
            RelationMode::Connect => {
                snapshot.set(self.connect_key.clone(), self.connect_value.clone());
                snapshot.clear(&self.create_key);
            }
            RelationMode::Create => {
                let payload = if self.create_draft.values().all(FieldValue::is_empty) {
                    FieldValue::Empty
                } else {
                    FieldValue::Record(self.create_draft.clone())
                };
                snapshot.set(self.create_key.clone(), payload);
                snapshot.clear(&self.connect_key);
            }
        }
    }

    pub fn select(&mut self) -> &mut SelectControl {
        &mut self.connect
    }

    /// Apply a settled inline creation on the connect select. The snapshot is
    /// only touched while connect mode is active.
    pub fn poll_creation(&mut self, snapshot: &mut Snapshot) -> bool {
        match self.connect.poll_creation() {
            Some(CreationOutcome::Resolved(id)) => {
                self.connect_value = FieldValue::Id(id);
                if self.mode == RelationMode::Connect {
                    self.project(snapshot);
                }
                true
            }
            Some(CreationOutcome::Empty) | None => false,
        }
    }

    #[must_use]
    pub fn view(&self) -> RelationView {
        RelationView {
            mode: self.mode,
            connect: self.connect.view(&self.connect_value),
            create_fields: self
                .create_fields
                .iter()
                .map(|f| RelationField {
                    key: f.key.clone(),
                    label: f.label.clone(),
                    placeholder: f.placeholder.clone(),
                    value: self.create_draft.get(&f.key).cloned().unwrap_or_default(),
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelationField {
    pub key: String,
    pub label: String,
    pub placeholder: Option<String>,
    pub value: FieldValue,
}

/// Render model: a mode toggle, the connect select and the create inputs.
#[derive(Clone, Debug, PartialEq)]
pub struct RelationView {
    pub mode: RelationMode,
    pub connect: SelectView,
    pub create_fields: Vec<RelationField>,
}
