//! Collection page controller: fetched rows, grid state, one dialog session
//! and one delete confirmation.
//!
//! DESIGN
//! ======
//! Remote calls are split in two. `begin_*` turns a form commit (or a grid
//! action) into a `PendingMutation` tagged with the session that asked for
//! it; the caller executes it and hands the result to `finish_mutation`.
//! A result whose session is no longer open is dropped, so a late answer
//! for a closed dialog cannot close or annotate a newer one.
//!
//! ERROR HANDLING
//! ==============
//! Remote failures keep the dialog open, re-enable its submit, and are kept
//! in `last_error` for display. They are not returned as `Err`; only the
//! reload that follows a successful mutation can fail the call.

#[cfg(test)]
#[path = "controller_test.rs"]
mod controller_test;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::controls::SelectControl;
use crate::form::schema::SchemaError;
use crate::form::{FormEngine, FormError, RecordId, SubmitOutcome};
use crate::grid::{CellValue, CellView, ColumnDescriptor, GridError, GridState, RowAction};
use crate::net::{ApiError, Collection, DataAccess, Relation, fetch_all};

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error("{path} record {id} not found", path = .collection.path())]
    NotFound { collection: Collection, id: RecordId },
}

// =============================================================================
// MUTATIONS
// =============================================================================

/// One remote write.
#[derive(Clone, Debug, PartialEq)]
pub enum MutationRequest {
    Create { collection: Collection, body: Value },
    Update { collection: Collection, id: RecordId, body: Value },
    Delete { collection: Collection, id: RecordId },
    Connect { relation: Relation, owner: RecordId, related: RecordId },
    Disconnect { relation: Relation, owner: RecordId, related: RecordId },
}

impl MutationRequest {
    /// Run the request. Deletes and relation calls answer `None` on success.
    ///
    /// # Errors
    ///
    /// Propagates the data-access error. A write the service did not confirm
    /// is `Rejected`.
    pub async fn execute(&self, api: &dyn DataAccess) -> Result<Option<Value>, ApiError> {
        let result = match self {
            Self::Create { collection, body } => api.create(*collection, body).await,
            Self::Update { collection, id, body } => api.update(*collection, *id, body).await,
            Self::Delete { collection, id } => self.confirmed(api.delete(*collection, *id).await),
            Self::Connect { relation, owner, related } => {
                self.confirmed(api.connect_relation(*relation, *owner, *related).await)
            }
            Self::Disconnect { relation, owner, related } => {
                self.confirmed(api.disconnect_relation(*relation, *owner, *related).await)
            }
        };
        self.check(result)
    }

    /// Normalize a raw result: a create or update that answered without a
    /// record did not happen.
    ///
    /// # Errors
    ///
    /// Returns the original error, or `Rejected` for a missing record.
    pub fn check(&self, result: Result<Option<Value>, ApiError>) -> Result<Option<Value>, ApiError> {
        match (self, result) {
            (Self::Create { .. } | Self::Update { .. }, Ok(None)) => Err(ApiError::Rejected(self.label())),
            (_, result) => result,
        }
    }

    fn confirmed(&self, result: Result<bool, ApiError>) -> Result<Option<Value>, ApiError> {
        if result? { Ok(None) } else { Err(ApiError::Rejected(self.label())) }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
            Self::Connect { .. } => "connect",
            Self::Disconnect { .. } => "disconnect",
        }
    }
}

/// A request waiting for its result. `session` is `None` for grid actions
/// that no dialog owns.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingMutation {
    pub session: Option<Uuid>,
    pub request: MutationRequest,
}

impl PendingMutation {
    #[must_use]
    pub fn detached(request: MutationRequest) -> Self {
        Self { session: None, request }
    }
}

/// What `finish_mutation` did with a result.
#[derive(Clone, Debug, PartialEq)]
pub enum Finished {
    /// The owning session had closed; nothing changed.
    Stale,
    /// Success. Carries the record the service answered with, if any.
    Applied(Option<Value>),
    /// Remote failure, recorded in `last_error`.
    Failed(ApiError),
}

// =============================================================================
// DIALOGS
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogKind {
    Create,
    Edit(RecordId),
}

/// One open form dialog.
pub struct DialogSession {
    pub id: Uuid,
    pub kind: DialogKind,
    /// Collection the commit is written to.
    pub collection: Collection,
    pub title: String,
    pub description: String,
    pub form: FormEngine,
    /// Body fields the form does not edit, merged into every commit.
    fixed: Map<String, Value>,
}

impl DialogSession {
    #[must_use]
    pub fn new(
        kind: DialogKind,
        collection: Collection,
        title: impl Into<String>,
        description: impl Into<String>,
        form: FormEngine,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            collection,
            title: title.into(),
            description: description.into(),
            form,
            fixed: Map::new(),
        }
    }

    #[must_use]
    pub fn with_fixed(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fixed.insert(key.into(), value);
        self
    }

    fn request(&self, mut body: Value) -> MutationRequest {
        if let Some(fields) = body.as_object_mut() {
            for (key, value) in &self.fixed {
                fields.insert(key.clone(), value.clone());
            }
        }
        match self.kind {
            DialogKind::Create => MutationRequest::Create { collection: self.collection, body },
            DialogKind::Edit(id) => MutationRequest::Update { collection: self.collection, id, body },
        }
    }
}

/// Open "are you sure" prompt for one record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeleteConfirmation {
    pub id: Uuid,
    pub target: RecordId,
}

/// Inline select opened on one grid row.
#[derive(Debug)]
pub struct CellEditor {
    pub row: RecordId,
    pub control: SelectControl,
}

pub const DELETE_TITLE: &str = "Confirmation";
pub const DELETE_WARNING: &str =
    "This action is irreversible and you may not recover the data once you confirm.";

// =============================================================================
// PAGE
// =============================================================================

pub struct CollectionPage<R> {
    collection: Collection,
    params: Vec<(String, String)>,
    pub rows: Vec<R>,
    pub grid: GridState,
    pub loading: bool,
    pub last_error: Option<String>,
    dialog: Option<DialogSession>,
    delete: Option<DeleteConfirmation>,
}

impl<R: DeserializeOwned> CollectionPage<R> {
    /// # Errors
    ///
    /// Returns `Grid` when the configured page size is not offered.
    pub fn new(collection: Collection, config: &ApiConfig) -> Result<Self, PageError> {
        Ok(Self {
            collection,
            params: Vec::new(),
            rows: Vec::new(),
            grid: GridState::with_page_size(config.page_size)?,
            loading: false,
            last_error: None,
            dialog: None,
            delete: None,
        })
    }

    /// Query parameters sent with every reload, e.g. `entity=item`.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Fetch the whole collection again, replacing every row.
    ///
    /// # Errors
    ///
    /// Propagates the fetch error; the previous rows are kept.
    pub async fn reload(&mut self, api: &dyn DataAccess) -> Result<(), PageError> {
        self.loading = true;
        let params: Vec<(&str, &str)> = self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let fetched = fetch_all(api, self.collection, &params).await;
        self.loading = false;
        self.rows = fetched?;
        info!(collection = self.collection.path(), rows = self.rows.len(), "collection reloaded");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // dialog
    // -------------------------------------------------------------------------

    /// Open `session`, replacing any open dialog. Returns its id.
    pub fn open_dialog(&mut self, session: DialogSession) -> Uuid {
        let id = session.id;
        if let Some(previous) = self.dialog.replace(session) {
            debug!(session = %previous.id, "dialog replaced");
        }
        self.last_error = None;
        id
    }

    #[must_use]
    pub fn dialog(&self) -> Option<&DialogSession> {
        self.dialog.as_ref()
    }

    pub fn dialog_mut(&mut self) -> Option<&mut DialogSession> {
        self.dialog.as_mut()
    }

    /// Close the dialog without committing. Returns the closed session.
    pub fn close_dialog(&mut self) -> Option<DialogSession> {
        self.last_error = None;
        self.dialog.take()
    }

    /// Submit the open dialog's form. `None` when no dialog is open, the form
    /// rejected its input, or a commit is already in flight.
    pub fn begin_submit(&mut self) -> Option<PendingMutation> {
        let session = self.dialog.as_mut()?;
        match session.form.submit() {
            SubmitOutcome::Committed(snapshot) => Some(PendingMutation {
                session: Some(session.id),
                request: session.request(snapshot.to_json()),
            }),
            SubmitOutcome::Rejected(_) | SubmitOutcome::Busy => None,
        }
    }

    // -------------------------------------------------------------------------
    // delete confirmation
    // -------------------------------------------------------------------------

    /// Ask for confirmation before deleting `target`.
    pub fn request_delete(&mut self, target: RecordId) -> Uuid {
        let confirmation = DeleteConfirmation { id: Uuid::new_v4(), target };
        self.delete = Some(confirmation);
        self.last_error = None;
        confirmation.id
    }

    #[must_use]
    pub fn pending_delete(&self) -> Option<DeleteConfirmation> {
        self.delete
    }

    pub fn cancel_delete(&mut self) {
        self.delete = None;
    }

    /// Confirm the open prompt.
    #[must_use]
    pub fn begin_delete(&self) -> Option<PendingMutation> {
        let confirmation = self.delete?;
        Some(PendingMutation {
            session: Some(confirmation.id),
            request: MutationRequest::Delete { collection: self.collection, id: confirmation.target },
        })
    }

    // -------------------------------------------------------------------------
    // results
    // -------------------------------------------------------------------------

    /// Apply the result of `pending`. On success the owning dialog or prompt
    /// closes and the collection is reloaded.
    ///
    /// # Errors
    ///
    /// Returns the reload error after a successful mutation.
    pub async fn finish_mutation(
        &mut self,
        api: &dyn DataAccess,
        pending: &PendingMutation,
        result: Result<Option<Value>, ApiError>,
    ) -> Result<Finished, PageError> {
        let owner = match pending.session {
            None => Owner::Detached,
            Some(id) if self.dialog.as_ref().is_some_and(|d| d.id == id) => Owner::Dialog,
            Some(id) if self.delete.is_some_and(|d| d.id == id) => Owner::Delete,
            Some(id) => {
                debug!(session = %id, action = pending.request.label(), "dropping result for closed session");
                return Ok(Finished::Stale);
            }
        };

        match pending.request.check(result) {
            Ok(record) => {
                info!(collection = self.collection.path(), action = pending.request.label(), "mutation applied");
                match owner {
                    Owner::Dialog => self.dialog = None,
                    Owner::Delete => self.delete = None,
                    Owner::Detached => {}
                }
                self.last_error = None;
                self.reload(api).await?;
                Ok(Finished::Applied(record))
            }
            Err(err) => {
                warn!(
                    collection = self.collection.path(),
                    action = pending.request.label(),
                    code = err.error_code(),
                    error = %err,
                    "mutation failed"
                );
                if let (Owner::Dialog, Some(session)) = (owner, self.dialog.as_mut()) {
                    session.form.commit_failed();
                }
                self.last_error = Some(err.to_string());
                Ok(Finished::Failed(err))
            }
        }
    }

    /// Execute `pending` and apply its result in one step.
    ///
    /// # Errors
    ///
    /// Returns the reload error after a successful mutation.
    pub async fn run(&mut self, api: &dyn DataAccess, pending: PendingMutation) -> Result<Finished, PageError> {
        let result = pending.request.execute(api).await;
        self.finish_mutation(api, &pending, result).await
    }
}

#[derive(Clone, Copy)]
enum Owner {
    Dialog,
    Delete,
    Detached,
}

/// Id of a record the service answered with.
#[must_use]
pub fn created_id(record: Option<&Value>) -> Option<RecordId> {
    record?.get("id")?.as_i64()
}

// =============================================================================
// SHARED COLUMNS
// =============================================================================

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn id_column<R: 'static>(id: impl Fn(&R) -> RecordId + 'static) -> ColumnDescriptor<R> {
    ColumnDescriptor::accessor("id", "Id", move |row| CellValue::Number(id(row) as f64))
        .with_width(80)
        .not_hideable()
}

#[must_use]
pub fn actions_column<R: 'static>() -> ColumnDescriptor<R> {
    ColumnDescriptor::display("actions", "", |_, _| CellView::Actions(vec![RowAction::Delete, RowAction::Edit]))
        .with_width(70)
}
