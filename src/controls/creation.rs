//! Single-slot mailbox for inline record creation.
//!
//! DESIGN
//! ======
//! A select control offering "create new" cannot resolve its own value: the
//! owning page shows a secondary dialog and reports back when it closes. The
//! page owns one `CreationMailbox`; select controls hold `CreateCapability`
//! handles onto it and wait on the `Continuation` each trigger returns.
//!
//! The mailbox holds at most one pending continuation. Opening another while
//! one is pending settles the older one with `Settlement::Superseded`, so no
//! waiter is left hanging on a dialog that will never answer it.
//!
//! The slot is `Rc<RefCell<_>>`; everything here runs on the UI thread.

#[cfg(test)]
#[path = "creation_test.rs"]
mod creation_test;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;
use tracing::debug;
use uuid::Uuid;

use crate::form::value::RecordId;

/// How a continuation was settled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Settlement {
    /// The secondary dialog created a record.
    Created(RecordId),
    /// The secondary dialog was closed without creating anything.
    Dismissed,
    /// A newer creation replaced this one, or the mailbox went away.
    Superseded,
}

impl Settlement {
    #[must_use]
    pub fn created_id(self) -> Option<RecordId> {
        match self {
            Self::Created(id) => Some(id),
            Self::Dismissed | Self::Superseded => None,
        }
    }
}

struct PendingSlot {
    ticket: Uuid,
    subject: String,
    tx: oneshot::Sender<Settlement>,
}

/// Page-owned slot for the one creation currently in progress.
#[derive(Clone, Default)]
pub struct CreationMailbox {
    slot: Rc<RefCell<Option<PendingSlot>>>,
}

impl CreationMailbox {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a select control uses to start a creation for `subject`.
    #[must_use]
    pub fn capability(&self, subject: impl Into<String>) -> CreateCapability {
        CreateCapability { mailbox: self.clone(), subject: subject.into() }
    }

    /// Open a new continuation, superseding any pending one.
    pub fn open(&self, subject: &str) -> Continuation {
        let (tx, rx) = oneshot::channel();
        let ticket = Uuid::new_v4();
        let previous = self
            .slot
            .borrow_mut()
            .replace(PendingSlot { ticket, subject: subject.to_owned(), tx });
        if let Some(previous) = previous {
            debug!(ticket = %previous.ticket, subject = %previous.subject, "creation superseded");
            let _ = previous.tx.send(Settlement::Superseded);
        }
        Continuation { ticket, rx }
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Subject of the pending creation; tells the page which dialog to show.
    #[must_use]
    pub fn pending_subject(&self) -> Option<String> {
        self.slot.borrow().as_ref().map(|p| p.subject.clone())
    }

    #[must_use]
    pub fn pending_ticket(&self) -> Option<Uuid> {
        self.slot.borrow().as_ref().map(|p| p.ticket)
    }

    /// Resolve the pending continuation with the new record's id.
    /// Returns false when nothing was pending or the waiter is gone.
    pub fn settle(&self, id: RecordId) -> bool {
        self.resolve(Settlement::Created(id))
    }

    /// Resolve the pending continuation with an explicit empty value.
    pub fn dismiss(&self) -> bool {
        self.resolve(Settlement::Dismissed)
    }

    fn resolve(&self, settlement: Settlement) -> bool {
        let Some(pending) = self.slot.borrow_mut().take() else {
            return false;
        };
        debug!(ticket = %pending.ticket, subject = %pending.subject, ?settlement, "creation settled");
        pending.tx.send(settlement).is_ok()
    }
}

impl fmt::Debug for CreationMailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationMailbox")
            .field("pending", &self.pending_subject())
            .finish()
    }
}

/// The `create` capability a select control is configured with.
#[derive(Clone)]
pub struct CreateCapability {
    mailbox: CreationMailbox,
    subject: String,
}

impl CreateCapability {
    /// Start a creation. The returned continuation settles later.
    #[must_use]
    pub fn create(&self) -> Continuation {
        self.mailbox.open(&self.subject)
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }
}

impl fmt::Debug for CreateCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateCapability")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

/// Deferred result of one creation.
#[derive(Debug)]
pub struct Continuation {
    ticket: Uuid,
    rx: oneshot::Receiver<Settlement>,
}

impl Continuation {
    #[must_use]
    pub fn ticket(&self) -> Uuid {
        self.ticket
    }

    /// Non-blocking check; `None` while still pending.
    pub fn try_settle(&mut self) -> Option<Settlement> {
        match self.rx.try_recv() {
            Ok(settlement) => Some(settlement),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Settlement::Superseded),
        }
    }

    /// Wait for the settlement.
    pub async fn settled(self) -> Settlement {
        self.rx.await.unwrap_or(Settlement::Superseded)
    }
}
