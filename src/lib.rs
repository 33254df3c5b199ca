//! # ledger-admin
//!
//! Headless administration core for the items / categories / receipts
//! service. Field schemas drive a form engine whose complex controls (select
//! with inline creation, structured list editor, relation dual editor) emit
//! typed view models, and a data grid engine derives pages from fetched
//! collections.
//!
//! Painting those view models is left to the front end; this crate owns the
//! state machines, the data-access seam, and the page controllers that wire
//! dialogs to remote mutations.

pub mod config;
pub mod controls;
pub mod form;
pub mod grid;
pub mod net;
pub mod pages;
