//! Session management module
//!
//! Per-session dialog state and the shared in-memory store.

mod store;
mod types;

pub use store::SessionStore;
pub use types::{DialogKind, LeaveDraft, ReportScratch, Scratch, Session, Stage};
