//! hr-core: ElevateHR USSD Core Library
//!
//! Session state machine, dialog contract, employee directory, and
//! record repositories for the ElevateHR USSD self-service gateway.

pub mod config;
pub mod dialog;
pub mod directory;
pub mod error;
pub mod notify;
pub mod records;
pub mod router;
pub mod session;

pub use config::{Config, SessionConfig, SmsConfig};
pub use dialog::{DialogHandler, DialogRegistry, DialogReply, DialogResult};
pub use directory::{EmployeeDirectory, StaticDirectory};
pub use error::{Error, Result};
pub use notify::{LogNotifier, Notification, Notifier};
pub use records::{MemoryRecords, Repositories, SqliteRecords};
pub use router::{Disposition, UssdRequest, UssdResponse, UssdRouter};
pub use session::{DialogKind, Scratch, Session, SessionStore, Stage};
