//! Dialog handler contract
//!
//! Each sub-dialog implements [`DialogHandler`]; the router dispatches
//! the new input tokens for an exchange to the handler registered for
//! the session's current stage.

mod registry;

pub use registry::DialogRegistry;

use crate::notify::Notification;
use crate::session::{DialogKind, Session};

/// What a dialog has to say back to the router
#[derive(Debug, Clone, PartialEq)]
pub enum DialogResult {
    /// Show a prompt and expect another input
    Continue(String),
    /// Final message; the session is over
    Terminate(String),
    /// Nothing more to say here; return the caller to the main menu
    YieldToParent,
}

/// A dialog's reply plus any notifications it wants sent out-of-band.
///
/// Handlers never talk to the notification service themselves; they
/// queue messages here and the router drains them after persisting the
/// session, which keeps handlers pure and testable.
#[derive(Debug, Clone, PartialEq)]
pub struct DialogReply {
    pub result: DialogResult,
    pub outbox: Vec<Notification>,
}

impl DialogReply {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            result: DialogResult::Continue(text.into()),
            outbox: Vec::new(),
        }
    }

    pub fn terminate(text: impl Into<String>) -> Self {
        Self {
            result: DialogResult::Terminate(text.into()),
            outbox: Vec::new(),
        }
    }

    pub fn yield_to_parent() -> Self {
        Self {
            result: DialogResult::YieldToParent,
            outbox: Vec::new(),
        }
    }

    /// Attach an outbound notification to this reply
    pub fn with_notification(mut self, notification: Notification) -> Self {
        self.outbox.push(notification);
        self
    }
}

/// Contract implemented by every sub-dialog
///
/// `advance` is synchronous: one exchange is one unit of computation
/// with no suspension points. `tokens` holds only the input the handler
/// has not seen before: the router owns consumed-token bookkeeping and
/// never forwards an already-applied token. An empty slice means
/// "render the prompt for wherever this dialog currently is", which is
/// both the dialog's entry screen and the retransmission case.
pub trait DialogHandler: Send + Sync {
    fn kind(&self) -> DialogKind;

    fn advance(&self, tokens: &[String], caller: &str, session: &mut Session) -> DialogReply;
}
