//! Session types
//!
//! A session tracks one caller's position in the dialog tree across a
//! sequence of stateless exchanges. The position is a fixed [`Stage`]
//! enum with a per-stage [`Scratch`] payload, so a stage can only see
//! the transient fields that belong to it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::records::{LeaveType, ReportStatus};

/// The five sub-dialogs reachable from the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogKind {
    Clock,
    Leave,
    Performance,
    Reporting,
    Documents,
}

impl DialogKind {
    pub fn name(&self) -> &'static str {
        match self {
            DialogKind::Clock => "clock",
            DialogKind::Leave => "leave",
            DialogKind::Performance => "performance",
            DialogKind::Reporting => "reporting",
            DialogKind::Documents => "documents",
        }
    }
}

/// Position of a session in the overall dialog tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    /// Awaiting or verifying the caller's employee id
    Auth,
    /// Top-level menu
    MainMenu,
    /// Inside a sub-dialog
    Dialog(DialogKind),
}

/// In-progress leave request
///
/// Fields fill in order; the first unset field is the step the caller
/// is on, and all set means the confirmation screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaveDraft {
    pub leave_type: Option<LeaveType>,
    pub days: Option<u32>,
    pub start_date: Option<NaiveDate>,
}

impl LeaveDraft {
    /// Ready for the confirmation screen
    pub fn is_complete(&self) -> bool {
        self.leave_type.is_some() && self.days.is_some() && self.start_date.is_some()
    }
}

/// Position inside the reporting dialog
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum ReportScratch {
    /// Status selection menu
    #[default]
    Root,
    /// Awaiting confirmation of a selected status
    Confirm(ReportStatus),
    /// Browsing recent reports
    History,
}

/// Stage-scoped transient state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Scratch {
    #[default]
    None,
    Leave(LeaveDraft),
    Reporting(ReportScratch),
}

/// Per-session state, one instance per live USSD dialog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Caller phone number (transport-supplied)
    pub caller: String,
    /// Bound identity once authenticated
    pub employee_id: Option<String>,
    pub authenticated: bool,
    pub stage: Stage,
    /// Shared 3-strikes counter for auth and menu input
    pub attempts: u8,
    /// Number of input tokens already applied to this session.
    /// The caller resubmits its whole history every round trip; this
    /// offset is the single source of truth for which token is new.
    pub consumed: usize,
    /// Text of the last CONTINUE response sent for this session. A
    /// retransmission (no new tokens) replays this verbatim instead of
    /// re-rendering the stage prompt, so carrier retries reproduce the
    /// original response even when it carried an error line.
    pub last_prompt: Option<String>,
    pub scratch: Scratch,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    /// Create a fresh unauthenticated session for a caller
    pub fn new(caller: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            caller: caller.into(),
            employee_id: None,
            authenticated: false,
            stage: Stage::Auth,
            attempts: 0,
            consumed: 0,
            last_prompt: None,
            scratch: Scratch::default(),
            created_at: now,
            last_activity: now,
        }
    }

    /// Record activity on this session
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }

    /// Move to a new stage, clearing scratch state and the attempt counter
    pub fn transition(&mut self, stage: Stage) {
        self.stage = stage;
        self.scratch = Scratch::default();
        self.attempts = 0;
    }

    /// Mutable access to the leave draft, resetting foreign scratch first
    pub fn leave_draft(&mut self) -> &mut LeaveDraft {
        if !matches!(self.scratch, Scratch::Leave(_)) {
            self.scratch = Scratch::Leave(LeaveDraft::default());
        }
        match &mut self.scratch {
            Scratch::Leave(draft) => draft,
            _ => unreachable!("scratch was just set to Leave"),
        }
    }

    /// The reporting dialog's position, resetting foreign scratch first
    pub fn report_scratch(&mut self) -> ReportScratch {
        if let Scratch::Reporting(pos) = self.scratch {
            pos
        } else {
            self.scratch = Scratch::Reporting(ReportScratch::Root);
            ReportScratch::Root
        }
    }

    /// Store the reporting dialog's position
    pub fn set_report_scratch(&mut self, pos: ReportScratch) {
        self.scratch = Scratch::Reporting(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_at_auth() {
        let session = Session::new("+254711000111");
        assert_eq!(session.stage, Stage::Auth);
        assert!(!session.authenticated);
        assert_eq!(session.consumed, 0);
        assert_eq!(session.scratch, Scratch::None);
    }

    #[test]
    fn test_transition_clears_scratch_and_attempts() {
        let mut session = Session::new("+254711000111");
        session.attempts = 2;
        session.leave_draft().days = Some(3);

        session.transition(Stage::MainMenu);
        assert_eq!(session.stage, Stage::MainMenu);
        assert_eq!(session.attempts, 0);
        assert_eq!(session.scratch, Scratch::None);
    }

    #[test]
    fn test_leave_draft_resets_foreign_scratch() {
        let mut session = Session::new("+254711000111");
        session.set_report_scratch(ReportScratch::History);

        let draft = session.leave_draft();
        assert_eq!(*draft, LeaveDraft::default());
    }

    #[test]
    fn test_leave_draft_completion() {
        let mut draft = LeaveDraft::default();
        assert!(!draft.is_complete());

        draft.leave_type = Some(LeaveType::Sick);
        draft.days = Some(5);
        draft.start_date = NaiveDate::from_ymd_opt(2030, 7, 1);
        assert!(draft.is_complete());
    }
}
