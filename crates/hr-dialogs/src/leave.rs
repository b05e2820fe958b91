//! Leave request dialog
//!
//! Four-step flow: type, day count, start date, confirmation. Progress
//! lives in the session's leave draft; `0` cancels at every step.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::warn;
use uuid::Uuid;

use hr_core::notify::Notification;
use hr_core::records::{LeaveRepository, LeaveRequest, LeaveType};
use hr_core::session::{DialogKind, LeaveDraft, Session};
use hr_core::{DialogHandler, DialogReply};

const TYPE_MENU: &str = "Select Leave Type:\n1. Sick\n2. Casual\n3. Annual\n0. Main Menu";
const DATE_PROMPT: &str = "Enter leave start date (DD-MM-YYYY):";
const DATE_FORMAT: &str = "%d-%m-%Y";

pub struct LeaveDialog {
    leave: Arc<dyn LeaveRepository>,
}

impl LeaveDialog {
    pub fn new(leave: Arc<dyn LeaveRepository>) -> Self {
        Self { leave }
    }

    /// Apply one token to the draft. `None` means the draft advanced
    /// and the next step's prompt should be rendered.
    fn step(&self, token: &str, caller: &str, session: &mut Session) -> Option<DialogReply> {
        if token == "0" {
            return Some(DialogReply::yield_to_parent());
        }
        let draft = session.leave_draft();

        if draft.leave_type.is_none() {
            match LeaveType::from_menu_choice(token) {
                Some(leave_type) => {
                    draft.leave_type = Some(leave_type);
                    None
                }
                None => Some(DialogReply::prompt(format!(
                    "Invalid option. Choose:\n{}",
                    TYPE_MENU
                ))),
            }
        } else if draft.days.is_none() {
            let max = draft.leave_type.map(|t| t.max_days()).unwrap_or(0);
            match token.parse::<u32>() {
                Ok(days) if (1..=max).contains(&days) => {
                    draft.days = Some(days);
                    None
                }
                _ => Some(DialogReply::prompt(format!(
                    "Enter a valid number of days (1-{}):",
                    max
                ))),
            }
        } else if draft.start_date.is_none() {
            match NaiveDate::parse_from_str(token, DATE_FORMAT) {
                Ok(date) if date >= Utc::now().date_naive() => {
                    draft.start_date = Some(date);
                    None
                }
                Ok(_) => Some(DialogReply::prompt(format!(
                    "Start date cannot be in the past.\n{}",
                    DATE_PROMPT
                ))),
                Err(_) => Some(DialogReply::prompt(format!(
                    "Invalid date format.\nUse DD-MM-YYYY (e.g. 01-07-2030):\n{}",
                    DATE_PROMPT
                ))),
            }
        } else {
            // Confirmation screen: 1 commits, anything else re-prompts
            // (0 was already handled above)
            match token {
                "1" => Some(self.commit(caller, session)),
                _ => Some(DialogReply::prompt(confirmation_text(session.leave_draft()))),
            }
        }
    }

    fn commit(&self, caller: &str, session: &mut Session) -> DialogReply {
        let draft = session.leave_draft().clone();
        let (Some(leave_type), Some(days), Some(start_date)) =
            (draft.leave_type, draft.days, draft.start_date)
        else {
            // Confirmation is only reachable with a complete draft
            return DialogReply::prompt(prompt_for(&draft));
        };

        let reference = new_reference();
        let request = LeaveRequest {
            reference: reference.clone(),
            employee_id: session.employee_id.clone().unwrap_or_default(),
            leave_type,
            days,
            start_date,
            submitted_at: Utc::now(),
        };

        if let Err(e) = self.leave.submit(&request) {
            warn!(reference, "Failed to submit leave request: {}", e);
            return DialogReply::terminate("Unable to submit right now. Please try again later.");
        }

        let formatted_start = start_date.format("%d %b %Y");
        let sms = Notification::new(
            caller,
            format!(
                "Your {} request {} for {} day(s) starting {} was received.",
                leave_type.name(),
                reference,
                days,
                formatted_start
            ),
        );

        DialogReply::terminate(format!(
            "Leave request submitted.\nRef: {}\n{} for {} day(s) starting {}.\n\
             Your office-in-charge will review and respond within 48hrs.",
            reference,
            leave_type.name(),
            days,
            formatted_start
        ))
        .with_notification(sms)
    }
}

impl DialogHandler for LeaveDialog {
    fn kind(&self) -> DialogKind {
        DialogKind::Leave
    }

    fn advance(&self, tokens: &[String], caller: &str, session: &mut Session) -> DialogReply {
        for token in tokens {
            if let Some(reply) = self.step(token, caller, session) {
                return reply;
            }
        }
        DialogReply::prompt(prompt_for(session.leave_draft()))
    }
}

fn new_reference() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("LV-{}", id[..8].to_uppercase())
}

/// The prompt for the draft's current step
fn prompt_for(draft: &LeaveDraft) -> String {
    if draft.leave_type.is_none() {
        TYPE_MENU.to_string()
    } else if draft.days.is_none() {
        let max = draft.leave_type.map(|t| t.max_days()).unwrap_or(0);
        format!("Enter number of leave days (1-{}):", max)
    } else if draft.start_date.is_none() {
        DATE_PROMPT.to_string()
    } else {
        confirmation_text(draft)
    }
}

fn confirmation_text(draft: &LeaveDraft) -> String {
    let leave_type = draft.leave_type.map(|t| t.name()).unwrap_or("Leave");
    let days = draft.days.unwrap_or(0);
    let start = draft
        .start_date
        .map(|d| d.format("%d %b %Y").to_string())
        .unwrap_or_default();
    format!(
        "Confirm Leave Request:\n{} for {} day(s)\nStarting {}\n1. Submit\n0. Cancel",
        leave_type, days, start
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_core::{DialogResult, MemoryRecords};

    fn setup() -> (LeaveDialog, Arc<MemoryRecords>, Session) {
        let records = Arc::new(MemoryRecords::new());
        let dialog = LeaveDialog::new(records.clone());
        let mut session = Session::new("+254711000111");
        session.authenticated = true;
        session.employee_id = Some("EMP123".to_string());
        (dialog, records, session)
    }

    fn advance(dialog: &LeaveDialog, session: &mut Session, token: &str) -> DialogReply {
        dialog.advance(&[token.to_string()], "+254711000111", session)
    }

    fn prompt_text(reply: DialogReply) -> String {
        match reply.result {
            DialogResult::Continue(text) => text,
            other => panic!("expected continue, got {:?}", other),
        }
    }

    #[test]
    fn test_entry_renders_type_menu() {
        let (dialog, _, mut session) = setup();
        let reply = dialog.advance(&[], "+254711000111", &mut session);
        assert_eq!(prompt_text(reply), TYPE_MENU);
    }

    #[test]
    fn test_full_flow_to_submission() {
        let (dialog, records, mut session) = setup();

        dialog.advance(&[], "+254711000111", &mut session);
        assert!(prompt_text(advance(&dialog, &mut session, "1")).contains("number of leave days"));
        assert!(prompt_text(advance(&dialog, &mut session, "5")).contains("start date"));

        let confirm = prompt_text(advance(&dialog, &mut session, "01-07-2030"));
        assert!(confirm.contains("Sick Leave"));
        assert!(confirm.contains("5 day(s)"));
        assert!(confirm.contains("01 Jul 2030"));

        let reply = advance(&dialog, &mut session, "1");
        match reply.result {
            DialogResult::Terminate(text) => {
                assert!(text.contains("Ref: LV-"));
                assert!(text.contains("Sick Leave for 5 day(s)"));
            }
            other => panic!("expected terminate, got {:?}", other),
        }
        assert_eq!(reply.outbox.len(), 1);

        let submitted = records.leave_requests();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].days, 5);
        assert_eq!(submitted[0].leave_type, LeaveType::Sick);
    }

    #[test]
    fn test_day_count_bounded_by_type_maximum() {
        let (dialog, _, mut session) = setup();
        advance(&dialog, &mut session, "2"); // Casual, max 7

        let rejected = prompt_text(advance(&dialog, &mut session, "8"));
        assert!(rejected.contains("valid number of days (1-7)"));

        // Still at the days step
        assert!(prompt_text(advance(&dialog, &mut session, "abc")).contains("1-7"));
        assert!(prompt_text(advance(&dialog, &mut session, "7")).contains("start date"));
    }

    #[test]
    fn test_past_date_rejected() {
        let (dialog, _, mut session) = setup();
        advance(&dialog, &mut session, "1");
        advance(&dialog, &mut session, "3");

        let rejected = prompt_text(advance(&dialog, &mut session, "01-07-2020"));
        assert!(rejected.contains("cannot be in the past"));
    }

    #[test]
    fn test_malformed_date_rejected() {
        let (dialog, _, mut session) = setup();
        advance(&dialog, &mut session, "1");
        advance(&dialog, &mut session, "3");

        let rejected = prompt_text(advance(&dialog, &mut session, "2030/07/01"));
        assert!(rejected.contains("Invalid date format"));
    }

    #[test]
    fn test_cancel_at_confirmation_yields_without_submitting() {
        let (dialog, records, mut session) = setup();
        advance(&dialog, &mut session, "1");
        advance(&dialog, &mut session, "5");
        advance(&dialog, &mut session, "01-07-2030");

        let reply = advance(&dialog, &mut session, "0");
        assert_eq!(reply.result, DialogResult::YieldToParent);
        assert!(records.leave_requests().is_empty());
    }

    #[test]
    fn test_cancel_mid_flow_yields() {
        let (dialog, _, mut session) = setup();
        advance(&dialog, &mut session, "1");

        let reply = advance(&dialog, &mut session, "0");
        assert_eq!(reply.result, DialogResult::YieldToParent);
    }

    #[test]
    fn test_retransmission_re_renders_current_prompt() {
        let (dialog, _, mut session) = setup();
        advance(&dialog, &mut session, "1");
        advance(&dialog, &mut session, "5");

        // Empty token slice: carrier retry after the days step
        let reply = dialog.advance(&[], "+254711000111", &mut session);
        assert_eq!(prompt_text(reply), DATE_PROMPT);
    }
}
