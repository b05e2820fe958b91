//! Clock in/out dialog

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::warn;

use hr_core::records::ClockRepository;
use hr_core::session::{DialogKind, Session};
use hr_core::{DialogHandler, DialogReply};

const MENU: &str = "Clock Options:\n1. Clock In\n2. Clock Out\n0. Main Menu";
const MSG_REPO_FAILURE: &str = "Unable to record right now. Please try again later.";

/// Standard shift length used to project the expected clock-out time
const SHIFT_HOURS: i64 = 8;

pub struct ClockDialog {
    clock: Arc<dyn ClockRepository>,
}

impl ClockDialog {
    pub fn new(clock: Arc<dyn ClockRepository>) -> Self {
        Self { clock }
    }

    fn clock_in(&self, employee_id: &str) -> DialogReply {
        let now = Utc::now();

        match self.clock.clock_in_at(employee_id, now.date_naive()) {
            Ok(Some(existing)) => DialogReply::terminate(format!(
                "You already clocked in today at {}.",
                existing.format("%I:%M %p")
            )),
            Ok(None) => {
                if let Err(e) = self.clock.record_clock_in(employee_id, now) {
                    warn!(employee_id, "Failed to record clock-in: {}", e);
                    return DialogReply::terminate(MSG_REPO_FAILURE);
                }
                let expected_out = now + Duration::hours(SHIFT_HOURS);
                DialogReply::terminate(format!(
                    "Clock-in recorded at {}.\nExpected clock-out: {}.",
                    now.format("%I:%M %p"),
                    expected_out.format("%I:%M %p")
                ))
            }
            Err(e) => {
                warn!(employee_id, "Clock lookup failed: {}", e);
                DialogReply::terminate(MSG_REPO_FAILURE)
            }
        }
    }

    fn clock_out(&self, employee_id: &str) -> DialogReply {
        let now = Utc::now();

        match self.clock.clock_in_at(employee_id, now.date_naive()) {
            Ok(None) => {
                DialogReply::terminate("You haven't clocked in today. Clock in first.")
            }
            Ok(Some(_)) => {
                if let Err(e) = self.clock.record_clock_out(employee_id, now) {
                    warn!(employee_id, "Failed to record clock-out: {}", e);
                    return DialogReply::terminate(MSG_REPO_FAILURE);
                }
                DialogReply::terminate(format!(
                    "Clock-out recorded at {}.",
                    now.format("%I:%M %p")
                ))
            }
            Err(e) => {
                warn!(employee_id, "Clock lookup failed: {}", e);
                DialogReply::terminate(MSG_REPO_FAILURE)
            }
        }
    }
}

impl DialogHandler for ClockDialog {
    fn kind(&self) -> DialogKind {
        DialogKind::Clock
    }

    fn advance(&self, tokens: &[String], _caller: &str, session: &mut Session) -> DialogReply {
        let Some(choice) = tokens.first() else {
            return DialogReply::prompt(MENU);
        };

        // Identity is bound before any dialog is reachable
        let employee_id = session.employee_id.clone().unwrap_or_default();

        match choice.as_str() {
            "0" => DialogReply::yield_to_parent(),
            "1" => self.clock_in(&employee_id),
            "2" => self.clock_out(&employee_id),
            _ => DialogReply::prompt(format!("Invalid choice. Try again.\n{}", MENU)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_core::{DialogResult, MemoryRecords};

    fn setup() -> (ClockDialog, Arc<MemoryRecords>, Session) {
        let records = Arc::new(MemoryRecords::new());
        let dialog = ClockDialog::new(records.clone());
        let mut session = Session::new("+254711000111");
        session.authenticated = true;
        session.employee_id = Some("EMP123".to_string());
        (dialog, records, session)
    }

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_entry_renders_menu() {
        let (dialog, _, mut session) = setup();
        let reply = dialog.advance(&[], "+254711000111", &mut session);
        assert_eq!(
            reply.result,
            DialogResult::Continue(MENU.to_string())
        );
    }

    #[test]
    fn test_back_yields() {
        let (dialog, _, mut session) = setup();
        let reply = dialog.advance(&tokens(&["0"]), "+254711000111", &mut session);
        assert_eq!(reply.result, DialogResult::YieldToParent);
    }

    #[test]
    fn test_clock_in_then_duplicate_refused() {
        let (dialog, _, mut session) = setup();

        let first = dialog.advance(&tokens(&["1"]), "+254711000111", &mut session);
        match first.result {
            DialogResult::Terminate(text) => {
                assert!(text.contains("Clock-in recorded at"));
                assert!(text.contains("Expected clock-out"));
            }
            other => panic!("expected terminate, got {:?}", other),
        }

        let second = dialog.advance(&tokens(&["1"]), "+254711000111", &mut session);
        match second.result {
            DialogResult::Terminate(text) => {
                assert!(text.contains("already clocked in today"));
            }
            other => panic!("expected terminate, got {:?}", other),
        }
    }

    #[test]
    fn test_clock_out_requires_clock_in() {
        let (dialog, _, mut session) = setup();

        let refused = dialog.advance(&tokens(&["2"]), "+254711000111", &mut session);
        match refused.result {
            DialogResult::Terminate(text) => assert!(text.contains("haven't clocked in")),
            other => panic!("expected terminate, got {:?}", other),
        }

        dialog.advance(&tokens(&["1"]), "+254711000111", &mut session);
        let recorded = dialog.advance(&tokens(&["2"]), "+254711000111", &mut session);
        match recorded.result {
            DialogResult::Terminate(text) => assert!(text.contains("Clock-out recorded at")),
            other => panic!("expected terminate, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_choice_reprompts() {
        let (dialog, _, mut session) = setup();
        let reply = dialog.advance(&tokens(&["7"]), "+254711000111", &mut session);
        match reply.result {
            DialogResult::Continue(text) => assert!(text.contains("Invalid choice")),
            other => panic!("expected continue, got {:?}", other),
        }
    }
}
