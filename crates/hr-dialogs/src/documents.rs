//! Document download dialog
//!
//! Picks a document and queues an SMS with its link; the protocol
//! response never waits on delivery.

use hr_core::notify::Notification;
use hr_core::session::{DialogKind, Session};
use hr_core::{DialogHandler, DialogReply};

const MENU: &str = "Download Options:\n1. Payslip\n2. Contract\n3. Tax Cert\n0. Main Menu";

pub struct DocumentsDialog {
    base_url: String,
}

impl DocumentsDialog {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    fn link_for(&self, document: &str) -> String {
        format!("{}/{}.pdf", self.base_url, document.replace(' ', "_"))
    }
}

fn document_name(choice: &str) -> Option<&'static str> {
    match choice {
        "1" => Some("Payslip"),
        "2" => Some("Employment Contract"),
        "3" => Some("KRA Tax Certificate"),
        _ => None,
    }
}

impl DialogHandler for DocumentsDialog {
    fn kind(&self) -> DialogKind {
        DialogKind::Documents
    }

    fn advance(&self, tokens: &[String], caller: &str, _session: &mut Session) -> DialogReply {
        let Some(choice) = tokens.first() else {
            return DialogReply::prompt(MENU);
        };

        if choice == "0" {
            return DialogReply::yield_to_parent();
        }

        let Some(document) = document_name(choice) else {
            return DialogReply::prompt(format!("Invalid document option.\n{}", MENU));
        };

        let sms = Notification::new(
            caller,
            format!("Hi! Your {} is ready: {}", document, self.link_for(document)),
        );
        DialogReply::terminate("Download link sent via SMS.").with_notification(sms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hr_core::DialogResult;

    fn setup() -> (DocumentsDialog, Session) {
        let dialog = DocumentsDialog::new("https://elevatehr.example.com/docs");
        let mut session = Session::new("+254711000111");
        session.authenticated = true;
        session.employee_id = Some("EMP123".to_string());
        (dialog, session)
    }

    #[test]
    fn test_entry_renders_menu() {
        let (dialog, mut session) = setup();
        let reply = dialog.advance(&[], "+254711000111", &mut session);
        assert_eq!(reply.result, DialogResult::Continue(MENU.to_string()));
    }

    #[test]
    fn test_valid_choice_terminates_and_queues_sms() {
        let (dialog, mut session) = setup();
        let reply = dialog.advance(&["2".to_string()], "+254711000111", &mut session);

        assert_eq!(
            reply.result,
            DialogResult::Terminate("Download link sent via SMS.".to_string())
        );
        assert_eq!(reply.outbox.len(), 1);
        assert_eq!(reply.outbox[0].to, "+254711000111");
        assert!(reply.outbox[0]
            .message
            .contains("https://elevatehr.example.com/docs/Employment_Contract.pdf"));
    }

    #[test]
    fn test_invalid_choice_reprompts_without_sms() {
        let (dialog, mut session) = setup();
        let reply = dialog.advance(&["9".to_string()], "+254711000111", &mut session);

        match reply.result {
            DialogResult::Continue(text) => assert!(text.contains("Invalid document option")),
            other => panic!("expected continue, got {:?}", other),
        }
        assert!(reply.outbox.is_empty());
    }

    #[test]
    fn test_back_yields() {
        let (dialog, mut session) = setup();
        let reply = dialog.advance(&["0".to_string()], "+254711000111", &mut session);
        assert_eq!(reply.result, DialogResult::YieldToParent);
    }
}
