//! Session state machine / router
//!
//! Owns session lifecycle, the authentication gate, the top-level menu,
//! and dispatch to the active dialog handler. One call to
//! [`UssdRouter::handle`] is one exchange: load session, apply the new
//! input token, persist, reply CONTINUE or TERMINATE.

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::SessionConfig;
use crate::dialog::{DialogRegistry, DialogResult};
use crate::directory::EmployeeDirectory;
use crate::notify::{Notification, Notifier};
use crate::session::{DialogKind, Session, SessionStore, Stage};

/// Input token delimiter of the accumulated USSD text
pub const TOKEN_DELIMITER: char = '*';

const AUTH_PROMPT: &str = "Welcome to ElevateHR\nEnter your Employee ID:";
const MAIN_MENU_OPTIONS: &str = "1. Clock In/Out\n\
    2. Report Status\n\
    3. Request Leave\n\
    4. Performance Summary\n\
    5. Payment Summary\n\
    6. Download Documents\n\
    0. Exit";
const MSG_EXPIRED: &str = "Session expired. Please dial again.";
const MSG_TOO_MANY_ATTEMPTS: &str = "Too many invalid attempts. Goodbye.";
const MSG_AUTH_FAILED: &str = "Authentication failed. Please dial again.";
const MSG_SYSTEM_ERROR: &str = "System error. Please try again later.";
const MSG_GOODBYE: &str = "Thank you for using ElevateHR. Goodbye.";
const MSG_PAYMENT_SUMMARY: &str = "Your payment summary will be sent via SMS.";

/// One inbound exchange from the telecom gateway
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UssdRequest {
    pub session_id: String,
    pub phone_number: String,
    /// Entire accumulated `*`-delimited input history
    #[serde(default)]
    pub text: String,
    /// Passed through by the transport, unused by the core
    #[serde(default)]
    pub service_code: String,
}

/// The two dispositions of a response: CONTINUE or TERMINATE
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Continue,
    Terminate,
}

/// Response to one exchange
#[derive(Debug, Clone, PartialEq)]
pub struct UssdResponse {
    pub disposition: Disposition,
    pub text: String,
}

impl UssdResponse {
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            disposition: Disposition::Continue,
            text: text.into(),
        }
    }

    pub fn terminate(text: impl Into<String>) -> Self {
        Self {
            disposition: Disposition::Terminate,
            text: text.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.disposition == Disposition::Terminate
    }

    /// The wire encoding the transport collaborator depends on
    pub fn render(&self) -> String {
        match self.disposition {
            Disposition::Continue => format!("CON {}", self.text),
            Disposition::Terminate => format!("END {}", self.text),
        }
    }
}

/// Split accumulated input into its ordered token sequence
pub fn split_tokens(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(TOKEN_DELIMITER)
        .map(|t| t.trim().to_string())
        .collect()
}

/// The session state machine
pub struct UssdRouter {
    store: Arc<SessionStore>,
    registry: DialogRegistry,
    directory: Arc<dyn EmployeeDirectory>,
    notifier: Arc<dyn Notifier>,
    config: SessionConfig,
}

impl UssdRouter {
    pub fn new(
        store: Arc<SessionStore>,
        registry: DialogRegistry,
        directory: Arc<dyn EmployeeDirectory>,
        notifier: Arc<dyn Notifier>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            registry,
            directory,
            notifier,
            config,
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Process one exchange
    ///
    /// Held under the per-session-id exchange lock for the whole
    /// get/mutate/put cycle, so a duplicated carrier delivery can never
    /// interleave with the original. Always returns a well-formed
    /// response; nothing propagates to the transport.
    pub fn handle(&self, req: &UssdRequest) -> UssdResponse {
        let lock = self.store.exchange_lock(&req.session_id);
        let _guard = lock.lock().unwrap();

        let mut session = self.store.get_or_create(&req.session_id, &req.phone_number);

        // Hard cutoff from creation, not last activity: a session cannot
        // be kept alive indefinitely by continued interaction.
        let timeout = Duration::seconds(self.config.timeout_secs as i64);
        if Utc::now() - session.created_at > timeout {
            debug!(session_id = %req.session_id, "Session expired");
            self.store.delete(&req.session_id);
            return UssdResponse::terminate(MSG_EXPIRED);
        }
        session.touch();

        let tokens = split_tokens(&req.text);
        if session.consumed > tokens.len() {
            // The accumulated history can only grow within one session id;
            // a shorter resubmission is transport misbehavior.
            warn!(session_id = %req.session_id, "Input history shrank; discarding session");
            self.store.delete(&req.session_id);
            return UssdResponse::terminate(MSG_SYSTEM_ERROR);
        }
        let new_tokens: Vec<String> = tokens[session.consumed..].to_vec();

        // Retransmission: no new input means a carrier retry (or an idle
        // re-render). Replay the previous response verbatim, side-effect
        // free, so the caller sees exactly what they saw the first time.
        if new_tokens.is_empty() {
            if let Some(text) = session.last_prompt.clone() {
                self.store.put(&req.session_id, session);
                return UssdResponse::prompt(text);
            }
        }

        let (response, outbox, keep) = self.step(&mut session, &new_tokens, &req.phone_number);

        if keep && !response.is_terminal() {
            session.consumed = tokens.len();
            session.last_prompt = Some(response.text.clone());
            self.store.put(&req.session_id, session);
        } else {
            self.store.delete(&req.session_id);
        }

        // Fire-and-forget: delivery outcomes never gate the response.
        for notification in outbox {
            self.notifier.deliver(notification);
        }

        response
    }

    /// Advance the state machine by the new tokens of one exchange
    fn step(
        &self,
        session: &mut Session,
        new_tokens: &[String],
        caller: &str,
    ) -> (UssdResponse, Vec<Notification>, bool) {
        match session.stage {
            Stage::Auth => {
                let response = self.authenticate(session, new_tokens);
                // Catch-up case: tokens past the identity belong to the
                // menu, not to a later re-interpretation of Auth input.
                if session.stage == Stage::MainMenu && new_tokens.len() > 1 {
                    return self.main_menu(session, &new_tokens[1..], caller);
                }
                (response, Vec::new(), true)
            }
            _ if !session.authenticated => {
                // Internal-consistency guard: past Auth implies authenticated
                warn!(stage = ?session.stage, "Unauthenticated session past auth stage");
                (UssdResponse::terminate(MSG_AUTH_FAILED), Vec::new(), false)
            }
            Stage::MainMenu => self.main_menu(session, new_tokens, caller),
            Stage::Dialog(kind) => self.dispatch(session, kind, new_tokens, caller),
        }
    }

    /// Authentication gate: first token is the claimed employee id
    fn authenticate(&self, session: &mut Session, new_tokens: &[String]) -> UssdResponse {
        let Some(claimed) = new_tokens.first() else {
            return UssdResponse::prompt(AUTH_PROMPT);
        };

        let employee_id = claimed.trim().to_uppercase();
        if self.directory.is_valid(&employee_id) {
            let greeting = self
                .directory
                .display_name(&employee_id)
                .map(|name| format!("Welcome, {}", name))
                .unwrap_or_else(|| "Welcome to ElevateHR".to_string());

            session.authenticated = true;
            session.employee_id = Some(employee_id);
            session.transition(Stage::MainMenu);
            return UssdResponse::prompt(format!("{}\n{}", greeting, MAIN_MENU_OPTIONS));
        }

        session.attempts += 1;
        if session.attempts >= self.config.max_attempts {
            return UssdResponse::terminate(MSG_TOO_MANY_ATTEMPTS);
        }
        let remaining = self.config.max_attempts - session.attempts;
        UssdResponse::prompt(format!(
            "Invalid Employee ID. {} attempt(s) remaining.\nEnter your Employee ID:",
            remaining
        ))
    }

    /// Top-level menu: map the newest token through the fixed option table
    fn main_menu(
        &self,
        session: &mut Session,
        new_tokens: &[String],
        caller: &str,
    ) -> (UssdResponse, Vec<Notification>, bool) {
        let Some(choice) = new_tokens.first() else {
            return (UssdResponse::prompt(main_menu_text()), Vec::new(), true);
        };

        let kind = match choice.as_str() {
            "1" => Some(DialogKind::Clock),
            "2" => Some(DialogKind::Reporting),
            "3" => Some(DialogKind::Leave),
            "4" => Some(DialogKind::Performance),
            "6" => Some(DialogKind::Documents),
            "5" => {
                let notification =
                    Notification::new(caller, "Your ElevateHR payment summary is on its way.");
                return (
                    UssdResponse::terminate(MSG_PAYMENT_SUMMARY),
                    vec![notification],
                    false,
                );
            }
            "0" => return (UssdResponse::terminate(MSG_GOODBYE), Vec::new(), false),
            _ => None,
        };

        let Some(kind) = kind else {
            session.attempts += 1;
            if session.attempts >= self.config.max_attempts {
                return (
                    UssdResponse::terminate(MSG_TOO_MANY_ATTEMPTS),
                    Vec::new(),
                    false,
                );
            }
            return (
                UssdResponse::prompt(format!("Invalid choice. Try again.\n\n{}", main_menu_text())),
                Vec::new(),
                true,
            );
        };

        session.transition(Stage::Dialog(kind));
        // Forward whatever follows the selector (normally nothing) so the
        // dialog renders its entry screen in the same exchange.
        self.dispatch(session, kind, &new_tokens[1..], caller)
    }

    /// Forward the new tokens to the registered handler for a stage
    fn dispatch(
        &self,
        session: &mut Session,
        kind: DialogKind,
        new_tokens: &[String],
        caller: &str,
    ) -> (UssdResponse, Vec<Notification>, bool) {
        let Some(handler) = self.registry.get(kind) else {
            warn!(dialog = kind.name(), "No handler registered for stage");
            return (
                UssdResponse::terminate(MSG_SYSTEM_ERROR),
                Vec::new(),
                false,
            );
        };

        let reply = handler.advance(new_tokens, caller, session);
        match reply.result {
            DialogResult::Continue(text) => (UssdResponse::prompt(text), reply.outbox, true),
            DialogResult::Terminate(text) => (UssdResponse::terminate(text), reply.outbox, false),
            DialogResult::YieldToParent => {
                // Back to the main menu; sub-dialog progress is discarded
                session.transition(Stage::MainMenu);
                (UssdResponse::prompt(main_menu_text()), reply.outbox, true)
            }
        }
    }
}

fn main_menu_text() -> String {
    format!("Welcome to ElevateHR\n{}", MAIN_MENU_OPTIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::{DialogHandler, DialogReply};
    use crate::directory::StaticDirectory;
    use std::sync::Mutex;

    /// Notifier that records deliveries for assertions
    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
    }

    impl Notifier for RecordingNotifier {
        fn deliver(&self, notification: Notification) {
            self.sent.lock().unwrap().push(notification);
        }
    }

    /// Minimal dialog: menu screen, "1" terminates, "0" yields
    struct StubDialog(DialogKind);

    impl DialogHandler for StubDialog {
        fn kind(&self) -> DialogKind {
            self.0
        }

        fn advance(&self, tokens: &[String], _caller: &str, _session: &mut Session) -> DialogReply {
            match tokens.first().map(String::as_str) {
                None => DialogReply::prompt(format!("{} menu", self.0.name())),
                Some("0") => DialogReply::yield_to_parent(),
                Some("1") => DialogReply::terminate(format!("{} done", self.0.name())),
                Some(_) => DialogReply::prompt("invalid"),
            }
        }
    }

    struct Fixture {
        router: UssdRouter,
        notifier: Arc<RecordingNotifier>,
        store: Arc<SessionStore>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(SessionStore::new());
        let notifier = Arc::new(RecordingNotifier::default());

        let mut registry = DialogRegistry::new();
        for kind in [
            DialogKind::Clock,
            DialogKind::Reporting,
            DialogKind::Leave,
            DialogKind::Performance,
        ] {
            registry.register(Arc::new(StubDialog(kind)));
        }
        // Documents deliberately unregistered for the inconsistency test

        let directory = StaticDirectory::new([("EMP123".to_string(), "John Doe".to_string())]);
        let router = UssdRouter::new(
            store.clone(),
            registry,
            Arc::new(directory),
            notifier.clone(),
            SessionConfig::default(),
        );

        Fixture {
            router,
            notifier,
            store,
        }
    }

    fn request(text: &str) -> UssdRequest {
        UssdRequest {
            session_id: "sid-1".to_string(),
            phone_number: "+254711000111".to_string(),
            text: text.to_string(),
            service_code: "*384#".to_string(),
        }
    }

    #[test]
    fn test_first_contact_prompts_for_employee_id() {
        let fx = fixture();
        let response = fx.router.handle(&request(""));
        assert_eq!(response.disposition, Disposition::Continue);
        assert!(response.text.contains("Employee ID"));
        assert!(fx.store.contains("sid-1"));
    }

    #[test]
    fn test_auth_success_shows_main_menu() {
        let fx = fixture();
        fx.router.handle(&request(""));
        let response = fx.router.handle(&request("EMP123"));

        assert_eq!(response.disposition, Disposition::Continue);
        assert!(response.text.contains("Welcome, John Doe"));
        assert!(response.text.contains("1. Clock In/Out"));
    }

    #[test]
    fn test_auth_is_case_insensitive() {
        let fx = fixture();
        fx.router.handle(&request(""));
        let response = fx.router.handle(&request(" emp123 "));
        assert_eq!(response.disposition, Disposition::Continue);
        assert!(response.text.contains("1. Clock In/Out"));
    }

    #[test]
    fn test_auth_three_strikes() {
        let fx = fixture();
        fx.router.handle(&request(""));

        let first = fx.router.handle(&request("NOPE"));
        assert_eq!(first.disposition, Disposition::Continue);
        assert!(first.text.contains("2 attempt(s) remaining"));

        let second = fx.router.handle(&request("NOPE*NOPE"));
        assert!(second.text.contains("1 attempt(s) remaining"));

        let third = fx.router.handle(&request("NOPE*NOPE*NOPE"));
        assert_eq!(third.disposition, Disposition::Terminate);
        assert_eq!(third.text, MSG_TOO_MANY_ATTEMPTS);
        assert!(!fx.store.contains("sid-1"));
    }

    #[test]
    fn test_menu_three_strikes() {
        let fx = fixture();
        fx.router.handle(&request(""));
        fx.router.handle(&request("EMP123"));

        let first = fx.router.handle(&request("EMP123*9"));
        assert!(first.text.contains("Invalid choice"));
        let _second = fx.router.handle(&request("EMP123*9*9"));
        let third = fx.router.handle(&request("EMP123*9*9*9"));

        assert_eq!(third.disposition, Disposition::Terminate);
        assert_eq!(third.text, MSG_TOO_MANY_ATTEMPTS);
        assert!(!fx.store.contains("sid-1"));
    }

    #[test]
    fn test_menu_selects_dialog() {
        let fx = fixture();
        fx.router.handle(&request(""));
        fx.router.handle(&request("EMP123"));

        let response = fx.router.handle(&request("EMP123*1"));
        assert_eq!(response.disposition, Disposition::Continue);
        assert_eq!(response.text, "clock menu");
    }

    #[test]
    fn test_back_token_returns_to_main_menu() {
        let fx = fixture();
        fx.router.handle(&request(""));
        fx.router.handle(&request("EMP123"));
        fx.router.handle(&request("EMP123*1"));

        let response = fx.router.handle(&request("EMP123*1*0"));
        assert_eq!(response.disposition, Disposition::Continue);
        assert!(response.text.contains("1. Clock In/Out"));
        assert!(fx.store.contains("sid-1"));

        // Progress restarts: selecting the dialog again shows its menu
        let again = fx.router.handle(&request("EMP123*1*0*1"));
        assert_eq!(again.text, "clock menu");
    }

    #[test]
    fn test_exit_terminates() {
        let fx = fixture();
        fx.router.handle(&request(""));
        fx.router.handle(&request("EMP123"));

        let response = fx.router.handle(&request("EMP123*0"));
        assert_eq!(response.disposition, Disposition::Terminate);
        assert_eq!(response.text, MSG_GOODBYE);
        assert!(!fx.store.contains("sid-1"));
    }

    #[test]
    fn test_payment_summary_terminates_and_notifies() {
        let fx = fixture();
        fx.router.handle(&request(""));
        fx.router.handle(&request("EMP123"));

        let response = fx.router.handle(&request("EMP123*5"));
        assert_eq!(response.disposition, Disposition::Terminate);
        assert_eq!(response.text, MSG_PAYMENT_SUMMARY);

        let sent = fx.notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "+254711000111");
    }

    #[test]
    fn test_unregistered_dialog_is_system_error() {
        let fx = fixture();
        fx.router.handle(&request(""));
        fx.router.handle(&request("EMP123"));

        let response = fx.router.handle(&request("EMP123*6"));
        assert_eq!(response.disposition, Disposition::Terminate);
        assert_eq!(response.text, MSG_SYSTEM_ERROR);
        assert!(!fx.store.contains("sid-1"));
    }

    #[test]
    fn test_retransmission_is_idempotent() {
        let fx = fixture();
        fx.router.handle(&request(""));
        fx.router.handle(&request("EMP123"));
        let first = fx.router.handle(&request("EMP123*1"));

        // Carrier retry: identical accumulated input resubmitted
        let second = fx.router.handle(&request("EMP123*1"));
        assert_eq!(first, second);

        // And the dialog has not advanced: the next real token still
        // lands on the dialog's menu, not one level deeper.
        let next = fx.router.handle(&request("EMP123*1*0"));
        assert!(next.text.contains("1. Clock In/Out"));
    }

    #[test]
    fn test_retransmission_after_invalid_input_replays_error() {
        let fx = fixture();
        fx.router.handle(&request(""));

        let first = fx.router.handle(&request("NOPE"));
        assert!(first.text.contains("2 attempt(s) remaining"));

        // Carrier retry: the error line must come back, not the bare prompt
        let retry = fx.router.handle(&request("NOPE"));
        assert_eq!(retry, first);

        // And the attempt counter did not move: two more strikes remain
        let second = fx.router.handle(&request("NOPE*NOPE"));
        assert!(second.text.contains("1 attempt(s) remaining"));
    }

    #[test]
    fn test_first_contact_with_pending_menu_selection() {
        let fx = fixture();

        // Identity and menu choice arrive in one accumulated history
        let response = fx.router.handle(&request("EMP123*1"));
        assert_eq!(response.disposition, Disposition::Continue);
        assert_eq!(response.text, "clock menu");
    }

    #[test]
    fn test_expired_session_terminates_and_is_removed() {
        let fx = fixture();
        fx.router.handle(&request(""));
        fx.router.handle(&request("EMP123"));

        // Age the session past the timeout
        {
            let mut session = fx.store.get_or_create("sid-1", "+254711000111");
            session.created_at = Utc::now() - Duration::seconds(600);
            fx.store.put("sid-1", session);
        }

        let response = fx.router.handle(&request("EMP123*1"));
        assert_eq!(response.disposition, Disposition::Terminate);
        assert_eq!(response.text, MSG_EXPIRED);
        assert!(!fx.store.contains("sid-1"));
    }

    #[test]
    fn test_timeout_is_from_creation_not_activity() {
        let fx = fixture();
        fx.router.handle(&request(""));

        // Recent activity does not rescue an old session
        {
            let mut session = fx.store.get_or_create("sid-1", "+254711000111");
            session.created_at = Utc::now() - Duration::seconds(301);
            session.last_activity = Utc::now();
            fx.store.put("sid-1", session);
        }

        let response = fx.router.handle(&request("EMP123"));
        assert_eq!(response.text, MSG_EXPIRED);
    }

    #[test]
    fn test_shrunken_history_discards_session() {
        let fx = fixture();
        fx.router.handle(&request(""));
        fx.router.handle(&request("EMP123"));
        fx.router.handle(&request("EMP123*1"));

        let response = fx.router.handle(&request("EMP123"));
        assert_eq!(response.disposition, Disposition::Terminate);
        assert_eq!(response.text, MSG_SYSTEM_ERROR);
        assert!(!fx.store.contains("sid-1"));
    }

    #[test]
    fn test_render_wire_prefixes() {
        assert_eq!(UssdResponse::prompt("hi").render(), "CON hi");
        assert_eq!(UssdResponse::terminate("bye").render(), "END bye");
    }

    #[test]
    fn test_split_tokens() {
        assert!(split_tokens("").is_empty());
        assert_eq!(split_tokens("EMP123"), vec!["EMP123"]);
        assert_eq!(split_tokens("EMP123*3* 1 "), vec!["EMP123", "3", "1"]);
    }
}
