//! Daily status reporting dialog
//!
//! Status selection with confirmation, plus a browser for the last few
//! reports. Position within the dialog lives in the session's
//! reporting scratch.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use hr_core::records::{ReportRepository, ReportStatus, StatusReport};
use hr_core::session::{DialogKind, ReportScratch, Session};
use hr_core::{DialogHandler, DialogReply};

const STATUS_MENU: &str = "Report Status:\n\
    1. Present at work\n\
    2. Working remotely\n\
    3. Sick leave\n\
    4. On approved leave\n\
    5. Unexpected absence\n\
    6. View recent reports\n\
    0. Main Menu";
const HISTORY_LIMIT: usize = 5;

pub struct ReportingDialog {
    reports: Arc<dyn ReportRepository>,
}

impl ReportingDialog {
    pub fn new(reports: Arc<dyn ReportRepository>) -> Self {
        Self { reports }
    }

    /// Apply one token at the dialog's current position
    fn step(&self, token: &str, session: &mut Session) -> Option<DialogReply> {
        let employee_id = session.employee_id.clone().unwrap_or_default();

        match session.report_scratch() {
            ReportScratch::Root => match token {
                "0" => Some(DialogReply::yield_to_parent()),
                "6" => {
                    let recent = self.recent(&employee_id);
                    if recent.is_empty() {
                        return Some(DialogReply::terminate("No reports found."));
                    }
                    session.set_report_scratch(ReportScratch::History);
                    None
                }
                _ => match ReportStatus::from_menu_choice(token) {
                    Some(status) => {
                        session.set_report_scratch(ReportScratch::Confirm(status));
                        None
                    }
                    None => Some(DialogReply::prompt(format!(
                        "Invalid choice. Try again.\n\n{}",
                        STATUS_MENU
                    ))),
                },
            },
            ReportScratch::Confirm(status) => match token {
                "0" => Some(DialogReply::yield_to_parent()),
                "1" => {
                    let today = Utc::now().date_naive();
                    let report = StatusReport {
                        employee_id,
                        day: today,
                        status,
                        recorded_at: Utc::now(),
                    };
                    if let Err(e) = self.reports.record_status(&report) {
                        warn!("Failed to record status report: {}", e);
                        return Some(DialogReply::terminate(
                            "Unable to record right now. Please try again later.",
                        ));
                    }
                    Some(DialogReply::terminate(format!(
                        "Status recorded:\n{} on {}\n\nDial again to update.",
                        status.label(),
                        today
                    )))
                }
                "2" => Some(DialogReply::terminate("Status update cancelled.")),
                _ => Some(DialogReply::prompt(self.confirm_text(&employee_id, status))),
            },
            ReportScratch::History => match token {
                "0" => {
                    session.set_report_scratch(ReportScratch::Root);
                    None
                }
                _ => {
                    let recent = self.recent(&employee_id);
                    let index = token.parse::<usize>().ok().filter(|n| *n >= 1);
                    match index.and_then(|n| recent.get(n - 1)) {
                        Some(report) => Some(DialogReply::terminate(format!(
                            "Report for {}:\nStatus: {}\nTime: {}",
                            report.day,
                            report.status.label(),
                            report.recorded_at.format("%Y-%m-%d %H:%M")
                        ))),
                        None => Some(DialogReply::prompt(history_text(&recent))),
                    }
                }
            },
        }
    }

    /// The prompt for the dialog's current position
    fn prompt(&self, session: &mut Session) -> DialogReply {
        let employee_id = session.employee_id.clone().unwrap_or_default();
        match session.report_scratch() {
            ReportScratch::Root => DialogReply::prompt(STATUS_MENU),
            ReportScratch::Confirm(status) => {
                DialogReply::prompt(self.confirm_text(&employee_id, status))
            }
            ReportScratch::History => DialogReply::prompt(history_text(&self.recent(&employee_id))),
        }
    }

    fn confirm_text(&self, employee_id: &str, status: ReportStatus) -> String {
        let today = Utc::now().date_naive();
        match self.reports.status_for_day(employee_id, today) {
            Ok(Some(current)) => format!(
                "You're currently marked as {}.\nChange to {}?\n1. Yes\n2. No",
                current.label(),
                status.label()
            ),
            _ => format!(
                "Confirm {} status:\n{}\n\n1. Confirm\n2. Cancel",
                status.label(),
                status.description()
            ),
        }
    }

    fn recent(&self, employee_id: &str) -> Vec<StatusReport> {
        match self.reports.recent(employee_id, HISTORY_LIMIT) {
            Ok(reports) => reports,
            Err(e) => {
                warn!(employee_id, "Report history lookup failed: {}", e);
                Vec::new()
            }
        }
    }
}

fn history_text(recent: &[StatusReport]) -> String {
    let lines = recent
        .iter()
        .enumerate()
        .map(|(i, report)| format!("{}. {}: {}", i + 1, report.day, report.status.label()))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Your Reports (Last {}):\n{}\n\nSelect to view details\n0. Back",
        HISTORY_LIMIT, lines
    )
}

impl DialogHandler for ReportingDialog {
    fn kind(&self) -> DialogKind {
        DialogKind::Reporting
    }

    fn advance(&self, tokens: &[String], _caller: &str, session: &mut Session) -> DialogReply {
        for token in tokens {
            if let Some(reply) = self.step(token, session) {
                return reply;
            }
        }
        self.prompt(session)
    }
}
