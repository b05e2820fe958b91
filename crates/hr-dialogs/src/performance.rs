//! Performance summary dialog

use std::sync::Arc;

use tracing::warn;

use hr_core::records::{PerformanceRecord, PerformanceRepository};
use hr_core::session::{DialogKind, Session};
use hr_core::{DialogHandler, DialogReply};

const MENU: &str =
    "Performance Summary:\n1. View Ratings\n2. Current Goals\n3. Training History\n0. Main Menu";

pub struct PerformanceDialog {
    performance: Arc<dyn PerformanceRepository>,
}

impl PerformanceDialog {
    pub fn new(performance: Arc<dyn PerformanceRepository>) -> Self {
        Self { performance }
    }

    fn record_for(&self, employee_id: &str) -> PerformanceRecord {
        match self.performance.summary(employee_id) {
            Ok(Some(record)) => record,
            Ok(None) => placeholder(employee_id),
            Err(e) => {
                warn!(employee_id, "Performance lookup failed: {}", e);
                placeholder(employee_id)
            }
        }
    }
}

/// Record shown for employees without review data yet
fn placeholder(employee_id: &str) -> PerformanceRecord {
    PerformanceRecord {
        employee_id: employee_id.to_string(),
        last_review: "Not reviewed".to_string(),
        rating: "Not rated".to_string(),
        goals: Vec::new(),
        completed_training: Vec::new(),
    }
}

fn bulleted(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        return format!("- {}", empty);
    }
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

impl DialogHandler for PerformanceDialog {
    fn kind(&self) -> DialogKind {
        DialogKind::Performance
    }

    fn advance(&self, tokens: &[String], _caller: &str, session: &mut Session) -> DialogReply {
        let Some(choice) = tokens.first() else {
            return DialogReply::prompt(MENU);
        };

        let employee_id = session.employee_id.clone().unwrap_or_default();

        match choice.as_str() {
            "0" => DialogReply::yield_to_parent(),
            "1" => {
                let record = self.record_for(&employee_id);
                DialogReply::terminate(format!(
                    "Performance Rating:\nLast Review: {}\nRating: {}/5",
                    record.last_review, record.rating
                ))
            }
            "2" => {
                let record = self.record_for(&employee_id);
                DialogReply::terminate(format!(
                    "Current Goals:\n{}",
                    bulleted(&record.goals, "No current goals")
                ))
            }
            "3" => {
                let record = self.record_for(&employee_id);
                DialogReply::terminate(format!(
                    "Completed Training:\n{}",
                    bulleted(&record.completed_training, "No training completed")
                ))
            }
            _ => DialogReply::prompt(format!("Invalid option.\n{}", MENU)),
        }
    }
}
