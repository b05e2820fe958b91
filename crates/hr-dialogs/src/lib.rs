//! hr-dialogs: Sub-dialog handlers for the ElevateHR USSD gateway
//!
//! One handler per sub-flow, registered into the core dialog registry.

pub mod clock;
pub mod documents;
pub mod leave;
pub mod performance;
pub mod reporting;

pub use clock::ClockDialog;
pub use documents::DocumentsDialog;
pub use leave::LeaveDialog;
pub use performance::PerformanceDialog;
pub use reporting::ReportingDialog;

use std::sync::Arc;

use hr_core::records::Repositories;
use hr_core::DialogRegistry;

/// Register all default dialog handlers with the registry
pub fn register_default_dialogs(
    registry: &mut DialogRegistry,
    repos: &Repositories,
    docs_base_url: &str,
) {
    registry.register(Arc::new(ClockDialog::new(repos.clock.clone())));
    registry.register(Arc::new(LeaveDialog::new(repos.leave.clone())));
    registry.register(Arc::new(PerformanceDialog::new(repos.performance.clone())));
    registry.register(Arc::new(ReportingDialog::new(repos.reports.clone())));
    registry.register(Arc::new(DocumentsDialog::new(docs_base_url)));
}
