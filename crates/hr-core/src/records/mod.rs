//! Business-record repositories
//!
//! Dialog handlers read and write HR records through these capability
//! traits. Production wiring uses [`SqliteRecords`]; tests and
//! credential-less development use [`MemoryRecords`].

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryRecords;
pub use sqlite::SqliteRecords;
pub use types::{
    DayClock, LeaveRequest, LeaveType, PerformanceRecord, ReportStatus, StatusReport,
};

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::Result;

/// Clock-in/out records
pub trait ClockRepository: Send + Sync {
    /// The clock-in time recorded for `day`, if any
    fn clock_in_at(&self, employee_id: &str, day: NaiveDate) -> Result<Option<DateTime<Utc>>>;

    fn record_clock_in(&self, employee_id: &str, at: DateTime<Utc>) -> Result<()>;

    fn record_clock_out(&self, employee_id: &str, at: DateTime<Utc>) -> Result<()>;
}

/// Leave request submissions
pub trait LeaveRepository: Send + Sync {
    fn submit(&self, request: &LeaveRequest) -> Result<()>;
}

/// Read-only performance summaries
pub trait PerformanceRepository: Send + Sync {
    fn summary(&self, employee_id: &str) -> Result<Option<PerformanceRecord>>;
}

/// Daily attendance reports
pub trait ReportRepository: Send + Sync {
    /// The status already recorded for `day`, if any
    fn status_for_day(&self, employee_id: &str, day: NaiveDate) -> Result<Option<ReportStatus>>;

    fn record_status(&self, report: &StatusReport) -> Result<()>;

    /// Most recent reports, newest first, at most `limit`
    fn recent(&self, employee_id: &str, limit: usize) -> Result<Vec<StatusReport>>;
}

/// Bundle of repository handles threaded into the dialog handlers
#[derive(Clone)]
pub struct Repositories {
    pub clock: Arc<dyn ClockRepository>,
    pub leave: Arc<dyn LeaveRepository>,
    pub performance: Arc<dyn PerformanceRepository>,
    pub reports: Arc<dyn ReportRepository>,
}

impl Repositories {
    /// Wire every repository to one backend implementing all four traits
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: ClockRepository
            + LeaveRepository
            + PerformanceRepository
            + ReportRepository
            + 'static,
    {
        Self {
            clock: backend.clone(),
            leave: backend.clone(),
            performance: backend.clone(),
            reports: backend,
        }
    }
}
