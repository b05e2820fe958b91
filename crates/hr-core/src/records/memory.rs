//! In-memory record backend
//!
//! Default backend when no database path is configured, and the test
//! double for dialog handler tests.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, NaiveDate, Utc};

use crate::records::{
    ClockRepository, DayClock, LeaveRepository, LeaveRequest, PerformanceRecord,
    PerformanceRepository, ReportRepository, ReportStatus, StatusReport,
};
use crate::Result;

/// In-memory implementation of all record repositories
#[derive(Debug, Default)]
pub struct MemoryRecords {
    clock: RwLock<HashMap<(String, NaiveDate), DayClock>>,
    leaves: RwLock<Vec<LeaveRequest>>,
    performance: RwLock<HashMap<String, PerformanceRecord>>,
    reports: RwLock<HashMap<String, Vec<StatusReport>>>,
}

impl MemoryRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a performance record (admin/test helper, not part of the
    /// repository contract)
    pub fn set_performance(&self, record: PerformanceRecord) {
        let mut performance = self.performance.write().unwrap();
        performance.insert(record.employee_id.clone(), record);
    }

    /// Submitted leave requests, oldest first
    pub fn leave_requests(&self) -> Vec<LeaveRequest> {
        self.leaves.read().unwrap().clone()
    }
}

impl ClockRepository for MemoryRecords {
    fn clock_in_at(&self, employee_id: &str, day: NaiveDate) -> Result<Option<DateTime<Utc>>> {
        let clock = self.clock.read().unwrap();
        Ok(clock
            .get(&(employee_id.to_string(), day))
            .and_then(|c| c.clock_in))
    }

    fn record_clock_in(&self, employee_id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut clock = self.clock.write().unwrap();
        let entry = clock
            .entry((employee_id.to_string(), at.date_naive()))
            .or_default();
        entry.clock_in = Some(at);
        Ok(())
    }

    fn record_clock_out(&self, employee_id: &str, at: DateTime<Utc>) -> Result<()> {
        let mut clock = self.clock.write().unwrap();
        let entry = clock
            .entry((employee_id.to_string(), at.date_naive()))
            .or_default();
        entry.clock_out = Some(at);
        Ok(())
    }
}

impl LeaveRepository for MemoryRecords {
    fn submit(&self, request: &LeaveRequest) -> Result<()> {
        let mut leaves = self.leaves.write().unwrap();
        leaves.push(request.clone());
        Ok(())
    }
}

impl PerformanceRepository for MemoryRecords {
    fn summary(&self, employee_id: &str) -> Result<Option<PerformanceRecord>> {
        let performance = self.performance.read().unwrap();
        Ok(performance.get(employee_id).cloned())
    }
}

impl ReportRepository for MemoryRecords {
    fn status_for_day(&self, employee_id: &str, day: NaiveDate) -> Result<Option<ReportStatus>> {
        let reports = self.reports.read().unwrap();
        Ok(reports
            .get(employee_id)
            .and_then(|list| list.iter().find(|r| r.day == day))
            .map(|r| r.status))
    }

    fn record_status(&self, report: &StatusReport) -> Result<()> {
        let mut reports = self.reports.write().unwrap();
        let list = reports.entry(report.employee_id.clone()).or_default();
        // One report per day; re-reporting replaces
        list.retain(|r| r.day != report.day);
        list.push(report.clone());
        list.sort_by_key(|r| r.day);
        Ok(())
    }

    fn recent(&self, employee_id: &str, limit: usize) -> Result<Vec<StatusReport>> {
        let reports = self.reports.read().unwrap();
        let mut list = reports.get(employee_id).cloned().unwrap_or_default();
        list.reverse();
        list.truncate(limit);
        Ok(list)
    }
}
