//! HR record types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Leave categories an employee can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeaveType {
    Sick,
    Casual,
    Annual,
}

impl LeaveType {
    /// Human-readable name used in prompts and records
    pub fn name(&self) -> &'static str {
        match self {
            LeaveType::Sick => "Sick Leave",
            LeaveType::Casual => "Casual Leave",
            LeaveType::Annual => "Annual Leave",
        }
    }

    /// Maximum days a single request of this type may cover
    pub fn max_days(&self) -> u32 {
        match self {
            LeaveType::Sick => 14,
            LeaveType::Casual => 7,
            LeaveType::Annual => 30,
        }
    }

    /// Map a menu digit to a leave type
    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        match choice {
            "1" => Some(LeaveType::Sick),
            "2" => Some(LeaveType::Casual),
            "3" => Some(LeaveType::Annual),
            _ => None,
        }
    }
}

/// A submitted leave request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaveRequest {
    /// Generated reference id, e.g. `LV-3F2A9C1B`
    pub reference: String,
    pub employee_id: String,
    pub leave_type: LeaveType,
    pub days: u32,
    pub start_date: NaiveDate,
    pub submitted_at: DateTime<Utc>,
}

/// Daily attendance status choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportStatus {
    Present,
    Remote,
    Sick,
    OnLeave,
    Absent,
}

impl ReportStatus {
    /// Short label shown in menus and history lists
    pub fn label(&self) -> &'static str {
        match self {
            ReportStatus::Present => "Present",
            ReportStatus::Remote => "Remote",
            ReportStatus::Sick => "Sick",
            ReportStatus::OnLeave => "On Leave",
            ReportStatus::Absent => "Absent",
        }
    }

    /// Longer description shown on the confirmation screen
    pub fn description(&self) -> &'static str {
        match self {
            ReportStatus::Present => "at workplace",
            ReportStatus::Remote => "working from alternate location",
            ReportStatus::Sick => "on sick leave",
            ReportStatus::OnLeave => "on approved leave",
            ReportStatus::Absent => "unexpected absence",
        }
    }

    /// Map a menu digit to a status
    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        match choice {
            "1" => Some(ReportStatus::Present),
            "2" => Some(ReportStatus::Remote),
            "3" => Some(ReportStatus::Sick),
            "4" => Some(ReportStatus::OnLeave),
            "5" => Some(ReportStatus::Absent),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Present => "present",
            ReportStatus::Remote => "remote",
            ReportStatus::Sick => "sick",
            ReportStatus::OnLeave => "on_leave",
            ReportStatus::Absent => "absent",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "present" => Some(ReportStatus::Present),
            "remote" => Some(ReportStatus::Remote),
            "sick" => Some(ReportStatus::Sick),
            "on_leave" => Some(ReportStatus::OnLeave),
            "absent" => Some(ReportStatus::Absent),
            _ => None,
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown status: {}", s))
    }
}

/// One day's attendance report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    pub employee_id: String,
    pub day: NaiveDate,
    pub status: ReportStatus,
    pub recorded_at: DateTime<Utc>,
}

/// Clock-in/out record for one employee on one day
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayClock {
    pub clock_in: Option<DateTime<Utc>>,
    pub clock_out: Option<DateTime<Utc>>,
}

/// Performance summary for one employee
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub employee_id: String,
    pub last_review: String,
    pub rating: String,
    pub goals: Vec<String>,
    pub completed_training: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leave_type_menu_mapping() {
        assert_eq!(LeaveType::from_menu_choice("1"), Some(LeaveType::Sick));
        assert_eq!(LeaveType::from_menu_choice("3"), Some(LeaveType::Annual));
        assert_eq!(LeaveType::from_menu_choice("9"), None);
    }

    #[test]
    fn test_leave_type_maxima() {
        assert_eq!(LeaveType::Sick.max_days(), 14);
        assert_eq!(LeaveType::Casual.max_days(), 7);
        assert_eq!(LeaveType::Annual.max_days(), 30);
    }

    #[test]
    fn test_report_status_round_trip() {
        for status in [
            ReportStatus::Present,
            ReportStatus::Remote,
            ReportStatus::Sick,
            ReportStatus::OnLeave,
            ReportStatus::Absent,
        ] {
            let parsed: ReportStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
