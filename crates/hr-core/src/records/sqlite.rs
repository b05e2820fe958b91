//! SQLite record backend

use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use tracing::debug;

use crate::records::{
    ClockRepository, LeaveRepository, LeaveRequest, PerformanceRecord, PerformanceRepository,
    ReportRepository, ReportStatus, StatusReport,
};
use crate::{Error, Result};

/// SQLite-backed implementation of all record repositories
///
/// The connection is wrapped in a `Mutex` because `rusqlite::Connection`
/// is not `Sync`; repository calls are short single statements.
pub struct SqliteRecords {
    conn: Mutex<Connection>,
}

impl SqliteRecords {
    /// Open (or create) a record database at the given path
    pub fn new(db_path: &str) -> Result<Self> {
        debug!("Opening record database at: {}", db_path);
        let conn = Connection::open(db_path)?;
        let records = Self { conn: Mutex::new(conn) };
        records.init_tables()?;
        Ok(records)
    }

    /// Create an in-memory record database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let records = Self { conn: Mutex::new(conn) };
        records.init_tables()?;
        Ok(records)
    }

    /// Initialize database tables
    fn init_tables(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS clock_log (
                employee_id TEXT NOT NULL,
                day TEXT NOT NULL,
                clock_in TEXT,
                clock_out TEXT,
                PRIMARY KEY (employee_id, day)
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS leave_requests (
                reference TEXT PRIMARY KEY,
                employee_id TEXT NOT NULL,
                leave_type TEXT NOT NULL,
                days INTEGER NOT NULL,
                start_date TEXT NOT NULL,
                submitted_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS performance (
                employee_id TEXT PRIMARY KEY,
                last_review TEXT NOT NULL,
                rating TEXT NOT NULL,
                goals TEXT NOT NULL,
                completed_training TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS status_reports (
                employee_id TEXT NOT NULL,
                day TEXT NOT NULL,
                status TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                PRIMARY KEY (employee_id, day)
            )",
            [],
        )?;
        Ok(())
    }

    /// Upsert a performance record (admin tooling, not part of the
    /// repository contract)
    pub fn upsert_performance(&self, record: &PerformanceRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO performance
             (employee_id, last_review, rating, goals, completed_training)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.employee_id,
                record.last_review,
                record.rating,
                serde_json::to_string(&record.goals)?,
                serde_json::to_string(&record.completed_training)?,
            ],
        )?;
        Ok(())
    }
}

fn parse_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| rusqlite::Error::InvalidQuery)
}

impl ClockRepository for SqliteRecords {
    fn clock_in_at(&self, employee_id: &str, day: NaiveDate) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT clock_in FROM clock_log WHERE employee_id = ?1 AND day = ?2",
            params![employee_id, day.to_string()],
            |row| row.get::<_, Option<String>>(0),
        );

        match result {
            Ok(Some(raw)) => Ok(Some(parse_timestamp(&raw)?)),
            Ok(None) => Ok(None),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn record_clock_in(&self, employee_id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO clock_log (employee_id, day, clock_in) VALUES (?1, ?2, ?3)
             ON CONFLICT (employee_id, day) DO UPDATE SET clock_in = ?3",
            params![employee_id, at.date_naive().to_string(), at.to_rfc3339()],
        )?;
        Ok(())
    }

    fn record_clock_out(&self, employee_id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO clock_log (employee_id, day, clock_out) VALUES (?1, ?2, ?3)
             ON CONFLICT (employee_id, day) DO UPDATE SET clock_out = ?3",
            params![employee_id, at.date_naive().to_string(), at.to_rfc3339()],
        )?;
        Ok(())
    }
}

impl LeaveRepository for SqliteRecords {
    fn submit(&self, request: &LeaveRequest) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO leave_requests
             (reference, employee_id, leave_type, days, start_date, submitted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                request.reference,
                request.employee_id,
                request.leave_type.name(),
                request.days,
                request.start_date.to_string(),
                request.submitted_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl PerformanceRepository for SqliteRecords {
    fn summary(&self, employee_id: &str) -> Result<Option<PerformanceRecord>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT last_review, rating, goals, completed_training
             FROM performance WHERE employee_id = ?1",
            params![employee_id],
            |row| {
                let goals_json: String = row.get(2)?;
                let training_json: String = row.get(3)?;
                let goals: Vec<String> = serde_json::from_str(&goals_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?;
                let completed_training: Vec<String> = serde_json::from_str(&training_json)
                    .map_err(|_| rusqlite::Error::InvalidQuery)?;

                Ok(PerformanceRecord {
                    employee_id: employee_id.to_string(),
                    last_review: row.get(0)?,
                    rating: row.get(1)?,
                    goals,
                    completed_training,
                })
            },
        );

        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::from(e)),
        }
    }
}

impl ReportRepository for SqliteRecords {
    fn status_for_day(&self, employee_id: &str, day: NaiveDate) -> Result<Option<ReportStatus>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT status FROM status_reports WHERE employee_id = ?1 AND day = ?2",
            params![employee_id, day.to_string()],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(raw) => raw
                .parse()
                .map(Some)
                .map_err(Error::Repository),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn record_status(&self, report: &StatusReport) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO status_reports (employee_id, day, status, recorded_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                report.employee_id,
                report.day.to_string(),
                report.status.to_string(),
                report.recorded_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn recent(&self, employee_id: &str, limit: usize) -> Result<Vec<StatusReport>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT day, status, recorded_at FROM status_reports
             WHERE employee_id = ?1 ORDER BY day DESC LIMIT ?2",
        )?;

        let rows = stmt.query_map(params![employee_id, limit as i64], |row| {
            let day_raw: String = row.get(0)?;
            let status_raw: String = row.get(1)?;
            let recorded_raw: String = row.get(2)?;

            let day = day_raw
                .parse::<NaiveDate>()
                .map_err(|_| rusqlite::Error::InvalidQuery)?;
            let status = status_raw
                .parse::<ReportStatus>()
                .map_err(|_| rusqlite::Error::InvalidQuery)?;

            Ok(StatusReport {
                employee_id: employee_id.to_string(),
                day,
                status,
                recorded_at: parse_timestamp(&recorded_raw)?,
            })
        })?;

        let mut reports = Vec::new();
        for row in rows {
            reports.push(row?);
        }
        Ok(reports)
    }
}
