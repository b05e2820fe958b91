//! Employee directory
//!
//! The authentication gate's view of the organization: a synchronous,
//! side-effect-free identity lookup.

use std::collections::HashMap;

/// Authorized-identity lookup
pub trait EmployeeDirectory: Send + Sync {
    /// Whether the (already normalized) id belongs to an employee
    fn is_valid(&self, employee_id: &str) -> bool;

    /// Display name for an employee id
    fn display_name(&self, employee_id: &str) -> Option<String>;
}

/// Directory backed by a fixed roster loaded from configuration
#[derive(Debug, Default)]
pub struct StaticDirectory {
    employees: HashMap<String, String>,
}

impl StaticDirectory {
    /// Build from `(id, display name)` pairs; ids are stored uppercase
    pub fn new(roster: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            employees: roster
                .into_iter()
                .map(|(id, name)| (id.to_uppercase(), name))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.employees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.employees.is_empty()
    }
}

impl EmployeeDirectory for StaticDirectory {
    fn is_valid(&self, employee_id: &str) -> bool {
        self.employees.contains_key(employee_id)
    }

    fn display_name(&self, employee_id: &str) -> Option<String> {
        self.employees.get(employee_id).cloned()
    }
}
