//! Expense workflow status and its board column mapping

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Where an expense sits in the resolution workflow.
///
/// Each status corresponds to one of the default board columns; moving a
/// linked card into that column updates the expense.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    #[default]
    Logged,
    Pending,
    Cleared,
    Reimbursable,
}

impl ExpenseStatus {
    pub const ALL: [ExpenseStatus; 4] = [
        ExpenseStatus::Logged,
        ExpenseStatus::Pending,
        ExpenseStatus::Cleared,
        ExpenseStatus::Reimbursable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logged => "logged",
            Self::Pending => "pending",
            Self::Cleared => "cleared",
            Self::Reimbursable => "reimbursable",
        }
    }

    /// Name of the default board column for this status
    pub fn column_name(&self) -> &'static str {
        match self {
            Self::Logged => "To Log",
            Self::Pending => "Verify",
            Self::Cleared => "Paid",
            Self::Reimbursable => "Reimburse",
        }
    }

    /// Status implied by a column name, if it is one of the default columns.
    ///
    /// Matching is exact; custom columns leave the expense status untouched.
    pub fn from_column_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.column_name() == name)
    }
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpenseStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "logged" => Ok(Self::Logged),
            "pending" => Ok(Self::Pending),
            "cleared" => Ok(Self::Cleared),
            "reimbursable" => Ok(Self::Reimbursable),
            _ => Err(ValidationError::InvalidVariant {
                field: "status",
                value: s.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Pending".parse::<ExpenseStatus>().unwrap(), ExpenseStatus::Pending);
        assert!("archived".parse::<ExpenseStatus>().is_err());
    }

    #[test]
    fn column_mapping_round_trips() {
        for status in ExpenseStatus::ALL {
            assert_eq!(ExpenseStatus::from_column_name(status.column_name()), Some(status));
        }
    }

    #[test]
    fn custom_columns_have_no_status() {
        assert_eq!(ExpenseStatus::from_column_name("Backlog"), None);
        assert_eq!(ExpenseStatus::from_column_name("to log"), None);
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&ExpenseStatus::Reimbursable).unwrap();
        assert_eq!(json, "\"reimbursable\"");
    }
}
