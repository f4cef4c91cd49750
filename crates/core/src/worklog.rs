//! Attendance worklog entries feeding payroll deductions and overtime.

use std::fmt;

use hrms_shared::AppError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of worklog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Minutes late.
    Late,
    /// Full leave days.
    LeaveDay,
    /// Leave hours.
    LeaveHours,
    /// Leave charged at double rate, in days.
    LeaveDouble,
    /// Overtime hours.
    Ot,
}

impl EntryType {
    /// Returns the string representation of the entry type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Late => "late",
            Self::LeaveDay => "leave_day",
            Self::LeaveHours => "leave_hours",
            Self::LeaveDouble => "leave_double",
            Self::Ot => "ot",
        }
    }

    /// Parses an entry type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "late" => Some(Self::Late),
            "leave_day" => Some(Self::LeaveDay),
            "leave_hours" => Some(Self::LeaveHours),
            "leave_double" => Some(Self::LeaveDouble),
            "ot" => Some(Self::Ot),
            _ => None,
        }
    }

    /// Checks that `quantity` is meaningful for this entry type.
    ///
    /// Quantities are positive; late entries count whole minutes.
    pub fn validate_quantity(self, quantity: Decimal) -> Result<Decimal, AppError> {
        if quantity <= Decimal::ZERO {
            return Err(AppError::bad_request("quantity must be greater than zero"));
        }
        if self == Self::Late && !quantity.fract().is_zero() {
            return Err(AppError::bad_request("late quantity must be whole minutes"));
        }
        Ok(quantity)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_wire_names() {
        assert_eq!(EntryType::parse("leave_hours"), Some(EntryType::LeaveHours));
        assert_eq!(EntryType::parse("LATE"), None);
        let json = serde_json::to_value(EntryType::LeaveDouble).unwrap();
        assert_eq!(json, serde_json::json!("leave_double"));
    }

    #[test]
    fn test_quantity_rules() {
        assert_eq!(EntryType::Late.validate_quantity(dec!(15)), Ok(dec!(15)));
        assert!(EntryType::Late.validate_quantity(dec!(1.5)).is_err());
        assert!(EntryType::LeaveHours.validate_quantity(dec!(1.5)).is_ok());
        assert!(EntryType::Ot.validate_quantity(Decimal::ZERO).is_err());
    }
}
