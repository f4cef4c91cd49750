//! Employee records as seen by payroll.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::payroll::PayrollError;
use crate::payroll::calc::validate_rate;

/// Employment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    /// Currently employed; included in new payroll runs.
    Active,
    /// No longer employed.
    Resigned,
}

impl EmployeeStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Resigned => "resigned",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "resigned" => Some(Self::Resigned),
            _ => None,
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compensation terms of an employee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayTerms {
    /// Monthly base pay.
    pub base_pay_amount: Decimal,
    /// Monthly housing allowance.
    pub housing_allowance: Decimal,
    /// Employee provident fund rate.
    pub pf_rate_employee: Decimal,
    /// Employer provident fund rate.
    pub pf_rate_employer: Decimal,
}

impl PayTerms {
    /// Checks amounts are non-negative and rates are fractions.
    pub fn validate(self) -> Result<Self, PayrollError> {
        if self.base_pay_amount < Decimal::ZERO {
            return Err(PayrollError::NegativeAmount("basePayAmount"));
        }
        if self.housing_allowance < Decimal::ZERO {
            return Err(PayrollError::NegativeAmount("housingAllowance"));
        }
        validate_rate("pfRateEmployee", self.pf_rate_employee)?;
        validate_rate("pfRateEmployer", self.pf_rate_employer)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_terms_validation() {
        let terms = PayTerms {
            base_pay_amount: dec!(30000),
            housing_allowance: dec!(0),
            pf_rate_employee: dec!(0.03),
            pf_rate_employer: dec!(0.03),
        };
        assert!(terms.validate().is_ok());

        let bad = PayTerms {
            base_pay_amount: dec!(-1),
            ..terms
        };
        assert_eq!(bad.validate(), Err(PayrollError::NegativeAmount("basePayAmount")));

        let bad = PayTerms {
            pf_rate_employee: dec!(3),
            ..terms
        };
        assert_eq!(bad.validate(), Err(PayrollError::InvalidRate("pfRateEmployee")));
    }
}
