//! Payroll domain types.
//!
//! This module defines the run status machine states, accumulator kinds,
//! JSON line items stored on run items and the employee permission flags
//! copied onto every item.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Payroll run status.
///
/// The valid transitions are:
/// - Processing → Pending (items generated)
/// - Pending → Processing (bulk edit reset)
/// - Pending → Approved (admin approval, terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Items are being generated or bulk-edited.
    Processing,
    /// Items are ready for review and adjustment.
    Pending,
    /// Run is approved and immutable.
    Approved,
}

impl RunStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Pending => "pending",
            Self::Approved => "approved",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "processing" => Some(Self::Processing),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            _ => None,
        }
    }

    /// Returns true while the run may still be soft-deleted or edited.
    #[must_use]
    pub const fn is_mutable(&self) -> bool {
        matches!(self, Self::Processing | Self::Pending)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of per-employee running total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccumType {
    /// Withheld income tax (per year).
    Tax,
    /// Employee social security contribution (per year).
    Sso,
    /// Employer social security contribution (per year).
    SsoEmployer,
    /// Employee provident fund contribution (all-time).
    Pf,
    /// Employer provident fund contribution (all-time).
    PfEmployer,
    /// Remaining loan balance (all-time, never negative).
    LoanOutstanding,
}

impl AccumType {
    /// All accumulator kinds.
    pub const ALL: [Self; 6] = [
        Self::Tax,
        Self::Sso,
        Self::SsoEmployer,
        Self::Pf,
        Self::PfEmployer,
        Self::LoanOutstanding,
    ];

    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tax => "tax",
            Self::Sso => "sso",
            Self::SsoEmployer => "sso_employer",
            Self::Pf => "pf",
            Self::PfEmployer => "pf_employer",
            Self::LoanOutstanding => "loan_outstanding",
        }
    }

    /// Parses a kind from a string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == s)
    }

    /// Returns true when the accumulator is partitioned by year.
    #[must_use]
    pub const fn is_yearly(&self) -> bool {
        matches!(self, Self::Tax | Self::Sso | Self::SsoEmployer)
    }

    /// Year key for this kind: `Some(year)` when yearly, `None` otherwise.
    #[must_use]
    pub const fn year_key(&self, year: i32) -> Option<i32> {
        if self.is_yearly() { Some(year) } else { None }
    }

    /// Returns true when the balance is clamped at zero.
    #[must_use]
    pub const fn is_clamped(&self) -> bool {
        matches!(self, Self::LoanOutstanding)
    }
}

impl fmt::Display for AccumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form income or deduction line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Display label.
    #[serde(alias = "description")]
    pub label: String,
    /// Amount of the line.
    #[serde(alias = "amount")]
    pub value: Decimal,
}

/// Repayment towards an employee loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRepayment {
    /// Loan the repayment belongs to, if tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<Uuid>,
    /// Display description.
    #[serde(alias = "label", default)]
    pub description: String,
    /// Repaid amount.
    #[serde(alias = "value")]
    pub amount: Decimal,
}

/// Sums the `value` of every line.
#[must_use]
pub fn sum_lines(lines: &[LineItem]) -> Decimal {
    lines.iter().map(|line| line.value).sum()
}

/// Sums the `amount` of every repayment.
#[must_use]
pub fn sum_repayments(repayments: &[LoanRepayment]) -> Decimal {
    repayments.iter().map(|r| r.amount).sum()
}

/// Employee permission flags copied onto each run item.
///
/// The copy freezes what was allowed when the run was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmployeeFlags {
    /// Water charges may be deducted.
    pub allow_water: bool,
    /// Electric charges may be deducted.
    pub allow_electric: bool,
    /// Internet charges may be deducted.
    pub allow_internet: bool,
    /// Doctor fee may be deducted.
    pub allow_doctor_fee: bool,
    /// Employee pays social security.
    pub sso_contribute: bool,
    /// Employee pays into the provident fund.
    pub provident_fund_contribute: bool,
    /// Income tax is withheld.
    pub withhold_tax: bool,
}

/// Manual-override markers on a run item.
///
/// A set flag means a person entered the value and automated
/// recomputation must leave the cell alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualFlags {
    /// Tax entered manually.
    pub is_manual_tax: bool,
    /// Provident fund entered manually.
    pub is_manual_pf: bool,
    /// Internet charge entered manually.
    pub is_manual_internet: bool,
    /// Water charge entered manually.
    pub is_manual_water: bool,
    /// Electric charge entered manually.
    pub is_manual_electric: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_run_status_parse() {
        assert_eq!(RunStatus::parse("pending"), Some(RunStatus::Pending));
        assert_eq!(RunStatus::parse("APPROVED"), Some(RunStatus::Approved));
        assert_eq!(RunStatus::parse("draft"), None);
        assert!(RunStatus::Processing.is_mutable());
        assert!(!RunStatus::Approved.is_mutable());
    }

    #[test]
    fn test_accum_year_partitioning() {
        assert_eq!(AccumType::Tax.year_key(2025), Some(2025));
        assert_eq!(AccumType::SsoEmployer.year_key(2025), Some(2025));
        assert_eq!(AccumType::Pf.year_key(2025), None);
        assert_eq!(AccumType::LoanOutstanding.year_key(2025), None);
        assert_eq!(AccumType::parse("sso_employer"), Some(AccumType::SsoEmployer));
        assert_eq!(AccumType::parse("bonus"), None);
    }

    #[test]
    fn test_line_item_accepts_both_key_spellings() {
        let lines: Vec<LineItem> = serde_json::from_str(
            r#"[{"label":"shift","value":"100.50"},{"description":"gift","amount":"20"}]"#,
        )
        .unwrap();
        assert_eq!(lines[1].label, "gift");
        assert_eq!(sum_lines(&lines), dec!(120.50));
    }

    #[test]
    fn test_loan_repayment_accepts_label_value() {
        let repayments: Vec<LoanRepayment> =
            serde_json::from_str(r#"[{"label":"car","value":"500"},{"amount":"250"}]"#).unwrap();
        assert_eq!(repayments[0].description, "car");
        assert_eq!(repayments[1].description, "");
        assert_eq!(sum_repayments(&repayments), dec!(750));
    }
}
