//! Accumulator bookkeeping for approved runs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::payroll::item::PayrollItemValues;
use crate::payroll::types::{AccumType, sum_repayments};

/// Applies `delta` to `current` under the rules of `kind`.
///
/// Loan balances never drop below zero; every other kind is a plain sum.
#[must_use]
pub fn next_balance(kind: AccumType, current: Decimal, delta: Decimal) -> Decimal {
    let next = current + delta;
    if kind.is_clamped() && next < Decimal::ZERO {
        Decimal::ZERO
    } else {
        next
    }
}

/// One accumulator increment produced by approving a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumDelta {
    /// Employee the accumulator belongs to.
    pub employee_id: Uuid,
    /// Accumulator kind.
    pub accum_type: AccumType,
    /// Year partition, `None` for all-time kinds.
    pub accum_year: Option<i32>,
    /// Signed change.
    pub amount: Decimal,
}

/// Accumulator values read before a run is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumSnapshot {
    /// Tax withheld in the payroll year.
    pub tax: Decimal,
    /// Social security paid in the payroll year.
    pub sso: Decimal,
    /// Provident fund paid so far.
    pub pf: Decimal,
    /// Remaining loan balance.
    pub loan_outstanding: Decimal,
}

impl AccumSnapshot {
    /// Builds a snapshot from `(kind, amount)` rows of one employee.
    ///
    /// Rows must already be filtered to the payroll year for yearly kinds.
    pub fn from_rows(rows: impl IntoIterator<Item = (AccumType, Decimal)>) -> Self {
        let mut snapshot = Self::default();
        for (kind, amount) in rows {
            match kind {
                AccumType::Tax => snapshot.tax += amount,
                AccumType::Sso => snapshot.sso += amount,
                AccumType::Pf => snapshot.pf += amount,
                AccumType::LoanOutstanding => snapshot.loan_outstanding += amount,
                AccumType::SsoEmployer | AccumType::PfEmployer => {}
            }
        }
        snapshot
    }
}

/// Computes the accumulator increments for one approved item.
///
/// Zero deltas are skipped.
#[must_use]
pub fn item_deltas(employee_id: Uuid, item: &PayrollItemValues, year: i32) -> Vec<AccumDelta> {
    [
        (AccumType::Tax, item.tax_month_amount),
        (AccumType::Sso, item.sso_month_amount),
        (AccumType::SsoEmployer, item.sso_month_employer),
        (AccumType::Pf, item.pf_month_amount),
        (AccumType::PfEmployer, item.pf_month_employer),
        (AccumType::LoanOutstanding, -sum_repayments(&item.loan_repayments)),
    ]
    .into_iter()
    .filter(|(_, amount)| !amount.is_zero())
    .map(|(accum_type, amount)| AccumDelta {
        employee_id,
        accum_type,
        accum_year: accum_type.year_key(year),
        amount,
    })
    .collect()
}

/// Computes the increments for every item of a run.
pub fn approval_deltas<'a>(
    items: impl IntoIterator<Item = (Uuid, &'a PayrollItemValues)>,
    year: i32,
) -> Vec<AccumDelta> {
    items
        .into_iter()
        .flat_map(|(employee_id, item)| item_deltas(employee_id, item, year))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payroll::types::LoanRepayment;
    use rust_decimal_macros::dec;

    #[test]
    fn test_next_balance_clamps_only_loans() {
        assert_eq!(
            next_balance(AccumType::LoanOutstanding, dec!(100), dec!(-150)),
            Decimal::ZERO
        );
        assert_eq!(next_balance(AccumType::Tax, dec!(100), dec!(-150)), dec!(-50));
        assert_eq!(next_balance(AccumType::Sso, dec!(750), dec!(750)), dec!(1500));
    }

    #[test]
    fn test_item_deltas_partition_years() {
        let employee = Uuid::new_v4();
        let item = PayrollItemValues {
            sso_month_amount: dec!(750),
            sso_month_employer: dec!(750),
            pf_month_amount: dec!(900),
            loan_repayments: vec![LoanRepayment {
                loan_id: None,
                description: "car".to_string(),
                amount: dec!(500),
            }],
            ..Default::default()
        };

        let deltas = item_deltas(employee, &item, 2025);
        assert_eq!(deltas.len(), 4);
        assert!(deltas.iter().all(|d| d.employee_id == employee));

        let sso = deltas.iter().find(|d| d.accum_type == AccumType::Sso).unwrap();
        assert_eq!(sso.accum_year, Some(2025));
        assert_eq!(sso.amount, dec!(750));

        let pf = deltas.iter().find(|d| d.accum_type == AccumType::Pf).unwrap();
        assert_eq!(pf.accum_year, None);

        let loan = deltas
            .iter()
            .find(|d| d.accum_type == AccumType::LoanOutstanding)
            .unwrap();
        assert_eq!(loan.amount, dec!(-500));
        assert_eq!(loan.accum_year, None);

        assert!(deltas.iter().all(|d| d.accum_type != AccumType::Tax));
    }

    #[test]
    fn test_snapshot_from_rows() {
        let snapshot = AccumSnapshot::from_rows([
            (AccumType::Tax, dec!(1000)),
            (AccumType::Sso, dec!(1500)),
            (AccumType::SsoEmployer, dec!(1500)),
            (AccumType::LoanOutstanding, dec!(2000)),
        ]);
        assert_eq!(snapshot.tax, dec!(1000));
        assert_eq!(snapshot.sso, dec!(1500));
        assert_eq!(snapshot.pf, Decimal::ZERO);
        assert_eq!(snapshot.loan_outstanding, dec!(2000));
    }
}
