//! Per-employee payroll item figures and the totals derived from them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::payroll::accumulation::next_balance;
use crate::payroll::types::{
    AccumType, EmployeeFlags, LineItem, LoanRepayment, ManualFlags, sum_lines, sum_repayments,
};

/// Every stored figure of one payroll run item.
///
/// The derived fields (`income_total`, `deduction_total`, `net_pay`,
/// `advance_diff`, the `*_accum_total` snapshots and
/// `loan_outstanding_total`) are only ever written by
/// [`PayrollItemValues::recompute`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayrollItemValues {
    // Income
    /// Base salary for the month.
    pub salary: Decimal,
    /// Overtime hours worked.
    pub ot_hours: Decimal,
    /// Overtime pay.
    pub ot_amount: Decimal,
    /// Bonus paid with this run.
    pub bonus: Decimal,
    /// Housing allowance copied from the employee.
    pub housing_allowance: Decimal,
    /// Attendance bonus for no late arrivals.
    pub attendance_bonus_no_late: Decimal,
    /// Attendance bonus for no leave.
    pub attendance_bonus_no_leave: Decimal,
    /// Compensation for unused leave.
    pub leave_compensation: Decimal,
    /// Additional income lines.
    pub others_income: Vec<LineItem>,

    // Attendance deductions
    /// Leave days taken.
    pub leave_days_qty: Decimal,
    /// Deduction for leave days.
    pub leave_days_deduction: Decimal,
    /// Leave hours taken.
    pub leave_hours_qty: Decimal,
    /// Deduction for leave hours.
    pub leave_hours_deduction: Decimal,
    /// Double-rate leave days taken.
    pub leave_double_qty: Decimal,
    /// Deduction for double-rate leave.
    pub leave_double_deduction: Decimal,
    /// Minutes late.
    pub late_minutes_qty: Decimal,
    /// Deduction for lateness.
    pub late_minutes_deduction: Decimal,

    // Statutory
    /// Employee social security contribution.
    pub sso_month_amount: Decimal,
    /// Employer social security contribution.
    pub sso_month_employer: Decimal,
    /// Income tax withheld.
    pub tax_month_amount: Decimal,
    /// Employee provident fund contribution.
    pub pf_month_amount: Decimal,
    /// Employer provident fund contribution.
    pub pf_month_employer: Decimal,

    // Advance and loans
    /// Outstanding salary advance.
    pub advance_amount: Decimal,
    /// Advance repaid this month.
    pub advance_repay: Decimal,
    /// Advance left after repayment.
    pub advance_diff: Decimal,
    /// Loan repayments taken this month.
    pub loan_repayments: Vec<LoanRepayment>,
    /// Loan balance before this run.
    pub loan_outstanding_prev: Decimal,
    /// Loan balance after this run.
    pub loan_outstanding_total: Decimal,

    // Utilities and other deductions
    /// Previous water meter reading.
    pub water_meter_prev: Option<Decimal>,
    /// Current water meter reading.
    pub water_meter_curr: Option<Decimal>,
    /// Water charge.
    pub water_amount: Decimal,
    /// Previous electric meter reading.
    pub electric_meter_prev: Option<Decimal>,
    /// Current electric meter reading.
    pub electric_meter_curr: Option<Decimal>,
    /// Electric charge.
    pub electric_amount: Decimal,
    /// Internet charge.
    pub internet_amount: Decimal,
    /// Doctor fee.
    pub doctor_fee: Decimal,
    /// Additional deduction lines.
    pub others_deduction: Vec<LineItem>,

    // Accumulator snapshots
    /// Social security paid this year before the run.
    pub sso_accum_prev: Decimal,
    /// Social security paid this year including the run.
    pub sso_accum_total: Decimal,
    /// Tax withheld this year before the run.
    pub tax_accum_prev: Decimal,
    /// Tax withheld this year including the run.
    pub tax_accum_total: Decimal,
    /// Provident fund paid before the run.
    pub pf_accum_prev: Decimal,
    /// Provident fund paid including the run.
    pub pf_accum_total: Decimal,

    // Totals
    /// Sum of all income.
    pub income_total: Decimal,
    /// Sum of all deductions.
    pub deduction_total: Decimal,
    /// `income_total - deduction_total`.
    pub net_pay: Decimal,

    /// Employee permissions frozen at run creation.
    #[serde(flatten)]
    pub flags: EmployeeFlags,
    /// Manual-override markers.
    #[serde(flatten)]
    pub manual: ManualFlags,
}

impl PayrollItemValues {
    /// Sum of all income components.
    #[must_use]
    pub fn income(&self) -> Decimal {
        self.salary
            + self.ot_amount
            + self.bonus
            + self.leave_compensation
            + self.housing_allowance
            + self.attendance_bonus_no_late
            + self.attendance_bonus_no_leave
            + sum_lines(&self.others_income)
    }

    /// Sum of all deduction components.
    #[must_use]
    pub fn deductions(&self) -> Decimal {
        self.late_minutes_deduction
            + self.leave_days_deduction
            + self.leave_double_deduction
            + self.leave_hours_deduction
            + self.sso_month_amount
            + self.tax_month_amount
            + self.pf_month_amount
            + self.water_amount
            + self.electric_amount
            + self.internet_amount
            + self.doctor_fee
            + self.advance_repay
            + sum_repayments(&self.loan_repayments)
            + sum_lines(&self.others_deduction)
    }

    /// Refreshes every derived field from the inputs.
    pub fn recompute(&mut self) {
        self.income_total = self.income();
        self.deduction_total = self.deductions();
        self.net_pay = self.income_total - self.deduction_total;

        self.advance_diff = self.advance_amount - self.advance_repay;
        self.loan_outstanding_total = next_balance(
            AccumType::LoanOutstanding,
            self.loan_outstanding_prev,
            -sum_repayments(&self.loan_repayments),
        );

        self.sso_accum_total = self.sso_accum_prev + self.sso_month_amount;
        self.tax_accum_total = self.tax_accum_prev + self.tax_month_amount;
        self.pf_accum_total = self.pf_accum_prev + self.pf_month_amount;
    }

    /// Returns a copy with derived fields refreshed.
    #[must_use]
    pub fn recomputed(mut self) -> Self {
        self.recompute();
        self
    }

    /// Returns true when the stored totals agree with the inputs.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.clone().recomputed() == *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_totals_cover_every_component() {
        let item = PayrollItemValues {
            salary: dec!(30000),
            ot_amount: dec!(1500),
            bonus: dec!(1000),
            housing_allowance: dec!(2000),
            attendance_bonus_no_late: dec!(300),
            attendance_bonus_no_leave: dec!(200),
            leave_compensation: dec!(100),
            others_income: vec![LineItem {
                label: "shift".to_string(),
                value: dec!(400),
            }],
            late_minutes_deduction: dec!(50),
            leave_days_deduction: dec!(1000),
            leave_hours_deduction: dec!(125),
            leave_double_deduction: dec!(0),
            sso_month_amount: dec!(750),
            tax_month_amount: dec!(500),
            pf_month_amount: dec!(900),
            water_amount: dec!(120),
            electric_amount: dec!(340.50),
            internet_amount: dec!(300),
            doctor_fee: dec!(80),
            advance_amount: dec!(5000),
            advance_repay: dec!(1000),
            loan_outstanding_prev: dec!(2000),
            loan_repayments: vec![LoanRepayment {
                loan_id: None,
                description: "car".to_string(),
                amount: dec!(500),
            }],
            others_deduction: vec![LineItem {
                label: "uniform".to_string(),
                value: dec!(200),
            }],
            ..Default::default()
        }
        .recomputed();

        assert_eq!(item.income_total, dec!(35500));
        assert_eq!(item.deduction_total, dec!(5865.50));
        assert_eq!(item.net_pay, dec!(29634.50));
        assert_eq!(item.advance_diff, dec!(4000));
        assert_eq!(item.loan_outstanding_total, dec!(1500));
        assert!(item.is_consistent());
    }

    #[test]
    fn test_loan_balance_never_negative() {
        let item = PayrollItemValues {
            loan_outstanding_prev: dec!(100),
            loan_repayments: vec![LoanRepayment {
                loan_id: None,
                description: String::new(),
                amount: dec!(250),
            }],
            ..Default::default()
        }
        .recomputed();
        assert_eq!(item.loan_outstanding_total, Decimal::ZERO);
    }

    #[test]
    fn test_accum_totals_follow_month_amounts() {
        let item = PayrollItemValues {
            sso_accum_prev: dec!(1500),
            sso_month_amount: dec!(750),
            tax_accum_prev: dec!(1000),
            tax_month_amount: dec!(600),
            pf_accum_prev: dec!(10),
            ..Default::default()
        }
        .recomputed();
        assert_eq!(item.sso_accum_total, dec!(2250));
        assert_eq!(item.tax_accum_total, dec!(1600));
        assert_eq!(item.pf_accum_total, dec!(10));
    }

    #[test]
    fn test_stale_totals_are_inconsistent() {
        let mut item = PayrollItemValues {
            salary: dec!(100),
            ..Default::default()
        }
        .recomputed();
        assert!(item.is_consistent());
        item.bonus = dec!(1);
        assert!(!item.is_consistent());
    }
}
