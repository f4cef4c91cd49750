//! Item generation arithmetic for new payroll runs.

use chrono::{Datelike, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use crate::payroll::accumulation::AccumSnapshot;
use crate::payroll::error::PayrollError;
use crate::payroll::item::PayrollItemValues;
use crate::payroll::types::EmployeeFlags;

/// Highest monthly wage social security is levied on.
pub const SSO_WAGE_CAP: Decimal = Decimal::from_parts(15000, 0, 0, false, 0);

/// Social security rate used when a run does not name one.
pub const DEFAULT_SSO_RATE: Decimal = Decimal::from_parts(5, 0, 0, false, 2);

/// Rounds a money amount to two places, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Social security contribution for `salary` at `rate`.
#[must_use]
pub fn sso_amount(salary: Decimal, rate: Decimal) -> Decimal {
    round_money(salary.min(SSO_WAGE_CAP) * rate)
}

/// Provident fund contribution for `salary` at `rate`.
#[must_use]
pub fn pf_amount(salary: Decimal, rate: Decimal) -> Decimal {
    round_money(salary * rate)
}

/// Checks that `rate` is a fraction in `[0, 1]`.
pub fn validate_rate(name: &'static str, rate: Decimal) -> Result<Decimal, PayrollError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(PayrollError::InvalidRate(name));
    }
    Ok(rate)
}

/// Frozen parameters of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParameters {
    /// First day of the payroll month.
    pub payroll_month: NaiveDate,
    /// First day of the attendance period.
    pub period_start: NaiveDate,
    /// Day the salaries are paid.
    pub pay_date: NaiveDate,
    /// Employee social security rate.
    pub sso_rate_employee: Decimal,
    /// Employer social security rate.
    pub sso_rate_employer: Decimal,
}

impl RunParameters {
    /// Validates month alignment, date order and rates.
    pub fn validate(self) -> Result<Self, PayrollError> {
        if self.payroll_month.day() != 1 {
            return Err(PayrollError::InvalidPayrollMonth);
        }
        if self.pay_date < self.period_start {
            return Err(PayrollError::PayDateBeforePeriod);
        }
        validate_rate("ssoRateEmployee", self.sso_rate_employee)?;
        validate_rate("ssoRateEmployer", self.sso_rate_employer)?;
        Ok(self)
    }

    /// Year used for yearly accumulators.
    #[must_use]
    pub fn accum_year(&self) -> i32 {
        self.payroll_month.year()
    }
}

/// Employee fields the run snapshot is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeePayProfile {
    /// Employee id.
    pub employee_id: Uuid,
    /// Monthly base pay.
    pub base_pay_amount: Decimal,
    /// Monthly housing allowance.
    pub housing_allowance: Decimal,
    /// Employee provident fund rate.
    pub pf_rate_employee: Decimal,
    /// Employer provident fund rate.
    pub pf_rate_employer: Decimal,
    /// Permission flags.
    pub flags: EmployeeFlags,
}

/// Builds the initial item for one employee.
///
/// Adjustable amounts start at zero; tax is entered later by adjustment.
#[must_use]
pub fn build_item(
    profile: &EmployeePayProfile,
    params: &RunParameters,
    snapshot: AccumSnapshot,
) -> PayrollItemValues {
    let salary = profile.base_pay_amount;
    let flags = profile.flags;

    let (sso_month_amount, sso_month_employer) = if flags.sso_contribute {
        (
            sso_amount(salary, params.sso_rate_employee),
            sso_amount(salary, params.sso_rate_employer),
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    let (pf_month_amount, pf_month_employer) = if flags.provident_fund_contribute {
        (
            pf_amount(salary, profile.pf_rate_employee),
            pf_amount(salary, profile.pf_rate_employer),
        )
    } else {
        (Decimal::ZERO, Decimal::ZERO)
    };

    PayrollItemValues {
        salary,
        housing_allowance: profile.housing_allowance,
        sso_month_amount,
        sso_month_employer,
        pf_month_amount,
        pf_month_employer,
        sso_accum_prev: snapshot.sso,
        tax_accum_prev: snapshot.tax,
        pf_accum_prev: snapshot.pf,
        loan_outstanding_prev: snapshot.loan_outstanding,
        flags,
        ..Default::default()
    }
    .recomputed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn params() -> RunParameters {
        RunParameters {
            payroll_month: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            period_start: NaiveDate::from_ymd_opt(2025, 2, 26).unwrap(),
            pay_date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
            sso_rate_employee: dec!(0.05),
            sso_rate_employer: dec!(0.05),
        }
    }

    fn profile(salary: Decimal, flags: EmployeeFlags) -> EmployeePayProfile {
        EmployeePayProfile {
            employee_id: Uuid::new_v4(),
            base_pay_amount: salary,
            housing_allowance: Decimal::ZERO,
            pf_rate_employee: dec!(0.03),
            pf_rate_employer: dec!(0.03),
            flags,
        }
    }

    #[test]
    fn test_single_employee_run_item() {
        let flags = EmployeeFlags {
            sso_contribute: true,
            ..Default::default()
        };
        let item = build_item(&profile(dec!(30000), flags), &params(), AccumSnapshot::default());

        assert_eq!(item.salary, dec!(30000));
        assert_eq!(item.income_total, dec!(30000));
        assert_eq!(item.sso_month_amount, dec!(750));
        assert_eq!(item.sso_month_employer, dec!(750));
        assert_eq!(item.deduction_total, dec!(750));
        assert_eq!(item.net_pay, dec!(29250));
        assert_eq!(item.tax_month_amount, Decimal::ZERO);
        assert_eq!(item.pf_month_amount, Decimal::ZERO);
    }

    #[rstest]
    #[case(dec!(30000), dec!(0.05), dec!(750))]
    #[case(dec!(10000), dec!(0.05), dec!(500))]
    #[case(dec!(12345), dec!(0.05), dec!(617.25))]
    #[case(dec!(1650.10), dec!(0.05), dec!(82.51))]
    #[case(dec!(15000), dec!(0), dec!(0))]
    fn test_sso_amount(#[case] salary: Decimal, #[case] rate: Decimal, #[case] expected: Decimal) {
        assert_eq!(sso_amount(salary, rate), expected);
    }

    #[test]
    fn test_round_money_half_away_from_zero() {
        assert_eq!(round_money(dec!(0.125)), dec!(0.13));
        assert_eq!(round_money(dec!(-0.125)), dec!(-0.13));
        assert_eq!(round_money(dec!(0.124)), dec!(0.12));
    }

    #[test]
    fn test_pf_only_when_contributing() {
        let flags = EmployeeFlags {
            provident_fund_contribute: true,
            ..Default::default()
        };
        let item = build_item(&profile(dec!(20000), flags), &params(), AccumSnapshot::default());
        assert_eq!(item.pf_month_amount, dec!(600));
        assert_eq!(item.pf_month_employer, dec!(600));
        assert_eq!(item.sso_month_amount, Decimal::ZERO);
        assert_eq!(item.net_pay, dec!(19400));
    }

    #[test]
    fn test_snapshot_carried_into_item() {
        let flags = EmployeeFlags {
            sso_contribute: true,
            ..Default::default()
        };
        let snapshot = AccumSnapshot {
            tax: dec!(1200),
            sso: dec!(1500),
            pf: dec!(0),
            loan_outstanding: dec!(3000),
        };
        let item = build_item(&profile(dec!(30000), flags), &params(), snapshot);
        assert_eq!(item.sso_accum_prev, dec!(1500));
        assert_eq!(item.sso_accum_total, dec!(2250));
        assert_eq!(item.tax_accum_total, dec!(1200));
        assert_eq!(item.loan_outstanding_total, dec!(3000));
    }

    #[test]
    fn test_parameters_validation() {
        assert!(params().validate().is_ok());

        let mut bad = params();
        bad.payroll_month = NaiveDate::from_ymd_opt(2025, 3, 2).unwrap();
        assert_eq!(bad.validate(), Err(PayrollError::InvalidPayrollMonth));

        let mut bad = params();
        bad.pay_date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(bad.validate(), Err(PayrollError::PayDateBeforePeriod));

        let mut bad = params();
        bad.sso_rate_employer = dec!(1.5);
        assert_eq!(bad.validate(), Err(PayrollError::InvalidRate("ssoRateEmployer")));
    }
}
