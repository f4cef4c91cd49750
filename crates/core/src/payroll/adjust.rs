//! Sparse patches over payroll run items.
//!
//! A field that is absent from the request body is [`Patch::Unchanged`];
//! a field that is present (including an explicit `null` on nullable
//! columns) is [`Patch::Set`]. [`plan_adjustment`] validates a patch
//! against the item's frozen permission flags, applies it, latches the
//! manual-override markers and returns the new values plus a delta map
//! for the audit log.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::payroll::error::{GuardedResource, PayrollError};
use crate::payroll::item::PayrollItemValues;
use crate::payroll::types::{LineItem, LoanRepayment};

/// Presence-aware field update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    /// Field absent from the request.
    Unchanged,
    /// Field present with this value.
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Unchanged
    }
}

impl<T> Patch<T> {
    /// Returns true when the field was present.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    /// Borrows the value, if present.
    #[must_use]
    pub const fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Unchanged => None,
        }
    }
}

impl<T> Patch<Option<T>> {
    /// Returns true when the field was set to a non-null value.
    #[must_use]
    pub const fn is_set_some(&self) -> bool {
        matches!(self, Self::Set(Some(_)))
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Self::Set)
    }
}

/// Write-allowed columns of a payroll run item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
#[allow(missing_docs)]
pub struct ItemPatch {
    pub ot_hours: Patch<Decimal>,
    pub ot_amount: Patch<Decimal>,
    pub bonus: Patch<Decimal>,
    pub attendance_bonus_no_late: Patch<Decimal>,
    pub attendance_bonus_no_leave: Patch<Decimal>,
    pub leave_compensation: Patch<Decimal>,
    pub others_income: Patch<Vec<LineItem>>,

    pub leave_days_qty: Patch<Decimal>,
    pub leave_days_deduction: Patch<Decimal>,
    pub leave_hours_qty: Patch<Decimal>,
    pub leave_hours_deduction: Patch<Decimal>,
    pub leave_double_qty: Patch<Decimal>,
    pub leave_double_deduction: Patch<Decimal>,
    pub late_minutes_qty: Patch<Decimal>,
    pub late_minutes_deduction: Patch<Decimal>,

    pub sso_month_amount: Patch<Decimal>,
    pub tax_month_amount: Patch<Decimal>,
    pub pf_month_amount: Patch<Decimal>,

    pub advance_repay: Patch<Decimal>,
    pub loan_repayments: Patch<Vec<LoanRepayment>>,

    pub water_meter_prev: Patch<Option<Decimal>>,
    pub water_meter_curr: Patch<Option<Decimal>>,
    pub water_amount: Patch<Decimal>,
    pub electric_meter_prev: Patch<Option<Decimal>>,
    pub electric_meter_curr: Patch<Option<Decimal>>,
    pub electric_amount: Patch<Decimal>,
    pub internet_amount: Patch<Decimal>,
    pub doctor_fee: Patch<Decimal>,
    pub others_deduction: Patch<Vec<LineItem>>,
}

/// Old and new value of one changed field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    /// Value before the update.
    pub from: Value,
    /// Value after the update.
    pub to: Value,
}

/// Result of a validated patch.
#[derive(Debug, Clone, PartialEq)]
pub struct Adjustment {
    /// Item values to persist.
    pub values: PayrollItemValues,
    /// Changed fields keyed by their camelCase name.
    pub changes: BTreeMap<&'static str, FieldChange>,
}

impl Adjustment {
    /// Delta map in the shape stored in audit details.
    #[must_use]
    pub fn changes_json(&self) -> serde_json::Map<String, Value> {
        self.changes
            .iter()
            .map(|(field, change)| {
                let mut entry = serde_json::Map::new();
                entry.insert("from".to_string(), change.from.clone());
                entry.insert("to".to_string(), change.to.clone());
                ((*field).to_string(), Value::Object(entry))
            })
            .collect()
    }
}

#[derive(Default)]
struct Changes(BTreeMap<&'static str, FieldChange>);

impl Changes {
    fn record<T: Serialize>(&mut self, field: &'static str, from: &T, to: &T) {
        self.0.insert(
            field,
            FieldChange {
                from: serde_json::to_value(from).unwrap_or(Value::Null),
                to: serde_json::to_value(to).unwrap_or(Value::Null),
            },
        );
    }

    fn apply<T>(&mut self, field: &'static str, target: &mut T, patch: &Patch<T>) -> bool
    where
        T: Clone + PartialEq + Serialize,
    {
        match patch {
            Patch::Set(value) if value != target => {
                self.record(field, target, value);
                *target = value.clone();
                true
            }
            _ => false,
        }
    }

    fn latch(&mut self, field: &'static str, flag: &mut bool, changed: bool) {
        if changed && !*flag {
            self.record(field, &false, &true);
            *flag = true;
        }
    }
}

fn check_permissions(current: &PayrollItemValues, patch: &ItemPatch) -> Result<(), PayrollError> {
    let flags = current.flags;
    let guards = [
        (
            GuardedResource::Water,
            flags.allow_water,
            patch.water_amount.is_set()
                || patch.water_meter_prev.is_set_some()
                || patch.water_meter_curr.is_set_some(),
        ),
        (
            GuardedResource::Electric,
            flags.allow_electric,
            patch.electric_amount.is_set()
                || patch.electric_meter_prev.is_set_some()
                || patch.electric_meter_curr.is_set_some(),
        ),
        (
            GuardedResource::Internet,
            flags.allow_internet,
            patch.internet_amount.is_set(),
        ),
        (
            GuardedResource::DoctorFee,
            flags.allow_doctor_fee,
            patch.doctor_fee.is_set(),
        ),
        (
            GuardedResource::SocialSecurity,
            flags.sso_contribute,
            patch.sso_month_amount.is_set(),
        ),
        (
            GuardedResource::ProvidentFund,
            flags.provident_fund_contribute,
            patch.pf_month_amount.is_set(),
        ),
        (
            GuardedResource::Tax,
            flags.withhold_tax,
            patch.tax_month_amount.is_set(),
        ),
    ];

    match guards
        .into_iter()
        .find(|(_, allowed, requested)| *requested && !*allowed)
    {
        Some((resource, _, _)) => Err(PayrollError::NotAllowed(resource)),
        None => Ok(()),
    }
}

fn non_negative(field: &'static str, value: Option<&Decimal>) -> Result<(), PayrollError> {
    match value {
        Some(v) if *v < Decimal::ZERO => Err(PayrollError::NegativeAmount(field)),
        _ => Ok(()),
    }
}

fn check_amounts(patch: &ItemPatch) -> Result<(), PayrollError> {
    let scalars = [
        ("otHours", &patch.ot_hours),
        ("otAmount", &patch.ot_amount),
        ("bonus", &patch.bonus),
        ("attendanceBonusNoLate", &patch.attendance_bonus_no_late),
        ("attendanceBonusNoLeave", &patch.attendance_bonus_no_leave),
        ("leaveCompensation", &patch.leave_compensation),
        ("leaveDaysQty", &patch.leave_days_qty),
        ("leaveDaysDeduction", &patch.leave_days_deduction),
        ("leaveHoursQty", &patch.leave_hours_qty),
        ("leaveHoursDeduction", &patch.leave_hours_deduction),
        ("leaveDoubleQty", &patch.leave_double_qty),
        ("leaveDoubleDeduction", &patch.leave_double_deduction),
        ("lateMinutesQty", &patch.late_minutes_qty),
        ("lateMinutesDeduction", &patch.late_minutes_deduction),
        ("ssoMonthAmount", &patch.sso_month_amount),
        ("taxMonthAmount", &patch.tax_month_amount),
        ("pfMonthAmount", &patch.pf_month_amount),
        ("advanceRepay", &patch.advance_repay),
        ("waterAmount", &patch.water_amount),
        ("electricAmount", &patch.electric_amount),
        ("internetAmount", &patch.internet_amount),
        ("doctorFee", &patch.doctor_fee),
    ];
    for (field, value) in scalars {
        non_negative(field, value.as_set())?;
    }

    let meters = [
        ("waterMeterPrev", &patch.water_meter_prev),
        ("waterMeterCurr", &patch.water_meter_curr),
        ("electricMeterPrev", &patch.electric_meter_prev),
        ("electricMeterCurr", &patch.electric_meter_curr),
    ];
    for (field, value) in meters {
        non_negative(field, value.as_set().and_then(Option::as_ref))?;
    }

    for line in patch.others_income.as_set().into_iter().flatten() {
        non_negative("othersIncome", Some(&line.value))?;
    }
    for line in patch.others_deduction.as_set().into_iter().flatten() {
        non_negative("othersDeduction", Some(&line.value))?;
    }
    for repayment in patch.loan_repayments.as_set().into_iter().flatten() {
        non_negative("loanRepayments", Some(&repayment.amount))?;
    }
    Ok(())
}

fn check_balances(current: &PayrollItemValues, patch: &ItemPatch) -> Result<(), PayrollError> {
    if let Some(repay) = patch.advance_repay.as_set() {
        let has_advance = current.advance_amount > Decimal::ZERO
            || current.advance_repay > Decimal::ZERO;
        if *repay > Decimal::ZERO && !has_advance {
            return Err(PayrollError::NoOutstandingAdvance);
        }
    }

    if let Some(repayments) = patch.loan_repayments.as_set() {
        let has_loan = current.loan_outstanding_total > Decimal::ZERO
            || !current.loan_repayments.is_empty();
        if !repayments.is_empty() && !has_loan {
            return Err(PayrollError::NoOutstandingLoan);
        }
    }
    Ok(())
}

/// Validates `patch` against `current` and computes the updated item.
///
/// # Errors
///
/// - `NotAllowed` when a field is guarded by a permission flag that is off
/// - `NegativeAmount` for negative money or quantities
/// - `NoOutstandingAdvance` / `NoOutstandingLoan` for repayments without a balance
/// - `NoFieldsToUpdate` when nothing would change
pub fn plan_adjustment(
    current: &PayrollItemValues,
    patch: &ItemPatch,
) -> Result<Adjustment, PayrollError> {
    check_permissions(current, patch)?;
    check_amounts(patch)?;
    check_balances(current, patch)?;

    let mut next = current.clone();
    let mut changes = Changes::default();

    changes.apply("otHours", &mut next.ot_hours, &patch.ot_hours);
    changes.apply("otAmount", &mut next.ot_amount, &patch.ot_amount);
    changes.apply("bonus", &mut next.bonus, &patch.bonus);
    changes.apply(
        "attendanceBonusNoLate",
        &mut next.attendance_bonus_no_late,
        &patch.attendance_bonus_no_late,
    );
    changes.apply(
        "attendanceBonusNoLeave",
        &mut next.attendance_bonus_no_leave,
        &patch.attendance_bonus_no_leave,
    );
    changes.apply(
        "leaveCompensation",
        &mut next.leave_compensation,
        &patch.leave_compensation,
    );
    changes.apply("othersIncome", &mut next.others_income, &patch.others_income);

    changes.apply("leaveDaysQty", &mut next.leave_days_qty, &patch.leave_days_qty);
    changes.apply(
        "leaveDaysDeduction",
        &mut next.leave_days_deduction,
        &patch.leave_days_deduction,
    );
    changes.apply("leaveHoursQty", &mut next.leave_hours_qty, &patch.leave_hours_qty);
    changes.apply(
        "leaveHoursDeduction",
        &mut next.leave_hours_deduction,
        &patch.leave_hours_deduction,
    );
    changes.apply("leaveDoubleQty", &mut next.leave_double_qty, &patch.leave_double_qty);
    changes.apply(
        "leaveDoubleDeduction",
        &mut next.leave_double_deduction,
        &patch.leave_double_deduction,
    );
    changes.apply("lateMinutesQty", &mut next.late_minutes_qty, &patch.late_minutes_qty);
    changes.apply(
        "lateMinutesDeduction",
        &mut next.late_minutes_deduction,
        &patch.late_minutes_deduction,
    );

    changes.apply("ssoMonthAmount", &mut next.sso_month_amount, &patch.sso_month_amount);
    let tax = changes.apply("taxMonthAmount", &mut next.tax_month_amount, &patch.tax_month_amount);
    let pf = changes.apply("pfMonthAmount", &mut next.pf_month_amount, &patch.pf_month_amount);

    changes.apply("advanceRepay", &mut next.advance_repay, &patch.advance_repay);
    changes.apply("loanRepayments", &mut next.loan_repayments, &patch.loan_repayments);

    changes.apply("waterMeterPrev", &mut next.water_meter_prev, &patch.water_meter_prev);
    changes.apply("waterMeterCurr", &mut next.water_meter_curr, &patch.water_meter_curr);
    let water = changes.apply("waterAmount", &mut next.water_amount, &patch.water_amount);
    changes.apply(
        "electricMeterPrev",
        &mut next.electric_meter_prev,
        &patch.electric_meter_prev,
    );
    changes.apply(
        "electricMeterCurr",
        &mut next.electric_meter_curr,
        &patch.electric_meter_curr,
    );
    let electric = changes.apply("electricAmount", &mut next.electric_amount, &patch.electric_amount);
    let internet = changes.apply("internetAmount", &mut next.internet_amount, &patch.internet_amount);
    changes.apply("doctorFee", &mut next.doctor_fee, &patch.doctor_fee);
    changes.apply("othersDeduction", &mut next.others_deduction, &patch.others_deduction);

    if changes.0.is_empty() {
        return Err(PayrollError::NoFieldsToUpdate);
    }

    changes.latch("isManualTax", &mut next.manual.is_manual_tax, tax);
    changes.latch("isManualPf", &mut next.manual.is_manual_pf, pf);
    changes.latch("isManualInternet", &mut next.manual.is_manual_internet, internet);
    changes.latch("isManualWater", &mut next.manual.is_manual_water, water);
    changes.latch("isManualElectric", &mut next.manual.is_manual_electric, electric);

    next.recompute();
    let totals = [
        ("incomeTotal", current.income_total, next.income_total),
        ("deductionTotal", current.deduction_total, next.deduction_total),
        ("netPay", current.net_pay, next.net_pay),
    ];
    for (field, before, after) in totals {
        if before != after {
            changes.record(field, &before, &after);
        }
    }

    Ok(Adjustment {
        values: next,
        changes: changes.0,
    })
}
