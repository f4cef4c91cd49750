//! Payroll run item repository.
//!
//! Items store [`PayrollItemValues`] column by column; the free-form line
//! lists live in JSONB columns.

use hrms_core::payroll::{
    Adjustment, EmployeeFlags, ItemPatch, ManualFlags, PayrollItemValues, RunLifecycle,
    plan_adjustment,
};
use hrms_shared::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::entities::{payroll_run_items, payroll_runs};
use crate::error::map_db_err;
use crate::repositories::payroll_run::PayrollRunRepository;
use crate::transactor::TenantScope;

fn decode_lines<T: DeserializeOwned>(column: &str, value: &serde_json::Value) -> AppResult<Vec<T>> {
    serde_json::from_value(value.clone())
        .map_err(|e| AppError::internal(format!("corrupt {column} column: {e}")))
}

fn encode_lines<T: serde::Serialize>(column: &str, lines: &[T]) -> AppResult<serde_json::Value> {
    serde_json::to_value(lines)
        .map_err(|e| AppError::internal(format!("cannot encode {column}: {e}")))
}

/// Reads the figures stored on an item row.
///
/// # Errors
///
/// Returns `internal` when a JSON line column cannot be decoded.
pub fn item_values(item: &payroll_run_items::Model) -> AppResult<PayrollItemValues> {
    Ok(PayrollItemValues {
        salary: item.salary,
        ot_hours: item.ot_hours,
        ot_amount: item.ot_amount,
        bonus: item.bonus,
        housing_allowance: item.housing_allowance,
        attendance_bonus_no_late: item.attendance_bonus_no_late,
        attendance_bonus_no_leave: item.attendance_bonus_no_leave,
        leave_compensation: item.leave_compensation,
        others_income: decode_lines("others_income", &item.others_income)?,
        leave_days_qty: item.leave_days_qty,
        leave_days_deduction: item.leave_days_deduction,
        leave_hours_qty: item.leave_hours_qty,
        leave_hours_deduction: item.leave_hours_deduction,
        leave_double_qty: item.leave_double_qty,
        leave_double_deduction: item.leave_double_deduction,
        late_minutes_qty: item.late_minutes_qty,
        late_minutes_deduction: item.late_minutes_deduction,
        sso_month_amount: item.sso_month_amount,
        sso_month_employer: item.sso_month_employer,
        tax_month_amount: item.tax_month_amount,
        pf_month_amount: item.pf_month_amount,
        pf_month_employer: item.pf_month_employer,
        advance_amount: item.advance_amount,
        advance_repay: item.advance_repay,
        advance_diff: item.advance_diff,
        loan_repayments: decode_lines("loan_repayments", &item.loan_repayments)?,
        loan_outstanding_prev: item.loan_outstanding_prev,
        loan_outstanding_total: item.loan_outstanding_total,
        water_meter_prev: item.water_meter_prev,
        water_meter_curr: item.water_meter_curr,
        water_amount: item.water_amount,
        electric_meter_prev: item.electric_meter_prev,
        electric_meter_curr: item.electric_meter_curr,
        electric_amount: item.electric_amount,
        internet_amount: item.internet_amount,
        doctor_fee: item.doctor_fee,
        others_deduction: decode_lines("others_deduction", &item.others_deduction)?,
        sso_accum_prev: item.sso_accum_prev,
        sso_accum_total: item.sso_accum_total,
        tax_accum_prev: item.tax_accum_prev,
        tax_accum_total: item.tax_accum_total,
        pf_accum_prev: item.pf_accum_prev,
        pf_accum_total: item.pf_accum_total,
        income_total: item.income_total,
        deduction_total: item.deduction_total,
        net_pay: item.net_pay,
        flags: EmployeeFlags {
            allow_water: item.allow_water,
            allow_electric: item.allow_electric,
            allow_internet: item.allow_internet,
            allow_doctor_fee: item.allow_doctor_fee,
            sso_contribute: item.sso_contribute,
            provident_fund_contribute: item.provident_fund_contribute,
            withhold_tax: item.withhold_tax,
        },
        manual: ManualFlags {
            is_manual_tax: item.is_manual_tax,
            is_manual_pf: item.is_manual_pf,
            is_manual_internet: item.is_manual_internet,
            is_manual_water: item.is_manual_water,
            is_manual_electric: item.is_manual_electric,
        },
    })
}

/// Writes every figure of `values` onto `active`.
///
/// # Errors
///
/// Returns `internal` when a line list cannot be encoded.
pub fn write_values(
    active: &mut payroll_run_items::ActiveModel,
    values: &PayrollItemValues,
) -> AppResult<()> {
    active.salary = Set(values.salary);
    active.ot_hours = Set(values.ot_hours);
    active.ot_amount = Set(values.ot_amount);
    active.bonus = Set(values.bonus);
    active.housing_allowance = Set(values.housing_allowance);
    active.attendance_bonus_no_late = Set(values.attendance_bonus_no_late);
    active.attendance_bonus_no_leave = Set(values.attendance_bonus_no_leave);
    active.leave_compensation = Set(values.leave_compensation);
    active.others_income = Set(encode_lines("others_income", &values.others_income)?);

    active.leave_days_qty = Set(values.leave_days_qty);
    active.leave_days_deduction = Set(values.leave_days_deduction);
    active.leave_hours_qty = Set(values.leave_hours_qty);
    active.leave_hours_deduction = Set(values.leave_hours_deduction);
    active.leave_double_qty = Set(values.leave_double_qty);
    active.leave_double_deduction = Set(values.leave_double_deduction);
    active.late_minutes_qty = Set(values.late_minutes_qty);
    active.late_minutes_deduction = Set(values.late_minutes_deduction);

    active.sso_month_amount = Set(values.sso_month_amount);
    active.sso_month_employer = Set(values.sso_month_employer);
    active.tax_month_amount = Set(values.tax_month_amount);
    active.pf_month_amount = Set(values.pf_month_amount);
    active.pf_month_employer = Set(values.pf_month_employer);

    active.advance_amount = Set(values.advance_amount);
    active.advance_repay = Set(values.advance_repay);
    active.advance_diff = Set(values.advance_diff);
    active.loan_repayments = Set(encode_lines("loan_repayments", &values.loan_repayments)?);
    active.loan_outstanding_prev = Set(values.loan_outstanding_prev);
    active.loan_outstanding_total = Set(values.loan_outstanding_total);

    active.water_meter_prev = Set(values.water_meter_prev);
    active.water_meter_curr = Set(values.water_meter_curr);
    active.water_amount = Set(values.water_amount);
    active.electric_meter_prev = Set(values.electric_meter_prev);
    active.electric_meter_curr = Set(values.electric_meter_curr);
    active.electric_amount = Set(values.electric_amount);
    active.internet_amount = Set(values.internet_amount);
    active.doctor_fee = Set(values.doctor_fee);
    active.others_deduction = Set(encode_lines("others_deduction", &values.others_deduction)?);

    active.sso_accum_prev = Set(values.sso_accum_prev);
    active.sso_accum_total = Set(values.sso_accum_total);
    active.tax_accum_prev = Set(values.tax_accum_prev);
    active.tax_accum_total = Set(values.tax_accum_total);
    active.pf_accum_prev = Set(values.pf_accum_prev);
    active.pf_accum_total = Set(values.pf_accum_total);

    active.income_total = Set(values.income_total);
    active.deduction_total = Set(values.deduction_total);
    active.net_pay = Set(values.net_pay);

    active.allow_water = Set(values.flags.allow_water);
    active.allow_electric = Set(values.flags.allow_electric);
    active.allow_internet = Set(values.flags.allow_internet);
    active.allow_doctor_fee = Set(values.flags.allow_doctor_fee);
    active.sso_contribute = Set(values.flags.sso_contribute);
    active.provident_fund_contribute = Set(values.flags.provident_fund_contribute);
    active.withhold_tax = Set(values.flags.withhold_tax);

    active.is_manual_tax = Set(values.manual.is_manual_tax);
    active.is_manual_pf = Set(values.manual.is_manual_pf);
    active.is_manual_internet = Set(values.manual.is_manual_internet);
    active.is_manual_water = Set(values.manual.is_manual_water);
    active.is_manual_electric = Set(values.manual.is_manual_electric);

    Ok(())
}

/// An item after a successful adjustment.
#[derive(Debug, Clone)]
pub struct AdjustedItem {
    /// The stored item.
    pub item: payroll_run_items::Model,
    /// Owning run.
    pub run: payroll_runs::Model,
    /// Field-level delta.
    pub adjustment: Adjustment,
}

/// Payroll item repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayrollItemRepository;

fn scoped(
    query: Select<payroll_run_items::Entity>,
    scope: &TenantScope,
) -> Select<payroll_run_items::Entity> {
    let query = query
        .filter(payroll_run_items::Column::CompanyId.eq(scope.company_id))
        .filter(payroll_run_items::Column::DeletedAt.is_null());
    if scope.branch_ids.is_empty() {
        query
    } else {
        query.filter(payroll_run_items::Column::BranchId.is_in(scope.branch_ids.clone()))
    }
}

impl PayrollItemRepository {
    /// Inserts a new item for `employee_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        run: &payroll_runs::Model,
        employee_id: Uuid,
        values: &PayrollItemValues,
        actor: Uuid,
    ) -> AppResult<payroll_run_items::Model> {
        let now = chrono::Utc::now().into();
        let mut active = payroll_run_items::ActiveModel {
            id: Set(Uuid::now_v7()),
            run_id: Set(run.id),
            company_id: Set(run.company_id),
            branch_id: Set(run.branch_id),
            employee_id: Set(employee_id),
            updated_by: Set(Some(actor)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };
        write_values(&mut active, values)?;
        active.insert(conn).await.map_err(map_db_err)
    }

    /// Lists the non-deleted items of a run.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_for_run<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        run_id: Uuid,
    ) -> AppResult<Vec<payroll_run_items::Model>> {
        scoped(payroll_run_items::Entity::find(), scope)
            .filter(payroll_run_items::Column::RunId.eq(run_id))
            .order_by_asc(payroll_run_items::Column::CreatedAt)
            .order_by_asc(payroll_run_items::Column::Id)
            .all(conn)
            .await
            .map_err(map_db_err)
    }

    /// Finds a non-deleted item visible in `scope`.
    ///
    /// # Errors
    ///
    /// Returns `not_found` if the item is missing or outside the scope.
    pub async fn find<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> AppResult<payroll_run_items::Model> {
        scoped(payroll_run_items::Entity::find_by_id(id), scope)
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("payroll item not found"))
    }

    /// Applies `patch` to an item of a pending run.
    ///
    /// The owning run is locked for the duration of the transaction, then the
    /// item is read again under its own row lock. Concurrent adjustments of
    /// items in the same run therefore apply one after the other, each on top
    /// of the previous commit.
    ///
    /// # Errors
    ///
    /// Returns `not_found` for unknown items, `bad_request` when the run is
    /// not pending or the patch is invalid, `conflict` when a field is not
    /// allowed for the employee.
    pub async fn adjust<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
        patch: &ItemPatch,
        actor: Uuid,
    ) -> AppResult<AdjustedItem> {
        let run_id = Self::find(conn, scope, id).await?.run_id;
        let run = PayrollRunRepository::find_for_update(conn, scope, run_id).await?;
        RunLifecycle::ensure_adjustable(run.status.into())?;

        let item = scoped(payroll_run_items::Entity::find_by_id(id), scope)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("payroll item not found"))?;

        let current = item_values(&item)?;
        let adjustment = plan_adjustment(&current, patch)?;

        let mut active: payroll_run_items::ActiveModel = item.into();
        write_values(&mut active, &adjustment.values)?;
        active.updated_by = Set(Some(actor));
        active.updated_at = Set(chrono::Utc::now().into());
        let item = active.update(conn).await.map_err(map_db_err)?;

        Ok(AdjustedItem {
            item,
            run,
            adjustment,
        })
    }
}
