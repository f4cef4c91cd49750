//! Payroll accumulator storage.
//!
//! Yearly kinds (tax, sso, sso employer) are partitioned by `accum_year`;
//! all-time kinds store a NULL year. The unique index folds NULL into `-1`
//! so upserts always hit one row per (employee, kind, year).

use std::collections::HashMap;

use hrms_core::payroll::{AccumDelta, AccumSnapshot, next_balance};
use hrms_shared::AppResult;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, DbBackend, EntityTrait, QueryFilter, QueryOrder,
    Statement,
};
use uuid::Uuid;

use crate::entities::payroll_accumulations;
use crate::error::map_db_err;

const UPSERT_SQL: &str = r"
INSERT INTO payroll_accumulations (id, company_id, employee_id, accum_type, accum_year, amount)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (employee_id, accum_type, (COALESCE(accum_year, -1)))
DO UPDATE SET amount = CASE
    WHEN $8 THEN GREATEST(payroll_accumulations.amount + $7, 0)
    ELSE payroll_accumulations.amount + $7
END
";

/// Accumulation repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccumulationRepository;

impl AccumulationRepository {
    /// Reads the accumulators relevant to `year` for each employee.
    ///
    /// Employees without rows get an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn snapshots<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        employee_ids: &[Uuid],
        year: i32,
    ) -> AppResult<HashMap<Uuid, AccumSnapshot>> {
        if employee_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = payroll_accumulations::Entity::find()
            .filter(payroll_accumulations::Column::CompanyId.eq(company_id))
            .filter(payroll_accumulations::Column::EmployeeId.is_in(employee_ids.to_vec()))
            .filter(
                Condition::any()
                    .add(payroll_accumulations::Column::AccumYear.eq(year))
                    .add(payroll_accumulations::Column::AccumYear.is_null()),
            )
            .all(conn)
            .await
            .map_err(map_db_err)?;

        let mut grouped: HashMap<Uuid, Vec<_>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.employee_id)
                .or_default()
                .push((row.accum_type.into(), row.amount));
        }

        Ok(employee_ids
            .iter()
            .map(|id| {
                let rows = grouped.remove(id).unwrap_or_default();
                (*id, AccumSnapshot::from_rows(rows))
            })
            .collect())
    }

    /// Applies approval deltas.
    ///
    /// Deltas are applied in (employee, kind, year) order so concurrent
    /// approvals lock accumulator rows in the same sequence.
    ///
    /// # Errors
    ///
    /// Returns an error if any upsert fails.
    pub async fn apply<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        mut deltas: Vec<AccumDelta>,
    ) -> AppResult<usize> {
        deltas.sort_by(|a, b| {
            (a.employee_id, a.accum_type.as_str(), a.accum_year).cmp(&(
                b.employee_id,
                b.accum_type.as_str(),
                b.accum_year,
            ))
        });

        for delta in &deltas {
            let initial = next_balance(delta.accum_type, Decimal::ZERO, delta.amount);
            conn.execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                UPSERT_SQL,
                [
                    Uuid::now_v7().into(),
                    company_id.into(),
                    delta.employee_id.into(),
                    delta.accum_type.as_str().into(),
                    delta.accum_year.into(),
                    initial.into(),
                    delta.amount.into(),
                    delta.accum_type.is_clamped().into(),
                ],
            ))
            .await
            .map_err(map_db_err)?;
        }

        Ok(deltas.len())
    }

    /// Lists an employee's accumulators, optionally limited to one year.
    ///
    /// All-time kinds are always included.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn for_employee<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        employee_id: Uuid,
        year: Option<i32>,
    ) -> AppResult<Vec<payroll_accumulations::Model>> {
        let mut query = payroll_accumulations::Entity::find()
            .filter(payroll_accumulations::Column::CompanyId.eq(company_id))
            .filter(payroll_accumulations::Column::EmployeeId.eq(employee_id));
        if let Some(year) = year {
            query = query.filter(
                Condition::any()
                    .add(payroll_accumulations::Column::AccumYear.eq(year))
                    .add(payroll_accumulations::Column::AccumYear.is_null()),
            );
        }

        query
            .order_by_asc(payroll_accumulations::Column::AccumType)
            .order_by_desc(payroll_accumulations::Column::AccumYear)
            .all(conn)
            .await
            .map_err(map_db_err)
    }
}
