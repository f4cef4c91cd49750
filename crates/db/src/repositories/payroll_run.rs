//! Payroll run repository.
//!
//! Implements the run lifecycle against the database: creation with item
//! generation, status moves, approval with accumulator updates, pay date
//! edits and soft deletion. Every function expects a connection inside a
//! tenant-scoped transaction.

use chrono::{Datelike, NaiveDate};
use hrms_core::payroll::{
    PayrollError, RunLifecycle, RunParameters, RunStatus, RunTransition, approval_deltas,
    build_item,
};
use hrms_shared::{AppError, AppResult, Role, types::PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, sea_query::Expr,
};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use crate::entities::{payroll_run_items, payroll_runs, sea_orm_active_enums::PayrollRunStatus};
use crate::error::map_db_err;
use crate::repositories::accumulation::AccumulationRepository;
use crate::repositories::branch::BranchRepository;
use crate::repositories::employee::{EmployeeRepository, pay_profile};
use crate::repositories::payroll_item::{PayrollItemRepository, item_values};
use crate::transactor::TenantScope;

/// A run and the number of items generated for it.
#[derive(Debug, Clone)]
pub struct CreatedRun {
    /// The run, already `pending`.
    pub run: payroll_runs::Model,
    /// Number of generated items.
    pub item_count: usize,
}

/// Filters for listing runs.
#[derive(Debug, Clone, Default)]
pub struct RunFilter {
    /// Only runs in this status.
    pub status: Option<RunStatus>,
    /// Only runs of this payroll month.
    pub payroll_month: Option<NaiveDate>,
}

/// Requested changes to a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunUpdate {
    /// New pay date.
    pub pay_date: Option<NaiveDate>,
    /// Target status.
    pub status: Option<RunStatus>,
}

/// Result of [`PayrollRunRepository::update`].
#[derive(Debug, Clone)]
pub struct UpdatedRun {
    /// The stored run.
    pub run: payroll_runs::Model,
    /// Whether the update approved the run.
    pub approved: bool,
    /// Number of accumulator rows touched by approval.
    pub accumulations: usize,
    /// Field-level delta.
    pub changes: Map<String, Value>,
}

/// Payroll run repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct PayrollRunRepository;

fn scoped(query: Select<payroll_runs::Entity>, scope: &TenantScope) -> Select<payroll_runs::Entity> {
    let query = query
        .filter(payroll_runs::Column::CompanyId.eq(scope.company_id))
        .filter(payroll_runs::Column::DeletedAt.is_null());
    if scope.branch_ids.is_empty() {
        query
    } else {
        query.filter(payroll_runs::Column::BranchId.is_in(scope.branch_ids.clone()))
    }
}

impl PayrollRunRepository {
    /// Creates a run for `branch_id` and generates one item per active
    /// employee of the branch.
    ///
    /// The run is inserted as `processing` and moved to `pending` once every
    /// item is stored.
    ///
    /// # Errors
    ///
    /// Returns `bad_request` for invalid parameters or an unknown branch and
    /// `conflict` when a run already covers the month.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        branch_id: Uuid,
        params: RunParameters,
        actor: Uuid,
    ) -> AppResult<CreatedRun> {
        let params = params.validate()?;
        BranchRepository::find(conn, scope.company_id, branch_id)
            .await
            .map_err(|_| AppError::bad_request("branch not found"))?;

        let existing = payroll_runs::Entity::find()
            .filter(payroll_runs::Column::CompanyId.eq(scope.company_id))
            .filter(payroll_runs::Column::BranchId.eq(branch_id))
            .filter(payroll_runs::Column::PayrollMonth.eq(params.payroll_month))
            .filter(payroll_runs::Column::DeletedAt.is_null())
            .count(conn)
            .await
            .map_err(map_db_err)?;
        if existing > 0 {
            return Err(PayrollError::DuplicateRun.into());
        }

        let now = chrono::Utc::now().into();
        let run = payroll_runs::ActiveModel {
            id: Set(Uuid::now_v7()),
            company_id: Set(scope.company_id),
            branch_id: Set(branch_id),
            payroll_month: Set(params.payroll_month),
            period_start: Set(params.period_start),
            pay_date: Set(params.pay_date),
            status: Set(PayrollRunStatus::Processing),
            sso_rate_employee: Set(params.sso_rate_employee),
            sso_rate_employer: Set(params.sso_rate_employer),
            approved_at: Set(None),
            approved_by: Set(None),
            created_by: Set(actor),
            updated_by: Set(actor),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .map_err(map_db_err)?;

        let employees =
            EmployeeRepository::active_in_branch(conn, scope.company_id, branch_id).await?;
        let ids: Vec<Uuid> = employees.iter().map(|e| e.id).collect();
        let snapshots =
            AccumulationRepository::snapshots(conn, scope.company_id, &ids, params.accum_year())
                .await?;

        for employee in &employees {
            let snapshot = snapshots.get(&employee.id).copied().unwrap_or_default();
            let values = build_item(&pay_profile(employee), &params, snapshot);
            PayrollItemRepository::insert(conn, &run, employee.id, &values, actor).await?;
        }

        let mut active: payroll_runs::ActiveModel = run.into();
        active.status = Set(PayrollRunStatus::Pending);
        let run = active.update(conn).await.map_err(map_db_err)?;

        tracing::info!(
            run_id = %run.id,
            branch_id = %branch_id,
            payroll_month = %params.payroll_month,
            items = employees.len(),
            "payroll run created"
        );

        Ok(CreatedRun {
            run,
            item_count: employees.len(),
        })
    }

    /// Lists runs visible in `scope`, newest month first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        filter: &RunFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<payroll_runs::Model>, u64)> {
        let mut query = scoped(payroll_runs::Entity::find(), scope);
        if let Some(status) = filter.status {
            query = query.filter(payroll_runs::Column::Status.eq(PayrollRunStatus::from(status)));
        }
        if let Some(month) = filter.payroll_month {
            query = query.filter(payroll_runs::Column::PayrollMonth.eq(month));
        }

        let total = query.clone().count(conn).await.map_err(map_db_err)?;
        let rows = query
            .order_by_desc(payroll_runs::Column::PayrollMonth)
            .order_by_asc(payroll_runs::Column::BranchId)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await
            .map_err(map_db_err)?;

        Ok((rows, total))
    }

    /// Finds a non-deleted run visible in `scope`.
    ///
    /// # Errors
    ///
    /// Returns `not_found` if the run is missing or outside the scope.
    pub async fn find<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> AppResult<payroll_runs::Model> {
        scoped(payroll_runs::Entity::find_by_id(id), scope)
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("payroll run not found"))
    }

    /// Like [`PayrollRunRepository::find`] but takes a row lock on the run.
    ///
    /// # Errors
    ///
    /// Returns `not_found` if the run is missing or outside the scope.
    pub async fn find_for_update<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> AppResult<payroll_runs::Model> {
        scoped(payroll_runs::Entity::find_by_id(id), scope)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("payroll run not found"))
    }

    /// Applies a pay date and/or status change on behalf of `actor`.
    ///
    /// A pay date is applied before the status move, so one request can fix
    /// the date and approve.
    ///
    /// # Errors
    ///
    /// Returns `bad_request` for approved runs, invalid transitions, a pay
    /// date before the period or an empty update; `forbidden` when a
    /// non-admin approves; `conflict` when another run of the month is
    /// already approved.
    pub async fn update<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
        update: RunUpdate,
        actor: Uuid,
        actor_role: Role,
    ) -> AppResult<UpdatedRun> {
        if update.pay_date.is_none() && update.status.is_none() {
            return Err(PayrollError::NoFieldsToUpdate.into());
        }

        let run = Self::find_for_update(conn, scope, id).await?;
        let current: RunStatus = run.status.into();
        RunLifecycle::ensure_mutable(current)?;

        let transition = update
            .status
            .map(|to| RunLifecycle::transition(current, to, actor_role))
            .transpose()?;

        let mut changes = Map::new();
        let mut active: payroll_runs::ActiveModel = run.clone().into();

        if let Some(pay_date) = update.pay_date {
            if pay_date < run.period_start {
                return Err(PayrollError::PayDateBeforePeriod.into());
            }
            if pay_date != run.pay_date {
                changes.insert(
                    "payDate".to_string(),
                    json!({ "from": run.pay_date, "to": pay_date }),
                );
                active.pay_date = Set(pay_date);
            }
        }

        let mut approved = false;
        let mut accumulations = 0;
        match transition {
            Some(RunTransition::Move { new_status }) => {
                changes.insert(
                    "status".to_string(),
                    json!({ "from": current.as_str(), "to": new_status.as_str() }),
                );
                active.status = Set(new_status.into());
            }
            Some(RunTransition::Approve) => {
                accumulations = Self::apply_approval(conn, &run).await?;
                let now = chrono::Utc::now().into();
                changes.insert(
                    "status".to_string(),
                    json!({ "from": current.as_str(), "to": RunStatus::Approved.as_str() }),
                );
                active.status = Set(PayrollRunStatus::Approved);
                active.approved_at = Set(Some(now));
                active.approved_by = Set(Some(actor));
                approved = true;
            }
            None => {}
        }

        if changes.is_empty() {
            return Err(PayrollError::NoFieldsToUpdate.into());
        }

        active.updated_by = Set(actor);
        active.updated_at = Set(chrono::Utc::now().into());
        let run = active.update(conn).await.map_err(map_db_err)?;

        Ok(UpdatedRun {
            run,
            approved,
            accumulations,
            changes,
        })
    }

    /// Increments the accumulators for every item of a locked, pending run.
    async fn apply_approval<C: ConnectionTrait>(
        conn: &C,
        run: &payroll_runs::Model,
    ) -> AppResult<usize> {
        let already_approved = payroll_runs::Entity::find()
            .filter(payroll_runs::Column::CompanyId.eq(run.company_id))
            .filter(payroll_runs::Column::BranchId.eq(run.branch_id))
            .filter(payroll_runs::Column::PayrollMonth.eq(run.payroll_month))
            .filter(payroll_runs::Column::Status.eq(PayrollRunStatus::Approved))
            .filter(payroll_runs::Column::DeletedAt.is_null())
            .filter(payroll_runs::Column::Id.ne(run.id))
            .count(conn)
            .await
            .map_err(map_db_err)?;
        if already_approved > 0 {
            return Err(PayrollError::AlreadyApprovedForMonth.into());
        }

        let scope = TenantScope {
            company_id: run.company_id,
            branch_ids: vec![run.branch_id],
        };
        let items = PayrollItemRepository::list_for_run(conn, &scope, run.id).await?;
        let values = items
            .iter()
            .map(|item| item_values(item).map(|v| (item.employee_id, v)))
            .collect::<AppResult<Vec<_>>>()?;

        let year = run.payroll_month.year();
        let deltas = approval_deltas(values.iter().map(|(id, v)| (*id, v)), year);
        AccumulationRepository::apply(conn, run.company_id, deltas).await
    }

    /// Soft-deletes a run that is not approved, together with its items.
    ///
    /// # Errors
    ///
    /// Returns `bad_request` for approved runs.
    pub async fn soft_delete<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
        actor: Uuid,
    ) -> AppResult<payroll_runs::Model> {
        let run = Self::find_for_update(conn, scope, id).await?;
        RunLifecycle::ensure_deletable(run.status.into())?;

        let now = chrono::Utc::now();
        payroll_run_items::Entity::update_many()
            .col_expr(payroll_run_items::Column::DeletedAt, Expr::value(now))
            .filter(payroll_run_items::Column::RunId.eq(run.id))
            .filter(payroll_run_items::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .map_err(map_db_err)?;

        let mut active: payroll_runs::ActiveModel = run.into();
        active.deleted_at = Set(Some(now.into()));
        active.updated_by = Set(actor);
        active.updated_at = Set(now.into());
        active.update(conn).await.map_err(map_db_err)
    }
}
