//! Worklog repository.

use chrono::NaiveDate;
use hrms_core::worklog::EntryType;
use hrms_shared::{AppError, AppResult, types::PageRequest};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::entities::{sea_orm_active_enums::WorklogEntryType, worklogs};
use crate::error::map_db_err;
use crate::repositories::employee::EmployeeRepository;
use crate::transactor::TenantScope;

/// Input for recording a worklog entry.
#[derive(Debug, Clone)]
pub struct CreateWorklogInput {
    /// Employee the entry belongs to.
    pub employee_id: Uuid,
    /// Day the entry refers to.
    pub work_date: NaiveDate,
    /// Kind of entry.
    pub entry_type: EntryType,
    /// Minutes, hours or days depending on the kind.
    pub quantity: Decimal,
    /// Optional note.
    pub note: Option<String>,
}

/// Filters for listing worklogs.
#[derive(Debug, Clone, Default)]
pub struct WorklogFilter {
    /// Only entries of this employee.
    pub employee_id: Option<Uuid>,
    /// Earliest work date, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest work date, inclusive.
    pub to: Option<NaiveDate>,
}

/// Worklog repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorklogRepository;

fn scoped(query: Select<worklogs::Entity>, scope: &TenantScope) -> Select<worklogs::Entity> {
    let query = query
        .filter(worklogs::Column::CompanyId.eq(scope.company_id))
        .filter(worklogs::Column::DeletedAt.is_null());
    if scope.branch_ids.is_empty() {
        query
    } else {
        query.filter(worklogs::Column::BranchId.is_in(scope.branch_ids.clone()))
    }
}

impl WorklogRepository {
    /// Records an entry for an employee visible in `scope`.
    ///
    /// # Errors
    ///
    /// Returns `bad_request` for a bad quantity, `not_found` for an unknown
    /// employee and `conflict` when the same (employee, date, entryType)
    /// already exists.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        input: CreateWorklogInput,
        actor: Uuid,
    ) -> AppResult<worklogs::Model> {
        let quantity = input.entry_type.validate_quantity(input.quantity)?;
        let employee = EmployeeRepository::find(conn, scope, input.employee_id).await?;

        let now = chrono::Utc::now().into();
        worklogs::ActiveModel {
            id: Set(Uuid::now_v7()),
            company_id: Set(employee.company_id),
            branch_id: Set(employee.branch_id),
            employee_id: Set(employee.id),
            work_date: Set(input.work_date),
            entry_type: Set(WorklogEntryType::from(input.entry_type)),
            quantity: Set(quantity),
            note: Set(input.note.filter(|n| !n.trim().is_empty())),
            created_by: Set(actor),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .map_err(map_db_err)
    }

    /// Lists entries visible in `scope`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `bad_request` when `from` is after `to`.
    pub async fn list<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        filter: &WorklogFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<worklogs::Model>, u64)> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(AppError::bad_request("from must not be after to"));
            }
        }

        let mut query = scoped(worklogs::Entity::find(), scope);
        if let Some(employee_id) = filter.employee_id {
            query = query.filter(worklogs::Column::EmployeeId.eq(employee_id));
        }
        if let Some(from) = filter.from {
            query = query.filter(worklogs::Column::WorkDate.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(worklogs::Column::WorkDate.lte(to));
        }

        let total = query.clone().count(conn).await.map_err(map_db_err)?;
        let rows = query
            .order_by_desc(worklogs::Column::WorkDate)
            .order_by_asc(worklogs::Column::EntryType)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await
            .map_err(map_db_err)?;

        Ok((rows, total))
    }

    /// Soft-deletes an entry visible in `scope`.
    ///
    /// # Errors
    ///
    /// Returns `not_found` if the entry is missing or outside the scope.
    pub async fn soft_delete<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> AppResult<worklogs::Model> {
        let worklog = scoped(worklogs::Entity::find_by_id(id), scope)
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("worklog not found"))?;

        let now = chrono::Utc::now().into();
        let mut active: worklogs::ActiveModel = worklog.into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(conn).await.map_err(map_db_err)
    }
}
