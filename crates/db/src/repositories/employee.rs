//! Employee repository.

use hrms_core::employee::{EmployeeStatus as CoreEmployeeStatus, PayTerms};
use hrms_core::payroll::{EmployeeFlags, EmployeePayProfile};
use hrms_shared::{AppError, AppResult, types::PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::entities::{employees, sea_orm_active_enums::EmployeeStatus};
use crate::error::map_db_err;
use crate::repositories::branch::BranchRepository;
use crate::transactor::TenantScope;

/// Input for creating an employee.
#[derive(Debug, Clone)]
pub struct CreateEmployeeInput {
    /// Target branch; defaults to the single selected branch.
    pub branch_id: Option<Uuid>,
    /// Number unique within the company.
    pub employee_number: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Compensation terms.
    pub terms: PayTerms,
    /// Permission flags copied onto payroll items.
    pub flags: EmployeeFlags,
}

/// Filters for listing employees.
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    /// Only employees with this status.
    pub status: Option<CoreEmployeeStatus>,
}

/// Employee repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmployeeRepository;

/// Restricts `query` to the scope's company and selected branches.
fn scoped(query: Select<employees::Entity>, scope: &TenantScope) -> Select<employees::Entity> {
    let query = query
        .filter(employees::Column::CompanyId.eq(scope.company_id))
        .filter(employees::Column::DeletedAt.is_null());
    if scope.branch_ids.is_empty() {
        query
    } else {
        query.filter(employees::Column::BranchId.is_in(scope.branch_ids.clone()))
    }
}

impl EmployeeRepository {
    /// Lists employees visible in `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        filter: &EmployeeFilter,
        page: &PageRequest,
    ) -> AppResult<(Vec<employees::Model>, u64)> {
        let mut query = scoped(employees::Entity::find(), scope);
        if let Some(status) = filter.status {
            query = query.filter(employees::Column::Status.eq(EmployeeStatus::from(status)));
        }

        let total = query.clone().count(conn).await.map_err(map_db_err)?;
        let rows = query
            .order_by_asc(employees::Column::EmployeeNumber)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await
            .map_err(map_db_err)?;

        Ok((rows, total))
    }

    /// Finds an employee visible in `scope`.
    ///
    /// # Errors
    ///
    /// Returns `not_found` if the employee is missing or outside the scope.
    pub async fn find<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        id: Uuid,
    ) -> AppResult<employees::Model> {
        scoped(employees::Entity::find_by_id(id), scope)
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("employee not found"))
    }

    /// Creates an active employee.
    ///
    /// # Errors
    ///
    /// Returns `bad_request` for invalid terms, a missing or unselected
    /// branch, `conflict` for a duplicate number, or a database error.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        scope: &TenantScope,
        input: CreateEmployeeInput,
        actor: Uuid,
    ) -> AppResult<employees::Model> {
        let terms = input.terms.validate()?;
        let number = input.employee_number.trim().to_string();
        if number.is_empty() {
            return Err(AppError::bad_request("employee number is required"));
        }

        let branch_id = match (input.branch_id, scope.branch_ids.as_slice()) {
            (Some(id), _) => id,
            (None, [only]) => *only,
            (None, _) => return Err(AppError::bad_request("branchId is required")),
        };
        if !scope.branch_ids.is_empty() && !scope.branch_ids.contains(&branch_id) {
            return Err(AppError::forbidden("access denied to this branch"));
        }
        BranchRepository::find(conn, scope.company_id, branch_id)
            .await
            .map_err(|_| AppError::bad_request("branch not found"))?;

        let now = chrono::Utc::now().into();
        employees::ActiveModel {
            id: Set(Uuid::now_v7()),
            company_id: Set(scope.company_id),
            branch_id: Set(branch_id),
            employee_number: Set(number),
            first_name: Set(input.first_name.trim().to_string()),
            last_name: Set(input.last_name.trim().to_string()),
            status: Set(EmployeeStatus::Active),
            base_pay_amount: Set(terms.base_pay_amount),
            housing_allowance: Set(terms.housing_allowance),
            pf_rate_employee: Set(terms.pf_rate_employee),
            pf_rate_employer: Set(terms.pf_rate_employer),
            allow_water: Set(input.flags.allow_water),
            allow_electric: Set(input.flags.allow_electric),
            allow_internet: Set(input.flags.allow_internet),
            allow_doctor_fee: Set(input.flags.allow_doctor_fee),
            sso_contribute: Set(input.flags.sso_contribute),
            provident_fund_contribute: Set(input.flags.provident_fund_contribute),
            withhold_tax: Set(input.flags.withhold_tax),
            created_by: Set(Some(actor)),
            updated_by: Set(Some(actor)),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .map_err(map_db_err)
    }

    /// Active employees of one branch, ordered by number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn active_in_branch<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        branch_id: Uuid,
    ) -> AppResult<Vec<employees::Model>> {
        employees::Entity::find()
            .filter(employees::Column::CompanyId.eq(company_id))
            .filter(employees::Column::BranchId.eq(branch_id))
            .filter(employees::Column::Status.eq(EmployeeStatus::Active))
            .filter(employees::Column::DeletedAt.is_null())
            .order_by_asc(employees::Column::EmployeeNumber)
            .all(conn)
            .await
            .map_err(map_db_err)
    }
}

/// Permission flags stored on an employee row.
#[must_use]
pub fn employee_flags(employee: &employees::Model) -> EmployeeFlags {
    EmployeeFlags {
        allow_water: employee.allow_water,
        allow_electric: employee.allow_electric,
        allow_internet: employee.allow_internet,
        allow_doctor_fee: employee.allow_doctor_fee,
        sso_contribute: employee.sso_contribute,
        provident_fund_contribute: employee.provident_fund_contribute,
        withhold_tax: employee.withhold_tax,
    }
}

/// Pay inputs of an employee used to build payroll items.
#[must_use]
pub fn pay_profile(employee: &employees::Model) -> EmployeePayProfile {
    EmployeePayProfile {
        employee_id: employee.id,
        base_pay_amount: employee.base_pay_amount,
        housing_allowance: employee.housing_allowance,
        pf_rate_employee: employee.pf_rate_employee,
        pf_rate_employer: employee.pf_rate_employer,
        flags: employee_flags(employee),
    }
}
