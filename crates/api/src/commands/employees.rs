//! Employee directory commands.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use hrms_core::employee::{EmployeeStatus, PayTerms};
use hrms_core::payroll::EmployeeFlags;
use hrms_db::entities::employees;
use hrms_db::repositories::employee::employee_flags;
use hrms_db::repositories::{CreateEmployeeInput, EmployeeFilter, EmployeeRepository};
use hrms_shared::types::{PageRequest, PageResponse};
use hrms_shared::{AppResult, AuditAction, Handler, MediatorBuilder, RequestContext};

use super::{CommandDeps, audit, details, publish_after_commit, utc};

/// Lists employees in the selected branches.
#[derive(Debug, Clone, Default)]
pub struct ListEmployees {
    /// Only employees with this status.
    pub status: Option<EmployeeStatus>,
    /// Requested page.
    pub page: PageRequest,
}

/// Loads one employee.
#[derive(Debug, Clone, Copy)]
pub struct GetEmployee {
    /// Employee ID.
    pub id: Uuid,
}

/// Creates an employee.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployee {
    /// Target branch; defaults to the single selected branch.
    #[serde(default)]
    pub branch_id: Option<Uuid>,
    /// Number unique within the company.
    pub employee_number: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Monthly base pay.
    pub base_pay_amount: Decimal,
    /// Monthly housing allowance.
    #[serde(default)]
    pub housing_allowance: Decimal,
    /// Employee provident fund rate.
    #[serde(default)]
    pub pf_rate_employee: Decimal,
    /// Employer provident fund rate.
    #[serde(default)]
    pub pf_rate_employer: Decimal,
    /// Permission flags.
    #[serde(flatten)]
    pub flags: EmployeeFlags,
}

/// Employee as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeResponse {
    /// Employee ID.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Home branch.
    pub branch_id: Uuid,
    /// Number unique within the company.
    pub employee_number: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Employment status.
    pub status: EmployeeStatus,
    /// Monthly base pay.
    pub base_pay_amount: Decimal,
    /// Monthly housing allowance.
    pub housing_allowance: Decimal,
    /// Employee provident fund rate.
    pub pf_rate_employee: Decimal,
    /// Employer provident fund rate.
    pub pf_rate_employer: Decimal,
    /// Permission flags.
    #[serde(flatten)]
    pub flags: EmployeeFlags,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
}

impl From<employees::Model> for EmployeeResponse {
    fn from(employee: employees::Model) -> Self {
        let flags = employee_flags(&employee);
        Self {
            id: employee.id,
            company_id: employee.company_id,
            branch_id: employee.branch_id,
            employee_number: employee.employee_number,
            first_name: employee.first_name,
            last_name: employee.last_name,
            status: employee.status.into(),
            base_pay_amount: employee.base_pay_amount,
            housing_allowance: employee.housing_allowance,
            pf_rate_employee: employee.pf_rate_employee,
            pf_rate_employer: employee.pf_rate_employer,
            flags,
            created_at: utc(employee.created_at),
            updated_at: utc(employee.updated_at),
        }
    }
}

struct EmployeeHandler {
    deps: CommandDeps,
}

#[async_trait]
impl Handler<ListEmployees, PageResponse<EmployeeResponse>> for EmployeeHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: ListEmployees,
    ) -> AppResult<PageResponse<EmployeeResponse>> {
        ctx.require_tenant()?;
        let page = request.page.normalized();
        let query = page.clone();
        let filter = EmployeeFilter {
            status: request.status,
        };
        let (rows, total) = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    EmployeeRepository::list(tx.conn(), tx.scope(), &filter, &query).await
                })
            })
            .await?;
        Ok(PageResponse::new(rows, &page, total).map(EmployeeResponse::from))
    }
}

#[async_trait]
impl Handler<GetEmployee, EmployeeResponse> for EmployeeHandler {
    async fn handle(&self, ctx: &RequestContext, request: GetEmployee) -> AppResult<EmployeeResponse> {
        ctx.require_tenant()?;
        let employee = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move { EmployeeRepository::find(tx.conn(), tx.scope(), request.id).await })
            })
            .await?;
        Ok(employee.into())
    }
}

#[async_trait]
impl Handler<CreateEmployee, EmployeeResponse> for EmployeeHandler {
    async fn handle(&self, ctx: &RequestContext, request: CreateEmployee) -> AppResult<EmployeeResponse> {
        ctx.require_tenant()?;
        let actor = ctx.user().id;
        let events = self.deps.events.clone();
        let owned = ctx.clone();
        let input = CreateEmployeeInput {
            branch_id: request.branch_id,
            employee_number: request.employee_number,
            first_name: request.first_name,
            last_name: request.last_name,
            terms: PayTerms {
                base_pay_amount: request.base_pay_amount,
                housing_allowance: request.housing_allowance,
                pf_rate_employee: request.pf_rate_employee,
                pf_rate_employer: request.pf_rate_employer,
            },
            flags: request.flags,
        };

        let employee = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    let employee =
                        EmployeeRepository::create(tx.conn(), tx.scope(), input, actor).await?;
                    let changes = json!({
                        "employeeNumber": employee.employee_number,
                        "branchId": employee.branch_id,
                    });
                    publish_after_commit(
                        tx,
                        &events,
                        audit(&owned, AuditAction::Create, "employees", employee.id, details(changes)),
                    );
                    Ok(employee)
                })
            })
            .await?;

        tracing::info!(employee_id = %employee.id, branch_id = %employee.branch_id, "employee created");
        Ok(employee.into())
    }
}

pub(crate) fn register(builder: &mut MediatorBuilder, deps: &CommandDeps) {
    builder
        .register::<ListEmployees, PageResponse<EmployeeResponse>, _>(EmployeeHandler {
            deps: deps.clone(),
        })
        .register::<GetEmployee, EmployeeResponse, _>(EmployeeHandler { deps: deps.clone() })
        .register::<CreateEmployee, EmployeeResponse, _>(EmployeeHandler { deps: deps.clone() });
}
