//! Payroll run lifecycle commands.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use hrms_core::payroll::{DEFAULT_SSO_RATE, RunParameters, RunStatus};
use hrms_db::entities::payroll_runs;
use hrms_db::repositories::{
    PayrollItemRepository, PayrollRunRepository, RunFilter, RunUpdate,
};
use hrms_shared::types::{PageRequest, PageResponse};
use hrms_shared::{
    AppResult, AuditAction, Handler, MediatorBuilder, NoResponse, RequestContext,
};

use super::payroll_items::ItemResponse;
use super::{CommandDeps, audit, details, publish_after_commit, utc};

/// Creates the run of one month for the selected branch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRun {
    /// First day of the payroll month.
    pub payroll_month: NaiveDate,
    /// First day of the attendance period.
    pub period_start: NaiveDate,
    /// Day the salaries are paid.
    pub pay_date: NaiveDate,
    /// Employee social security rate.
    #[serde(default)]
    pub sso_rate_employee: Option<Decimal>,
    /// Employer social security rate.
    #[serde(default)]
    pub sso_rate_employer: Option<Decimal>,
}

/// Lists runs in the selected branches.
#[derive(Debug, Clone, Default)]
pub struct ListRuns {
    /// Only runs in this status.
    pub status: Option<RunStatus>,
    /// Only runs of this payroll month.
    pub payroll_month: Option<NaiveDate>,
    /// Requested page.
    pub page: PageRequest,
}

/// Loads one run.
#[derive(Debug, Clone, Copy)]
pub struct GetRun {
    /// Run ID.
    pub id: Uuid,
}

/// Changes the pay date and/or status of a run.
#[derive(Debug, Clone, Copy)]
pub struct UpdateRun {
    /// Run ID.
    pub id: Uuid,
    /// New pay date.
    pub pay_date: Option<NaiveDate>,
    /// Target status; `approved` performs approval.
    pub status: Option<RunStatus>,
}

/// Soft-deletes a run that is not approved.
#[derive(Debug, Clone, Copy)]
pub struct DeleteRun {
    /// Run ID.
    pub id: Uuid,
}

/// Lists the items of a run.
#[derive(Debug, Clone, Copy)]
pub struct ListRunItems {
    /// Run ID.
    pub run_id: Uuid,
}

/// Run as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    /// Run ID.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Branch the run pays.
    pub branch_id: Uuid,
    /// First day of the payroll month.
    pub payroll_month: NaiveDate,
    /// First day of the attendance period.
    pub period_start: NaiveDate,
    /// Day the salaries are paid.
    pub pay_date: NaiveDate,
    /// Lifecycle status.
    pub status: RunStatus,
    /// Employee social security rate frozen at creation.
    pub sso_rate_employee: Decimal,
    /// Employer social security rate frozen at creation.
    pub sso_rate_employer: Decimal,
    /// Approval instant.
    pub approved_at: Option<DateTime<Utc>>,
    /// Approving identity.
    pub approved_by: Option<Uuid>,
    /// Creating identity.
    pub created_by: Uuid,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
}

impl From<payroll_runs::Model> for RunResponse {
    fn from(run: payroll_runs::Model) -> Self {
        Self {
            id: run.id,
            company_id: run.company_id,
            branch_id: run.branch_id,
            payroll_month: run.payroll_month,
            period_start: run.period_start,
            pay_date: run.pay_date,
            status: run.status.into(),
            sso_rate_employee: run.sso_rate_employee,
            sso_rate_employer: run.sso_rate_employer,
            approved_at: run.approved_at.map(utc),
            approved_by: run.approved_by,
            created_by: run.created_by,
            created_at: utc(run.created_at),
            updated_at: utc(run.updated_at),
        }
    }
}

/// A new run with the number of generated items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRunResponse {
    /// The run.
    #[serde(flatten)]
    pub run: RunResponse,
    /// Number of generated items.
    pub item_count: usize,
}

struct RunHandler {
    deps: CommandDeps,
}

#[async_trait]
impl Handler<CreateRun, CreatedRunResponse> for RunHandler {
    async fn handle(&self, ctx: &RequestContext, request: CreateRun) -> AppResult<CreatedRunResponse> {
        let branch_id = ctx.require_tenant()?.require_branch()?;
        let actor = ctx.user().id;
        let events = self.deps.events.clone();
        let owned = ctx.clone();
        let params = RunParameters {
            payroll_month: request.payroll_month,
            period_start: request.period_start,
            pay_date: request.pay_date,
            sso_rate_employee: request.sso_rate_employee.unwrap_or(DEFAULT_SSO_RATE),
            sso_rate_employer: request.sso_rate_employer.unwrap_or(DEFAULT_SSO_RATE),
        };

        let created = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    let created =
                        PayrollRunRepository::create(tx.conn(), tx.scope(), branch_id, params, actor)
                            .await?;
                    let changes = json!({
                        "payrollMonth": created.run.payroll_month,
                        "itemCount": created.item_count,
                    });
                    publish_after_commit(
                        tx,
                        &events,
                        audit(&owned, AuditAction::Create, "payroll_runs", created.run.id, details(changes)),
                    );
                    Ok(created)
                })
            })
            .await?;

        Ok(CreatedRunResponse {
            run: created.run.into(),
            item_count: created.item_count,
        })
    }
}

#[async_trait]
impl Handler<ListRuns, PageResponse<RunResponse>> for RunHandler {
    async fn handle(&self, ctx: &RequestContext, request: ListRuns) -> AppResult<PageResponse<RunResponse>> {
        ctx.require_tenant()?;
        let page = request.page.normalized();
        let query = page.clone();
        let filter = RunFilter {
            status: request.status,
            payroll_month: request.payroll_month,
        };
        let (rows, total) = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    PayrollRunRepository::list(tx.conn(), tx.scope(), &filter, &query).await
                })
            })
            .await?;
        Ok(PageResponse::new(rows, &page, total).map(RunResponse::from))
    }
}

#[async_trait]
impl Handler<GetRun, RunResponse> for RunHandler {
    async fn handle(&self, ctx: &RequestContext, request: GetRun) -> AppResult<RunResponse> {
        ctx.require_tenant()?;
        let run = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move { PayrollRunRepository::find(tx.conn(), tx.scope(), request.id).await })
            })
            .await?;
        Ok(run.into())
    }
}

#[async_trait]
impl Handler<UpdateRun, RunResponse> for RunHandler {
    async fn handle(&self, ctx: &RequestContext, request: UpdateRun) -> AppResult<RunResponse> {
        ctx.require_tenant()?;
        let actor = ctx.user().id;
        let role = ctx.user().role;
        let events = self.deps.events.clone();
        let owned = ctx.clone();
        let update = RunUpdate {
            pay_date: request.pay_date,
            status: request.status,
        };

        let updated = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    let updated = PayrollRunRepository::update(
                        tx.conn(),
                        tx.scope(),
                        request.id,
                        update,
                        actor,
                        role,
                    )
                    .await?;

                    let event = if updated.approved {
                        let mut changes = updated.changes.clone();
                        changes.insert("accumulations".to_string(), json!(updated.accumulations));
                        audit(&owned, AuditAction::Approve, "payroll_runs", updated.run.id, changes)
                    } else {
                        audit(
                            &owned,
                            AuditAction::Update,
                            "payroll_runs",
                            updated.run.id,
                            updated.changes.clone(),
                        )
                    };
                    publish_after_commit(tx, &events, event);
                    Ok(updated)
                })
            })
            .await?;

        if updated.approved {
            tracing::info!(
                run_id = %updated.run.id,
                accumulations = updated.accumulations,
                "payroll run approved"
            );
        }
        Ok(updated.run.into())
    }
}

#[async_trait]
impl Handler<DeleteRun, NoResponse> for RunHandler {
    async fn handle(&self, ctx: &RequestContext, request: DeleteRun) -> AppResult<NoResponse> {
        ctx.require_tenant()?;
        let actor = ctx.user().id;
        let events = self.deps.events.clone();
        let owned = ctx.clone();
        self.deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    let run =
                        PayrollRunRepository::soft_delete(tx.conn(), tx.scope(), request.id, actor)
                            .await?;
                    publish_after_commit(
                        tx,
                        &events,
                        audit(&owned, AuditAction::Delete, "payroll_runs", run.id, serde_json::Map::new()),
                    );
                    Ok(NoResponse)
                })
            })
            .await
    }
}

#[async_trait]
impl Handler<ListRunItems, Vec<ItemResponse>> for RunHandler {
    async fn handle(&self, ctx: &RequestContext, request: ListRunItems) -> AppResult<Vec<ItemResponse>> {
        ctx.require_tenant()?;
        let items = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    PayrollRunRepository::find(tx.conn(), tx.scope(), request.run_id).await?;
                    PayrollItemRepository::list_for_run(tx.conn(), tx.scope(), request.run_id).await
                })
            })
            .await?;
        items.into_iter().map(ItemResponse::try_from).collect()
    }
}

pub(crate) fn register(builder: &mut MediatorBuilder, deps: &CommandDeps) {
    builder
        .register::<CreateRun, CreatedRunResponse, _>(RunHandler { deps: deps.clone() })
        .register::<ListRuns, PageResponse<RunResponse>, _>(RunHandler { deps: deps.clone() })
        .register::<GetRun, RunResponse, _>(RunHandler { deps: deps.clone() })
        .register::<UpdateRun, RunResponse, _>(RunHandler { deps: deps.clone() })
        .register::<DeleteRun, NoResponse, _>(RunHandler { deps: deps.clone() })
        .register::<ListRunItems, Vec<ItemResponse>, _>(RunHandler { deps: deps.clone() });
}
