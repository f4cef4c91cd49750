//! Attendance entries.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use hrms_core::worklog::EntryType;
use hrms_db::entities::worklogs;
use hrms_db::repositories::{CreateWorklogInput, WorklogFilter, WorklogRepository};
use hrms_shared::types::{PageRequest, PageResponse};
use hrms_shared::{
    AppResult, AuditAction, Handler, MediatorBuilder, NoResponse, RequestContext,
};

use super::{CommandDeps, audit, details, publish_after_commit, utc};

/// Records one worklog entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorklog {
    /// Employee the entry belongs to.
    pub employee_id: Uuid,
    /// Day the entry refers to.
    pub work_date: NaiveDate,
    /// Kind of entry.
    pub entry_type: EntryType,
    /// Minutes, hours or days depending on the kind.
    pub quantity: Decimal,
    /// Optional note.
    #[serde(default)]
    pub note: Option<String>,
}

/// Lists worklog entries.
#[derive(Debug, Clone, Default)]
pub struct ListWorklogs {
    /// Only entries of this employee.
    pub employee_id: Option<Uuid>,
    /// Earliest work date, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest work date, inclusive.
    pub to: Option<NaiveDate>,
    /// Requested page.
    pub page: PageRequest,
}

/// Soft-deletes a worklog entry.
#[derive(Debug, Clone, Copy)]
pub struct DeleteWorklog {
    /// Worklog ID.
    pub id: Uuid,
}

/// Worklog entry as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorklogResponse {
    /// Worklog ID.
    pub id: Uuid,
    /// Employee the entry belongs to.
    pub employee_id: Uuid,
    /// Branch of the employee.
    pub branch_id: Uuid,
    /// Day the entry refers to.
    pub work_date: NaiveDate,
    /// Kind of entry.
    pub entry_type: EntryType,
    /// Quantity in the kind's unit.
    pub quantity: Decimal,
    /// Optional note.
    pub note: Option<String>,
    /// Recording identity.
    pub created_by: Uuid,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl From<worklogs::Model> for WorklogResponse {
    fn from(entry: worklogs::Model) -> Self {
        Self {
            id: entry.id,
            employee_id: entry.employee_id,
            branch_id: entry.branch_id,
            work_date: entry.work_date,
            entry_type: entry.entry_type.into(),
            quantity: entry.quantity,
            note: entry.note,
            created_by: entry.created_by,
            created_at: utc(entry.created_at),
        }
    }
}

struct WorklogHandler {
    deps: CommandDeps,
}

#[async_trait]
impl Handler<CreateWorklog, WorklogResponse> for WorklogHandler {
    async fn handle(&self, ctx: &RequestContext, request: CreateWorklog) -> AppResult<WorklogResponse> {
        ctx.require_tenant()?;
        let actor = ctx.user().id;
        let events = self.deps.events.clone();
        let owned = ctx.clone();
        let input = CreateWorklogInput {
            employee_id: request.employee_id,
            work_date: request.work_date,
            entry_type: request.entry_type,
            quantity: request.quantity,
            note: request.note,
        };

        let entry = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    let entry = WorklogRepository::create(tx.conn(), tx.scope(), input, actor).await?;
                    let changes = json!({
                        "employeeId": entry.employee_id,
                        "workDate": entry.work_date,
                        "entryType": EntryType::from(entry.entry_type).as_str(),
                        "quantity": entry.quantity,
                    });
                    publish_after_commit(
                        tx,
                        &events,
                        audit(&owned, AuditAction::Create, "worklogs", entry.id, details(changes)),
                    );
                    Ok(entry)
                })
            })
            .await?;
        Ok(entry.into())
    }
}

#[async_trait]
impl Handler<ListWorklogs, PageResponse<WorklogResponse>> for WorklogHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: ListWorklogs,
    ) -> AppResult<PageResponse<WorklogResponse>> {
        ctx.require_tenant()?;
        let page = request.page.normalized();
        let query = page.clone();
        let filter = WorklogFilter {
            employee_id: request.employee_id,
            from: request.from,
            to: request.to,
        };
        let (rows, total) = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    WorklogRepository::list(tx.conn(), tx.scope(), &filter, &query).await
                })
            })
            .await?;
        Ok(PageResponse::new(rows, &page, total).map(WorklogResponse::from))
    }
}

#[async_trait]
impl Handler<DeleteWorklog, NoResponse> for WorklogHandler {
    async fn handle(&self, ctx: &RequestContext, request: DeleteWorklog) -> AppResult<NoResponse> {
        ctx.require_tenant()?;
        let events = self.deps.events.clone();
        let owned = ctx.clone();
        self.deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    let entry = WorklogRepository::soft_delete(tx.conn(), tx.scope(), request.id).await?;
                    publish_after_commit(
                        tx,
                        &events,
                        audit(
                            &owned,
                            AuditAction::Delete,
                            "worklogs",
                            entry.id,
                            serde_json::Map::new(),
                        ),
                    );
                    Ok(NoResponse)
                })
            })
            .await
    }
}

pub(crate) fn register(builder: &mut MediatorBuilder, deps: &CommandDeps) {
    builder
        .register::<CreateWorklog, WorklogResponse, _>(WorklogHandler { deps: deps.clone() })
        .register::<ListWorklogs, PageResponse<WorklogResponse>, _>(WorklogHandler {
            deps: deps.clone(),
        })
        .register::<DeleteWorklog, NoResponse, _>(WorklogHandler { deps: deps.clone() });
}
