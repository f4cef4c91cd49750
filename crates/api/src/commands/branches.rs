//! Branch listing and administration inside the selected company.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use hrms_core::org::OrgStatus;
use hrms_db::entities::branches;
use hrms_db::repositories::{BranchRepository, CreateBranchInput};
use hrms_shared::types::{PageRequest, PageResponse};
use hrms_shared::{
    AppError, AppResult, AuditAction, Handler, MediatorBuilder, NoResponse, RequestContext,
};

use super::{CommandDeps, audit, details, publish_after_commit, utc};

/// Lists the company's branches.
#[derive(Debug, Clone, Default)]
pub struct ListBranches {
    /// Requested page.
    pub page: PageRequest,
}

/// Creates a branch.
#[derive(Debug, Clone)]
pub struct CreateBranch {
    /// Code unique within the company.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// Moves a branch to another status.
#[derive(Debug, Clone, Copy)]
pub struct ChangeBranchStatus {
    /// Branch ID.
    pub id: Uuid,
    /// Target status.
    pub status: OrgStatus,
}

/// Makes a branch the company default.
#[derive(Debug, Clone, Copy)]
pub struct SetDefaultBranch {
    /// Branch ID.
    pub id: Uuid,
}

/// Soft-deletes an archived branch.
#[derive(Debug, Clone, Copy)]
pub struct DeleteBranch {
    /// Branch ID.
    pub id: Uuid,
}

/// Branch as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchResponse {
    /// Branch ID.
    pub id: Uuid,
    /// Owning company.
    pub company_id: Uuid,
    /// Code unique within the company.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: OrgStatus,
    /// Whether this is the company default.
    pub is_default: bool,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
}

impl From<branches::Model> for BranchResponse {
    fn from(branch: branches::Model) -> Self {
        Self {
            id: branch.id,
            company_id: branch.company_id,
            code: branch.code,
            name: branch.name,
            status: branch.status.into(),
            is_default: branch.is_default,
            created_at: utc(branch.created_at),
            updated_at: utc(branch.updated_at),
        }
    }
}

/// Branch mutations need the company admin role on top of the route gate.
fn require_company_admin(ctx: &RequestContext) -> AppResult<Uuid> {
    let tenant = ctx.require_tenant()?;
    if !tenant.is_admin {
        return Err(AppError::forbidden("insufficient permission"));
    }
    Ok(tenant.company_id)
}

struct BranchHandler {
    deps: CommandDeps,
}

#[async_trait]
impl Handler<ListBranches, PageResponse<BranchResponse>> for BranchHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: ListBranches,
    ) -> AppResult<PageResponse<BranchResponse>> {
        let company_id = ctx.require_tenant()?.company_id;
        let page = request.page.normalized();
        let query = page.clone();
        let (rows, total) = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move { BranchRepository::list(tx.conn(), company_id, &query).await })
            })
            .await?;
        Ok(PageResponse::new(rows, &page, total).map(BranchResponse::from))
    }
}

#[async_trait]
impl Handler<CreateBranch, BranchResponse> for BranchHandler {
    async fn handle(&self, ctx: &RequestContext, request: CreateBranch) -> AppResult<BranchResponse> {
        let company_id = require_company_admin(ctx)?;
        let events = self.deps.events.clone();
        let owned = ctx.clone();
        let branch = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    let branch = BranchRepository::create(
                        tx.conn(),
                        company_id,
                        CreateBranchInput {
                            code: request.code,
                            name: request.name,
                        },
                    )
                    .await?;
                    let changes = json!({ "code": branch.code, "name": branch.name });
                    publish_after_commit(
                        tx,
                        &events,
                        audit(&owned, AuditAction::Create, "branches", branch.id, details(changes)),
                    );
                    Ok(branch)
                })
            })
            .await?;

        tracing::info!(branch_id = %branch.id, code = %branch.code, "branch created");
        Ok(branch.into())
    }
}

#[async_trait]
impl Handler<ChangeBranchStatus, BranchResponse> for BranchHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: ChangeBranchStatus,
    ) -> AppResult<BranchResponse> {
        let company_id = require_company_admin(ctx)?;
        let events = self.deps.events.clone();
        let owned = ctx.clone();
        let branch = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    let branch = BranchRepository::change_status(
                        tx.conn(),
                        company_id,
                        request.id,
                        request.status,
                    )
                    .await?;
                    let changes = json!({ "status": request.status.as_str() });
                    publish_after_commit(
                        tx,
                        &events,
                        audit(&owned, AuditAction::Update, "branches", branch.id, details(changes)),
                    );
                    Ok(branch)
                })
            })
            .await?;
        Ok(branch.into())
    }
}

#[async_trait]
impl Handler<SetDefaultBranch, BranchResponse> for BranchHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: SetDefaultBranch,
    ) -> AppResult<BranchResponse> {
        let company_id = require_company_admin(ctx)?;
        let events = self.deps.events.clone();
        let owned = ctx.clone();
        let branch = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    let branch =
                        BranchRepository::set_default(tx.conn(), company_id, request.id).await?;
                    publish_after_commit(
                        tx,
                        &events,
                        audit(
                            &owned,
                            AuditAction::Update,
                            "branches",
                            branch.id,
                            details(json!({ "isDefault": true })),
                        ),
                    );
                    Ok(branch)
                })
            })
            .await?;
        Ok(branch.into())
    }
}

#[async_trait]
impl Handler<DeleteBranch, NoResponse> for BranchHandler {
    async fn handle(&self, ctx: &RequestContext, request: DeleteBranch) -> AppResult<NoResponse> {
        let company_id = require_company_admin(ctx)?;
        let events = self.deps.events.clone();
        let owned = ctx.clone();
        self.deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    let branch =
                        BranchRepository::soft_delete(tx.conn(), company_id, request.id).await?;
                    publish_after_commit(
                        tx,
                        &events,
                        audit(
                            &owned,
                            AuditAction::Delete,
                            "branches",
                            branch.id,
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
        .register::<ListBranches, PageResponse<BranchResponse>, _>(BranchHandler { deps: deps.clone() })
        .register::<CreateBranch, BranchResponse, _>(BranchHandler { deps: deps.clone() })
        .register::<ChangeBranchStatus, BranchResponse, _>(BranchHandler { deps: deps.clone() })
        .register::<SetDefaultBranch, BranchResponse, _>(BranchHandler { deps: deps.clone() })
        .register::<DeleteBranch, NoResponse, _>(BranchHandler { deps: deps.clone() });
}
