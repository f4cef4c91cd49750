//! Company creation and the caller's company list.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use hrms_core::org::OrgStatus;
use hrms_db::repositories::CreateCompanyInput;
use hrms_db::{CompanyRepository, PermissionRepository};
use hrms_shared::auth::CompanyMembership;
use hrms_shared::{
    AppResult, AuditAction, EventBus, Handler, LogEvent, MediatorBuilder, RequestContext,
};

use super::auth::membership_response;
use super::{CommandDeps, utc};

/// Creates a company with its default branch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompany {
    /// Short unique code.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// Lists the companies the caller has a role in.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListMyCompanies;

/// A newly created company.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyResponse {
    /// Company ID.
    pub id: Uuid,
    /// Short code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: OrgStatus,
    /// The `HQ` branch created with the company.
    pub default_branch_id: Uuid,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

struct CreateCompanyHandler {
    companies: CompanyRepository,
    events: EventBus,
}

#[async_trait]
impl Handler<CreateCompany, CompanyResponse> for CreateCompanyHandler {
    async fn handle(&self, ctx: &RequestContext, request: CreateCompany) -> AppResult<CompanyResponse> {
        let created = self
            .companies
            .create(
                CreateCompanyInput {
                    code: request.code,
                    name: request.name,
                },
                ctx.user().id,
            )
            .await?;

        let company = created.company;
        let mut event = LogEvent::from_context(ctx, AuditAction::Create, "companies", company.id);
        event.company_id = Some(company.id);
        self.events.publish(&event);

        tracing::info!(company_id = %company.id, code = %company.code, "company created");
        Ok(CompanyResponse {
            id: company.id,
            code: company.code,
            name: company.name,
            status: company.status.into(),
            default_branch_id: created.default_branch.id,
            created_at: utc(company.created_at),
        })
    }
}

struct ListMyCompaniesHandler {
    permissions: PermissionRepository,
}

#[async_trait]
impl Handler<ListMyCompanies, Vec<CompanyMembership>> for ListMyCompaniesHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        _request: ListMyCompanies,
    ) -> AppResult<Vec<CompanyMembership>> {
        Ok(self
            .permissions
            .memberships(ctx.user().id)
            .await?
            .into_iter()
            .map(membership_response)
            .collect())
    }
}

pub(crate) fn register(builder: &mut MediatorBuilder, deps: &CommandDeps) {
    builder
        .register::<CreateCompany, CompanyResponse, _>(CreateCompanyHandler {
            companies: CompanyRepository::new(deps.transactor.clone()),
            events: deps.events.clone(),
        })
        .register::<ListMyCompanies, Vec<CompanyMembership>, _>(ListMyCompaniesHandler {
            permissions: PermissionRepository::new(deps.transactor.clone()),
        });
}
