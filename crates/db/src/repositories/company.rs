//! Company repository.

use hrms_shared::{AppError, AppResult, Role};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::{branches, companies, sea_orm_active_enums::OrgStatus};
use crate::error::map_db_err;
use crate::repositories::permission::PermissionRepository;
use crate::transactor::{TenantScope, Transactor};

/// Code of the branch created with every company.
pub const DEFAULT_BRANCH_CODE: &str = "HQ";

/// Name of the branch created with every company.
pub const DEFAULT_BRANCH_NAME: &str = "Head Office";

/// Input for creating a company.
#[derive(Debug, Clone)]
pub struct CreateCompanyInput {
    /// Unique short code.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// A freshly created company and its default branch.
#[derive(Debug, Clone)]
pub struct CreatedCompany {
    /// The company.
    pub company: companies::Model,
    /// The default branch.
    pub default_branch: branches::Model,
}

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    transactor: Transactor,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(transactor: Transactor) -> Self {
        Self { transactor }
    }

    /// Creates a company, its default branch, and grants `creator` the
    /// company `admin` role in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `bad_request` for blank code or name, `conflict` if the code is
    /// taken, or a database error.
    pub async fn create(&self, input: CreateCompanyInput, creator: Uuid) -> AppResult<CreatedCompany> {
        let code = input.code.trim().to_uppercase();
        let name = input.name.trim().to_string();
        if code.is_empty() || name.is_empty() {
            return Err(AppError::bad_request("company code and name are required"));
        }

        let company_id = Uuid::now_v7();
        self.transactor
            .within_scope(TenantScope::company(company_id), move |tx| {
                Box::pin(async move {
                    let now = chrono::Utc::now().into();

                    let company = companies::ActiveModel {
                        id: Set(company_id),
                        code: Set(code),
                        name: Set(name),
                        status: Set(OrgStatus::Active),
                        created_by: Set(Some(creator)),
                        created_at: Set(now),
                        updated_at: Set(now),
                        deleted_at: Set(None),
                    }
                    .insert(tx.conn())
                    .await
                    .map_err(map_db_err)?;

                    let default_branch = branches::ActiveModel {
                        id: Set(Uuid::now_v7()),
                        company_id: Set(company_id),
                        code: Set(DEFAULT_BRANCH_CODE.to_string()),
                        name: Set(DEFAULT_BRANCH_NAME.to_string()),
                        status: Set(OrgStatus::Active),
                        is_default: Set(true),
                        created_at: Set(now),
                        updated_at: Set(now),
                        deleted_at: Set(None),
                    }
                    .insert(tx.conn())
                    .await
                    .map_err(map_db_err)?;

                    PermissionRepository::grant_company_role(
                        tx.conn(),
                        creator,
                        company_id,
                        Role::Admin,
                    )
                    .await?;

                    Ok(CreatedCompany {
                        company,
                        default_branch,
                    })
                })
            })
            .await
    }

    /// Finds a non-deleted company by ID.
    ///
    /// # Errors
    ///
    /// Returns `not_found` if the company does not exist.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<companies::Model> {
        companies::Entity::find_by_id(id)
            .filter(companies::Column::DeletedAt.is_null())
            .one(self.transactor.connection())
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("company not found"))
    }
}
