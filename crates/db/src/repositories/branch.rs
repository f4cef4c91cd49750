//! Branch repository.
//!
//! All functions expect a connection scoped to the owning company.

use hrms_core::org::{BranchPolicy, OrgStatus as CoreOrgStatus};
use hrms_shared::{AppError, AppResult, types::PageRequest};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, sea_query::Expr,
};
use uuid::Uuid;

use crate::entities::{branches, sea_orm_active_enums::OrgStatus};
use crate::error::map_db_err;

/// Input for creating a branch.
#[derive(Debug, Clone)]
pub struct CreateBranchInput {
    /// Short code, unique within the company.
    pub code: String,
    /// Display name.
    pub name: String,
}

/// Branch repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchRepository;

impl BranchRepository {
    /// Lists non-deleted branches of `company_id` ordered by code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<(Vec<branches::Model>, u64)> {
        let query = branches::Entity::find()
            .filter(branches::Column::CompanyId.eq(company_id))
            .filter(branches::Column::DeletedAt.is_null());

        let total = query.clone().count(conn).await.map_err(map_db_err)?;
        let rows = query
            .order_by_asc(branches::Column::Code)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await
            .map_err(map_db_err)?;

        Ok((rows, total))
    }

    /// Finds a non-deleted branch of `company_id`.
    ///
    /// # Errors
    ///
    /// Returns `not_found` if no such branch exists.
    pub async fn find<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        id: Uuid,
    ) -> AppResult<branches::Model> {
        branches::Entity::find_by_id(id)
            .filter(branches::Column::CompanyId.eq(company_id))
            .filter(branches::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("branch not found"))
    }

    async fn find_for_update<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        id: Uuid,
    ) -> AppResult<branches::Model> {
        branches::Entity::find_by_id(id)
            .filter(branches::Column::CompanyId.eq(company_id))
            .filter(branches::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("branch not found"))
    }

    /// Creates an active, non-default branch.
    ///
    /// # Errors
    ///
    /// Returns `bad_request` for blank input and `conflict` for a duplicate
    /// code.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        input: CreateBranchInput,
    ) -> AppResult<branches::Model> {
        let code = input.code.trim().to_uppercase();
        let name = input.name.trim().to_string();
        if code.is_empty() || name.is_empty() {
            return Err(AppError::bad_request("branch code and name are required"));
        }

        let now = chrono::Utc::now().into();
        branches::ActiveModel {
            id: Set(Uuid::now_v7()),
            company_id: Set(company_id),
            code: Set(code),
            name: Set(name),
            status: Set(OrgStatus::Active),
            is_default: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .map_err(map_db_err)
    }

    /// Moves a branch to `target` status.
    ///
    /// # Errors
    ///
    /// Returns `bad_request` when the branch policy rejects the change.
    pub async fn change_status<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        id: Uuid,
        target: CoreOrgStatus,
    ) -> AppResult<branches::Model> {
        let branch = Self::find_for_update(conn, company_id, id).await?;
        let status = BranchPolicy::change_status(branch.status.into(), target, branch.is_default)?;

        let mut active: branches::ActiveModel = branch.into();
        active.status = Set(status.into());
        active.updated_at = Set(chrono::Utc::now().into());
        active.update(conn).await.map_err(map_db_err)
    }

    /// Makes `id` the company's default branch, clearing the previous one.
    ///
    /// # Errors
    ///
    /// Returns `bad_request` when the branch is not active.
    pub async fn set_default<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        id: Uuid,
    ) -> AppResult<branches::Model> {
        let branch = Self::find_for_update(conn, company_id, id).await?;
        BranchPolicy::ensure_can_be_default(branch.status.into())?;
        if branch.is_default {
            return Ok(branch);
        }

        let now = chrono::Utc::now();
        branches::Entity::update_many()
            .col_expr(branches::Column::IsDefault, Expr::value(false))
            .col_expr(branches::Column::UpdatedAt, Expr::value(now))
            .filter(branches::Column::CompanyId.eq(company_id))
            .filter(branches::Column::IsDefault.eq(true))
            .exec(conn)
            .await
            .map_err(map_db_err)?;

        let mut active: branches::ActiveModel = branch.into();
        active.is_default = Set(true);
        active.updated_at = Set(now.into());
        active.update(conn).await.map_err(map_db_err)
    }

    /// Soft-deletes an archived, non-default branch.
    ///
    /// # Errors
    ///
    /// Returns `bad_request` for the default branch or a non-archived one.
    pub async fn soft_delete<C: ConnectionTrait>(
        conn: &C,
        company_id: Uuid,
        id: Uuid,
    ) -> AppResult<branches::Model> {
        let branch = Self::find_for_update(conn, company_id, id).await?;
        BranchPolicy::ensure_deletable(branch.status.into(), branch.is_default)?;

        let now = chrono::Utc::now().into();
        let mut active: branches::ActiveModel = branch.into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);
        active.update(conn).await.map_err(map_db_err)
    }
}
