//! Company roles and branch assignments.
//!
//! Backs the tenant middleware through [`TenantAccessStore`]. Role rows live
//! outside row-level security; branch lookups run inside a company scope so
//! the branch policies see the company being resolved.

use async_trait::async_trait;
use hrms_shared::{AppResult, Role, TenantAccessStore};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::{
    branches, companies, sea_orm_active_enums::UserRole, user_branch_access, user_company_roles,
};
use crate::error::map_db_err;
use crate::transactor::{TenantScope, Transactor};

/// Company the user belongs to, with their role there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    /// The company.
    pub company: companies::Model,
    /// Role inside the company.
    pub role: Role,
}

/// Permission repository.
#[derive(Debug, Clone)]
pub struct PermissionRepository {
    transactor: Transactor,
}

impl PermissionRepository {
    /// Creates a new permission repository.
    #[must_use]
    pub const fn new(transactor: Transactor) -> Self {
        Self { transactor }
    }

    /// Grants `role` inside `company_id`.
    ///
    /// # Errors
    ///
    /// Returns `conflict` if the user already has a role there.
    pub async fn grant_company_role<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        company_id: Uuid,
        role: Role,
    ) -> AppResult<user_company_roles::Model> {
        user_company_roles::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            company_id: Set(company_id),
            role: Set(UserRole::from(role)),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(conn)
        .await
        .map_err(map_db_err)
    }

    /// Assigns `branch_id` to the user.
    ///
    /// # Errors
    ///
    /// Returns `conflict` if the assignment exists.
    pub async fn grant_branch_access<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
        branch_id: Uuid,
    ) -> AppResult<user_branch_access::Model> {
        user_branch_access::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            branch_id: Set(branch_id),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(conn)
        .await
        .map_err(map_db_err)
    }

    /// Lists the non-deleted companies the user holds a role in.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn memberships(&self, user_id: Uuid) -> AppResult<Vec<Membership>> {
        let rows = user_company_roles::Entity::find()
            .filter(user_company_roles::Column::UserId.eq(user_id))
            .find_also_related(companies::Entity)
            .order_by_asc(user_company_roles::Column::CreatedAt)
            .all(self.transactor.connection())
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .filter_map(|(grant, company)| {
                company
                    .filter(|c| c.deleted_at.is_none())
                    .map(|company| Membership {
                        company,
                        role: grant.role.into(),
                    })
            })
            .collect())
    }
}

#[async_trait]
impl TenantAccessStore for PermissionRepository {
    async fn company_role(&self, user_id: Uuid, company_id: Uuid) -> AppResult<Option<Role>> {
        let grant = user_company_roles::Entity::find()
            .filter(user_company_roles::Column::UserId.eq(user_id))
            .filter(user_company_roles::Column::CompanyId.eq(company_id))
            .one(self.transactor.connection())
            .await
            .map_err(map_db_err)?;

        Ok(grant.map(|g| g.role.into()))
    }

    async fn assigned_branches(&self, user_id: Uuid, company_id: Uuid) -> AppResult<Vec<Uuid>> {
        self.transactor
            .within_scope(TenantScope::company(company_id), move |tx| {
                Box::pin(async move {
                    let visible = company_branch_ids(tx.conn(), company_id).await?;
                    if visible.is_empty() {
                        return Ok(Vec::new());
                    }

                    user_branch_access::Entity::find()
                        .select_only()
                        .column(user_branch_access::Column::BranchId)
                        .filter(user_branch_access::Column::UserId.eq(user_id))
                        .filter(user_branch_access::Column::BranchId.is_in(visible))
                        .order_by_asc(user_branch_access::Column::BranchId)
                        .into_tuple::<Uuid>()
                        .all(tx.conn())
                        .await
                        .map_err(map_db_err)
                })
            })
            .await
    }

    async fn company_branches(&self, company_id: Uuid) -> AppResult<Vec<Uuid>> {
        self.transactor
            .within_scope(TenantScope::company(company_id), move |tx| {
                Box::pin(async move { company_branch_ids(tx.conn(), company_id).await })
            })
            .await
    }
}

async fn company_branch_ids<C: ConnectionTrait>(conn: &C, company_id: Uuid) -> AppResult<Vec<Uuid>> {
    branches::Entity::find()
        .select_only()
        .column(branches::Column::Id)
        .filter(branches::Column::CompanyId.eq(company_id))
        .filter(branches::Column::DeletedAt.is_null())
        .order_by_asc(branches::Column::Id)
        .into_tuple::<Uuid>()
        .all(conn)
        .await
        .map_err(map_db_err)
}
