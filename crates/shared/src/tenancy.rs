//! Permission lookups the tenant middleware relies on.

use async_trait::async_trait;
use uuid::Uuid;

use crate::context::Role;
use crate::error::AppResult;

/// Read access to company roles and branch assignments.
///
/// Implemented by the database layer; tests use in-memory fakes.
#[async_trait]
pub trait TenantAccessStore: Send + Sync {
    /// Role the user holds inside `company_id`, if any.
    async fn company_role(&self, user_id: Uuid, company_id: Uuid) -> AppResult<Option<Role>>;

    /// Non-deleted branches of `company_id` explicitly assigned to the user.
    async fn assigned_branches(&self, user_id: Uuid, company_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// All non-deleted branches of `company_id`.
    async fn company_branches(&self, company_id: Uuid) -> AppResult<Vec<Uuid>>;
}
