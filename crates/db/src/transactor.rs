//! Tenant-scoped transactions with post-commit hooks.
//!
//! Every repository write (and every read of a tenant table) runs inside
//! [`Transactor::within_transaction`]. Before the body runs, the transaction
//! publishes the caller's company and branch selection as transaction-local
//! settings that the row-level security policies read:
//!
//! - `app.company_id`: the selected company
//! - `app.branch_id`: the single selected branch, empty otherwise
//! - `app.branch_ids`: comma-separated selection, empty means every branch
//!
//! Side effects that must not happen on rollback are registered with
//! [`TxContext::after_commit`] and run, in registration order, only once the
//! outermost transaction has committed.
//!
//! # Usage
//!
//! ```ignore
//! let run = transactor
//!     .within_transaction(&ctx, move |tx| {
//!         Box::pin(async move {
//!             let run = payroll_runs::Entity::find_by_id(id).one(tx.conn()).await
//!                 .map_err(map_db_err)?;
//!             tx.after_commit(async move { bus.publish(&event); Ok(()) });
//!             Ok(run)
//!         })
//!     })
//!     .await?;
//! ```

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use futures::future::BoxFuture;
use hrms_shared::{AppError, AppResult, RequestContext, TenantInfo};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, Statement,
    TransactionTrait,
};
use uuid::Uuid;

use crate::error::map_db_err;

/// Work deferred until the outermost transaction commits.
pub type PostCommitHook = BoxFuture<'static, anyhow::Result<()>>;

/// Company and branch selection published to row-level security.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantScope {
    /// Selected company.
    pub company_id: Uuid,
    /// Selected branches; empty means every branch of the company.
    pub branch_ids: Vec<Uuid>,
}

impl TenantScope {
    /// Scope covering every branch of `company_id`.
    #[must_use]
    pub const fn company(company_id: Uuid) -> Self {
        Self {
            company_id,
            branch_ids: Vec::new(),
        }
    }

    /// Scope resolved by the tenant middleware.
    #[must_use]
    pub fn from_tenant(tenant: &TenantInfo) -> Self {
        Self {
            company_id: tenant.company_id,
            branch_ids: tenant.branch_ids.clone(),
        }
    }

    fn branch_setting(&self) -> String {
        match self.branch_ids.as_slice() {
            [only] => only.to_string(),
            _ => String::new(),
        }
    }

    fn branch_ids_setting(&self) -> String {
        self.branch_ids
            .iter()
            .map(Uuid::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Opens tenant-scoped transactions on the shared pool.
#[derive(Debug, Clone)]
pub struct Transactor {
    db: DatabaseConnection,
}

impl Transactor {
    /// Wraps the connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Pooled handle for statements that need no tenant scope.
    ///
    /// Only tables without row-level security (users, sessions, companies,
    /// permissions, audit logs) may be queried through it.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Runs `body` in a transaction scoped to the tenant resolved for `ctx`.
    ///
    /// # Errors
    ///
    /// Returns `internal` when `ctx` carries no tenant, any error returned by
    /// `body`, or a mapped database error from begin/commit.
    pub async fn within_transaction<T, F>(&self, ctx: &RequestContext, body: F) -> AppResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c TxContext) -> BoxFuture<'c, AppResult<T>> + Send,
    {
        let tenant = ctx
            .tenant()
            .ok_or_else(|| AppError::internal("transaction opened without tenant scope"))?;
        self.within_scope(TenantScope::from_tenant(tenant), body)
            .await
    }

    /// Runs `body` in a transaction scoped to `scope`.
    ///
    /// Commits when `body` succeeds and then runs the registered hooks;
    /// rolls back and discards the hooks otherwise.
    ///
    /// # Errors
    ///
    /// Returns any error returned by `body`, or a mapped database error from
    /// begin, the scope statement or commit.
    pub async fn within_scope<T, F>(&self, scope: TenantScope, body: F) -> AppResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c TxContext) -> BoxFuture<'c, AppResult<T>> + Send,
    {
        let txn = self.db.begin().await.map_err(map_db_err)?;
        apply_scope(&txn, &scope).await.map_err(map_db_err)?;

        let tx = TxContext {
            txn,
            scope,
            hooks: Mutex::new(Vec::new()),
        };

        let result = body(&tx).await;
        let TxContext { txn, hooks, .. } = tx;
        let hooks = hooks.into_inner().unwrap_or_else(PoisonError::into_inner);

        match result {
            Ok(value) => {
                commit_and_run_hooks(txn, hooks).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::error!(error = %rollback, "transaction rollback failed");
                }
                if !hooks.is_empty() {
                    tracing::debug!(discarded = hooks.len(), "rolled back, dropping hooks");
                }
                Err(err)
            }
        }
    }
}

/// Publishes `scope` to the row-level security settings of `txn`.
async fn apply_scope(txn: &DatabaseTransaction, scope: &TenantScope) -> Result<(), sea_orm::DbErr> {
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT set_config('app.company_id', $1, true), \
                set_config('app.branch_id', $2, true), \
                set_config('app.branch_ids', $3, true)",
        [
            scope.company_id.to_string().into(),
            scope.branch_setting().into(),
            scope.branch_ids_setting().into(),
        ],
    ))
    .await?;
    Ok(())
}

/// Commits `txn` and then runs `hooks` in order, both on a spawned task.
///
/// The task is awaited, so hooks finish before the response is produced.
/// Once spawned, dropping the caller no longer loses the commit's hooks.
async fn commit_and_run_hooks(txn: DatabaseTransaction, hooks: Vec<PostCommitHook>) -> AppResult<()> {
    let task = tokio::spawn(async move {
        txn.commit().await.map_err(map_db_err)?;
        for (index, hook) in hooks.into_iter().enumerate() {
            if let Err(err) = hook.await {
                tracing::warn!(hook = index, error = %err, "post-commit hook failed");
            }
        }
        Ok::<_, AppError>(())
    });

    task.await.map_err(|err| {
        tracing::error!(error = %err, "commit task aborted");
        AppError::internal("commit task aborted")
    })?
}

/// An open, tenant-scoped transaction.
pub struct TxContext {
    txn: DatabaseTransaction,
    scope: TenantScope,
    hooks: Mutex<Vec<PostCommitHook>>,
}

impl std::fmt::Debug for TxContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TxContext")
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl TxContext {
    /// Handle every statement of the body must go through.
    #[must_use]
    pub const fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// The tenant scope this transaction was opened with.
    #[must_use]
    pub const fn scope(&self) -> &TenantScope {
        &self.scope
    }

    /// Registers `hook` to run after the outermost commit.
    pub fn after_commit<Fut>(&self, hook: Fut)
    where
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.hooks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::pin(hook));
    }

    /// Runs `body` in a savepoint of this transaction.
    ///
    /// Hooks registered by `body` join this transaction's hooks on success
    /// and are dropped when the savepoint rolls back.
    ///
    /// # Errors
    ///
    /// Returns any error returned by `body`, or a mapped database error from
    /// the savepoint statements.
    pub async fn within<T, F>(&self, body: F) -> AppResult<T>
    where
        T: Send,
        F: for<'c> FnOnce(&'c TxContext) -> BoxFuture<'c, AppResult<T>> + Send,
    {
        let child = Self {
            txn: self.txn.begin().await.map_err(map_db_err)?,
            scope: self.scope.clone(),
            hooks: Mutex::new(Vec::new()),
        };

        let result = body(&child).await;
        let Self { txn, hooks, .. } = child;
        let hooks = hooks.into_inner().unwrap_or_else(PoisonError::into_inner);

        match result {
            Ok(value) => {
                txn.commit().await.map_err(map_db_err)?;
                self.hooks
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .extend(hooks);
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::error!(error = %rollback, "savepoint rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hrms_shared::{Role, UserInfo};

    fn ctx(tenant: Option<TenantInfo>) -> RequestContext {
        let ctx = RequestContext::new(UserInfo {
            id: Uuid::new_v4(),
            username: "payroll-admin".to_string(),
            role: Role::Admin,
        });
        match tenant {
            Some(tenant) => ctx.with_tenant(tenant),
            None => ctx,
        }
    }

    fn tenant(company_id: Uuid, branch_ids: Vec<Uuid>) -> TenantInfo {
        TenantInfo {
            company_id,
            branch_ids,
            is_admin: true,
        }
    }

    #[test]
    fn test_scope_settings() {
        let b1 = Uuid::new_v4();
        let b2 = Uuid::new_v4();

        let single = TenantScope {
            company_id: Uuid::new_v4(),
            branch_ids: vec![b1],
        };
        assert_eq!(single.branch_setting(), b1.to_string());
        assert_eq!(single.branch_ids_setting(), b1.to_string());

        let many = TenantScope {
            company_id: Uuid::new_v4(),
            branch_ids: vec![b1, b2],
        };
        assert_eq!(many.branch_setting(), "");
        assert_eq!(many.branch_ids_setting(), format!("{b1},{b2}"));

        let all = TenantScope::company(Uuid::new_v4());
        assert_eq!(all.branch_setting(), "");
        assert_eq!(all.branch_ids_setting(), "");
    }

    #[test]
    fn test_scope_from_tenant() {
        let company_id = Uuid::new_v4();
        let branch_id = Uuid::new_v4();
        let scope = TenantScope::from_tenant(&tenant(company_id, vec![branch_id]));
        assert_eq!(scope.company_id, company_id);
        assert_eq!(scope.branch_ids, vec![branch_id]);
    }

    #[tokio::test]
    async fn test_missing_tenant_is_internal() {
        let transactor = Transactor::new(DatabaseConnection::Disconnected);
        let err = transactor
            .within_transaction(&ctx(None), |_tx| Box::pin(async { Ok(()) }))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AppError::internal("transaction opened without tenant scope")
        );
    }
}
