//! Database layer with `SeaORM` entities, repositories and the transactor.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The tenant-scoped [`Transactor`] with post-commit hooks
//! - Repositories for identity, tenancy, HR data and payroll
//! - Translation of database errors into `AppError`
//! - The audit-log subscriber
//! - Database migrations

pub mod audit;
pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;
pub mod transactor;

pub use audit::spawn_audit_writer;
pub use error::map_db_err;
pub use repositories::{
    AuditLogRepository, CompanyRepository, PermissionRepository, SessionRepository,
    UserRepository,
};
pub use transactor::{PostCommitHook, TenantScope, Transactor, TxContext};

use std::time::Duration;

use hrms_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes the connection pool.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    Database::connect(options).await
}
