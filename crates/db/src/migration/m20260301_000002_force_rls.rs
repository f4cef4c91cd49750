//! Forces row-level security on tenant tables.
//!
//! Without FORCE the policies are skipped for the table owner, which is the
//! role migrations and the API usually share.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(FORCE_RLS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(DISABLE_FORCE_RLS_SQL).await?;

        Ok(())
    }
}

const FORCE_RLS_SQL: &str = r"
-- ============================================================
-- FORCE ROW LEVEL SECURITY
-- Applies tenant policies to the table owner the API connects as
-- ============================================================

ALTER TABLE branches FORCE ROW LEVEL SECURITY;
ALTER TABLE employees FORCE ROW LEVEL SECURITY;
ALTER TABLE worklogs FORCE ROW LEVEL SECURITY;
ALTER TABLE payroll_runs FORCE ROW LEVEL SECURITY;
ALTER TABLE payroll_run_items FORCE ROW LEVEL SECURITY;
ALTER TABLE payroll_accumulations FORCE ROW LEVEL SECURITY;
";

const DISABLE_FORCE_RLS_SQL: &str = r"
-- ============================================================
-- DISABLE FORCE ROW LEVEL SECURITY (Rollback)
-- ============================================================

ALTER TABLE branches NO FORCE ROW LEVEL SECURITY;
ALTER TABLE employees NO FORCE ROW LEVEL SECURITY;
ALTER TABLE worklogs NO FORCE ROW LEVEL SECURITY;
ALTER TABLE payroll_runs NO FORCE ROW LEVEL SECURITY;
ALTER TABLE payroll_run_items NO FORCE ROW LEVEL SECURITY;
ALTER TABLE payroll_accumulations NO FORCE ROW LEVEL SECURITY;
";
