//! `SeaORM` entity definitions, one module per table.

#![allow(missing_docs)]

pub mod prelude;

pub mod audit_logs;
pub mod branches;
pub mod companies;
pub mod employees;
pub mod payroll_accumulations;
pub mod payroll_run_items;
pub mod payroll_runs;
pub mod sea_orm_active_enums;
pub mod sessions;
pub mod user_branch_access;
pub mod user_company_roles;
pub mod users;
pub mod worklogs;
