//! Repository abstractions for data access.
//!
//! Identity and permission repositories own a connection. Tenant data
//! repositories are stateless and take the connection of the surrounding
//! [`crate::transactor::TxContext`], so several of them can share one
//! transaction.

pub mod accumulation;
pub mod audit_log;
pub mod branch;
pub mod company;
pub mod employee;
pub mod payroll_item;
pub mod payroll_run;
pub mod permission;
pub mod session;
pub mod user;
pub mod worklog;

pub use accumulation::AccumulationRepository;
pub use audit_log::AuditLogRepository;
pub use branch::{BranchRepository, CreateBranchInput};
pub use company::{CompanyRepository, CreateCompanyInput, CreatedCompany};
pub use employee::{CreateEmployeeInput, EmployeeFilter, EmployeeRepository};
pub use payroll_item::{AdjustedItem, PayrollItemRepository};
pub use payroll_run::{CreatedRun, PayrollRunRepository, RunFilter, RunUpdate, UpdatedRun};
pub use permission::{Membership, PermissionRepository};
pub use session::SessionRepository;
pub use user::UserRepository;
pub use worklog::{CreateWorklogInput, WorklogFilter, WorklogRepository};
