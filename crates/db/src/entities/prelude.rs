//! Entity re-exports.

pub use super::audit_logs::Entity as AuditLogs;
pub use super::branches::Entity as Branches;
pub use super::companies::Entity as Companies;
pub use super::employees::Entity as Employees;
pub use super::payroll_accumulations::Entity as PayrollAccumulations;
pub use super::payroll_run_items::Entity as PayrollRunItems;
pub use super::payroll_runs::Entity as PayrollRuns;
pub use super::sessions::Entity as Sessions;
pub use super::user_branch_access::Entity as UserBranchAccess;
pub use super::user_company_roles::Entity as UserCompanyRoles;
pub use super::users::Entity as Users;
pub use super::worklogs::Entity as Worklogs;
