//! Text-backed enums stored in database columns.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use hrms_core::employee::EmployeeStatus as CoreEmployeeStatus;
use hrms_core::org::OrgStatus as CoreOrgStatus;
use hrms_core::payroll::{AccumType as CoreAccumType, RunStatus as CoreRunStatus};
use hrms_core::worklog::EntryType as CoreEntryType;
use hrms_shared::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[sea_orm(string_value = "superadmin")]
    Superadmin,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "hr")]
    Hr,
    #[sea_orm(string_value = "staff")]
    Staff,
}

impl From<UserRole> for Role {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Superadmin => Self::Superadmin,
            UserRole::Admin => Self::Admin,
            UserRole::Hr => Self::Hr,
            UserRole::Staff => Self::Staff,
        }
    }
}

impl From<Role> for UserRole {
    fn from(role: Role) -> Self {
        match role {
            Role::Superadmin => Self::Superadmin,
            Role::Admin => Self::Admin,
            Role::Hr => Self::Hr,
            Role::Staff => Self::Staff,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum OrgStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "suspended")]
    Suspended,
    #[sea_orm(string_value = "archived")]
    Archived,
}

impl From<OrgStatus> for CoreOrgStatus {
    fn from(status: OrgStatus) -> Self {
        match status {
            OrgStatus::Active => Self::Active,
            OrgStatus::Suspended => Self::Suspended,
            OrgStatus::Archived => Self::Archived,
        }
    }
}

impl From<CoreOrgStatus> for OrgStatus {
    fn from(status: CoreOrgStatus) -> Self {
        match status {
            CoreOrgStatus::Active => Self::Active,
            CoreOrgStatus::Suspended => Self::Suspended,
            CoreOrgStatus::Archived => Self::Archived,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "resigned")]
    Resigned,
}

impl From<EmployeeStatus> for CoreEmployeeStatus {
    fn from(status: EmployeeStatus) -> Self {
        match status {
            EmployeeStatus::Active => Self::Active,
            EmployeeStatus::Resigned => Self::Resigned,
        }
    }
}

impl From<CoreEmployeeStatus> for EmployeeStatus {
    fn from(status: CoreEmployeeStatus) -> Self {
        match status {
            CoreEmployeeStatus::Active => Self::Active,
            CoreEmployeeStatus::Resigned => Self::Resigned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum PayrollRunStatus {
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
}

impl From<PayrollRunStatus> for CoreRunStatus {
    fn from(status: PayrollRunStatus) -> Self {
        match status {
            PayrollRunStatus::Processing => Self::Processing,
            PayrollRunStatus::Pending => Self::Pending,
            PayrollRunStatus::Approved => Self::Approved,
        }
    }
}

impl From<CoreRunStatus> for PayrollRunStatus {
    fn from(status: CoreRunStatus) -> Self {
        match status {
            CoreRunStatus::Processing => Self::Processing,
            CoreRunStatus::Pending => Self::Pending,
            CoreRunStatus::Approved => Self::Approved,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum AccumType {
    #[sea_orm(string_value = "tax")]
    Tax,
    #[sea_orm(string_value = "sso")]
    Sso,
    #[sea_orm(string_value = "sso_employer")]
    SsoEmployer,
    #[sea_orm(string_value = "pf")]
    Pf,
    #[sea_orm(string_value = "pf_employer")]
    PfEmployer,
    #[sea_orm(string_value = "loan_outstanding")]
    LoanOutstanding,
}

impl From<AccumType> for CoreAccumType {
    fn from(kind: AccumType) -> Self {
        match kind {
            AccumType::Tax => Self::Tax,
            AccumType::Sso => Self::Sso,
            AccumType::SsoEmployer => Self::SsoEmployer,
            AccumType::Pf => Self::Pf,
            AccumType::PfEmployer => Self::PfEmployer,
            AccumType::LoanOutstanding => Self::LoanOutstanding,
        }
    }
}

impl From<CoreAccumType> for AccumType {
    fn from(kind: CoreAccumType) -> Self {
        match kind {
            CoreAccumType::Tax => Self::Tax,
            CoreAccumType::Sso => Self::Sso,
            CoreAccumType::SsoEmployer => Self::SsoEmployer,
            CoreAccumType::Pf => Self::Pf,
            CoreAccumType::PfEmployer => Self::PfEmployer,
            CoreAccumType::LoanOutstanding => Self::LoanOutstanding,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum WorklogEntryType {
    #[sea_orm(string_value = "late")]
    Late,
    #[sea_orm(string_value = "leave_day")]
    LeaveDay,
    #[sea_orm(string_value = "leave_hours")]
    LeaveHours,
    #[sea_orm(string_value = "leave_double")]
    LeaveDouble,
    #[sea_orm(string_value = "ot")]
    Ot,
}

impl From<WorklogEntryType> for CoreEntryType {
    fn from(kind: WorklogEntryType) -> Self {
        match kind {
            WorklogEntryType::Late => Self::Late,
            WorklogEntryType::LeaveDay => Self::LeaveDay,
            WorklogEntryType::LeaveHours => Self::LeaveHours,
            WorklogEntryType::LeaveDouble => Self::LeaveDouble,
            WorklogEntryType::Ot => Self::Ot,
        }
    }
}

impl From<CoreEntryType> for WorklogEntryType {
    fn from(kind: CoreEntryType) -> Self {
        match kind {
            CoreEntryType::Late => Self::Late,
            CoreEntryType::LeaveDay => Self::LeaveDay,
            CoreEntryType::LeaveHours => Self::LeaveHours,
            CoreEntryType::LeaveDouble => Self::LeaveDouble,
            CoreEntryType::Ot => Self::Ot,
        }
    }
}
