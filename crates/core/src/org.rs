//! Company and branch status rules.

use std::fmt;

use hrms_shared::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status shared by companies and branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrgStatus {
    /// In use.
    Active,
    /// Temporarily disabled.
    Suspended,
    /// Retired; may be soft-deleted.
    Archived,
}

impl OrgStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
            Self::Archived => "archived",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "suspended" => Some(Self::Suspended),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

impl fmt::Display for OrgStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Branch rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BranchError {
    /// The default branch is never deleted.
    #[error("cannot delete default branch")]
    DeleteDefault,

    /// The default branch stays active.
    #[error("cannot suspend or archive default branch")]
    DeactivateDefault,

    /// Archived branches can only be reactivated.
    #[error("cannot change archived branch to suspended")]
    ArchivedToSuspended,

    /// Only archived branches are deletable.
    #[error("only archived branches can be deleted")]
    NotArchived,

    /// Status update to the current status.
    #[error("branch is already {0}")]
    Unchanged(OrgStatus),

    /// Only active branches become the default.
    #[error("default branch must be active")]
    InactiveDefault,
}

impl From<BranchError> for AppError {
    fn from(err: BranchError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Stateless checks for branch changes.
pub struct BranchPolicy;

impl BranchPolicy {
    /// Validates a status change of a branch.
    pub fn change_status(
        current: OrgStatus,
        target: OrgStatus,
        is_default: bool,
    ) -> Result<OrgStatus, BranchError> {
        if current == target {
            return Err(BranchError::Unchanged(current));
        }
        if is_default && target != OrgStatus::Active {
            return Err(BranchError::DeactivateDefault);
        }
        if current == OrgStatus::Archived && target == OrgStatus::Suspended {
            return Err(BranchError::ArchivedToSuspended);
        }
        Ok(target)
    }

    /// Validates a soft delete.
    pub fn ensure_deletable(status: OrgStatus, is_default: bool) -> Result<(), BranchError> {
        if is_default {
            return Err(BranchError::DeleteDefault);
        }
        if status != OrgStatus::Archived {
            return Err(BranchError::NotArchived);
        }
        Ok(())
    }

    /// Validates promoting a branch to default.
    pub fn ensure_can_be_default(status: OrgStatus) -> Result<(), BranchError> {
        if status == OrgStatus::Active {
            Ok(())
        } else {
            Err(BranchError::InactiveDefault)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_branch_is_protected() {
        assert_eq!(
            BranchPolicy::ensure_deletable(OrgStatus::Archived, true),
            Err(BranchError::DeleteDefault)
        );
        assert_eq!(
            BranchPolicy::change_status(OrgStatus::Active, OrgStatus::Suspended, true),
            Err(BranchError::DeactivateDefault)
        );
        assert_eq!(
            BranchError::DeleteDefault.to_string(),
            "cannot delete default branch"
        );
    }

    #[rstest]
    #[case(OrgStatus::Active, OrgStatus::Suspended, Ok(OrgStatus::Suspended))]
    #[case(OrgStatus::Active, OrgStatus::Archived, Ok(OrgStatus::Archived))]
    #[case(OrgStatus::Suspended, OrgStatus::Active, Ok(OrgStatus::Active))]
    #[case(OrgStatus::Archived, OrgStatus::Active, Ok(OrgStatus::Active))]
    #[case(OrgStatus::Archived, OrgStatus::Suspended, Err(BranchError::ArchivedToSuspended))]
    #[case(OrgStatus::Active, OrgStatus::Active, Err(BranchError::Unchanged(OrgStatus::Active)))]
    fn test_status_changes(
        #[case] current: OrgStatus,
        #[case] target: OrgStatus,
        #[case] expected: Result<OrgStatus, BranchError>,
    ) {
        assert_eq!(BranchPolicy::change_status(current, target, false), expected);
    }

    #[test]
    fn test_only_archived_is_deletable() {
        assert_eq!(
            BranchPolicy::ensure_deletable(OrgStatus::Active, false),
            Err(BranchError::NotArchived)
        );
        assert!(BranchPolicy::ensure_deletable(OrgStatus::Archived, false).is_ok());
    }

    #[test]
    fn test_errors_are_bad_request() {
        let err: AppError = BranchError::ArchivedToSuspended.into();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_default_must_be_active() {
        assert!(BranchPolicy::ensure_can_be_default(OrgStatus::Active).is_ok());
        assert_eq!(
            BranchPolicy::ensure_can_be_default(OrgStatus::Suspended),
            Err(BranchError::InactiveDefault)
        );
    }
}
