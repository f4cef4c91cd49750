//! Payroll error types.
//!
//! Every variant maps onto one kind of the shared error taxonomy so
//! handlers can bubble them up with `?`.

use hrms_shared::AppError;
use thiserror::Error;

use crate::payroll::types::RunStatus;

/// Item field guarded by an employee permission flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedResource {
    /// Water meter readings and charge.
    Water,
    /// Electric meter readings and charge.
    Electric,
    /// Internet charge.
    Internet,
    /// Doctor fee.
    DoctorFee,
    /// Employee social security contribution.
    SocialSecurity,
    /// Employee provident fund contribution.
    ProvidentFund,
    /// Income tax withholding.
    Tax,
}

impl GuardedResource {
    /// Resource name with its verb, as used in error messages.
    #[must_use]
    pub const fn phrase(&self) -> &'static str {
        match self {
            Self::Water => "water charges are",
            Self::Electric => "electric charges are",
            Self::Internet => "internet charges are",
            Self::DoctorFee => "doctor fee is",
            Self::SocialSecurity => "social security contribution is",
            Self::ProvidentFund => "provident fund contribution is",
            Self::Tax => "tax withholding is",
        }
    }
}

/// Errors raised by payroll run and item operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayrollError {
    /// The run is approved and therefore frozen.
    #[error("approved run cannot be modified")]
    RunApproved,

    /// Requested status change is not part of the run state machine.
    #[error("invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: RunStatus,
        /// Requested status.
        to: RunStatus,
    },

    /// Only company admins approve runs.
    #[error("only admins can approve payroll runs")]
    ApprovalRequiresAdmin,

    /// Items are adjustable only while the run is pending.
    #[error("payroll run must be pending to adjust items")]
    RunNotPending,

    /// The employee's permission flags forbid the field.
    #[error("{} not allowed for this employee", .0.phrase())]
    NotAllowed(GuardedResource),

    /// Advance repayment without an advance.
    #[error("advance repayment requires an outstanding advance")]
    NoOutstandingAdvance,

    /// Loan repayment without a loan.
    #[error("loan repayment requires an outstanding loan")]
    NoOutstandingLoan,

    /// Money fields are never negative.
    #[error("{0} cannot be negative")]
    NegativeAmount(&'static str),

    /// Rates are fractions in `[0, 1]`.
    #[error("{0} must be between 0 and 1")]
    InvalidRate(&'static str),

    /// The patch changes nothing.
    #[error("no fields to update")]
    NoFieldsToUpdate,

    /// Payroll months are keyed by their first day.
    #[error("payroll month must be the first day of a month")]
    InvalidPayrollMonth,

    /// Pay date lies before the period start.
    #[error("pay date cannot be before period start")]
    PayDateBeforePeriod,

    /// Another approved run already covers the month.
    #[error("an approved payroll run already exists for this month")]
    AlreadyApprovedForMonth,

    /// Another non-deleted run already covers the month.
    #[error("a payroll run already exists for this month")]
    DuplicateRun,
}

impl From<PayrollError> for AppError {
    fn from(err: PayrollError) -> Self {
        let message = err.to_string();
        match err {
            PayrollError::ApprovalRequiresAdmin => Self::Forbidden(message),
            PayrollError::NotAllowed(_)
            | PayrollError::AlreadyApprovedForMonth
            | PayrollError::DuplicateRun => Self::Conflict(message),
            PayrollError::RunApproved
            | PayrollError::InvalidTransition { .. }
            | PayrollError::RunNotPending
            | PayrollError::NoOutstandingAdvance
            | PayrollError::NoOutstandingLoan
            | PayrollError::NegativeAmount(_)
            | PayrollError::InvalidRate(_)
            | PayrollError::NoFieldsToUpdate
            | PayrollError::InvalidPayrollMonth
            | PayrollError::PayDateBeforePeriod => Self::BadRequest(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(GuardedResource::Water, "water charges are not allowed for this employee")]
    #[case(GuardedResource::Electric, "electric charges are not allowed for this employee")]
    #[case(GuardedResource::Internet, "internet charges are not allowed for this employee")]
    #[case(GuardedResource::DoctorFee, "doctor fee is not allowed for this employee")]
    #[case(GuardedResource::SocialSecurity, "social security contribution is not allowed for this employee")]
    #[case(GuardedResource::ProvidentFund, "provident fund contribution is not allowed for this employee")]
    #[case(GuardedResource::Tax, "tax withholding is not allowed for this employee")]
    fn test_not_allowed_is_conflict(#[case] resource: GuardedResource, #[case] message: &str) {
        let err: AppError = PayrollError::NotAllowed(resource).into();
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.message(), message);
    }

    #[test]
    fn test_approved_run_is_bad_request() {
        let err: AppError = PayrollError::RunApproved.into();
        assert_eq!(err, AppError::bad_request("approved run cannot be modified"));
    }

    #[test]
    fn test_transition_message_names_states() {
        let err = PayrollError::InvalidTransition {
            from: RunStatus::Processing,
            to: RunStatus::Approved,
        };
        assert_eq!(
            err.to_string(),
            "invalid status transition from processing to approved"
        );
    }

    #[test]
    fn test_approval_requires_admin_is_forbidden() {
        let err: AppError = PayrollError::ApprovalRequiresAdmin.into();
        assert_eq!(err.status_code(), 403);
    }
}
