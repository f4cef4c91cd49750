//! Payroll run state machine.

use hrms_shared::Role;

use crate::payroll::error::PayrollError;
use crate::payroll::types::RunStatus;

/// Outcome of a validated status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunTransition {
    /// Plain status update.
    Move {
        /// Status to store.
        new_status: RunStatus,
    },
    /// Approval: the caller must also stamp the approver and feed the
    /// accumulators.
    Approve,
}

/// Stateless checks for payroll run transitions.
pub struct RunLifecycle;

impl RunLifecycle {
    /// Fails when the run is frozen.
    pub fn ensure_mutable(status: RunStatus) -> Result<(), PayrollError> {
        if status.is_mutable() {
            Ok(())
        } else {
            Err(PayrollError::RunApproved)
        }
    }

    /// Soft delete is limited to processing and pending runs.
    pub fn ensure_deletable(status: RunStatus) -> Result<(), PayrollError> {
        Self::ensure_mutable(status)
    }

    /// Item adjustment requires a pending run.
    pub fn ensure_adjustable(status: RunStatus) -> Result<(), PayrollError> {
        match status {
            RunStatus::Pending => Ok(()),
            RunStatus::Approved => Err(PayrollError::RunApproved),
            RunStatus::Processing => Err(PayrollError::RunNotPending),
        }
    }

    /// Validates moving a run from `from` to `to` on behalf of `actor`.
    ///
    /// Valid transitions:
    /// - Processing → Pending
    /// - Pending → Processing
    /// - Pending → Approved (admin only)
    pub fn transition(
        from: RunStatus,
        to: RunStatus,
        actor: Role,
    ) -> Result<RunTransition, PayrollError> {
        Self::ensure_mutable(from)?;

        match (from, to) {
            (RunStatus::Processing, RunStatus::Pending)
            | (RunStatus::Pending, RunStatus::Processing) => {
                Ok(RunTransition::Move { new_status: to })
            }
            (RunStatus::Pending, RunStatus::Approved) => {
                if actor == Role::Admin {
                    Ok(RunTransition::Approve)
                } else {
                    Err(PayrollError::ApprovalRequiresAdmin)
                }
            }
            _ => Err(PayrollError::InvalidTransition { from, to }),
        }
    }

    /// Returns true if `from → to` is an edge of the state machine.
    #[must_use]
    pub fn is_valid_transition(from: RunStatus, to: RunStatus) -> bool {
        matches!(
            (from, to),
            (RunStatus::Processing, RunStatus::Pending)
                | (
                    RunStatus::Pending,
                    RunStatus::Processing | RunStatus::Approved
                )
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_approves_pending() {
        assert_eq!(
            RunLifecycle::transition(RunStatus::Pending, RunStatus::Approved, Role::Admin),
            Ok(RunTransition::Approve)
        );
    }

    #[test]
    fn test_hr_cannot_approve() {
        assert_eq!(
            RunLifecycle::transition(RunStatus::Pending, RunStatus::Approved, Role::Hr),
            Err(PayrollError::ApprovalRequiresAdmin)
        );
    }

    #[test]
    fn test_reapprove_is_rejected() {
        assert_eq!(
            RunLifecycle::transition(RunStatus::Approved, RunStatus::Approved, Role::Admin),
            Err(PayrollError::RunApproved)
        );
    }

    #[test]
    fn test_processing_cannot_skip_to_approved() {
        assert_eq!(
            RunLifecycle::transition(RunStatus::Processing, RunStatus::Approved, Role::Admin),
            Err(PayrollError::InvalidTransition {
                from: RunStatus::Processing,
                to: RunStatus::Approved,
            })
        );
    }

    #[test]
    fn test_pending_processing_round_trip() {
        assert_eq!(
            RunLifecycle::transition(RunStatus::Pending, RunStatus::Processing, Role::Hr),
            Ok(RunTransition::Move {
                new_status: RunStatus::Processing
            })
        );
        assert_eq!(
            RunLifecycle::transition(RunStatus::Processing, RunStatus::Pending, Role::Hr),
            Ok(RunTransition::Move {
                new_status: RunStatus::Pending
            })
        );
    }

    #[test]
    fn test_same_status_is_invalid() {
        assert!(matches!(
            RunLifecycle::transition(RunStatus::Pending, RunStatus::Pending, Role::Admin),
            Err(PayrollError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_delete_and_adjust_guards() {
        assert!(RunLifecycle::ensure_deletable(RunStatus::Processing).is_ok());
        assert!(RunLifecycle::ensure_deletable(RunStatus::Pending).is_ok());
        assert_eq!(
            RunLifecycle::ensure_deletable(RunStatus::Approved),
            Err(PayrollError::RunApproved)
        );
        assert!(RunLifecycle::ensure_adjustable(RunStatus::Pending).is_ok());
        assert_eq!(
            RunLifecycle::ensure_adjustable(RunStatus::Processing),
            Err(PayrollError::RunNotPending)
        );
    }
}
