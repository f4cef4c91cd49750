//! Payroll run engine.
//!
//! Pure logic behind payroll runs: item arithmetic, the run state machine,
//! accumulator deltas on approval and sparse item adjustment.
//!
//! # Modules
//!
//! - `types` - Run status, accumulator kinds, JSON line items, flags
//! - `item` - Stored item figures and their derived totals
//! - `calc` - Item generation for new runs
//! - `lifecycle` - Run status transitions
//! - `accumulation` - Accumulator deltas and balance rules
//! - `adjust` - Item patch validation and manual-override latching
//! - `error` - Payroll error type

pub mod accumulation;
pub mod adjust;
pub mod calc;
pub mod error;
pub mod item;
pub mod lifecycle;
pub mod types;

#[cfg(test)]
mod lifecycle_props;

pub use accumulation::{AccumDelta, AccumSnapshot, approval_deltas, next_balance};
pub use adjust::{Adjustment, FieldChange, ItemPatch, Patch, plan_adjustment};
pub use calc::{
    DEFAULT_SSO_RATE, EmployeePayProfile, RunParameters, build_item, round_money, sso_amount,
};
pub use error::{GuardedResource, PayrollError};
pub use item::PayrollItemValues;
pub use lifecycle::{RunLifecycle, RunTransition};
pub use types::{AccumType, EmployeeFlags, LineItem, LoanRepayment, ManualFlags, RunStatus};
