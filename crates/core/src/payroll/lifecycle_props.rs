//! Property-based tests for the payroll run state machine and item totals.

use proptest::prelude::*;
use rust_decimal::Decimal;

use hrms_shared::Role;

use crate::payroll::error::PayrollError;
use crate::payroll::item::PayrollItemValues;
use crate::payroll::lifecycle::{RunLifecycle, RunTransition};
use crate::payroll::types::{LineItem, LoanRepayment, RunStatus};

fn arb_status() -> impl Strategy<Value = RunStatus> {
    prop_oneof![
        Just(RunStatus::Processing),
        Just(RunStatus::Pending),
        Just(RunStatus::Approved),
    ]
}

fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![
        Just(Role::Superadmin),
        Just(Role::Admin),
        Just(Role::Hr),
        Just(Role::Staff),
    ]
}

/// Non-negative money with two decimal places.
fn arb_money() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_lines() -> impl Strategy<Value = Vec<LineItem>> {
    prop::collection::vec(
        arb_money().prop_map(|value| LineItem {
            label: "line".to_string(),
            value,
        }),
        0..4,
    )
}

prop_compose! {
    fn arb_item()(
        income in prop::array::uniform8(arb_money()),
        deductions in prop::array::uniform12(arb_money()),
        others_income in arb_lines(),
        others_deduction in arb_lines(),
        repayments in prop::collection::vec(arb_money(), 0..3),
        loan_prev in arb_money(),
    ) -> PayrollItemValues {
        PayrollItemValues {
            salary: income[0],
            ot_amount: income[1],
            bonus: income[2],
            housing_allowance: income[3],
            attendance_bonus_no_late: income[4],
            attendance_bonus_no_leave: income[5],
            leave_compensation: income[6],
            advance_amount: income[7],
            late_minutes_deduction: deductions[0],
            leave_days_deduction: deductions[1],
            leave_hours_deduction: deductions[2],
            leave_double_deduction: deductions[3],
            sso_month_amount: deductions[4],
            tax_month_amount: deductions[5],
            pf_month_amount: deductions[6],
            water_amount: deductions[7],
            electric_amount: deductions[8],
            internet_amount: deductions[9],
            doctor_fee: deductions[10],
            advance_repay: deductions[11],
            others_income,
            others_deduction,
            loan_repayments: repayments
                .into_iter()
                .map(|amount| LoanRepayment { loan_id: None, description: String::new(), amount })
                .collect(),
            loan_outstanding_prev: loan_prev,
            ..Default::default()
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Approved runs reject every transition.
    #[test]
    fn prop_approved_is_terminal(to in arb_status(), role in arb_role()) {
        prop_assert_eq!(
            RunLifecycle::transition(RunStatus::Approved, to, role),
            Err(PayrollError::RunApproved)
        );
    }

    /// Only admins ever get an approval.
    #[test]
    fn prop_only_admin_approves(from in arb_status(), to in arb_status(), role in arb_role()) {
        if let Ok(RunTransition::Approve) = RunLifecycle::transition(from, to, role) {
            prop_assert_eq!(role, Role::Admin);
            prop_assert_eq!(from, RunStatus::Pending);
        }
    }

    /// Successful transitions are exactly the state machine edges.
    #[test]
    fn prop_transition_matches_edges(from in arb_status(), to in arb_status()) {
        let result = RunLifecycle::transition(from, to, Role::Admin);
        prop_assert_eq!(result.is_ok(), RunLifecycle::is_valid_transition(from, to));
    }

    /// Net pay always equals income minus deductions.
    #[test]
    fn prop_net_pay_balances(item in arb_item()) {
        let item = item.recomputed();
        prop_assert_eq!(item.income_total - item.deduction_total, item.net_pay);
        prop_assert!(item.loan_outstanding_total >= Decimal::ZERO);
        prop_assert!(item.is_consistent());
    }
}
