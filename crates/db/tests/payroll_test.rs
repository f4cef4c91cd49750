//! Integration tests for the payroll run lifecycle.
//!
//! Requires a running `PostgreSQL` database with migrations applied.

mod common;

use common::{Fixture, march_2025, sso_only};
use hrms_core::payroll::{EmployeeFlags, ItemPatch, LoanRepayment, Patch, RunStatus};
use hrms_db::entities::sea_orm_active_enums::{AccumType, PayrollRunStatus};
use hrms_db::repositories::{
    AccumulationRepository, PayrollItemRepository, PayrollRunRepository, RunUpdate,
};
use hrms_db::repositories::payroll_item::item_values;
use hrms_shared::{AppError, Role};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

async fn create_run(fx: &Fixture) -> (Uuid, Uuid) {
    let scope = fx.scope();
    let branch_id = fx.branch_id;
    let actor = fx.admin.id;
    let created = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move {
                PayrollRunRepository::create(tx.conn(), &scope, branch_id, march_2025(), actor)
                    .await
            })
        })
        .await
        .expect("failed to create run");

    let scope = fx.scope();
    let run_id = created.run.id;
    let items = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move { PayrollItemRepository::list_for_run(tx.conn(), &scope, run_id).await })
        })
        .await
        .expect("failed to list items");

    (run_id, items[0].id)
}

async fn set_status(fx: &Fixture, run_id: Uuid, status: RunStatus, role: Role) -> Result<(), AppError> {
    let scope = fx.scope();
    let actor = fx.admin.id;
    fx.transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move {
                PayrollRunRepository::update(
                    tx.conn(),
                    &scope,
                    run_id,
                    RunUpdate {
                        pay_date: None,
                        status: Some(status),
                    },
                    actor,
                    role,
                )
                .await
                .map(|_| ())
            })
        })
        .await
}

async fn adjust(fx: &Fixture, item_id: Uuid, patch: ItemPatch) -> Result<hrms_db::repositories::AdjustedItem, AppError> {
    let scope = fx.scope();
    let actor = fx.admin.id;
    fx.transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move {
                PayrollItemRepository::adjust(tx.conn(), &scope, item_id, &patch, actor).await
            })
        })
        .await
}

async fn accumulator(fx: &Fixture, employee_id: Uuid, kind: AccumType, year: Option<i32>) -> Decimal {
    let company_id = fx.company_id;
    let rows = fx
        .transactor
        .within_scope(fx.scope(), move |tx| {
            Box::pin(async move {
                AccumulationRepository::for_employee(tx.conn(), company_id, employee_id, None).await
            })
        })
        .await
        .expect("failed to read accumulators");

    rows.into_iter()
        .find(|r| r.accum_type == kind && r.accum_year == year)
        .map_or(Decimal::ZERO, |r| r.amount)
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_create_and_approve_single_employee_run() {
    let fx = Fixture::new().await;
    let employee = fx.employee(dec!(30000), sso_only()).await;
    let (run_id, item_id) = create_run(&fx).await;

    let scope = fx.scope();
    let item = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move { PayrollItemRepository::find(tx.conn(), &scope, item_id).await })
        })
        .await
        .unwrap();
    assert_eq!(item.employee_id, employee.id);
    assert_eq!(item.salary, dec!(30000));
    assert_eq!(item.income_total, dec!(30000));
    assert_eq!(item.sso_month_amount, dec!(750));
    assert_eq!(item.deduction_total, dec!(750));
    assert_eq!(item.net_pay, dec!(29250));

    set_status(&fx, run_id, RunStatus::Approved, Role::Admin)
        .await
        .unwrap();
    assert_eq!(
        accumulator(&fx, employee.id, AccumType::Sso, Some(2025)).await,
        dec!(750)
    );

    let err = set_status(&fx, run_id, RunStatus::Approved, Role::Admin)
        .await
        .unwrap_err();
    assert_eq!(err, AppError::bad_request("approved run cannot be modified"));
    assert_eq!(
        accumulator(&fx, employee.id, AccumType::Sso, Some(2025)).await,
        dec!(750)
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_only_admin_approves() {
    let fx = Fixture::new().await;
    fx.employee(dec!(20000), sso_only()).await;
    let (run_id, _) = create_run(&fx).await;

    let err = set_status(&fx, run_id, RunStatus::Approved, Role::Hr)
        .await
        .unwrap_err();
    assert_eq!(err, AppError::forbidden("only admins can approve payroll runs"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_duplicate_run_for_month_conflicts() {
    let fx = Fixture::new().await;
    fx.employee(dec!(20000), sso_only()).await;
    create_run(&fx).await;

    let scope = fx.scope();
    let branch_id = fx.branch_id;
    let actor = fx.admin.id;
    let err = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move {
                PayrollRunRepository::create(tx.conn(), &scope, branch_id, march_2025(), actor)
                    .await
            })
        })
        .await
        .unwrap_err();
    assert_eq!(err, AppError::conflict("a payroll run already exists for this month"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_water_adjustment_blocked_without_permission() {
    let fx = Fixture::new().await;
    fx.employee(dec!(30000), sso_only()).await;
    let (_, item_id) = create_run(&fx).await;

    let patch = ItemPatch {
        water_amount: Patch::Set(dec!(120)),
        ..ItemPatch::default()
    };
    let err = adjust(&fx, item_id, patch).await.unwrap_err();
    assert_eq!(
        err,
        AppError::conflict("water charges are not allowed for this employee")
    );

    let scope = fx.scope();
    let item = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move { PayrollItemRepository::find(tx.conn(), &scope, item_id).await })
        })
        .await
        .unwrap();
    assert_eq!(item.water_amount, Decimal::ZERO);
    assert_eq!(item.net_pay, dec!(29250));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_manual_tax_flag_latches() {
    let fx = Fixture::new().await;
    let flags = EmployeeFlags {
        withhold_tax: true,
        ..sso_only()
    };
    fx.employee(dec!(30000), flags).await;
    let (_, item_id) = create_run(&fx).await;

    let set_tax = |amount| ItemPatch {
        tax_month_amount: Patch::Set(amount),
        ..ItemPatch::default()
    };

    let first = adjust(&fx, item_id, set_tax(dec!(600))).await.unwrap();
    assert_eq!(first.item.tax_month_amount, dec!(600));
    assert!(first.item.is_manual_tax);
    assert_eq!(first.item.net_pay, dec!(28650));

    let unchanged = adjust(&fx, item_id, set_tax(dec!(600))).await.unwrap_err();
    assert_eq!(unchanged, AppError::bad_request("no fields to update"));

    let third = adjust(&fx, item_id, set_tax(dec!(700))).await.unwrap();
    assert_eq!(third.item.tax_month_amount, dec!(700));
    assert!(third.item.is_manual_tax);

    let values = item_values(&third.item).unwrap();
    assert!(values.is_consistent());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_loan_outstanding_is_clamped_on_approval() {
    let fx = Fixture::new().await;
    let employee = fx.employee(dec!(30000), sso_only()).await;
    let (run_id, item_id) = create_run(&fx).await;

    // Seed a 300 balance, then repay 500 in this run.
    let company_id = fx.company_id;
    let employee_id = employee.id;
    fx.transactor
        .within_scope(fx.scope(), move |tx| {
            Box::pin(async move {
                hrms_db::entities::payroll_accumulations::ActiveModel {
                    id: Set(Uuid::now_v7()),
                    company_id: Set(company_id),
                    employee_id: Set(employee_id),
                    accum_type: Set(AccumType::LoanOutstanding),
                    accum_year: Set(None),
                    amount: Set(dec!(300)),
                    ..Default::default()
                }
                .insert(tx.conn())
                .await
                .map_err(hrms_db::map_db_err)?;

                let scope = tx.scope().clone();
                let item = PayrollItemRepository::find(tx.conn(), &scope, item_id).await?;
                let mut active: hrms_db::entities::payroll_run_items::ActiveModel = item.into();
                active.loan_outstanding_prev = Set(dec!(300));
                active.loan_outstanding_total = Set(dec!(300));
                active.update(tx.conn()).await.map_err(hrms_db::map_db_err)?;
                Ok(())
            })
        })
        .await
        .unwrap();

    let patch = ItemPatch {
        loan_repayments: Patch::Set(vec![LoanRepayment {
            loan_id: None,
            description: "car".to_string(),
            amount: dec!(500),
        }]),
        ..ItemPatch::default()
    };
    let adjusted = adjust(&fx, item_id, patch).await.unwrap();
    assert_eq!(adjusted.item.loan_outstanding_total, Decimal::ZERO);

    set_status(&fx, run_id, RunStatus::Approved, Role::Admin)
        .await
        .unwrap();
    assert_eq!(
        accumulator(&fx, employee.id, AccumType::LoanOutstanding, None).await,
        Decimal::ZERO
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_approved_run_cannot_be_deleted() {
    let fx = Fixture::new().await;
    fx.employee(dec!(30000), sso_only()).await;
    let (run_id, _) = create_run(&fx).await;
    set_status(&fx, run_id, RunStatus::Approved, Role::Admin)
        .await
        .unwrap();

    let scope = fx.scope();
    let actor = fx.admin.id;
    let err = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move {
                PayrollRunRepository::soft_delete(tx.conn(), &scope, run_id, actor).await
            })
        })
        .await
        .unwrap_err();
    assert_eq!(err, AppError::bad_request("approved run cannot be modified"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_run_moves_back_to_processing() {
    let fx = Fixture::new().await;
    fx.employee(dec!(30000), sso_only()).await;
    let (run_id, item_id) = create_run(&fx).await;

    set_status(&fx, run_id, RunStatus::Processing, Role::Hr)
        .await
        .unwrap();

    let patch = ItemPatch {
        bonus: Patch::Set(dec!(1000)),
        ..ItemPatch::default()
    };
    let err = adjust(&fx, item_id, patch).await.unwrap_err();
    assert_eq!(
        err,
        AppError::bad_request("payroll run must be pending to adjust items")
    );

    let scope = fx.scope();
    let run = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move { PayrollRunRepository::find(tx.conn(), &scope, run_id).await })
        })
        .await
        .unwrap();
    assert_eq!(run.status, PayrollRunStatus::Processing);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_concurrent_adjustments_keep_both_changes() {
    let fx = Fixture::new().await;
    fx.employee(dec!(30000), sso_only()).await;
    let (_, item_id) = create_run(&fx).await;

    let (locked_tx, locked_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel::<()>();

    // Holds the run lock with a bonus applied until released.
    let scope = fx.scope();
    let actor = fx.admin.id;
    let first = fx.transactor.within_scope(scope.clone(), move |tx| {
        Box::pin(async move {
            let patch = ItemPatch {
                bonus: Patch::Set(dec!(1000)),
                ..ItemPatch::default()
            };
            let adjusted =
                PayrollItemRepository::adjust(tx.conn(), &scope, item_id, &patch, actor).await?;
            let _ = locked_tx.send(());
            let _ = release_rx.await;
            Ok(adjusted)
        })
    });

    let second = async {
        locked_rx.await.expect("first adjustment never took the lock");
        let patch = ItemPatch {
            ot_amount: Patch::Set(dec!(500)),
            ..ItemPatch::default()
        };
        let release = async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            let _ = release_tx.send(());
        };
        let (adjusted, ()) = tokio::join!(adjust(&fx, item_id, patch), release);
        adjusted
    };

    let (first, second) = tokio::join!(first, second);
    first.unwrap();
    let second = second.unwrap();

    assert_eq!(second.item.bonus, dec!(1000));
    assert_eq!(second.item.ot_amount, dec!(500));
    assert_eq!(second.item.income_total, dec!(31500));
    assert!(item_values(&second.item).unwrap().is_consistent());

    let scope = fx.scope();
    let stored = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move { PayrollItemRepository::find(tx.conn(), &scope, item_id).await })
        })
        .await
        .unwrap();
    assert_eq!(stored.bonus, dec!(1000));
    assert_eq!(stored.ot_amount, dec!(500));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_concurrent_approvals_accumulate_once() {
    let fx = Fixture::new().await;
    let employee = fx.employee(dec!(30000), sso_only()).await;
    let (run_id, _) = create_run(&fx).await;

    let (first, second) = tokio::join!(
        set_status(&fx, run_id, RunStatus::Approved, Role::Admin),
        set_status(&fx, run_id, RunStatus::Approved, Role::Admin),
    );

    let mut outcomes = [first, second];
    outcomes.sort_by_key(Result::is_err);
    assert!(outcomes[0].is_ok());
    assert_eq!(
        outcomes[1].clone().unwrap_err(),
        AppError::bad_request("approved run cannot be modified")
    );

    assert_eq!(
        accumulator(&fx, employee.id, AccumType::Sso, Some(2025)).await,
        dec!(750)
    );
}
