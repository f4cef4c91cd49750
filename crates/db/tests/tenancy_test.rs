//! Integration tests for tenant isolation, branches and worklogs.
//!
//! Requires a running `PostgreSQL` database with migrations applied.

mod common;

use chrono::NaiveDate;
use common::{Fixture, march_2025, sso_only};
use hrms_core::org::OrgStatus;
use hrms_core::worklog::EntryType;
use hrms_db::repositories::{
    BranchRepository, CreateBranchInput, CreateWorklogInput, EmployeeFilter, EmployeeRepository,
    PayrollRunRepository, PermissionRepository, WorklogRepository,
};
use hrms_db::{AuditLogRepository, TenantScope, spawn_audit_writer};
use hrms_shared::types::PageRequest;
use hrms_shared::{AppError, AuditAction, EventBus, LogEvent, Role, TenantAccessStore};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_other_company_cannot_see_rows() {
    let a = Fixture::new().await;
    let b = Fixture::new().await;
    a.employee(dec!(30000), sso_only()).await;

    let scope = a.scope();
    let branch_id = a.branch_id;
    let actor = a.admin.id;
    let run = a
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move {
                PayrollRunRepository::create(tx.conn(), &scope, branch_id, march_2025(), actor)
                    .await
            })
        })
        .await
        .unwrap()
        .run;

    // Scope B asking for A's rows by id sees nothing.
    let foreign = TenantScope::company(b.company_id);
    let run_id = run.id;
    let err = b
        .transactor
        .within_scope(foreign.clone(), move |tx| {
            Box::pin(async move { PayrollRunRepository::find(tx.conn(), &foreign, run_id).await })
        })
        .await
        .unwrap_err();
    assert_eq!(err, AppError::not_found("payroll run not found"));

    // Even a scope claiming company A but opened under B's settings is empty.
    let spoofed = TenantScope::company(a.company_id);
    let (rows, total) = b
        .transactor
        .within_scope(TenantScope::company(b.company_id), move |tx| {
            Box::pin(async move {
                EmployeeRepository::list(
                    tx.conn(),
                    &spoofed,
                    &EmployeeFilter::default(),
                    &PageRequest::default(),
                )
                .await
            })
        })
        .await
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(total, 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_permission_store_resolves_roles_and_branches() {
    let a = Fixture::new().await;
    let b = Fixture::new().await;
    let store = PermissionRepository::new(a.transactor.clone());

    assert_eq!(
        store.company_role(a.admin.id, a.company_id).await.unwrap(),
        Some(Role::Admin)
    );
    assert_eq!(store.company_role(a.admin.id, b.company_id).await.unwrap(), None);
    assert_eq!(
        store.company_branches(a.company_id).await.unwrap(),
        vec![a.branch_id]
    );
    assert!(
        store
            .assigned_branches(a.admin.id, a.company_id)
            .await
            .unwrap()
            .is_empty()
    );

    let memberships = store.memberships(a.admin.id).await.unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].company.id, a.company_id);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_default_branch_is_protected() {
    let fx = Fixture::new().await;
    let company_id = fx.company_id;
    let default_id = fx.branch_id;
    let scope = TenantScope::company(company_id);

    let err = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move { BranchRepository::soft_delete(tx.conn(), company_id, default_id).await })
        })
        .await
        .unwrap_err();
    assert_eq!(err, AppError::bad_request("cannot delete default branch"));

    let err = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move {
                BranchRepository::change_status(tx.conn(), company_id, default_id, OrgStatus::Suspended)
                    .await
            })
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AppError::bad_request("cannot suspend or archive default branch")
    );

    // Archive a second branch, then try archived -> suspended.
    let other = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move {
                let branch = BranchRepository::create(
                    tx.conn(),
                    company_id,
                    CreateBranchInput {
                        code: "NORTH".to_string(),
                        name: "North".to_string(),
                    },
                )
                .await?;
                BranchRepository::change_status(tx.conn(), company_id, branch.id, OrgStatus::Archived)
                    .await
            })
        })
        .await
        .unwrap();

    let other_id = other.id;
    let err = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move {
                BranchRepository::change_status(tx.conn(), company_id, other_id, OrgStatus::Suspended)
                    .await
            })
        })
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AppError::bad_request("cannot change archived branch to suspended")
    );

    // Moving the default keeps exactly one default.
    let promoted = fx
        .transactor
        .within_scope(scope.clone(), move |tx| {
            Box::pin(async move {
                BranchRepository::change_status(tx.conn(), company_id, other_id, OrgStatus::Active)
                    .await?;
                BranchRepository::set_default(tx.conn(), company_id, other_id).await?;
                BranchRepository::find(tx.conn(), company_id, default_id).await
            })
        })
        .await
        .unwrap();
    assert!(!promoted.is_default);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_duplicate_worklog_conflicts() {
    let fx = Fixture::new().await;
    let employee = fx.employee(dec!(30000), sso_only()).await;

    let record = |fx: &Fixture| {
        let scope = fx.scope();
        let actor = fx.admin.id;
        let employee_id = employee.id;
        let transactor = fx.transactor.clone();
        async move {
            transactor
                .within_scope(scope.clone(), move |tx| {
                    Box::pin(async move {
                        WorklogRepository::create(
                            tx.conn(),
                            &scope,
                            CreateWorklogInput {
                                employee_id,
                                work_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                                entry_type: EntryType::Late,
                                quantity: dec!(15),
                                note: None,
                            },
                            actor,
                        )
                        .await
                    })
                })
                .await
        }
    };

    record(&fx).await.unwrap();
    let err = record(&fx).await.unwrap_err();
    assert_eq!(
        err,
        AppError::conflict("worklog already exists for this employee, date, and entryType")
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_audit_writer_persists_published_events() {
    let fx = Fixture::new().await;
    let repo = AuditLogRepository::new(fx.transactor.connection().clone());
    let bus = EventBus::new(8);
    let writer = spawn_audit_writer(&bus, repo.clone());

    let entity_id = Uuid::new_v4();
    let mut details = serde_json::Map::new();
    details.insert("code".to_string(), serde_json::json!("HQ"));
    let report = bus.publish(&LogEvent {
        actor_id: fx.admin.id,
        company_id: Some(fx.company_id),
        branch_id: Some(fx.branch_id),
        action: AuditAction::Create,
        entity_name: "branches".to_string(),
        entity_id,
        details,
        timestamp: chrono::Utc::now(),
    });
    assert_eq!(report.delivered, 1);

    // Dropping the last handle ends the writer once the queue is drained.
    drop(bus);
    writer.await.unwrap();

    let rows = repo.for_entity("branches", entity_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].action, "CREATE");
    assert_eq!(rows[0].company_id, Some(fx.company_id));
    assert_eq!(rows[0].details["code"], "HQ");
}
