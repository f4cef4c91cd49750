//! Integration tests for tenant-scoped transactions and post-commit hooks.
//!
//! Requires a running `PostgreSQL` database.

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use common::database_url;
use hrms_db::{TenantScope, Transactor};
use hrms_shared::AppError;
use sea_orm::{ConnectionTrait, Database, DbBackend, Statement};
use tokio::sync::oneshot;
use uuid::Uuid;

async fn transactor() -> Transactor {
    let db = Database::connect(database_url())
        .await
        .expect("failed to connect to database");
    Transactor::new(db)
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_scope_is_published_before_body() {
    let transactor = transactor().await;
    let company_id = Uuid::new_v4();
    let branch_id = Uuid::new_v4();
    let scope = TenantScope {
        company_id,
        branch_ids: vec![branch_id],
    };

    let settings = transactor
        .within_scope(scope, |tx| {
            Box::pin(async move {
                let row = tx
                    .conn()
                    .query_one(Statement::from_string(
                        DbBackend::Postgres,
                        "SELECT current_setting('app.company_id', true) AS company, \
                                current_setting('app.branch_id', true) AS branch, \
                                current_setting('app.branch_ids', true) AS branches",
                    ))
                    .await
                    .map_err(hrms_db::map_db_err)?
                    .ok_or_else(|| AppError::internal("no row"))?;
                let read = |col: &str| {
                    row.try_get::<String>("", col)
                        .map_err(hrms_db::map_db_err)
                };
                Ok((read("company")?, read("branch")?, read("branches")?))
            })
        })
        .await
        .unwrap();

    assert_eq!(settings.0, company_id.to_string());
    assert_eq!(settings.1, branch_id.to_string());
    assert_eq!(settings.2, branch_id.to_string());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_hooks_run_in_order_after_commit() {
    let transactor = transactor().await;
    let seen = Arc::new(Mutex::new(Vec::new()));

    let hooks_seen = seen.clone();
    let value = transactor
        .within_scope(TenantScope::company(Uuid::new_v4()), move |tx| {
            Box::pin(async move {
                for n in 0..3 {
                    let seen = hooks_seen.clone();
                    tx.after_commit(async move {
                        seen.lock().unwrap().push(n);
                        Ok(())
                    });
                }
                Ok(42)
            })
        })
        .await
        .unwrap();

    assert_eq!(value, 42);
    assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2]);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_failed_hook_does_not_fail_request() {
    let transactor = transactor().await;
    let ran = Arc::new(Mutex::new(0));

    let counter = ran.clone();
    let result = transactor
        .within_scope(TenantScope::company(Uuid::new_v4()), move |tx| {
            Box::pin(async move {
                tx.after_commit(async { Err(anyhow::anyhow!("bus saturated")) });
                tx.after_commit(async move {
                    *counter.lock().unwrap() += 1;
                    Ok(())
                });
                Ok(())
            })
        })
        .await;

    assert!(result.is_ok());
    assert_eq!(*ran.lock().unwrap(), 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_rollback_discards_hooks() {
    let transactor = transactor().await;
    let ran = Arc::new(Mutex::new(0));

    let counter = ran.clone();
    let err = transactor
        .within_scope(TenantScope::company(Uuid::new_v4()), move |tx| {
            Box::pin(async move {
                tx.after_commit(async move {
                    *counter.lock().unwrap() += 1;
                    Ok(())
                });
                Err::<(), _>(AppError::conflict("approved run exists"))
            })
        })
        .await
        .unwrap_err();

    assert_eq!(err, AppError::conflict("approved run exists"));
    assert_eq!(*ran.lock().unwrap(), 0);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_nested_hooks_run_after_outer_commit() {
    let transactor = transactor().await;
    let seen = Arc::new(Mutex::new(Vec::new()));

    let outer_seen = seen.clone();
    transactor
        .within_scope(TenantScope::company(Uuid::new_v4()), move |tx| {
            Box::pin(async move {
                let inner_seen = outer_seen.clone();
                tx.within(move |inner| {
                    Box::pin(async move {
                        inner.after_commit(async move {
                            inner_seen.lock().unwrap().push("inner");
                            Ok(())
                        });
                        Ok(())
                    })
                })
                .await?;

                let failed_seen = outer_seen.clone();
                let nested = tx
                    .within(move |inner| {
                        Box::pin(async move {
                            inner.after_commit(async move {
                                failed_seen.lock().unwrap().push("rolled back");
                                Ok(())
                            });
                            Err::<(), _>(AppError::bad_request("nope"))
                        })
                    })
                    .await;
                assert!(nested.is_err());

                let last = outer_seen.clone();
                tx.after_commit(async move {
                    last.lock().unwrap().push("outer");
                    Ok(())
                });
                Ok(())
            })
        })
        .await
        .unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["inner", "outer"]);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_hooks_finish_when_caller_is_dropped() {
    let transactor = transactor().await;
    let (started_tx, started_rx) = oneshot::channel();
    let (finished_tx, finished_rx) = oneshot::channel();

    let request = tokio::spawn(async move {
        transactor
            .within_scope(TenantScope::company(Uuid::new_v4()), move |tx| {
                Box::pin(async move {
                    tx.after_commit(async move {
                        let _ = started_tx.send(());
                        tokio::time::sleep(Duration::from_millis(200)).await;
                        let _ = finished_tx.send(());
                        Ok(())
                    });
                    Ok(())
                })
            })
            .await
    });

    started_rx.await.expect("hook never started");
    request.abort();
    assert!(request.await.unwrap_err().is_cancelled());

    tokio::time::timeout(Duration::from_secs(5), finished_rx)
        .await
        .expect("hook did not finish")
        .expect("hook was dropped");
}
