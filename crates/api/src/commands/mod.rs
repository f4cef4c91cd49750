//! Mediator command handlers.
//!
//! Endpoint shims build one of the request types defined here and dispatch it
//! through the [`Mediator`]. Handlers open a tenant-scoped transaction, call
//! the repositories and publish audit events once the transaction commits.

pub mod accumulations;
pub mod auth;
pub mod branches;
pub mod companies;
pub mod employees;
pub mod payroll_items;
pub mod payroll_runs;
pub mod worklogs;

use std::sync::Arc;

use anyhow::anyhow;
use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use hrms_db::{Transactor, TxContext};
use hrms_shared::{
    AppResult, AuditAction, EventBus, LogEvent, Mediator, MediatorBuilder, RequestContext,
    ServiceRegistry,
};

/// Registry name of the [`Transactor`].
pub const TRANSACTOR: &str = "db.transactor";
/// Registry name of the audit [`EventBus`].
pub const EVENT_BUS: &str = "events.bus";

/// Collaborators shared by every handler.
#[derive(Debug, Clone)]
pub struct CommandDeps {
    /// Transaction runner.
    pub transactor: Transactor,
    /// Audit event bus.
    pub events: EventBus,
}

impl CommandDeps {
    /// Looks the collaborators up in the startup registry.
    ///
    /// # Errors
    ///
    /// Returns `internal` when a collaborator was never provided.
    pub fn from_registry(registry: &ServiceRegistry) -> AppResult<Self> {
        let transactor = registry.require::<Transactor>(TRANSACTOR)?;
        let events = registry.require::<EventBus>(EVENT_BUS)?;
        Ok(Self {
            transactor: (*transactor).clone(),
            events: (*events).clone(),
        })
    }
}

/// Builds the mediator with every handler of the API.
///
/// # Errors
///
/// Returns `internal` when the registry lacks a collaborator.
pub fn build_mediator(registry: &ServiceRegistry) -> AppResult<Arc<Mediator>> {
    let deps = CommandDeps::from_registry(registry)?;
    let mut builder = MediatorBuilder::new();

    auth::register(&mut builder, &deps);
    companies::register(&mut builder, &deps);
    branches::register(&mut builder, &deps);
    employees::register(&mut builder, &deps);
    worklogs::register(&mut builder, &deps);
    payroll_runs::register(&mut builder, &deps);
    payroll_items::register(&mut builder, &deps);
    accumulations::register(&mut builder, &deps);

    let mediator = builder.build();
    tracing::debug!(handlers = mediator.len(), "mediator ready");
    Ok(Arc::new(mediator))
}

/// Publishes `event` once the surrounding transaction commits.
pub(crate) fn publish_after_commit(tx: &TxContext, events: &EventBus, event: LogEvent) {
    let events = events.clone();
    tx.after_commit(async move {
        let report = events.publish(&event);
        if report.dropped > 0 {
            return Err(anyhow!(
                "{} event dropped by {} subscriber(s)",
                event.action.as_str(),
                report.dropped
            ));
        }
        Ok(())
    });
}

/// Builds an event with optional details.
pub(crate) fn audit(
    ctx: &RequestContext,
    action: AuditAction,
    entity_name: &str,
    entity_id: Uuid,
    details: serde_json::Map<String, serde_json::Value>,
) -> LogEvent {
    LogEvent::from_context(ctx, action, entity_name, entity_id).with_details(details)
}

/// Unwraps a `json!` object literal into event details.
pub(crate) fn details(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}

/// Converts a stored timestamp to UTC for responses.
pub(crate) fn utc(ts: DateTime<FixedOffset>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}
