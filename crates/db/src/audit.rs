//! Audit-log subscriber.
//!
//! Drains the event bus into the `audit_logs` table. The task ends once the
//! bus and every clone of it have been dropped.

use hrms_shared::EventBus;
use tokio::task::JoinHandle;

use crate::repositories::AuditLogRepository;

/// Subscribes to `bus` and persists every event on a background task.
#[must_use]
pub fn spawn_audit_writer(bus: &EventBus, repo: AuditLogRepository) -> JoinHandle<()> {
    let mut events = bus.subscribe();

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Err(err) = repo.record(&event).await {
                tracing::warn!(
                    action = event.action.as_str(),
                    entity = %event.entity_name,
                    entity_id = %event.entity_id,
                    error = %err,
                    "failed to write audit log"
                );
            }
        }
        tracing::debug!("audit writer stopped");
    })
}
