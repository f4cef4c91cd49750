//! In-memory audit event bus.
//!
//! Every subscriber owns a bounded channel. Publishing never waits: when a
//! subscriber's buffer is full the event is dropped for that subscriber and a
//! warning is logged. Delivery order per subscriber equals publish order.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::context::RequestContext;

/// Action recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    /// Entity created.
    Create,
    /// Entity modified.
    Update,
    /// Entity soft-deleted.
    Delete,
    /// Payroll run approved.
    Approve,
    /// Identity signed in.
    Login,
}

impl AuditAction {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Approve => "APPROVE",
            Self::Login => "LOGIN",
        }
    }
}

/// Audit event describing one state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// Identity that performed the change.
    pub actor_id: Uuid,
    /// Company the change belongs to.
    pub company_id: Option<Uuid>,
    /// Branch the change belongs to.
    pub branch_id: Option<Uuid>,
    /// What happened.
    pub action: AuditAction,
    /// Entity table/kind name.
    pub entity_name: String,
    /// Entity primary key.
    pub entity_id: Uuid,
    /// Free-form change details.
    pub details: serde_json::Map<String, serde_json::Value>,
    /// When the event was produced.
    pub timestamp: DateTime<Utc>,
}

impl LogEvent {
    /// Builds an event for the caller and tenant found in `ctx`.
    #[must_use]
    pub fn from_context(
        ctx: &RequestContext,
        action: AuditAction,
        entity_name: &str,
        entity_id: Uuid,
    ) -> Self {
        let tenant = ctx.tenant();
        Self {
            actor_id: ctx.user().id,
            company_id: tenant.map(|t| t.company_id),
            branch_id: ctx.branch_id(),
            action,
            entity_name: entity_name.to_string(),
            entity_id,
            details: serde_json::Map::new(),
            timestamp: Utc::now(),
        }
    }

    /// Attaches change details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Map<String, serde_json::Value>) -> Self {
        self.details = details;
        self
    }
}

/// Outcome of a single publish call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Subscribers that accepted the event.
    pub delivered: usize,
    /// Subscribers whose buffer was full.
    pub dropped: usize,
}

struct BusInner {
    subscribers: DashMap<u64, mpsc::Sender<LogEvent>>,
    next_id: AtomicU64,
    buffer: usize,
}

/// Topic-less publish channel for [`LogEvent`]s.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.inner.subscribers.len())
            .field("buffer", &self.inner.buffer)
            .finish()
    }
}

impl EventBus {
    /// Creates a bus whose subscribers buffer up to `buffer` events each.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: DashMap::new(),
                next_id: AtomicU64::new(0),
                buffer: buffer.max(1),
            }),
        }
    }

    /// Registers a new subscriber and returns its receiving end.
    ///
    /// Dropping the receiver unsubscribes on the next publish.
    #[must_use]
    pub fn subscribe(&self) -> mpsc::Receiver<LogEvent> {
        let (tx, rx) = mpsc::channel(self.inner.buffer);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.subscribers.insert(id, tx);
        rx
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    /// Delivers `event` to every current subscriber without waiting.
    pub fn publish(&self, event: &LogEvent) -> PublishReport {
        let mut report = PublishReport::default();
        let mut closed = Vec::new();

        for entry in self.inner.subscribers.iter() {
            match entry.value().try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.dropped += 1;
                    tracing::warn!(
                        subscriber = *entry.key(),
                        action = event.action.as_str(),
                        entity = %event.entity_name,
                        entity_id = %event.entity_id,
                        "event subscriber saturated, dropping event"
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(*entry.key()),
            }
        }

        for id in closed {
            self.inner.subscribers.remove(&id);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(action: AuditAction) -> LogEvent {
        LogEvent {
            actor_id: Uuid::new_v4(),
            company_id: Some(Uuid::new_v4()),
            branch_id: None,
            action,
            entity_name: "payroll_runs".to_string(),
            entity_id: Uuid::new_v4(),
            details: serde_json::Map::new(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_in_order() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        let create = event(AuditAction::Create);
        let approve = event(AuditAction::Approve);
        assert_eq!(bus.publish(&create).delivered, 2);
        assert_eq!(bus.publish(&approve).delivered, 2);

        for rx in [&mut first, &mut second] {
            assert_eq!(rx.recv().await.unwrap(), create);
            assert_eq!(rx.recv().await.unwrap(), approve);
        }
    }

    #[tokio::test]
    async fn test_full_subscriber_drops_without_blocking() {
        let bus = EventBus::new(1);
        let mut slow = bus.subscribe();

        assert_eq!(bus.publish(&event(AuditAction::Update)).delivered, 1);
        let report = bus.publish(&event(AuditAction::Update));
        assert_eq!(report, PublishReport { delivered: 0, dropped: 1 });

        assert!(slow.recv().await.is_some());
        assert!(slow.try_recv().is_err());
    }

    #[test]
    fn test_closed_subscriber_is_removed() {
        let bus = EventBus::new(4);
        let rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(rx);

        let report = bus.publish(&event(AuditAction::Delete));
        assert_eq!(report.delivered, 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_action_serializes_screaming() {
        let json = serde_json::to_value(AuditAction::Approve).unwrap();
        assert_eq!(json, serde_json::json!("APPROVE"));
    }
}
