//! Audit log repository.

use hrms_shared::{AppResult, LogEvent};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::audit_logs;
use crate::error::map_db_err;

/// Audit log repository.
#[derive(Debug, Clone)]
pub struct AuditLogRepository {
    db: DatabaseConnection,
}

impl AuditLogRepository {
    /// Creates a new audit log repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores one event.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn record(&self, event: &LogEvent) -> AppResult<audit_logs::Model> {
        audit_logs::ActiveModel {
            id: Set(Uuid::now_v7()),
            actor_id: Set(event.actor_id),
            company_id: Set(event.company_id),
            branch_id: Set(event.branch_id),
            action: Set(event.action.as_str().to_string()),
            entity_name: Set(event.entity_name.clone()),
            entity_id: Set(event.entity_id),
            details: Set(serde_json::Value::Object(event.details.clone())),
            occurred_at: Set(event.timestamp.into()),
            created_at: Set(chrono::Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(map_db_err)
    }

    /// Lists the history of one entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn for_entity(
        &self,
        entity_name: &str,
        entity_id: Uuid,
    ) -> AppResult<Vec<audit_logs::Model>> {
        audit_logs::Entity::find()
            .filter(audit_logs::Column::EntityName.eq(entity_name))
            .filter(audit_logs::Column::EntityId.eq(entity_id))
            .order_by_asc(audit_logs::Column::OccurredAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)
    }
}
