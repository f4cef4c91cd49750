//! Payroll item reads and manual adjustments.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use hrms_core::payroll::{ItemPatch, PayrollItemValues};
use hrms_db::entities::payroll_run_items;
use hrms_db::repositories::PayrollItemRepository;
use hrms_db::repositories::payroll_item::item_values;
use hrms_shared::{AppError, AppResult, AuditAction, Handler, MediatorBuilder, RequestContext};

use super::{CommandDeps, audit, publish_after_commit, utc};

/// Loads one item.
#[derive(Debug, Clone, Copy)]
pub struct GetItem {
    /// Item ID.
    pub id: Uuid,
}

/// Applies a partial update to an item of a pending run.
#[derive(Debug, Clone)]
pub struct AdjustItem {
    /// Item ID.
    pub id: Uuid,
    /// Fields to change.
    pub patch: ItemPatch,
}

/// Item as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    /// Item ID.
    pub id: Uuid,
    /// Owning run.
    pub run_id: Uuid,
    /// Paid employee.
    pub employee_id: Uuid,
    /// Branch of the run.
    pub branch_id: Uuid,
    /// Every figure of the item.
    #[serde(flatten)]
    pub values: PayrollItemValues,
    /// Last editor.
    pub updated_by: Option<Uuid>,
    /// Last update instant.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<payroll_run_items::Model> for ItemResponse {
    type Error = AppError;

    fn try_from(item: payroll_run_items::Model) -> AppResult<Self> {
        let values = item_values(&item)?;
        Ok(Self {
            id: item.id,
            run_id: item.run_id,
            employee_id: item.employee_id,
            branch_id: item.branch_id,
            values,
            updated_by: item.updated_by,
            updated_at: utc(item.updated_at),
        })
    }
}

struct ItemHandler {
    deps: CommandDeps,
}

#[async_trait]
impl Handler<GetItem, ItemResponse> for ItemHandler {
    async fn handle(&self, ctx: &RequestContext, request: GetItem) -> AppResult<ItemResponse> {
        ctx.require_tenant()?;
        let item = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move { PayrollItemRepository::find(tx.conn(), tx.scope(), request.id).await })
            })
            .await?;
        ItemResponse::try_from(item)
    }
}

#[async_trait]
impl Handler<AdjustItem, ItemResponse> for ItemHandler {
    async fn handle(&self, ctx: &RequestContext, request: AdjustItem) -> AppResult<ItemResponse> {
        ctx.require_tenant()?;
        let actor = ctx.user().id;
        let events = self.deps.events.clone();
        let owned = ctx.clone();

        let adjusted = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    let adjusted = PayrollItemRepository::adjust(
                        tx.conn(),
                        tx.scope(),
                        request.id,
                        &request.patch,
                        actor,
                    )
                    .await?;
                    publish_after_commit(
                        tx,
                        &events,
                        audit(
                            &owned,
                            AuditAction::Update,
                            "payroll_run_items",
                            adjusted.item.id,
                            adjusted.adjustment.changes_json(),
                        ),
                    );
                    Ok(adjusted)
                })
            })
            .await?;

        tracing::debug!(
            item_id = %adjusted.item.id,
            run_id = %adjusted.run.id,
            fields = adjusted.adjustment.changes.len(),
            "payroll item adjusted"
        );
        ItemResponse::try_from(adjusted.item)
    }
}

pub(crate) fn register(builder: &mut MediatorBuilder, deps: &CommandDeps) {
    builder
        .register::<GetItem, ItemResponse, _>(ItemHandler { deps: deps.clone() })
        .register::<AdjustItem, ItemResponse, _>(ItemHandler { deps: deps.clone() });
}
