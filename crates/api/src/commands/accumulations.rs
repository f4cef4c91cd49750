//! Year-to-date accumulators of one employee.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use hrms_core::payroll::AccumType;
use hrms_db::entities::payroll_accumulations;
use hrms_db::repositories::{AccumulationRepository, EmployeeRepository};
use hrms_shared::{AppResult, Handler, MediatorBuilder, RequestContext};

use super::{CommandDeps, utc};

/// Lists an employee's accumulators.
#[derive(Debug, Clone, Copy)]
pub struct GetAccumulations {
    /// Employee ID.
    pub employee_id: Uuid,
    /// Limits yearly kinds to this year; all-time kinds are always included.
    pub year: Option<i32>,
}

/// One accumulator row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccumulationResponse {
    /// Accumulator kind.
    pub accum_type: AccumType,
    /// Tax year, absent for all-time kinds.
    pub accum_year: Option<i32>,
    /// Running amount.
    pub amount: Decimal,
    /// Last change.
    pub updated_at: DateTime<Utc>,
}

impl From<payroll_accumulations::Model> for AccumulationResponse {
    fn from(row: payroll_accumulations::Model) -> Self {
        Self {
            accum_type: row.accum_type.into(),
            accum_year: row.accum_year,
            amount: row.amount,
            updated_at: utc(row.updated_at),
        }
    }
}

struct GetAccumulationsHandler {
    deps: CommandDeps,
}

#[async_trait]
impl Handler<GetAccumulations, Vec<AccumulationResponse>> for GetAccumulationsHandler {
    async fn handle(
        &self,
        ctx: &RequestContext,
        request: GetAccumulations,
    ) -> AppResult<Vec<AccumulationResponse>> {
        let company_id = ctx.require_tenant()?.company_id;
        let rows = self
            .deps
            .transactor
            .within_transaction(ctx, move |tx| {
                Box::pin(async move {
                    // Branch visibility comes from the employee row.
                    EmployeeRepository::find(tx.conn(), tx.scope(), request.employee_id).await?;
                    AccumulationRepository::for_employee(
                        tx.conn(),
                        company_id,
                        request.employee_id,
                        request.year,
                    )
                    .await
                })
            })
            .await?;
        Ok(rows.into_iter().map(AccumulationResponse::from).collect())
    }
}

pub(crate) fn register(builder: &mut MediatorBuilder, deps: &CommandDeps) {
    builder.register::<GetAccumulations, Vec<AccumulationResponse>, _>(GetAccumulationsHandler {
        deps: deps.clone(),
    });
}
