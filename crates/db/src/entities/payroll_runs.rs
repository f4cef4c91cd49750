//! `SeaORM` Entity for payroll_runs table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::PayrollRunStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payroll_runs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub payroll_month: Date,
    pub period_start: Date,
    pub pay_date: Date,
    pub status: PayrollRunStatus,
    #[sea_orm(column_type = "Decimal(Some((5, 4)))")]
    pub sso_rate_employee: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 4)))")]
    pub sso_rate_employer: Decimal,
    pub approved_at: Option<DateTimeWithTimeZone>,
    pub approved_by: Option<Uuid>,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::payroll_run_items::Entity")]
    PayrollRunItems,
}

impl Related<super::payroll_run_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayrollRunItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
