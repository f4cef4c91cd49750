//! `SeaORM` Entity for payroll_run_items table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "payroll_run_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub run_id: Uuid,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub employee_id: Uuid,

    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub salary: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub ot_hours: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub ot_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub bonus: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub housing_allowance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub attendance_bonus_no_late: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub attendance_bonus_no_leave: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub leave_compensation: Decimal,
    #[sea_orm(column_type = "JsonBinary")]
    pub others_income: Json,

    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub leave_days_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub leave_days_deduction: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub leave_hours_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub leave_hours_deduction: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub leave_double_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub leave_double_deduction: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub late_minutes_qty: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub late_minutes_deduction: Decimal,

    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub sso_month_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub sso_month_employer: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub tax_month_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub pf_month_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub pf_month_employer: Decimal,

    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub advance_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub advance_repay: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub advance_diff: Decimal,
    #[sea_orm(column_type = "JsonBinary")]
    pub loan_repayments: Json,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub loan_outstanding_prev: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub loan_outstanding_total: Decimal,

    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub water_meter_prev: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub water_meter_curr: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub water_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub electric_meter_prev: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))", nullable)]
    pub electric_meter_curr: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub electric_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub internet_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub doctor_fee: Decimal,
    #[sea_orm(column_type = "JsonBinary")]
    pub others_deduction: Json,

    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub sso_accum_prev: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub sso_accum_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub tax_accum_prev: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub tax_accum_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub pf_accum_prev: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub pf_accum_total: Decimal,

    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub income_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub deduction_total: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub net_pay: Decimal,

    pub allow_water: bool,
    pub allow_electric: bool,
    pub allow_internet: bool,
    pub allow_doctor_fee: bool,
    pub sso_contribute: bool,
    pub provident_fund_contribute: bool,
    pub withhold_tax: bool,

    pub is_manual_tax: bool,
    pub is_manual_pf: bool,
    pub is_manual_internet: bool,
    pub is_manual_water: bool,
    pub is_manual_electric: bool,

    pub updated_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::payroll_runs::Entity",
        from = "Column::RunId",
        to = "super::payroll_runs::Column::Id"
    )]
    PayrollRuns,
}

impl Related<super::payroll_runs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PayrollRuns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
