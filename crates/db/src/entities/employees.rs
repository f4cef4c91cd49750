//! `SeaORM` Entity for employees table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::EmployeeStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "employees")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub branch_id: Uuid,
    pub employee_number: String,
    pub first_name: String,
    pub last_name: String,
    pub status: EmployeeStatus,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub base_pay_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((15, 2)))")]
    pub housing_allowance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 4)))")]
    pub pf_rate_employee: Decimal,
    #[sea_orm(column_type = "Decimal(Some((5, 4)))")]
    pub pf_rate_employer: Decimal,
    pub allow_water: bool,
    pub allow_electric: bool,
    pub allow_internet: bool,
    pub allow_doctor_fee: bool,
    pub sso_contribute: bool,
    pub provident_fund_contribute: bool,
    pub withhold_tax: bool,
    pub created_by: Option<Uuid>,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::branches::Entity",
        from = "Column::BranchId",
        to = "super::branches::Column::Id"
    )]
    Branches,
}

impl Related<super::branches::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Branches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
