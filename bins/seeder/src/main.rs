//! Database seeder for HRMS development and testing.
//!
//! Seeds a superadmin, a demo company with its default branch, an HR officer
//! assigned to that branch, and a handful of employees.
//!
//! Environment:
//!   DATABASE_URL            - target database
//!   SEED_ADMIN_PASSWORD     - password for `superadmin` and `hr.demo`
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use hrms_core::auth::hash_password;
use hrms_core::employee::PayTerms;
use hrms_core::payroll::EmployeeFlags;
use hrms_db::repositories::{
    CompanyRepository, CreateCompanyInput, CreateEmployeeInput, EmployeeRepository,
    PermissionRepository, UserRepository,
};
use hrms_db::{TenantScope, Transactor, connect};
use hrms_shared::config::DatabaseConfig;
use hrms_shared::{AppError, Role};

const ADMIN_USERNAME: &str = "superadmin";
const HR_USERNAME: &str = "hr.demo";
const DEMO_COMPANY: &str = "DEMO";

struct SeedEmployee {
    number: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    base_pay: Decimal,
    flags: EmployeeFlags,
}

fn demo_employees() -> Vec<SeedEmployee> {
    let standard = EmployeeFlags {
        sso_contribute: true,
        withhold_tax: true,
        allow_water: true,
        allow_electric: true,
        ..EmployeeFlags::default()
    };
    vec![
        SeedEmployee {
            number: "E001",
            first_name: "Somchai",
            last_name: "Jaidee",
            base_pay: dec!(30000),
            flags: EmployeeFlags {
                provident_fund_contribute: true,
                ..standard
            },
        },
        SeedEmployee {
            number: "E002",
            first_name: "Malee",
            last_name: "Srisuk",
            base_pay: dec!(18000),
            flags: standard,
        },
        SeedEmployee {
            number: "E003",
            first_name: "Anan",
            last_name: "Boonma",
            base_pay: dec!(12000),
            flags: EmployeeFlags {
                sso_contribute: true,
                ..EmployeeFlags::default()
            },
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let password =
        std::env::var("SEED_ADMIN_PASSWORD").context("SEED_ADMIN_PASSWORD must be set")?;

    println!("Connecting to database...");
    let db = connect(&DatabaseConfig {
        url,
        max_connections: 2,
        min_connections: 1,
    })
    .await?;
    let users = UserRepository::new(db.clone());
    let transactor = Transactor::new(db.clone());
    let hash = hash_password(&password)?;

    println!("Seeding superadmin...");
    let admin = if let Some(existing) = users.find_by_username(ADMIN_USERNAME).await? {
        println!("  {ADMIN_USERNAME} already exists, skipping...");
        existing
    } else {
        users
            .create(ADMIN_USERNAME, &hash, "Platform Administrator", Role::Superadmin)
            .await?
    };

    println!("Seeding demo company...");
    let created = match CompanyRepository::new(transactor.clone())
        .create(
            CreateCompanyInput {
                code: DEMO_COMPANY.to_string(),
                name: "Demo Company".to_string(),
            },
            admin.id,
        )
        .await
    {
        Ok(created) => created,
        Err(AppError::Conflict(_)) => {
            println!("  {DEMO_COMPANY} already exists, skipping the rest...");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let company_id = created.company.id;
    let branch_id = created.default_branch.id;

    println!("Seeding HR officer...");
    let hr = users
        .create(HR_USERNAME, &hash, "Demo HR Officer", Role::Hr)
        .await?;
    let hr_id = hr.id;
    transactor
        .within_scope(TenantScope::company(company_id), move |tx| {
            Box::pin(async move {
                PermissionRepository::grant_company_role(tx.conn(), hr_id, company_id, Role::Hr)
                    .await?;
                PermissionRepository::grant_branch_access(tx.conn(), hr_id, branch_id).await?;
                Ok(())
            })
        })
        .await?;

    println!("Seeding employees...");
    let scope = TenantScope {
        company_id,
        branch_ids: vec![branch_id],
    };
    let actor = admin.id;
    for employee in demo_employees() {
        let input = CreateEmployeeInput {
            branch_id: Some(branch_id),
            employee_number: employee.number.to_string(),
            first_name: employee.first_name.to_string(),
            last_name: employee.last_name.to_string(),
            terms: PayTerms {
                base_pay_amount: employee.base_pay,
                housing_allowance: dec!(1000),
                pf_rate_employee: dec!(0.03),
                pf_rate_employer: dec!(0.03),
            },
            flags: employee.flags,
        };
        let id: Uuid = transactor
            .within_scope(scope.clone(), move |tx| {
                Box::pin(async move {
                    let model =
                        EmployeeRepository::create(tx.conn(), tx.scope(), input, actor).await?;
                    Ok(model.id)
                })
            })
            .await?;
        println!("  {} {} ({id})", employee.first_name, employee.last_name);
    }

    db.close().await?;
    println!("Seeding complete!");
    Ok(())
}
