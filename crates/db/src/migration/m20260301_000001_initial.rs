//! Initial database migration.
//!
//! Creates identity, tenancy, employee, worklog, payroll and audit tables,
//! their partial unique indexes, the `updated_at` trigger and the RLS
//! policies keyed on the transaction-local `app.*` settings.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: IDENTITY
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;
        db.execute_unprepared(SESSIONS_SQL).await?;

        // ============================================================
        // PART 2: TENANCY
        // ============================================================
        db.execute_unprepared(COMPANIES_SQL).await?;
        db.execute_unprepared(BRANCHES_SQL).await?;
        db.execute_unprepared(PERMISSIONS_SQL).await?;

        // ============================================================
        // PART 3: HR DATA
        // ============================================================
        db.execute_unprepared(EMPLOYEES_SQL).await?;
        db.execute_unprepared(WORKLOGS_SQL).await?;

        // ============================================================
        // PART 4: PAYROLL
        // ============================================================
        db.execute_unprepared(PAYROLL_RUNS_SQL).await?;
        db.execute_unprepared(PAYROLL_RUN_ITEMS_SQL).await?;
        db.execute_unprepared(PAYROLL_ACCUMULATIONS_SQL).await?;

        // ============================================================
        // PART 5: AUDIT
        // ============================================================
        db.execute_unprepared(AUDIT_LOGS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        // ============================================================
        // PART 7: ROW-LEVEL SECURITY
        // ============================================================
        db.execute_unprepared(RLS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    username VARCHAR(100) NOT NULL,
    password_hash TEXT NOT NULL,
    full_name VARCHAR(255) NOT NULL DEFAULT '',
    role TEXT NOT NULL CHECK (role IN ('superadmin', 'admin', 'hr', 'staff')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE UNIQUE INDEX user_username_uk ON users(username) WHERE deleted_at IS NULL;
";

const SESSIONS_SQL: &str = r"
CREATE TABLE sessions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    refresh_token_hash VARCHAR(64) NOT NULL,
    user_agent TEXT,
    expires_at TIMESTAMPTZ NOT NULL,
    revoked_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_expires_future CHECK (expires_at > created_at)
);

CREATE INDEX idx_sessions_token_hash ON sessions(refresh_token_hash) WHERE revoked_at IS NULL;
CREATE INDEX idx_sessions_user ON sessions(user_id, created_at DESC) WHERE revoked_at IS NULL;
CREATE INDEX idx_sessions_expires ON sessions(expires_at) WHERE revoked_at IS NULL;
";

const COMPANIES_SQL: &str = r"
CREATE TABLE companies (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    code VARCHAR(20) NOT NULL,
    name VARCHAR(255) NOT NULL,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'suspended', 'archived')),
    created_by UUID REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE UNIQUE INDEX company_code_uk ON companies(code) WHERE deleted_at IS NULL;
";

const BRANCHES_SQL: &str = r"
CREATE TABLE branches (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    code VARCHAR(20) NOT NULL,
    name VARCHAR(255) NOT NULL,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'suspended', 'archived')),
    is_default BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,
    CONSTRAINT chk_default_active CHECK (NOT is_default OR status = 'active')
);

CREATE UNIQUE INDEX branch_company_code_uk ON branches(company_id, code) WHERE deleted_at IS NULL;
CREATE UNIQUE INDEX branch_company_default_uk ON branches(company_id)
    WHERE is_default AND deleted_at IS NULL;
";

const PERMISSIONS_SQL: &str = r"
CREATE TABLE user_company_roles (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    role TEXT NOT NULL CHECK (role IN ('admin', 'hr', 'staff')),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT user_company_role_uk UNIQUE (user_id, company_id)
);

CREATE TABLE user_branch_access (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    branch_id UUID NOT NULL REFERENCES branches(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT user_branch_access_uk UNIQUE (user_id, branch_id)
);

CREATE INDEX idx_user_company_roles_company ON user_company_roles(company_id);
CREATE INDEX idx_user_branch_access_branch ON user_branch_access(branch_id);
";

const EMPLOYEES_SQL: &str = r"
CREATE TABLE employees (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    branch_id UUID NOT NULL REFERENCES branches(id),
    employee_number VARCHAR(50) NOT NULL,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'resigned')),
    base_pay_amount NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (base_pay_amount >= 0),
    housing_allowance NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (housing_allowance >= 0),
    pf_rate_employee NUMERIC(5, 4) NOT NULL DEFAULT 0 CHECK (pf_rate_employee BETWEEN 0 AND 1),
    pf_rate_employer NUMERIC(5, 4) NOT NULL DEFAULT 0 CHECK (pf_rate_employer BETWEEN 0 AND 1),
    allow_water BOOLEAN NOT NULL DEFAULT false,
    allow_electric BOOLEAN NOT NULL DEFAULT false,
    allow_internet BOOLEAN NOT NULL DEFAULT false,
    allow_doctor_fee BOOLEAN NOT NULL DEFAULT false,
    sso_contribute BOOLEAN NOT NULL DEFAULT false,
    provident_fund_contribute BOOLEAN NOT NULL DEFAULT false,
    withhold_tax BOOLEAN NOT NULL DEFAULT false,
    created_by UUID REFERENCES users(id),
    updated_by UUID REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE UNIQUE INDEX employee_company_number_uk ON employees(company_id, employee_number)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_employees_branch ON employees(company_id, branch_id) WHERE deleted_at IS NULL;
";

const WORKLOGS_SQL: &str = r"
CREATE TABLE worklogs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    branch_id UUID NOT NULL REFERENCES branches(id),
    employee_id UUID NOT NULL REFERENCES employees(id),
    work_date DATE NOT NULL,
    entry_type TEXT NOT NULL
        CHECK (entry_type IN ('late', 'leave_day', 'leave_hours', 'leave_double', 'ot')),
    quantity NUMERIC(10, 2) NOT NULL CHECK (quantity > 0),
    note TEXT,
    created_by UUID NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE UNIQUE INDEX worklog_employee_date_type_uk ON worklogs(employee_id, work_date, entry_type)
    WHERE deleted_at IS NULL;
CREATE INDEX idx_worklogs_company_date ON worklogs(company_id, work_date) WHERE deleted_at IS NULL;
";

const PAYROLL_RUNS_SQL: &str = r"
CREATE TABLE payroll_runs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    branch_id UUID NOT NULL REFERENCES branches(id),
    payroll_month DATE NOT NULL CHECK (EXTRACT(DAY FROM payroll_month) = 1),
    period_start DATE NOT NULL,
    pay_date DATE NOT NULL,
    status TEXT NOT NULL DEFAULT 'processing'
        CHECK (status IN ('processing', 'pending', 'approved')),
    sso_rate_employee NUMERIC(5, 4) NOT NULL CHECK (sso_rate_employee BETWEEN 0 AND 1),
    sso_rate_employer NUMERIC(5, 4) NOT NULL CHECK (sso_rate_employer BETWEEN 0 AND 1),
    approved_at TIMESTAMPTZ,
    approved_by UUID REFERENCES users(id),
    created_by UUID NOT NULL REFERENCES users(id),
    updated_by UUID NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ,
    CONSTRAINT chk_approved_stamp CHECK (
        (status = 'approved') = (approved_at IS NOT NULL AND approved_by IS NOT NULL)
    ),
    CONSTRAINT chk_approved_not_deleted CHECK (NOT (status = 'approved' AND deleted_at IS NOT NULL))
);

CREATE UNIQUE INDEX payroll_run_month_branch_uk ON payroll_runs(company_id, branch_id, payroll_month)
    WHERE deleted_at IS NULL;
CREATE UNIQUE INDEX payroll_run_month_branch_approved_uk
    ON payroll_runs(company_id, branch_id, payroll_month)
    WHERE status = 'approved' AND deleted_at IS NULL;
";

const PAYROLL_RUN_ITEMS_SQL: &str = r"
CREATE TABLE payroll_run_items (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    run_id UUID NOT NULL REFERENCES payroll_runs(id) ON DELETE CASCADE,
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    branch_id UUID NOT NULL REFERENCES branches(id),
    employee_id UUID NOT NULL REFERENCES employees(id),

    salary NUMERIC(15, 2) NOT NULL DEFAULT 0,
    ot_hours NUMERIC(15, 2) NOT NULL DEFAULT 0,
    ot_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    bonus NUMERIC(15, 2) NOT NULL DEFAULT 0,
    housing_allowance NUMERIC(15, 2) NOT NULL DEFAULT 0,
    attendance_bonus_no_late NUMERIC(15, 2) NOT NULL DEFAULT 0,
    attendance_bonus_no_leave NUMERIC(15, 2) NOT NULL DEFAULT 0,
    leave_compensation NUMERIC(15, 2) NOT NULL DEFAULT 0,
    others_income JSONB NOT NULL DEFAULT '[]'::jsonb,

    leave_days_qty NUMERIC(15, 2) NOT NULL DEFAULT 0,
    leave_days_deduction NUMERIC(15, 2) NOT NULL DEFAULT 0,
    leave_hours_qty NUMERIC(15, 2) NOT NULL DEFAULT 0,
    leave_hours_deduction NUMERIC(15, 2) NOT NULL DEFAULT 0,
    leave_double_qty NUMERIC(15, 2) NOT NULL DEFAULT 0,
    leave_double_deduction NUMERIC(15, 2) NOT NULL DEFAULT 0,
    late_minutes_qty NUMERIC(15, 2) NOT NULL DEFAULT 0,
    late_minutes_deduction NUMERIC(15, 2) NOT NULL DEFAULT 0,

    sso_month_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    sso_month_employer NUMERIC(15, 2) NOT NULL DEFAULT 0,
    tax_month_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    pf_month_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    pf_month_employer NUMERIC(15, 2) NOT NULL DEFAULT 0,

    advance_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    advance_repay NUMERIC(15, 2) NOT NULL DEFAULT 0,
    advance_diff NUMERIC(15, 2) NOT NULL DEFAULT 0,
    loan_repayments JSONB NOT NULL DEFAULT '[]'::jsonb,
    loan_outstanding_prev NUMERIC(15, 2) NOT NULL DEFAULT 0,
    loan_outstanding_total NUMERIC(15, 2) NOT NULL DEFAULT 0 CHECK (loan_outstanding_total >= 0),

    water_meter_prev NUMERIC(15, 2),
    water_meter_curr NUMERIC(15, 2),
    water_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    electric_meter_prev NUMERIC(15, 2),
    electric_meter_curr NUMERIC(15, 2),
    electric_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    internet_amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    doctor_fee NUMERIC(15, 2) NOT NULL DEFAULT 0,
    others_deduction JSONB NOT NULL DEFAULT '[]'::jsonb,

    sso_accum_prev NUMERIC(15, 2) NOT NULL DEFAULT 0,
    sso_accum_total NUMERIC(15, 2) NOT NULL DEFAULT 0,
    tax_accum_prev NUMERIC(15, 2) NOT NULL DEFAULT 0,
    tax_accum_total NUMERIC(15, 2) NOT NULL DEFAULT 0,
    pf_accum_prev NUMERIC(15, 2) NOT NULL DEFAULT 0,
    pf_accum_total NUMERIC(15, 2) NOT NULL DEFAULT 0,

    income_total NUMERIC(15, 2) NOT NULL DEFAULT 0,
    deduction_total NUMERIC(15, 2) NOT NULL DEFAULT 0,
    net_pay NUMERIC(15, 2) NOT NULL DEFAULT 0,

    allow_water BOOLEAN NOT NULL DEFAULT false,
    allow_electric BOOLEAN NOT NULL DEFAULT false,
    allow_internet BOOLEAN NOT NULL DEFAULT false,
    allow_doctor_fee BOOLEAN NOT NULL DEFAULT false,
    sso_contribute BOOLEAN NOT NULL DEFAULT false,
    provident_fund_contribute BOOLEAN NOT NULL DEFAULT false,
    withhold_tax BOOLEAN NOT NULL DEFAULT false,

    is_manual_tax BOOLEAN NOT NULL DEFAULT false,
    is_manual_pf BOOLEAN NOT NULL DEFAULT false,
    is_manual_internet BOOLEAN NOT NULL DEFAULT false,
    is_manual_water BOOLEAN NOT NULL DEFAULT false,
    is_manual_electric BOOLEAN NOT NULL DEFAULT false,

    updated_by UUID REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    deleted_at TIMESTAMPTZ
);

CREATE UNIQUE INDEX payroll_run_item_employee_uk ON payroll_run_items(run_id, employee_id)
    WHERE deleted_at IS NULL;
";

const PAYROLL_ACCUMULATIONS_SQL: &str = r"
CREATE TABLE payroll_accumulations (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    company_id UUID NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
    employee_id UUID NOT NULL REFERENCES employees(id),
    accum_type TEXT NOT NULL
        CHECK (accum_type IN ('tax', 'sso', 'sso_employer', 'pf', 'pf_employer', 'loan_outstanding')),
    accum_year INTEGER,
    amount NUMERIC(15, 2) NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_accum_year CHECK (
        (accum_type IN ('tax', 'sso', 'sso_employer')) = (accum_year IS NOT NULL)
    ),
    CONSTRAINT chk_loan_non_negative CHECK (accum_type <> 'loan_outstanding' OR amount >= 0)
);

-- All-time kinds store NULL years; COALESCE folds them into one key.
CREATE UNIQUE INDEX payroll_accumulation_uk
    ON payroll_accumulations(employee_id, accum_type, (COALESCE(accum_year, -1)));
";

const AUDIT_LOGS_SQL: &str = r"
CREATE TABLE audit_logs (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    actor_id UUID NOT NULL,
    company_id UUID,
    branch_id UUID,
    action TEXT NOT NULL,
    entity_name TEXT NOT NULL,
    entity_id UUID NOT NULL,
    details JSONB NOT NULL DEFAULT '{}'::jsonb,
    occurred_at TIMESTAMPTZ NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_audit_logs_entity ON audit_logs(entity_name, entity_id, occurred_at DESC);
CREATE INDEX idx_audit_logs_company ON audit_logs(company_id, occurred_at DESC);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_users_updated_at BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_companies_updated_at BEFORE UPDATE ON companies
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_branches_updated_at BEFORE UPDATE ON branches
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_employees_updated_at BEFORE UPDATE ON employees
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_worklogs_updated_at BEFORE UPDATE ON worklogs
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_payroll_runs_updated_at BEFORE UPDATE ON payroll_runs
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_payroll_run_items_updated_at BEFORE UPDATE ON payroll_run_items
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_payroll_accumulations_updated_at BEFORE UPDATE ON payroll_accumulations
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const RLS_SQL: &str = r"
-- ============================================================
-- ROW-LEVEL SECURITY POLICIES
-- The transactor sets app.company_id, app.branch_id and
-- app.branch_ids with set_config(..., true) before every body.
-- An empty app.branch_ids means every branch of the company.
-- ============================================================

CREATE OR REPLACE FUNCTION app_company_id() RETURNS UUID AS $$
    SELECT NULLIF(current_setting('app.company_id', true), '')::UUID
$$ LANGUAGE sql STABLE;

CREATE OR REPLACE FUNCTION app_branch_visible(branch UUID) RETURNS BOOLEAN AS $$
    SELECT COALESCE(current_setting('app.branch_ids', true), '') = ''
        OR branch = ANY(string_to_array(current_setting('app.branch_ids', true), ',')::UUID[])
$$ LANGUAGE sql STABLE;

ALTER TABLE branches ENABLE ROW LEVEL SECURITY;
ALTER TABLE employees ENABLE ROW LEVEL SECURITY;
ALTER TABLE worklogs ENABLE ROW LEVEL SECURITY;
ALTER TABLE payroll_runs ENABLE ROW LEVEL SECURITY;
ALTER TABLE payroll_run_items ENABLE ROW LEVEL SECURITY;
ALTER TABLE payroll_accumulations ENABLE ROW LEVEL SECURITY;

CREATE POLICY tenant_isolation ON branches
    USING (company_id = app_company_id());

CREATE POLICY tenant_isolation ON employees
    USING (company_id = app_company_id() AND app_branch_visible(branch_id));

CREATE POLICY tenant_isolation ON worklogs
    USING (company_id = app_company_id() AND app_branch_visible(branch_id));

CREATE POLICY tenant_isolation ON payroll_runs
    USING (company_id = app_company_id() AND app_branch_visible(branch_id));

CREATE POLICY tenant_isolation ON payroll_run_items
    USING (company_id = app_company_id() AND app_branch_visible(branch_id));

CREATE POLICY tenant_isolation ON payroll_accumulations
    USING (company_id = app_company_id());
";

const DROP_ALL_SQL: &str = r"
-- ============================================================
-- DROP ALL: Rollback migration
-- Order matters due to foreign key constraints
-- ============================================================

DROP TABLE IF EXISTS audit_logs CASCADE;
DROP TABLE IF EXISTS payroll_accumulations CASCADE;
DROP TABLE IF EXISTS payroll_run_items CASCADE;
DROP TABLE IF EXISTS payroll_runs CASCADE;
DROP TABLE IF EXISTS worklogs CASCADE;
DROP TABLE IF EXISTS employees CASCADE;
DROP TABLE IF EXISTS user_branch_access CASCADE;
DROP TABLE IF EXISTS user_company_roles CASCADE;
DROP TABLE IF EXISTS branches CASCADE;
DROP TABLE IF EXISTS companies CASCADE;
DROP TABLE IF EXISTS sessions CASCADE;
DROP TABLE IF EXISTS users CASCADE;

DROP FUNCTION IF EXISTS app_branch_visible(UUID);
DROP FUNCTION IF EXISTS app_company_id();
DROP FUNCTION IF EXISTS set_updated_at();
";
