//! Translation of database errors into the shared error taxonomy.

use hrms_shared::AppError;
use sea_orm::{DbErr, SqlErr};

/// Unique constraints whose violation is a caller mistake, with the message
/// returned to the client.
///
/// Longer names come first so a name that prefixes another never shadows it.
const UNIQUE_CONFLICTS: &[(&str, &str)] = &[
    (
        "payroll_run_month_branch_approved_uk",
        "an approved payroll run already exists for this month",
    ),
    (
        "payroll_run_month_branch_uk",
        "a payroll run already exists for this month",
    ),
    (
        "payroll_run_item_employee_uk",
        "employee already has an item in this payroll run",
    ),
    (
        "worklog_employee_date_type_uk",
        "worklog already exists for this employee, date, and entryType",
    ),
    (
        "branch_company_default_uk",
        "company already has a default branch",
    ),
    (
        "branch_company_code_uk",
        "branch code already exists in this company",
    ),
    ("company_code_uk", "company code already exists"),
    (
        "employee_company_number_uk",
        "employee number already exists in this company",
    ),
    ("user_username_uk", "username already exists"),
    (
        "user_company_role_uk",
        "user already has a role in this company",
    ),
    (
        "user_branch_access_uk",
        "user already has access to this branch",
    ),
    (
        "bonus_cycle_month_branch_approved_uk",
        "an approved bonus cycle already exists for this month",
    ),
    (
        "bonus_cycle_pending_branch_uk",
        "a pending bonus cycle already exists for this branch",
    ),
    (
        "salary_raise_cycle_pending_branch_uk",
        "a pending salary raise cycle already exists for this branch",
    ),
];

/// Returns the client message for a known unique constraint.
fn unique_conflict_message(detail: &str) -> Option<&'static str> {
    UNIQUE_CONFLICTS
        .iter()
        .find(|(name, _)| detail.contains(name))
        .map(|(_, message)| *message)
}

/// Maps a `DbErr` onto an [`AppError`].
///
/// Known unique violations become `conflict`; `RecordNotFound` becomes
/// `not_found`. Everything else, unknown constraints included, is `internal`.
#[must_use]
pub fn map_db_err(err: DbErr) -> AppError {
    if let DbErr::RecordNotFound(what) = &err {
        return AppError::not_found(what.clone());
    }

    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        if let Some(message) = unique_conflict_message(&detail) {
            return AppError::conflict(message);
        }
        return AppError::internal(format!("unmapped unique violation: {detail}"));
    }

    AppError::internal(format!("database error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "duplicate key value violates unique constraint \"worklog_employee_date_type_uk\"",
        Some("worklog already exists for this employee, date, and entryType")
    )]
    #[case(
        "duplicate key value violates unique constraint \"payroll_run_month_branch_approved_uk\"",
        Some("an approved payroll run already exists for this month")
    )]
    #[case(
        "duplicate key value violates unique constraint \"payroll_run_month_branch_uk\"",
        Some("a payroll run already exists for this month")
    )]
    #[case(
        "duplicate key value violates unique constraint \"branch_company_default_uk\"",
        Some("company already has a default branch")
    )]
    #[case("duplicate key value violates unique constraint \"mystery_uk\"", None)]
    fn test_unique_conflict_message(#[case] detail: &str, #[case] expected: Option<&str>) {
        assert_eq!(unique_conflict_message(detail), expected);
    }

    #[test]
    fn test_record_not_found_maps_to_not_found() {
        let err = map_db_err(DbErr::RecordNotFound("payroll run not found".to_string()));
        assert_eq!(err, AppError::not_found("payroll run not found"));
    }

    #[test]
    fn test_other_errors_are_internal() {
        let err = map_db_err(DbErr::Custom("boom".to_string()));
        assert!(err.is_internal());
    }
}
