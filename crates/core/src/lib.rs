//! Core business logic for HRMS.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `auth` - Password hashing
//! - `payroll` - Payroll run arithmetic, state machine and item adjustment
//! - `org` - Company and branch status rules
//! - `employee` - Employment status and pay terms
//! - `worklog` - Attendance entry types

pub mod auth;
pub mod employee;
pub mod org;
pub mod payroll;
pub mod worklog;
