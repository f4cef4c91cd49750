//! Credential handling.
//!
//! Passwords are stored as Argon2id PHC strings; the login flow verifies
//! against a fixed dummy hash when the user is unknown so both paths cost
//! the same.

mod password;

pub use password::{
    MIN_PASSWORD_LENGTH, PasswordError, hash_password, verify_password, verify_password_or_dummy,
};
