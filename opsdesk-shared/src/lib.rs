//! # OpsDesk Shared Library
//!
//! Types and business logic shared by the OpsDesk API server and its tests.
//!
//! ## Module Organization
//!
//! - `models`: database models (users, organizations, memberships, tickets,
//!   ticket history)
//! - `auth`: password hashing, JWT handling, and the access control gate
//! - `db`: connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the OpsDesk shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
