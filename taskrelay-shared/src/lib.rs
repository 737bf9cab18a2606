//! # TaskRelay Shared Library
//!
//! This crate contains the data model, database layer, and configuration
//! shared by the TaskRelay bot binary.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `db`: Connection pool and migrations
//! - `config`: Configuration management

pub mod config;
pub mod db;
pub mod models;

/// Current version of the TaskRelay shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
