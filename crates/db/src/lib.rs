//! Resilient Orders database library.
//!
//! This crate provides the `PostgreSQL` persistence layer for orders as a
//! library, allowing it to be used by the CLI and exercised by integration
//! tests.
//!
//! # Modules
//!
//! - [`config`] - Database configuration loaded from environment variables
//! - [`db`] - Connection pool, migrations and the [`db::OrdersRepository`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;

pub use config::{ConfigError, DatabaseConfig};
pub use db::{OrdersRepository, RepositoryError, StagingTable};
