//! Resilient Orders Core - Shared types library.
//!
//! This crate provides the domain types used across all Resilient Orders components:
//! - `db` - `PostgreSQL` repository for orders and duplicate detection
//! - `cli` - Command-line tools for migrations and order management
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access. The
//! optional `postgres` feature adds `sqlx` encoding for the identifier types
//! so they can be bound to queries directly.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for identifiers and the [`Order`] entity

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
