//! Core types for Resilient Orders.
//!
//! This module provides type-safe wrappers for order identifiers and the
//! order entity itself.

pub mod id;
pub mod order;

pub use id::*;
pub use order::{NaturalKey, Order};
