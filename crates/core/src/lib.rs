//! Gamevault Core - Shared types library.
//!
//! This crate provides common types used across all Gamevault components:
//! - `storefront` - REST API, admin back office and server-rendered catalog
//! - `cli` - Command-line tools for migrations, seeding and admin management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and easy to unit test.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses
//! - [`sales`] - Per-day sales aggregation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod sales;
pub mod types;

pub use types::*;
