// Rust guideline compliant 2026-10-12

//! Adapters (secondary ports) for the coupon validation binary.
//!
//! Each sub-module implements one or more hexagonal port traits defined in the
//! `domain` crate. Adapters are isolated from the redemption rules.

pub mod in_memory_catalog;
pub mod log_scan_log;
pub mod sqlite_store;
