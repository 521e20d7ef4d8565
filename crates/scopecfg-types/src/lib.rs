//! Shared types, adapter traits, and core utilities for scopecfg.
//!
//! This crate contains the foundational types that are shared between the
//! resolver, the HTTP layer and all adapter implementations. Keeping them in
//! a separate crate lets adapter crates compile without pulling in the
//! service or the web stack.

pub mod audit_adapter;
pub mod config_adapter;
pub mod error;
pub mod prelude;
pub mod scope;
pub mod types;

// vim: ts=4
