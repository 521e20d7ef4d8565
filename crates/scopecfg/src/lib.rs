//! Hierarchical scoped configuration service
//!
//! Resolves configuration values across GLOBAL, COMPANY, USER and MODULE
//! scopes, caches them with a TTL and records every mutation in an audit log.
//! This crate exposes the resolver over HTTP; storage is plugged in through
//! the adapter traits in [`types`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod app;
pub mod extract;
pub mod handler;
pub mod prelude;
pub mod routes;

pub use app::{App, AppBuilder, AppState};
pub use scopecfg_core as core;
pub use scopecfg_types as types;

// vim: ts=4
