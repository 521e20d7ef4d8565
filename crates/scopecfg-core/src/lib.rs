//! Scoped configuration resolver.
//!
//! [`ConfigService`] answers "what is the value of this key for this caller"
//! on top of a [`ConfigAdapter`](scopecfg_types::config_adapter::ConfigAdapter)
//! store, with a [`ConfigCache`] in front of it and every mutation reported to
//! an [`AuditAdapter`](scopecfg_types::audit_adapter::AuditAdapter).

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod memory;
pub mod prelude;
pub mod service;

pub use cache::{CacheLookup, ConfigCache};
pub use service::ConfigService;

// vim: ts=4
