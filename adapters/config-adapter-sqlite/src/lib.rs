//! SQLite storage for configuration entries and their audit log
//!
//! One database file holds both the `configurations` table and the
//! `audit_logs` table, so [`ConfigAdapterSqlite`] implements both
//! [`ConfigAdapter`] and [`AuditAdapter`].

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

mod audit;
mod config;
mod schema;
mod utils;

use async_trait::async_trait;
use sqlx::sqlite::{self, SqlitePool};
use std::path::Path;

use scopecfg_types::audit_adapter::{AuditAdapter, AuditEvent};
use scopecfg_types::config_adapter::{ConfigAdapter, ConfigEntry, ListConfigOptions};
use scopecfg_types::prelude::*;

pub use audit::AuditRecord;

/// Database file created inside the adapter's directory
pub const DB_FILE_NAME: &str = "config.db";

#[derive(Debug)]
pub struct ConfigAdapterSqlite {
	db: SqlitePool,
}

impl ConfigAdapterSqlite {
	/// Open (or create) the database inside `dir`
	pub async fn new(dir: impl AsRef<Path>) -> ClResult<Self> {
		let dir = dir.as_ref();
		tokio::fs::create_dir_all(dir).await?;

		let opts = sqlite::SqliteConnectOptions::new()
			.filename(dir.join(DB_FILE_NAME))
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.map_err(utils::db_err)?;

		schema::init_db(&db).await.map_err(utils::db_err)?;
		info!("Config database opened in {}", dir.display());

		Ok(Self { db })
	}

	/// Most recent audit records first
	pub async fn list_audit_records(&self, limit: u32) -> ClResult<Vec<AuditRecord>> {
		audit::list(&self.db, limit).await
	}
}

#[async_trait]
impl ConfigAdapter for ConfigAdapterSqlite {
	async fn read_config(&self, key: &str, scope: &Scope) -> ClResult<Option<ConfigEntry>> {
		config::read(&self.db, key, scope).await
	}

	async fn create_config(
		&self,
		key: &str,
		scope: &Scope,
		value: &serde_json::Value,
		actor_id: &str,
	) -> ClResult<ConfigEntry> {
		config::create(&self.db, key, scope, value, actor_id).await
	}

	async fn update_config(
		&self,
		config_id: i64,
		value: &serde_json::Value,
		actor_id: &str,
	) -> ClResult<ConfigEntry> {
		config::update(&self.db, config_id, value, actor_id).await
	}

	async fn delete_config(&self, config_id: i64) -> ClResult<bool> {
		config::delete(&self.db, config_id).await
	}

	async fn list_configs(&self, opts: &ListConfigOptions) -> ClResult<Vec<ConfigEntry>> {
		config::list(&self.db, opts).await
	}
}

#[async_trait]
impl AuditAdapter for ConfigAdapterSqlite {
	async fn record_event(&self, event: &AuditEvent) -> ClResult<()> {
		audit::record(&self.db, event).await
	}
}

// vim: ts=4
