//! Database schema initialization
//!
//! Creates the configuration and audit tables and their indexes. Identifier
//! columns use the empty string for "absent" so that the uniqueness
//! constraint covers entries whose scope leaves some identifiers unset
//! (SQLite treats NULLs as distinct in unique indexes).
//!
//! Values are serialized JSON in `text` columns. A `json` declared type gets
//! NUMERIC affinity and would store numbers as INTEGER or REAL.

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Configurations
	//****************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS configurations (
		config_id integer PRIMARY KEY AUTOINCREMENT,
		key text NOT NULL,
		scope text NOT NULL,
		company_id text NOT NULL DEFAULT '',
		user_id text NOT NULL DEFAULT '',
		module_id text NOT NULL DEFAULT '',
		value text NOT NULL,
		created_by text NOT NULL,
		updated_by text NOT NULL,
		created_at datetime DEFAULT (unixepoch()),
		updated_at datetime DEFAULT (unixepoch()),
		UNIQUE(key, scope, company_id, user_id, module_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_configurations_company ON configurations(company_id, key)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_configurations_module ON configurations(module_id, key)")
		.execute(&mut *tx)
		.await?;

	// Audit log
	//***********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS audit_logs (
		audit_id integer PRIMARY KEY AUTOINCREMENT,
		actor_id text NOT NULL,
		company_id text,
		action text NOT NULL,
		entity_type text NOT NULL,
		entity_id text NOT NULL,
		details text,
		created_at datetime DEFAULT (unixepoch())
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query(
		"CREATE INDEX IF NOT EXISTS idx_audit_logs_entity ON audit_logs(entity_type, entity_id)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

// vim: ts=4
