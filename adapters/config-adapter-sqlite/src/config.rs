//! Configuration entry storage

use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use scopecfg_types::config_adapter::{ConfigEntry, IdFilter, ListConfigOptions};
use scopecfg_types::prelude::*;

use crate::utils::{db_err, id_col, read_entry};

const ENTRY_COLUMNS: &str = "config_id, key, scope, company_id, user_id, module_id, value, \
	created_by, updated_by, created_at, updated_at";

/// Read the entry stored at exactly this scope
pub(crate) async fn read(db: &SqlitePool, key: &str, scope: &Scope) -> ClResult<Option<ConfigEntry>> {
	let row = sqlx::query(&format!(
		"SELECT {} FROM configurations
		WHERE key = ?1 AND scope = ?2 AND company_id = ?3 AND user_id = ?4 AND module_id = ?5",
		ENTRY_COLUMNS
	))
	.bind(key)
	.bind(scope.kind().as_str())
	.bind(id_col(scope.company_id()))
	.bind(id_col(scope.user_id()))
	.bind(id_col(scope.module_id()))
	.fetch_optional(db)
	.await
	.map_err(db_err)?;

	row.as_ref().map(read_entry).transpose()
}

/// Insert a new entry. A duplicate slot is reported as `Error::Conflict`.
pub(crate) async fn create(
	db: &SqlitePool,
	key: &str,
	scope: &Scope,
	value: &serde_json::Value,
	actor_id: &str,
) -> ClResult<ConfigEntry> {
	let now = Timestamp::now();
	let res = sqlx::query(&format!(
		"INSERT INTO configurations
		(key, scope, company_id, user_id, module_id, value, created_by, updated_by, created_at, updated_at)
		VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, ?8, ?8)
		RETURNING {}",
		ENTRY_COLUMNS
	))
	.bind(key)
	.bind(scope.kind().as_str())
	.bind(id_col(scope.company_id()))
	.bind(id_col(scope.user_id()))
	.bind(id_col(scope.module_id()))
	.bind(value.to_string())
	.bind(actor_id)
	.bind(now.0)
	.fetch_one(db)
	.await;

	match res {
		Ok(row) => read_entry(&row),
		Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
			debug!("DB: configuration {}:{} already exists", scope, key);
			Err(Error::Conflict(format!("configuration exists: {}:{}", scope, key)))
		}
		Err(err) => Err(db_err(err)),
	}
}

/// Replace the value of an existing entry
pub(crate) async fn update(
	db: &SqlitePool,
	config_id: i64,
	value: &serde_json::Value,
	actor_id: &str,
) -> ClResult<ConfigEntry> {
	let row = sqlx::query(&format!(
		"UPDATE configurations SET value = ?1, updated_by = ?2, updated_at = max(updated_at, ?3)
		WHERE config_id = ?4
		RETURNING {}",
		ENTRY_COLUMNS
	))
	.bind(value.to_string())
	.bind(actor_id)
	.bind(Timestamp::now().0)
	.bind(config_id)
	.fetch_optional(db)
	.await
	.map_err(db_err)?;

	match row {
		Some(row) => read_entry(&row),
		None => Err(Error::NotFound),
	}
}

pub(crate) async fn delete(db: &SqlitePool, config_id: i64) -> ClResult<bool> {
	let res = sqlx::query("DELETE FROM configurations WHERE config_id = ?1")
		.bind(config_id)
		.execute(db)
		.await
		.map_err(db_err)?;

	Ok(res.rows_affected() > 0)
}

fn push_id_filter<'a>(query: &mut QueryBuilder<'a, Sqlite>, column: &str, filter: &'a IdFilter) {
	match filter {
		IdFilter::Any => {}
		IdFilter::Null => {
			query.push(format!(" AND {} = ''", column));
		}
		IdFilter::Eq(id) => {
			query.push(format!(" AND {} = ", column)).push_bind(&**id);
		}
	}
}

pub(crate) async fn list(db: &SqlitePool, opts: &ListConfigOptions) -> ClResult<Vec<ConfigEntry>> {
	let mut query: QueryBuilder<Sqlite> =
		QueryBuilder::new(format!("SELECT {} FROM configurations WHERE 1 = 1", ENTRY_COLUMNS));

	if let Some(kind) = opts.scope {
		query.push(" AND scope = ").push_bind(kind.as_str());
	}
	push_id_filter(&mut query, "company_id", &opts.company_id);
	push_id_filter(&mut query, "user_id", &opts.user_id);
	push_id_filter(&mut query, "module_id", &opts.module_id);

	if let Some(prefix) = opts.key_prefix.as_deref() {
		// LIKE is case-insensitive in SQLite, compare the leading substring instead
		query
			.push(" AND substr(key, 1, length(")
			.push_bind(prefix)
			.push(")) = ")
			.push_bind(prefix);
	}

	query
		.push(" ORDER BY key ASC, config_id ASC LIMIT ")
		.push_bind(i64::from(opts.effective_limit()))
		.push(" OFFSET ")
		.push_bind(i64::from(opts.effective_offset()));

	let rows = query.build().fetch_all(db).await.map_err(db_err)?;
	rows.iter().map(read_entry).collect()
}

// vim: ts=4
