//! Shared utilities for the SQLite adapter
//!
//! Error mapping and row decoding helpers used by the domain modules.

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use scopecfg_types::config_adapter::ConfigEntry;
use scopecfg_types::prelude::*;

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Map a query error to `Error::DbError`, logging the original
pub(crate) fn db_err(err: sqlx::Error) -> Error {
	inspect(&err);
	Error::DbError
}

/// Identifier column value for an optional id
pub(crate) fn id_col(id: Option<&str>) -> &str {
	id.unwrap_or("")
}

fn opt_id(id: &str) -> Option<&str> {
	if id.is_empty() { None } else { Some(id) }
}

/// Decode a `configurations` row
pub(crate) fn read_entry(row: &SqliteRow) -> ClResult<ConfigEntry> {
	let scope: &str = row.try_get("scope").map_err(db_err)?;
	let company_id: &str = row.try_get("company_id").map_err(db_err)?;
	let user_id: &str = row.try_get("user_id").map_err(db_err)?;
	let module_id: &str = row.try_get("module_id").map_err(db_err)?;
	let value: &str = row.try_get("value").map_err(db_err)?;

	let kind = scope.parse::<ScopeKind>().map_err(|_| {
		warn!("DB: invalid scope in configurations row: {}", scope);
		Error::DbError
	})?;
	let scope = Scope::from_parts(kind, opt_id(company_id), opt_id(user_id), opt_id(module_id))
		.map_err(|err| {
			warn!("DB: configurations row violates scope rules: {}", err);
			Error::DbError
		})?;
	let value = serde_json::from_str(value).map_err(|err| {
		warn!("DB: invalid JSON in configurations row: {}", err);
		Error::DbError
	})?;

	Ok(ConfigEntry {
		config_id: row.try_get("config_id").map_err(db_err)?,
		key: row.try_get::<&str, _>("key").map_err(db_err)?.into(),
		scope,
		value,
		created_by: row.try_get::<&str, _>("created_by").map_err(db_err)?.into(),
		updated_by: row.try_get::<&str, _>("updated_by").map_err(db_err)?.into(),
		created_at: Timestamp(row.try_get("created_at").map_err(db_err)?),
		updated_at: Timestamp(row.try_get("updated_at").map_err(db_err)?),
	})
}

// vim: ts=4
