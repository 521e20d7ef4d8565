//! Audit log storage

use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use scopecfg_types::audit_adapter::AuditEvent;
use scopecfg_types::prelude::*;

use crate::utils::db_err;

/// A stored audit log row
#[derive(Debug, Clone)]
pub struct AuditRecord {
	pub audit_id: i64,
	pub actor_id: Box<str>,
	pub company_id: Option<Box<str>>,
	pub action: Box<str>,
	pub entity_type: Box<str>,
	pub entity_id: Box<str>,
	pub details: Value,
	pub created_at: Timestamp,
}

fn read_record(row: &SqliteRow) -> ClResult<AuditRecord> {
	let details: Option<&str> = row.try_get("details").map_err(db_err)?;
	let details = match details {
		Some(details) => serde_json::from_str(details).map_err(|err| {
			warn!("DB: invalid JSON in audit_logs row: {}", err);
			Error::DbError
		})?,
		None => Value::Null,
	};

	Ok(AuditRecord {
		audit_id: row.try_get("audit_id").map_err(db_err)?,
		actor_id: row.try_get::<&str, _>("actor_id").map_err(db_err)?.into(),
		company_id: row.try_get::<Option<&str>, _>("company_id").map_err(db_err)?.map(Into::into),
		action: row.try_get::<&str, _>("action").map_err(db_err)?.into(),
		entity_type: row.try_get::<&str, _>("entity_type").map_err(db_err)?.into(),
		entity_id: row.try_get::<&str, _>("entity_id").map_err(db_err)?.into(),
		details,
		created_at: Timestamp(row.try_get("created_at").map_err(db_err)?),
	})
}

pub(crate) async fn record(db: &SqlitePool, event: &AuditEvent) -> ClResult<()> {
	let details = serde_json::to_string(&event.details)?;

	sqlx::query(
		"INSERT INTO audit_logs (actor_id, company_id, action, entity_type, entity_id, details, created_at)
		VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
	)
	.bind(&*event.actor_id)
	.bind(event.company_id.as_deref())
	.bind(event.action.as_str())
	.bind(event.entity_type)
	.bind(&*event.entity_id)
	.bind(details)
	.bind(event.created_at.0)
	.execute(db)
	.await
	.map_err(db_err)?;

	Ok(())
}

pub(crate) async fn list(db: &SqlitePool, limit: u32) -> ClResult<Vec<AuditRecord>> {
	let rows = sqlx::query(
		"SELECT audit_id, actor_id, company_id, action, entity_type, entity_id, details, created_at
		FROM audit_logs ORDER BY audit_id DESC LIMIT ?1",
	)
	.bind(i64::from(limit))
	.fetch_all(db)
	.await
	.map_err(db_err)?;

	rows.iter().map(read_record).collect()
}

// vim: ts=4
