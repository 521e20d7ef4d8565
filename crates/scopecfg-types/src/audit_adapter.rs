//! Audit sink for configuration mutations
//!
//! Audit events describe who changed which configuration slot. They carry the
//! JSON type of a written value but never the value itself.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

use crate::prelude::*;

/// Entity type recorded for configuration audit events
pub const CONFIG_ENTITY_TYPE: &str = "configurations";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
	Create,
	Update,
	Delete,
}

impl AuditAction {
	pub fn as_str(self) -> &'static str {
		match self {
			AuditAction::Create => "CREATE",
			AuditAction::Update => "UPDATE",
			AuditAction::Delete => "DELETE",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditDetails {
	pub key: Box<str>,
	pub scope: ScopeKind,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value_type: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
	pub actor_id: Box<str>,
	pub company_id: Option<Box<str>>,
	pub action: AuditAction,
	pub entity_type: &'static str,
	pub entity_id: Box<str>,
	pub details: AuditDetails,
	pub created_at: Timestamp,
}

impl AuditEvent {
	/// Event for a configuration entry. `value` is only inspected for its type.
	pub fn config(
		action: AuditAction,
		actor_id: &str,
		config_id: i64,
		key: &str,
		scope: &Scope,
		value: Option<&serde_json::Value>,
	) -> Self {
		Self {
			actor_id: actor_id.into(),
			company_id: scope.company_id().map(Into::into),
			action,
			entity_type: CONFIG_ENTITY_TYPE,
			entity_id: config_id.to_string().into(),
			details: AuditDetails {
				key: key.into(),
				scope: scope.kind(),
				value_type: value.map(value_type),
			},
			created_at: Timestamp::now(),
		}
	}
}

/// JSON type name of a value
pub fn value_type(value: &serde_json::Value) -> &'static str {
	match value {
		serde_json::Value::Null => "null",
		serde_json::Value::Bool(_) => "boolean",
		serde_json::Value::Number(_) => "number",
		serde_json::Value::String(_) => "string",
		serde_json::Value::Array(_) => "array",
		serde_json::Value::Object(_) => "object",
	}
}

#[async_trait]
pub trait AuditAdapter: Debug + Send + Sync {
	async fn record_event(&self, event: &AuditEvent) -> ClResult<()>;
}


// vim: ts=4
