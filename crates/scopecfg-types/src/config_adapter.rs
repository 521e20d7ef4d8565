//! Adapter that persists configuration entries.
//!
//! The resolver composes "update if exists, else insert" out of these
//! primitives. Implementations must enforce uniqueness over
//! (key, scope, companyId, userId, moduleId) and report a duplicate insert as
//! [`Error::Conflict`] so the caller can retry as an update.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::prelude::*;

pub const DEFAULT_LIST_LIMIT: u32 = 100;
pub const MAX_LIST_LIMIT: u32 = 1000;

/// A persisted configuration entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigEntry {
	pub config_id: i64,
	pub key: Box<str>,
	#[serde(flatten)]
	pub scope: Scope,
	pub value: serde_json::Value,
	pub created_by: Box<str>,
	pub updated_by: Box<str>,
	pub created_at: Timestamp,
	pub updated_at: Timestamp,
}

// IdFilter //
//**********//
/// Tri-state identifier filter for listings
///
/// `Null` differs from `Any`: it selects only entries whose identifier is
/// absent. On the wire the literal string `null` selects `Null`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum IdFilter {
	#[default]
	Any,
	Null,
	Eq(Box<str>),
}

impl IdFilter {
	pub fn matches(&self, id: Option<&str>) -> bool {
		match self {
			IdFilter::Any => true,
			IdFilter::Null => id.is_none(),
			IdFilter::Eq(expected) => id == Some(&**expected),
		}
	}
}

impl<'de> Deserialize<'de> for IdFilter {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let value = Option::<String>::deserialize(deserializer)?;
		Ok(match value.as_deref() {
			None | Some("null") => IdFilter::Null,
			Some("") => IdFilter::Any,
			Some(id) => IdFilter::Eq(id.into()),
		})
	}
}

/// Filters for listing configuration entries
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListConfigOptions {
	pub scope: Option<ScopeKind>,
	#[serde(default)]
	pub company_id: IdFilter,
	#[serde(default)]
	pub user_id: IdFilter,
	#[serde(default)]
	pub module_id: IdFilter,
	pub key_prefix: Option<Box<str>>,
	pub limit: Option<u32>,
	pub offset: Option<u32>,
}

impl ListConfigOptions {
	/// Requested limit with the default applied and the maximum enforced
	pub fn effective_limit(&self) -> u32 {
		self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
	}

	pub fn effective_offset(&self) -> u32 {
		self.offset.unwrap_or(0)
	}

	/// Whether an entry satisfies every filter except pagination
	pub fn matches(&self, entry: &ConfigEntry) -> bool {
		self.scope.is_none_or(|kind| entry.scope.kind() == kind)
			&& self.company_id.matches(entry.scope.company_id())
			&& self.user_id.matches(entry.scope.user_id())
			&& self.module_id.matches(entry.scope.module_id())
			&& self.key_prefix.as_deref().is_none_or(|prefix| entry.key.starts_with(prefix))
	}
}

#[async_trait]
pub trait ConfigAdapter: Debug + Send + Sync {
	/// Exact lookup by key and scope
	async fn read_config(&self, key: &str, scope: &Scope) -> ClResult<Option<ConfigEntry>>;

	/// Insert a new entry. Fails with `Error::Conflict` if the slot is taken.
	async fn create_config(
		&self,
		key: &str,
		scope: &Scope,
		value: &serde_json::Value,
		actor_id: &str,
	) -> ClResult<ConfigEntry>;

	/// Replace the value of an existing entry. Fails with `Error::NotFound` if
	/// the entry no longer exists. `updated_at` never moves backwards.
	async fn update_config(
		&self,
		config_id: i64,
		value: &serde_json::Value,
		actor_id: &str,
	) -> ClResult<ConfigEntry>;

	/// Hard delete. Returns whether a row was removed.
	async fn delete_config(&self, config_id: i64) -> ClResult<bool>;

	/// Filtered listing ordered by key ascending
	async fn list_configs(&self, opts: &ListConfigOptions) -> ClResult<Vec<ConfigEntry>>;
}


// vim: ts=4
