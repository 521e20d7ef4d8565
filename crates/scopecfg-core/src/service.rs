//! Configuration service with caching, fallback resolution, and auditing

use serde::de::DeserializeOwned;
use std::sync::Arc;

use scopecfg_types::audit_adapter::{AuditAction, AuditAdapter, AuditEvent};
use scopecfg_types::config_adapter::{ConfigAdapter, ConfigEntry, ListConfigOptions};

use crate::cache::{CacheLookup, ConfigCache};
use crate::prelude::*;

/// Longest accepted configuration key
pub const MAX_KEY_LENGTH: usize = 255;

/// Read/write races are retried this many times before giving up
const UPSERT_ATTEMPTS: usize = 3;

fn validate_key(key: &str) -> ClResult<()> {
	if key.is_empty() {
		return Err(Error::ValidationError("configuration key must not be empty".into()));
	}
	if key.len() > MAX_KEY_LENGTH {
		return Err(Error::ValidationError(format!(
			"configuration key is longer than {} bytes",
			MAX_KEY_LENGTH
		)));
	}
	if key.chars().any(char::is_control) {
		return Err(Error::ValidationError(
			"configuration key must not contain control characters".into(),
		));
	}
	// Keys are a single URL path segment
	if key.contains('/') {
		return Err(Error::ValidationError("configuration key must not contain '/'".into()));
	}
	Ok(())
}

fn validate(key: &str, scope: &Scope) -> ClResult<()> {
	validate_key(key)?;
	scope.validate()
}

/// Configuration service - main interface for reading and changing configuration
#[derive(Debug)]
pub struct ConfigService {
	adapter: Arc<dyn ConfigAdapter>,
	audit: Arc<dyn AuditAdapter>,
	cache: Arc<ConfigCache>,
}

impl ConfigService {
	pub fn new(
		adapter: Arc<dyn ConfigAdapter>,
		audit: Arc<dyn AuditAdapter>,
		cache: Arc<ConfigCache>,
	) -> Self {
		Self { adapter, audit, cache }
	}

	pub fn cache(&self) -> &ConfigCache {
		&self.cache
	}

	/// Read the value stored at exactly this scope.
	///
	/// With `use_cache` a fresh cache slot answers without touching the store,
	/// and a store read (including "no value") refreshes the slot.
	pub async fn get(
		&self,
		key: &str,
		scope: &Scope,
		use_cache: bool,
	) -> ClResult<Option<serde_json::Value>> {
		validate(key, scope)?;
		let ckey = ConfigKey::new(key, scope);

		if use_cache {
			if let CacheLookup::Hit(value) = self.cache.get(&ckey) {
				debug!("Config cache hit: {}", ckey);
				return Ok(value);
			}
			debug!("Config cache miss: {}", ckey);
		}

		let value = self
			.adapter
			.read_config(key, scope)
			.await
			.inspect_err(|err| warn!("Config get failed for {}: {}", ckey, err))?
			.map(|entry| entry.value);

		if use_cache {
			self.cache.put(ckey, value.clone());
		}
		Ok(value)
	}

	/// Resolve a key through the fallback chain USER, COMPANY, MODULE, GLOBAL.
	///
	/// Scopes whose identifiers are not all known are skipped. A failing step
	/// does not stop the chain; if no scope yields a value, the first failure
	/// is returned instead of `None`.
	pub async fn get_with_fallback(
		&self,
		key: &str,
		ids: &ScopeIds,
		use_cache: bool,
	) -> ClResult<Option<serde_json::Value>> {
		let mut first_err = None;

		for scope in ids.fallback_chain() {
			match self.get(key, &scope, use_cache).await {
				Ok(Some(value)) => {
					debug!("Config '{}' resolved at {}", key, scope);
					return Ok(Some(value));
				}
				Ok(None) => {}
				Err(err) => {
					warn!("Config lookup for '{}' at {} failed, trying next scope: {}", key, scope, err);
					if first_err.is_none() {
						first_err = Some(err);
					}
				}
			}
		}

		match first_err {
			Some(err) => Err(err),
			None => Ok(None),
		}
	}

	/// Store a value at exactly this scope, updating in place if present
	pub async fn set(
		&self,
		key: &str,
		value: serde_json::Value,
		scope: &Scope,
		actor_id: &str,
	) -> ClResult<ConfigEntry> {
		validate(key, scope)?;
		if value.is_null() {
			return Err(Error::ValidationError(format!(
				"configuration '{}' cannot be set to null, delete it instead",
				key
			)));
		}
		let ckey = ConfigKey::new(key, scope);

		let (action, entry) = self
			.upsert(&ckey, &value, actor_id)
			.await
			.inspect_err(|err| warn!("Config set failed for {}: {}", ckey, err))?;
		self.cache.invalidate(&ckey);

		self.emit(AuditEvent::config(action, actor_id, entry.config_id, key, scope, Some(&value)))
			.await;
		let verb = if action == AuditAction::Create { "created" } else { "updated" };
		info!("Config {} {} by {}", ckey, verb, actor_id);

		Ok(entry)
	}

	/// Update if the slot exists, else insert. Concurrent creators are
	/// detected through the store's uniqueness constraint and retried as an
	/// update.
	async fn upsert(
		&self,
		ckey: &ConfigKey,
		value: &serde_json::Value,
		actor_id: &str,
	) -> ClResult<(AuditAction, ConfigEntry)> {
		for _ in 0..UPSERT_ATTEMPTS {
			match self.adapter.read_config(&ckey.key, &ckey.scope).await? {
				Some(existing) => {
					match self.adapter.update_config(existing.config_id, value, actor_id).await {
						Ok(entry) => return Ok((AuditAction::Update, entry)),
						Err(Error::NotFound) => {
							debug!("Config {} deleted during update, retrying", ckey);
						}
						Err(err) => return Err(err),
					}
				}
				None => {
					match self.adapter.create_config(&ckey.key, &ckey.scope, value, actor_id).await {
						Ok(entry) => return Ok((AuditAction::Create, entry)),
						Err(Error::Conflict(_)) => {
							debug!("Config {} created concurrently, retrying as update", ckey);
						}
						Err(err) => return Err(err),
					}
				}
			}
		}

		Err(Error::Conflict(format!("configuration {} changed concurrently", ckey)))
	}

	/// Remove the entry at exactly this scope. Returns `false` if there was none.
	pub async fn delete(&self, key: &str, scope: &Scope, actor_id: &str) -> ClResult<bool> {
		validate(key, scope)?;
		let ckey = ConfigKey::new(key, scope);

		let Some(existing) = self
			.adapter
			.read_config(key, scope)
			.await
			.inspect_err(|err| warn!("Config delete failed for {}: {}", ckey, err))?
		else {
			return Ok(false);
		};

		let deleted = self
			.adapter
			.delete_config(existing.config_id)
			.await
			.inspect_err(|err| warn!("Config delete failed for {}: {}", ckey, err))?;
		self.cache.invalidate(&ckey);
		if !deleted {
			// Someone else removed it between the lookup and the delete
			return Ok(false);
		}

		self.emit(AuditEvent::config(
			AuditAction::Delete,
			actor_id,
			existing.config_id,
			key,
			scope,
			None,
		))
		.await;
		info!("Config {} deleted by {}", ckey, actor_id);

		Ok(true)
	}

	/// Filtered listing, always read from the store
	pub async fn list(&self, opts: &ListConfigOptions) -> ClResult<Vec<ConfigEntry>> {
		self.adapter
			.list_configs(opts)
			.await
			.inspect_err(|err| warn!("Config list failed: {}", err))
	}

	/// Typed read at exactly this scope
	pub async fn get_as<T: DeserializeOwned>(&self, key: &str, scope: &Scope) -> ClResult<Option<T>> {
		self.get(key, scope, true).await?.map(|value| decode(key, value)).transpose()
	}

	/// Typed read through the fallback chain
	pub async fn get_with_fallback_as<T: DeserializeOwned>(
		&self,
		key: &str,
		ids: &ScopeIds,
	) -> ClResult<Option<T>> {
		self.get_with_fallback(key, ids, true).await?.map(|value| decode(key, value)).transpose()
	}

	/// Drop the cached slot for one key/scope
	pub fn invalidate(&self, key: &str, scope: &Scope) -> bool {
		self.cache.invalidate(&ConfigKey::new(key, scope))
	}

	/// Drop every cached slot. Returns how many were dropped.
	pub fn clear_cache(&self) -> usize {
		let cleared = self.cache.clear();
		info!("Config cache cleared ({} slots)", cleared);
		cleared
	}

	async fn emit(&self, event: AuditEvent) {
		// The mutation is already committed; a lost audit record is logged, not fatal
		if let Err(err) = self.audit.record_event(&event).await {
			warn!(
				"Audit event {} for config '{}' (id {}) not recorded: {}",
				event.action.as_str(),
				event.details.key,
				event.entity_id,
				err
			);
		}
	}
}

fn decode<T: DeserializeOwned>(key: &str, value: serde_json::Value) -> ClResult<T> {
	serde_json::from_value(value).map_err(|err| {
		Error::ValidationError(format!("configuration '{}' has unexpected shape: {}", key, err))
	})
}


// vim: ts=4
