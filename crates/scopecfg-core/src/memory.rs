//! In-memory adapters
//!
//! Process-local implementations of the store and audit adapters. They keep
//! per-operation call counters so tests can observe how often the resolver
//! reached the store.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use scopecfg_types::audit_adapter::{AuditAdapter, AuditEvent};
use scopecfg_types::config_adapter::{ConfigAdapter, ConfigEntry, ListConfigOptions};

use crate::prelude::*;

#[derive(Debug, Default)]
struct ConfigRows {
	last_id: i64,
	rows: BTreeMap<i64, ConfigEntry>,
}

// InMemoryConfigAdapter
//***********************
#[derive(Debug, Default)]
pub struct InMemoryConfigAdapter {
	state: parking_lot::Mutex<ConfigRows>,
	reads: AtomicUsize,
	writes: AtomicUsize,
}

impl InMemoryConfigAdapter {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// Number of point lookups served
	pub fn read_count(&self) -> usize {
		self.reads.load(Ordering::SeqCst)
	}

	/// Number of create/update/delete calls served
	pub fn write_count(&self) -> usize {
		self.writes.load(Ordering::SeqCst)
	}

	pub fn len(&self) -> usize {
		self.state.lock().rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.state.lock().rows.is_empty()
	}
}

#[async_trait]
impl ConfigAdapter for InMemoryConfigAdapter {
	async fn read_config(&self, key: &str, scope: &Scope) -> ClResult<Option<ConfigEntry>> {
		self.reads.fetch_add(1, Ordering::SeqCst);
		let state = self.state.lock();
		Ok(state.rows.values().find(|e| &*e.key == key && &e.scope == scope).cloned())
	}

	async fn create_config(
		&self,
		key: &str,
		scope: &Scope,
		value: &serde_json::Value,
		actor_id: &str,
	) -> ClResult<ConfigEntry> {
		self.writes.fetch_add(1, Ordering::SeqCst);
		let mut state = self.state.lock();
		if state.rows.values().any(|e| &*e.key == key && &e.scope == scope) {
			return Err(Error::Conflict(format!("configuration exists: {}:{}", scope, key)));
		}

		state.last_id += 1;
		let now = Timestamp::now();
		let entry = ConfigEntry {
			config_id: state.last_id,
			key: key.into(),
			scope: scope.clone(),
			value: value.clone(),
			created_by: actor_id.into(),
			updated_by: actor_id.into(),
			created_at: now,
			updated_at: now,
		};
		state.rows.insert(entry.config_id, entry.clone());
		Ok(entry)
	}

	async fn update_config(
		&self,
		config_id: i64,
		value: &serde_json::Value,
		actor_id: &str,
	) -> ClResult<ConfigEntry> {
		self.writes.fetch_add(1, Ordering::SeqCst);
		let mut state = self.state.lock();
		let entry = state.rows.get_mut(&config_id).ok_or(Error::NotFound)?;
		entry.value = value.clone();
		entry.updated_by = actor_id.into();
		entry.updated_at = entry.updated_at.max(Timestamp::now());
		Ok(entry.clone())
	}

	async fn delete_config(&self, config_id: i64) -> ClResult<bool> {
		self.writes.fetch_add(1, Ordering::SeqCst);
		Ok(self.state.lock().rows.remove(&config_id).is_some())
	}

	async fn list_configs(&self, opts: &ListConfigOptions) -> ClResult<Vec<ConfigEntry>> {
		let state = self.state.lock();
		let mut entries: Vec<ConfigEntry> =
			state.rows.values().filter(|e| opts.matches(e)).cloned().collect();
		entries.sort_by(|a, b| a.key.cmp(&b.key).then(a.config_id.cmp(&b.config_id)));

		Ok(entries
			.into_iter()
			.skip(opts.effective_offset() as usize)
			.take(opts.effective_limit() as usize)
			.collect())
	}
}

// InMemoryAuditAdapter
//**********************
/// Collects audit events in memory
#[derive(Debug, Default)]
pub struct InMemoryAuditAdapter {
	events: parking_lot::Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditAdapter {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn events(&self) -> Vec<AuditEvent> {
		self.events.lock().clone()
	}
}

#[async_trait]
impl AuditAdapter for InMemoryAuditAdapter {
	async fn record_event(&self, event: &AuditEvent) -> ClResult<()> {
		self.events.lock().push(event.clone());
		Ok(())
	}
}

// vim: ts=4
