//! Configuration value cache
//!
//! Time-bounded LRU cache in front of the configuration store. Slots are keyed
//! by [`ConfigKey`] and hold the resolved value, including "no value" so that
//! repeated lookups of unset keys do not reach the store.
//!
//! Expiry is lazy: a stale slot is evicted by the read that observes it.
//! There is no background sweep.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::time::Duration;
use tokio::time::Instant;

use crate::prelude::*;

/// Default time-to-live of a cached value
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default maximum number of cached slots
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
	/// No fresh slot; the store must be consulted
	Miss,
	/// Fresh slot. `None` means the store had no value for this key.
	Hit(Option<serde_json::Value>),
}

#[derive(Debug)]
struct CacheEntry {
	value: Option<serde_json::Value>,
	inserted_at: Instant,
}

pub struct ConfigCache {
	entries: parking_lot::RwLock<LruCache<ConfigKey, CacheEntry>>,
	ttl: Duration,
}

impl ConfigCache {
	pub fn new(ttl: Duration, capacity: usize) -> Self {
		let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
		Self { entries: parking_lot::RwLock::new(LruCache::new(capacity)), ttl }
	}

	pub fn ttl(&self) -> Duration {
		self.ttl
	}

	/// Look up a slot, evicting it if it has outlived the TTL
	pub fn get(&self, key: &ConfigKey) -> CacheLookup {
		let mut entries = self.entries.write();

		let expired = match entries.get(key) {
			Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
				return CacheLookup::Hit(entry.value.clone());
			}
			Some(_) => true,
			None => false,
		};

		if expired {
			debug!("Config cache slot expired: {}", key);
			entries.pop(key);
		}
		CacheLookup::Miss
	}

	pub fn put(&self, key: ConfigKey, value: Option<serde_json::Value>) {
		let mut entries = self.entries.write();
		entries.put(key, CacheEntry { value, inserted_at: Instant::now() });
	}

	/// Remove exactly one slot. Returns whether it was present.
	pub fn invalidate(&self, key: &ConfigKey) -> bool {
		self.entries.write().pop(key).is_some()
	}

	/// Remove every slot. Returns how many were removed.
	pub fn clear(&self) -> usize {
		let mut entries = self.entries.write();
		let removed = entries.len();
		entries.clear();
		removed
	}

	/// Number of slots, including stale ones not yet observed
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}
}

impl Default for ConfigCache {
	fn default() -> Self {
		Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
	}
}

impl std::fmt::Debug for ConfigCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ConfigCache").field("ttl", &self.ttl).field("len", &self.len()).finish()
	}
}


// vim: ts=4
