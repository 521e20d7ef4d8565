//! ConfigService behaviour tests
//!
//! Run against the in-memory adapters; store traffic is observed through the
//! adapter call counters.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use scopecfg_core::ConfigCache;
use scopecfg_core::ConfigService;
use scopecfg_core::memory::{InMemoryAuditAdapter, InMemoryConfigAdapter};
use scopecfg_types::audit_adapter::{AuditAction, AuditAdapter, AuditEvent};
use scopecfg_types::config_adapter::{ConfigAdapter, ConfigEntry, IdFilter, ListConfigOptions};
use scopecfg_types::prelude::*;

const TTL: Duration = Duration::from_secs(300);

struct Fixture {
	service: ConfigService,
	store: Arc<InMemoryConfigAdapter>,
	audit: Arc<InMemoryAuditAdapter>,
}

fn setup() -> Fixture {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();

	let store = InMemoryConfigAdapter::new();
	let audit = InMemoryAuditAdapter::new();
	let cache = Arc::new(ConfigCache::new(TTL, 100));
	let service = ConfigService::new(store.clone(), audit.clone(), cache);
	Fixture { service, store, audit }
}

fn user_scope() -> Scope {
	Scope::user("c1", "u1")
}

// Wrappers //
//**********//

/// Fails every lookup at one scope kind, delegates everything else
#[derive(Debug)]
struct FailingScopeAdapter {
	inner: Arc<InMemoryConfigAdapter>,
	failing: ScopeKind,
}

#[async_trait]
impl ConfigAdapter for FailingScopeAdapter {
	async fn read_config(&self, key: &str, scope: &Scope) -> ClResult<Option<ConfigEntry>> {
		if scope.kind() == self.failing {
			return Err(Error::DbError);
		}
		self.inner.read_config(key, scope).await
	}

	async fn create_config(
		&self,
		key: &str,
		scope: &Scope,
		value: &serde_json::Value,
		actor_id: &str,
	) -> ClResult<ConfigEntry> {
		self.inner.create_config(key, scope, value, actor_id).await
	}

	async fn update_config(
		&self,
		config_id: i64,
		value: &serde_json::Value,
		actor_id: &str,
	) -> ClResult<ConfigEntry> {
		self.inner.update_config(config_id, value, actor_id).await
	}

	async fn delete_config(&self, config_id: i64) -> ClResult<bool> {
		self.inner.delete_config(config_id).await
	}

	async fn list_configs(&self, opts: &ListConfigOptions) -> ClResult<Vec<ConfigEntry>> {
		self.inner.list_configs(opts).await
	}
}

/// Hides existing rows from the first lookup, as if another writer created
/// the row between our lookup and our insert
#[derive(Debug)]
struct RacingAdapter {
	inner: Arc<InMemoryConfigAdapter>,
	hidden: AtomicBool,
}

#[async_trait]
impl ConfigAdapter for RacingAdapter {
	async fn read_config(&self, key: &str, scope: &Scope) -> ClResult<Option<ConfigEntry>> {
		if self.hidden.swap(false, Ordering::SeqCst) {
			return Ok(None);
		}
		self.inner.read_config(key, scope).await
	}

	async fn create_config(
		&self,
		key: &str,
		scope: &Scope,
		value: &serde_json::Value,
		actor_id: &str,
	) -> ClResult<ConfigEntry> {
		self.inner.create_config(key, scope, value, actor_id).await
	}

	async fn update_config(
		&self,
		config_id: i64,
		value: &serde_json::Value,
		actor_id: &str,
	) -> ClResult<ConfigEntry> {
		self.inner.update_config(config_id, value, actor_id).await
	}

	async fn delete_config(&self, config_id: i64) -> ClResult<bool> {
		self.inner.delete_config(config_id).await
	}

	async fn list_configs(&self, opts: &ListConfigOptions) -> ClResult<Vec<ConfigEntry>> {
		self.inner.list_configs(opts).await
	}
}

#[derive(Debug)]
struct BrokenAudit;

#[async_trait]
impl AuditAdapter for BrokenAudit {
	async fn record_event(&self, _event: &AuditEvent) -> ClResult<()> {
		Err(Error::DbError)
	}
}

// Preconditions //
//***************//

#[tokio::test]
async fn test_missing_identifiers_fail_before_store() {
	let fx = setup();

	for (kind, company, user, module) in [
		(ScopeKind::Company, None, None, None),
		(ScopeKind::User, Some("c1"), None, None),
		(ScopeKind::User, None, Some("u1"), None),
		(ScopeKind::Module, None, None, None),
	] {
		let res = Scope::from_parts(kind, company, user, module);
		assert!(matches!(res, Err(Error::ValidationError(_))), "{:?} should be rejected", kind);
	}

	let res = fx.service.get("", &Scope::Global, true).await;
	assert!(matches!(res, Err(Error::ValidationError(_))));
	let res = fx.service.set("", json!(1), &Scope::Global, "actor1").await;
	assert!(matches!(res, Err(Error::ValidationError(_))));
	let res = fx.service.delete("", &Scope::Global, "actor1").await;
	assert!(matches!(res, Err(Error::ValidationError(_))));

	assert_eq!(fx.store.read_count(), 0);
	assert_eq!(fx.store.write_count(), 0);
}

#[tokio::test]
async fn test_empty_identifiers_fail_before_store() {
	let fx = setup();

	for scope in [Scope::company(""), Scope::user("c1", ""), Scope::user("", "u1"), Scope::module("")] {
		let res = fx.service.set("theme", json!("dark"), &scope, "actor1").await;
		assert!(matches!(res, Err(Error::ValidationError(_))), "{} should be rejected", scope);
		let res = fx.service.get("theme", &scope, true).await;
		assert!(matches!(res, Err(Error::ValidationError(_))));
		let res = fx.service.delete("theme", &scope, "actor1").await;
		assert!(matches!(res, Err(Error::ValidationError(_))));
	}

	assert_eq!(fx.store.read_count(), 0);
	assert_eq!(fx.store.write_count(), 0);
	assert!(fx.service.cache().is_empty());
	assert!(fx.audit.events().is_empty());
}

#[tokio::test]
async fn test_key_with_slash_is_rejected() {
	let fx = setup();
	let res = fx.service.set("ui/theme", json!("dark"), &Scope::Global, "actor1").await;
	assert!(matches!(res, Err(Error::ValidationError(_))));
	assert_eq!(fx.store.write_count(), 0);
}

#[tokio::test]
async fn test_set_null_is_rejected() {
	let fx = setup();
	let res = fx.service.set("theme", serde_json::Value::Null, &Scope::Global, "actor1").await;
	assert!(matches!(res, Err(Error::ValidationError(_))));
	assert_eq!(fx.store.write_count(), 0);
}

// Round trips //
//*************//

#[tokio::test]
async fn test_theme_round_trip() {
	let fx = setup();

	fx.service.set("theme", json!({"color": "dark"}), &user_scope(), "actor1").await.unwrap();

	assert_eq!(
		fx.service.get("theme", &user_scope(), true).await.unwrap(),
		Some(json!({"color": "dark"}))
	);
	assert_eq!(
		fx.service.get("theme", &user_scope(), false).await.unwrap(),
		Some(json!({"color": "dark"}))
	);
}

#[tokio::test]
async fn test_user_value_does_not_leak_to_company_scope() {
	let fx = setup();

	fx.service.set("theme", json!({"color": "dark"}), &user_scope(), "actor1").await.unwrap();

	assert_eq!(fx.service.get("theme", &Scope::company("c1"), true).await.unwrap(), None);
}

#[tokio::test]
async fn test_set_updates_in_place() {
	let fx = setup();

	let first = fx.service.set("invoice.series", json!("FCT"), &Scope::company("c1"), "a1").await.unwrap();
	let second =
		fx.service.set("invoice.series", json!("INV"), &Scope::company("c1"), "a2").await.unwrap();

	assert_eq!(first.config_id, second.config_id);
	assert_eq!(&*second.created_by, "a1");
	assert_eq!(&*second.updated_by, "a2");
	assert!(second.updated_at >= first.updated_at);
	assert_eq!(fx.store.len(), 1);

	let events = fx.audit.events();
	assert_eq!(events.len(), 2);
	assert_eq!(events[0].action, AuditAction::Create);
	assert_eq!(events[1].action, AuditAction::Update);
	assert_eq!(events[1].details.value_type, Some("string"));
	assert_eq!(events[1].company_id.as_deref(), Some("c1"));
	assert_eq!(&*events[1].actor_id, "a2");
}

#[tokio::test]
async fn test_delete_twice() {
	let fx = setup();

	fx.service.set("theme", json!("dark"), &Scope::Global, "actor1").await.unwrap();

	assert!(fx.service.delete("theme", &Scope::Global, "actor1").await.unwrap());
	assert!(!fx.service.delete("theme", &Scope::Global, "actor1").await.unwrap());
	assert_eq!(fx.service.get("theme", &Scope::Global, true).await.unwrap(), None);

	let events = fx.audit.events();
	assert_eq!(events.len(), 2);
	assert_eq!(events[1].action, AuditAction::Delete);
	assert_eq!(events[1].details.value_type, None);
}

// Cache //
//*******//

#[tokio::test]
async fn test_cache_never_serves_overwritten_value() {
	let fx = setup();
	let scope = Scope::company("c1");

	fx.service.set("vat.rate", json!(19), &scope, "actor1").await.unwrap();
	assert_eq!(fx.service.get("vat.rate", &scope, true).await.unwrap(), Some(json!(19)));

	fx.service.set("vat.rate", json!(21), &scope, "actor1").await.unwrap();
	assert_eq!(fx.service.get("vat.rate", &scope, true).await.unwrap(), Some(json!(21)));
}

#[tokio::test]
async fn test_cache_hit_skips_store() {
	let fx = setup();

	fx.service.set("theme", json!("dark"), &Scope::Global, "actor1").await.unwrap();
	let reads = fx.store.read_count();

	for _ in 0..5 {
		fx.service.get("theme", &Scope::Global, true).await.unwrap();
	}
	assert_eq!(fx.store.read_count(), reads + 1);

	// Absence is cached as well
	for _ in 0..5 {
		assert_eq!(fx.service.get("missing", &Scope::Global, true).await.unwrap(), None);
	}
	assert_eq!(fx.store.read_count(), reads + 2);
}

#[tokio::test]
async fn test_uncached_reads_bypass_cache() {
	let fx = setup();

	fx.service.set("theme", json!("dark"), &Scope::Global, "actor1").await.unwrap();
	let reads = fx.store.read_count();

	fx.service.get("theme", &Scope::Global, false).await.unwrap();
	fx.service.get("theme", &Scope::Global, false).await.unwrap();
	assert_eq!(fx.store.read_count(), reads + 2);
	assert!(fx.service.cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_ttl_expiry_refetches_once_per_window() {
	let fx = setup();

	fx.service.set("theme", json!("dark"), &Scope::Global, "actor1").await.unwrap();
	let reads = fx.store.read_count();

	for _ in 0..3 {
		fx.service.get("theme", &Scope::Global, true).await.unwrap();
	}
	assert_eq!(fx.store.read_count(), reads + 1);

	tokio::time::advance(TTL).await;
	for _ in 0..3 {
		assert_eq!(fx.service.get("theme", &Scope::Global, true).await.unwrap(), Some(json!("dark")));
	}
	assert_eq!(fx.store.read_count(), reads + 2);

	tokio::time::advance(TTL + Duration::from_secs(1)).await;
	fx.service.get("theme", &Scope::Global, true).await.unwrap();
	assert_eq!(fx.store.read_count(), reads + 3);
}

#[tokio::test]
async fn test_invalidate_and_clear() {
	let fx = setup();

	fx.service.set("a", json!(1), &Scope::Global, "actor1").await.unwrap();
	fx.service.set("b", json!(2), &Scope::Global, "actor1").await.unwrap();
	fx.service.get("a", &Scope::Global, true).await.unwrap();
	fx.service.get("b", &Scope::Global, true).await.unwrap();
	assert_eq!(fx.service.cache().len(), 2);

	assert!(fx.service.invalidate("a", &Scope::Global));
	assert_eq!(fx.service.cache().len(), 1);

	assert_eq!(fx.service.clear_cache(), 1);
	assert!(fx.service.cache().is_empty());
}

// Fallback //
//**********//

#[tokio::test]
async fn test_fallback_prefers_user_over_global() {
	let fx = setup();

	fx.service.set("theme", json!("user"), &user_scope(), "actor1").await.unwrap();
	fx.service.set("theme", json!("global"), &Scope::Global, "actor1").await.unwrap();

	let ids = ScopeIds::new().user("u1").company("c1");
	assert_eq!(fx.service.get_with_fallback("theme", &ids, true).await.unwrap(), Some(json!("user")));
}

#[tokio::test]
async fn test_fallback_precedence_order() {
	let fx = setup();

	fx.service.set("k", json!("company"), &Scope::company("c1"), "a").await.unwrap();
	fx.service.set("k", json!("module"), &Scope::module("sales"), "a").await.unwrap();
	fx.service.set("k", json!("global"), &Scope::Global, "a").await.unwrap();

	let ids = ScopeIds::new().user("u1").company("c1").module("sales");
	assert_eq!(fx.service.get_with_fallback("k", &ids, true).await.unwrap(), Some(json!("company")));

	let ids = ScopeIds::new().module("sales");
	assert_eq!(fx.service.get_with_fallback("k", &ids, true).await.unwrap(), Some(json!("module")));

	// A user id without a company id never reaches USER or COMPANY scope
	let ids = ScopeIds::new().user("u1");
	assert_eq!(fx.service.get_with_fallback("k", &ids, true).await.unwrap(), Some(json!("global")));
}

#[tokio::test]
async fn test_fallback_reaches_global_without_identifiers() {
	let fx = setup();

	fx.service.set("currency", json!("RON"), &Scope::Global, "actor1").await.unwrap();

	assert_eq!(
		fx.service.get_with_fallback("currency", &ScopeIds::new(), true).await.unwrap(),
		Some(json!("RON"))
	);
	assert_eq!(fx.service.get_with_fallback("other", &ScopeIds::new(), true).await.unwrap(), None);
}

#[tokio::test]
async fn test_fallback_continues_past_store_failure() {
	let store = InMemoryConfigAdapter::new();
	let adapter = Arc::new(FailingScopeAdapter { inner: store.clone(), failing: ScopeKind::User });
	let service =
		ConfigService::new(adapter, InMemoryAuditAdapter::new(), Arc::new(ConfigCache::default()));

	service.set("theme", json!("company"), &Scope::company("c1"), "actor1").await.unwrap();

	let ids = ScopeIds::new().user("u1").company("c1");
	assert_eq!(service.get_with_fallback("theme", &ids, true).await.unwrap(), Some(json!("company")));

	// Nothing found anywhere: the USER failure is surfaced instead of a silent None
	let res = service.get_with_fallback("unset", &ids, true).await;
	assert!(matches!(res, Err(Error::DbError)));

	// Exact reads at the failing scope propagate the error
	let res = service.get("theme", &Scope::user("c1", "u1"), true).await;
	assert!(matches!(res, Err(Error::DbError)));
}

#[tokio::test]
async fn test_typed_reads() {
	let fx = setup();

	fx.service.set("invoice.next_number", json!(1042), &Scope::company("c1"), "a").await.unwrap();
	fx.service.set("invoice.prefix", json!("FCT"), &Scope::Global, "a").await.unwrap();

	let next: Option<u64> = fx.service.get_as("invoice.next_number", &Scope::company("c1")).await.unwrap();
	assert_eq!(next, Some(1042));

	let ids = ScopeIds::new().company("c1");
	let prefix: Option<String> = fx.service.get_with_fallback_as("invoice.prefix", &ids).await.unwrap();
	assert_eq!(prefix.as_deref(), Some("FCT"));

	let res: ClResult<Option<bool>> = fx.service.get_as("invoice.prefix", &Scope::Global).await;
	assert!(matches!(res, Err(Error::ValidationError(_))));
}

// Races and sinks //
//*****************//

#[tokio::test]
async fn test_concurrent_create_retried_as_update() {
	let store = InMemoryConfigAdapter::new();
	let audit = InMemoryAuditAdapter::new();
	store.create_config("theme", &Scope::Global, &json!("old"), "other").await.unwrap();

	let adapter = Arc::new(RacingAdapter { inner: store.clone(), hidden: AtomicBool::new(true) });
	let service = ConfigService::new(adapter, audit.clone(), Arc::new(ConfigCache::default()));

	let entry = service.set("theme", json!("new"), &Scope::Global, "actor1").await.unwrap();
	assert_eq!(entry.value, json!("new"));
	assert_eq!(store.len(), 1);
	assert_eq!(audit.events()[0].action, AuditAction::Update);
}

#[tokio::test]
async fn test_audit_failure_does_not_fail_mutation() {
	let store = InMemoryConfigAdapter::new();
	let service = ConfigService::new(store.clone(), Arc::new(BrokenAudit), Arc::new(ConfigCache::default()));

	service.set("theme", json!("dark"), &Scope::Global, "actor1").await.unwrap();
	assert!(service.delete("theme", &Scope::Global, "actor1").await.unwrap());
	assert!(store.is_empty());
}

// Listing //
//*********//

#[tokio::test]
async fn test_list_filters_and_pagination() {
	let fx = setup();

	fx.service.set("ui.theme", json!("dark"), &user_scope(), "a").await.unwrap();
	fx.service.set("ui.lang", json!("ro"), &Scope::company("c1"), "a").await.unwrap();
	fx.service.set("ui.density", json!("compact"), &Scope::Global, "a").await.unwrap();
	fx.service.set("vat.rate", json!(19), &Scope::Global, "a").await.unwrap();
	fx.service.set("hr.payday", json!(10), &Scope::module("hr"), "a").await.unwrap();

	let all = fx.service.list(&ListConfigOptions::default()).await.unwrap();
	let keys: Vec<&str> = all.iter().map(|e| &*e.key).collect();
	assert_eq!(keys, vec!["hr.payday", "ui.density", "ui.lang", "ui.theme", "vat.rate"]);

	let opts = ListConfigOptions { key_prefix: Some("ui.".into()), ..Default::default() };
	assert_eq!(fx.service.list(&opts).await.unwrap().len(), 3);

	let opts = ListConfigOptions { company_id: IdFilter::Null, ..Default::default() };
	let keys: Vec<String> =
		fx.service.list(&opts).await.unwrap().iter().map(|e| e.key.to_string()).collect();
	assert_eq!(keys, vec!["hr.payday", "ui.density", "vat.rate"]);

	let opts = ListConfigOptions { company_id: IdFilter::Eq("c1".into()), ..Default::default() };
	assert_eq!(fx.service.list(&opts).await.unwrap().len(), 2);

	let opts = ListConfigOptions { scope: Some(ScopeKind::Module), ..Default::default() };
	assert_eq!(fx.service.list(&opts).await.unwrap()[0].scope, Scope::module("hr"));

	let opts = ListConfigOptions { limit: Some(2), offset: Some(2), ..Default::default() };
	let page: Vec<String> =
		fx.service.list(&opts).await.unwrap().iter().map(|e| e.key.to_string()).collect();
	assert_eq!(page, vec!["ui.lang", "ui.theme"]);

	// Listing never touches point lookups or the cache
	let reads = fx.store.read_count();
	fx.service.list(&ListConfigOptions::default()).await.unwrap();
	assert_eq!(fx.store.read_count(), reads);
	assert!(fx.service.cache().is_empty());
}

// vim: ts=4
