//! App builder - constructs and runs the configuration service

use std::sync::Arc;
use std::time::Duration;

use scopecfg_core::ConfigService;
use scopecfg_core::cache::{ConfigCache, DEFAULT_CAPACITY, DEFAULT_TTL};
use scopecfg_types::audit_adapter::AuditAdapter;
use scopecfg_types::config_adapter::ConfigAdapter;

use crate::prelude::*;
use crate::routes;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone)]
pub struct AppBuilderOpts {
	pub listen: Box<str>,
	pub cache_ttl: Duration,
	pub cache_capacity: usize,
}

#[derive(Debug, Default)]
pub struct Adapters {
	pub config_adapter: Option<Arc<dyn ConfigAdapter>>,
	pub audit_adapter: Option<Arc<dyn AuditAdapter>>,
}

#[derive(Debug)]
pub struct AppState {
	pub service: ConfigService,
	pub opts: AppBuilderOpts,
}

pub type App = Arc<AppState>;

pub struct AppBuilder {
	opts: AppBuilderOpts,
	adapters: Adapters,
}

impl AppBuilder {
	pub fn new() -> Self {
		// Tests build several apps in one process, so a second init is not an error
		let _ = tracing_subscriber::fmt()
			.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
			.with_target(false)
			.try_init();
		AppBuilder {
			opts: AppBuilderOpts {
				listen: "127.0.0.1:8080".into(),
				cache_ttl: DEFAULT_TTL,
				cache_capacity: DEFAULT_CAPACITY,
			},
			adapters: Adapters::default(),
		}
	}

	// Opts
	pub fn listen(&mut self, listen: impl Into<Box<str>>) -> &mut Self {
		self.opts.listen = listen.into();
		self
	}
	pub fn cache_ttl(&mut self, ttl: Duration) -> &mut Self {
		self.opts.cache_ttl = ttl;
		self
	}
	pub fn cache_capacity(&mut self, capacity: usize) -> &mut Self {
		self.opts.cache_capacity = capacity;
		self
	}

	// Adapters
	pub fn config_adapter(&mut self, config_adapter: Arc<dyn ConfigAdapter>) -> &mut Self {
		self.adapters.config_adapter = Some(config_adapter);
		self
	}
	pub fn audit_adapter(&mut self, audit_adapter: Arc<dyn AuditAdapter>) -> &mut Self {
		self.adapters.audit_adapter = Some(audit_adapter);
		self
	}

	/// Wire the adapters into a resolver and return the shared state
	pub fn build(self) -> ClResult<App> {
		let Some(config_adapter) = self.adapters.config_adapter else {
			error!("FATAL: No config adapter configured");
			return Err(Error::ConfigError("No config adapter configured".into()));
		};
		let Some(audit_adapter) = self.adapters.audit_adapter else {
			error!("FATAL: No audit adapter configured");
			return Err(Error::ConfigError("No audit adapter configured".into()));
		};
		if self.opts.cache_capacity == 0 {
			return Err(Error::ConfigError("cache capacity must be at least 1".into()));
		}

		let cache = Arc::new(ConfigCache::new(self.opts.cache_ttl, self.opts.cache_capacity));
		let service = ConfigService::new(config_adapter, audit_adapter, cache);

		Ok(Arc::new(AppState { service, opts: self.opts }))
	}

	pub async fn run(self) -> ClResult<()> {
		info!("scopecfg V{}", VERSION);

		let app = self.build()?;
		info!(
			"Config cache: ttl {}s, capacity {}",
			app.service.cache().ttl().as_secs(),
			app.opts.cache_capacity
		);

		let listener = tokio::net::TcpListener::bind(&*app.opts.listen)
			.await
			.inspect_err(|err| error!("FATAL: cannot listen on {}: {}", app.opts.listen, err))?;
		info!("Listening on {}", app.opts.listen);

		let router = routes::init(app);
		axum::serve(listener, router).await?;

		Ok(())
	}
}

impl Default for AppBuilder {
	fn default() -> Self {
		Self::new()
	}
}

// vim: ts=4
