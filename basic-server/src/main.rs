use std::{env, path, sync::Arc, time::Duration};

use scopecfg::prelude::*;
use scopecfg_config_adapter_sqlite::ConfigAdapterSqlite;

pub struct Config {
	pub listen: String,
	pub db_dir: path::PathBuf,
	pub cache_ttl: Option<Duration>,
	pub cache_capacity: Option<usize>,
}

fn env_number<T: std::str::FromStr>(name: &str) -> ClResult<Option<T>> {
	match env::var(name) {
		Ok(value) => value
			.trim()
			.parse()
			.map(Some)
			.map_err(|_| Error::ConfigError(format!("{} must be a number, got '{}'", name, value))),
		Err(_) => Ok(None),
	}
}

impl Config {
	fn from_env() -> ClResult<Self> {
		Ok(Config {
			listen: env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
			db_dir: path::PathBuf::from(env::var("DB_DIR").unwrap_or_else(|_| "./data".to_string())),
			cache_ttl: env_number::<u64>("CONFIG_CACHE_TTL_SECS")?.map(Duration::from_secs),
			cache_capacity: env_number("CONFIG_CACHE_CAPACITY")?,
		})
	}
}

#[tokio::main]
async fn main() -> ClResult<()> {
	let mut builder = scopecfg::AppBuilder::new();
	let config = Config::from_env().inspect_err(|err| error!("FATAL: {}", err))?;

	let adapter = Arc::new(ConfigAdapterSqlite::new(&config.db_dir).await?);

	builder.listen(config.listen).config_adapter(adapter.clone()).audit_adapter(adapter);
	if let Some(ttl) = config.cache_ttl {
		builder.cache_ttl(ttl);
	}
	if let Some(capacity) = config.cache_capacity {
		builder.cache_capacity(capacity);
	}

	builder.run().await
}

// vim: ts=4
