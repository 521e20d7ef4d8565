//! Configuration management handlers

use axum::{
	Json,
	extract::{Path, Query, State},
	http::StatusCode,
};
use serde::{Deserialize, Serialize};

use scopecfg_types::config_adapter::{ConfigEntry, ListConfigOptions};
use scopecfg_types::types::ApiResponse;

use crate::app::VERSION;
use crate::extract::{Actor, OptionalRequestId};
use crate::prelude::*;

/// Scope selection from query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeQuery {
	pub scope: Option<String>,
	pub company_id: Option<String>,
	pub user_id: Option<String>,
	pub module_id: Option<String>,
	pub use_cache: Option<bool>,
}

fn parse_scope(
	scope: Option<&str>,
	company_id: Option<&str>,
	user_id: Option<&str>,
	module_id: Option<&str>,
) -> ClResult<Scope> {
	let kind = scope
		.filter(|scope| !scope.is_empty())
		.ok_or_else(|| Error::ValidationError("scope is required".into()))?
		.parse()?;
	Scope::from_parts(kind, company_id, user_id, module_id)
}

impl ScopeQuery {
	fn to_scope(&self) -> ClResult<Scope> {
		parse_scope(
			self.scope.as_deref(),
			self.company_id.as_deref(),
			self.user_id.as_deref(),
			self.module_id.as_deref(),
		)
	}
}

/// A value together with the scope it was read from
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValueResponse {
	pub key: String,
	#[serde(flatten)]
	pub scope: Scope,
	pub value: serde_json::Value,
}

/// GET /api/config - List configuration entries
pub async fn list_configs(
	State(app): State<App>,
	OptionalRequestId(req_id): OptionalRequestId,
	Query(opts): Query<ListConfigOptions>,
) -> ClResult<(StatusCode, Json<ApiResponse<Vec<ConfigEntry>>>)> {
	let entries = app.service.list(&opts).await?;

	let count = entries.len();
	let response =
		ApiResponse::with_pagination(entries, opts.effective_offset(), opts.effective_limit(), count)
			.with_req_id(req_id);

	Ok((StatusCode::OK, Json(response)))
}

/// GET /api/config/{key} - Read the value stored at exactly one scope
pub async fn get_config(
	State(app): State<App>,
	Path(key): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
	Query(query): Query<ScopeQuery>,
) -> ClResult<(StatusCode, Json<ApiResponse<ConfigValueResponse>>)> {
	let scope = query.to_scope()?;
	let value = app
		.service
		.get(&key, &scope, query.use_cache.unwrap_or(true))
		.await?
		.ok_or(Error::NotFound)?;

	let response = ApiResponse::new(ConfigValueResponse { key, scope, value }).with_req_id(req_id);

	Ok((StatusCode::OK, Json(response)))
}

/// Identifiers known to the caller, for fallback resolution
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQuery {
	pub company_id: Option<String>,
	pub user_id: Option<String>,
	pub module_id: Option<String>,
	pub use_cache: Option<bool>,
}

impl ResolveQuery {
	fn to_ids(&self) -> ScopeIds {
		let mut ids = ScopeIds::new();
		if let Some(company_id) = self.company_id.as_deref().filter(|id| !id.is_empty()) {
			ids = ids.company(company_id);
		}
		if let Some(user_id) = self.user_id.as_deref().filter(|id| !id.is_empty()) {
			ids = ids.user(user_id);
		}
		if let Some(module_id) = self.module_id.as_deref().filter(|id| !id.is_empty()) {
			ids = ids.module(module_id);
		}
		ids
	}
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedValueResponse {
	pub key: String,
	pub value: serde_json::Value,
}

/// GET /api/config/{key}/resolve - Resolve a value through the scope fallback chain
pub async fn resolve_config(
	State(app): State<App>,
	Path(key): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
	Query(query): Query<ResolveQuery>,
) -> ClResult<(StatusCode, Json<ApiResponse<ResolvedValueResponse>>)> {
	let value = app
		.service
		.get_with_fallback(&key, &query.to_ids(), query.use_cache.unwrap_or(true))
		.await?
		.ok_or(Error::NotFound)?;

	let response = ApiResponse::new(ResolvedValueResponse { key, value }).with_req_id(req_id);

	Ok((StatusCode::OK, Json(response)))
}

/// PUT /api/config/{key} - Create or update a value at one scope
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetConfigRequest {
	pub scope: String,
	pub company_id: Option<String>,
	pub user_id: Option<String>,
	pub module_id: Option<String>,
	#[serde(default)]
	pub value: serde_json::Value,
}

pub async fn put_config(
	State(app): State<App>,
	Actor(actor): Actor,
	Path(key): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
	Json(req): Json<SetConfigRequest>,
) -> ClResult<(StatusCode, Json<ApiResponse<ConfigEntry>>)> {
	let scope = parse_scope(
		Some(&req.scope),
		req.company_id.as_deref(),
		req.user_id.as_deref(),
		req.module_id.as_deref(),
	)?;

	let entry = app.service.set(&key, req.value, &scope, &actor).await?;

	Ok((StatusCode::OK, Json(ApiResponse::new(entry).with_req_id(req_id))))
}

#[derive(Debug, Serialize)]
pub struct DeleteConfigResponse {
	pub deleted: bool,
}

/// DELETE /api/config/{key} - Remove the value at one scope
pub async fn delete_config(
	State(app): State<App>,
	Actor(actor): Actor,
	Path(key): Path<String>,
	OptionalRequestId(req_id): OptionalRequestId,
	Query(query): Query<ScopeQuery>,
) -> ClResult<(StatusCode, Json<ApiResponse<DeleteConfigResponse>>)> {
	let scope = query.to_scope()?;
	let deleted = app.service.delete(&key, &scope, &actor).await?;

	Ok((StatusCode::OK, Json(ApiResponse::new(DeleteConfigResponse { deleted }).with_req_id(req_id))))
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
	pub cleared: usize,
}

/// POST /api/config/cache/clear - Drop every cached value
pub async fn clear_cache(
	State(app): State<App>,
	Actor(actor): Actor,
	OptionalRequestId(req_id): OptionalRequestId,
) -> ClResult<(StatusCode, Json<ApiResponse<ClearCacheResponse>>)> {
	let cleared = app.service.clear_cache();
	info!("Config cache cleared by {}", actor);

	Ok((StatusCode::OK, Json(ApiResponse::new(ClearCacheResponse { cleared }).with_req_id(req_id))))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
	pub status: &'static str,
	pub version: &'static str,
}

/// GET /health - Liveness probe
pub async fn health() -> Json<HealthResponse> {
	Json(HealthResponse { status: "ok", version: VERSION })
}


// vim: ts=4
