use axum::{
	Router,
	extract::Request,
	middleware::{self, Next},
	response::Response,
	routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::extract::{REQUEST_ID_HEADER, RequestId};
use crate::handler;
use crate::prelude::*;

/// Copy an incoming `X-Request-Id` into the request extensions
async fn request_id(mut req: Request, next: Next) -> Response {
	let req_id = req
		.headers()
		.get(REQUEST_ID_HEADER)
		.and_then(|value| value.to_str().ok())
		.filter(|value| !value.is_empty())
		.map(str::to_owned);
	if let Some(req_id) = req_id {
		req.extensions_mut().insert(RequestId(req_id));
	}
	next.run(req).await
}

pub fn init(app: App) -> Router {
	Router::new()
		.route("/api/config", get(handler::list_configs))
		.route("/api/config/cache/clear", post(handler::clear_cache))
		.route(
			"/api/config/{key}",
			get(handler::get_config).put(handler::put_config).delete(handler::delete_config),
		)
		.route("/api/config/{key}/resolve", get(handler::resolve_config))
		.route("/health", get(handler::health))
		.layer(middleware::from_fn(request_id))
		.layer(TraceLayer::new_for_http())
		.with_state(app)
}

// vim: ts=4
