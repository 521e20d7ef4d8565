//! Custom extractors for request metadata

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::prelude::*;

pub const ACTOR_HEADER: &str = "x-actor-id";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

// Actor //
//*******//
/// Identifier of the acting user, taken from the `X-Actor-Id` header
#[derive(Debug, Clone)]
pub struct Actor(pub Box<str>);

impl<S> FromRequestParts<S> for Actor
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let actor = parts
			.headers
			.get(ACTOR_HEADER)
			.and_then(|value| value.to_str().ok())
			.map(str::trim)
			.filter(|value| !value.is_empty());

		match actor {
			Some(actor) => Ok(Actor(actor.into())),
			None => {
				debug!("Rejected {} {}: no actor", parts.method, parts.uri.path());
				Err(Error::PermissionDenied)
			}
		}
	}
}

// RequestId //
//***********//
/// Request ID for tracing and debugging
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

/// Optional Request ID extractor - always succeeds, returns None if not available
#[derive(Clone, Debug)]
pub struct OptionalRequestId(pub Option<String>);

impl<S> FromRequestParts<S> for OptionalRequestId
where
	S: Send + Sync,
{
	type Rejection = Error;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let req_id = parts.extensions.get::<RequestId>().map(|r| r.0.clone());
		Ok(OptionalRequestId(req_id))
	}
}

// vim: ts=4
