//! Error type shared by the resolver, the adapters and the HTTP layer

use axum::{Json, http::StatusCode, response::IntoResponse};

pub type ClResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	NotFound,
	PermissionDenied,
	/// Scope/identifier precondition or input shape violated
	ValidationError(String),
	/// Uniqueness constraint hit in the store
	Conflict(String),
	ConfigError(String),
	DbError,

	// externals
	Io(std::io::Error),
}

impl Error {
	/// Stable machine-readable code used in error responses
	pub fn code(&self) -> &'static str {
		match self {
			Error::NotFound => "E-NOTFOUND",
			Error::PermissionDenied => "E-PERM",
			Error::ValidationError(_) => "E-VALIDATION",
			Error::Conflict(_) => "E-CONFLICT",
			Error::ConfigError(_) => "E-CONFIG",
			Error::DbError => "E-DB",
			Error::Io(_) => "E-INTERNAL",
		}
	}

	fn status(&self) -> StatusCode {
		match self {
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::PermissionDenied => StatusCode::FORBIDDEN,
			Error::ValidationError(_) => StatusCode::BAD_REQUEST,
			Error::Conflict(_) => StatusCode::CONFLICT,
			Error::ConfigError(_) | Error::DbError | Error::Io(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		Self::ValidationError(format!("invalid JSON: {}", err))
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::Conflict(msg) => write!(f, "conflict: {}", msg),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::DbError => write!(f, "database error"),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Error::Io(err) => Some(err),
			_ => None,
		}
	}
}

#[derive(serde::Serialize)]
struct ErrorBody {
	code: &'static str,
	message: String,
}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		let status = self.status();
		// Internal details stay in the log, not in the response
		let message = match &self {
			Error::DbError | Error::Io(_) | Error::ConfigError(_) => {
				tracing::warn!("request failed: {}", self);
				"internal server error".to_string()
			}
			_ => self.to_string(),
		};
		(status, Json(ErrorBody { code: self.code(), message })).into_response()
	}
}


// vim: ts=4
