//! Common types used throughout scopecfg.

use serde::Serialize;
use std::time::SystemTime;

// Timestamp //
//***********//
/// Seconds since the Unix epoch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		now()
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for Timestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

pub fn now() -> Timestamp {
	let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
	Timestamp(i64::try_from(res.as_secs()).unwrap_or(i64::MAX))
}

// ApiResponse //
//*************//
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
	pub offset: u32,
	pub limit: u32,
	pub count: usize,
}

/// Envelope for every successful HTTP response
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
	pub data: T,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pagination: Option<Pagination>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub req_id: Option<String>,
}

impl<T> ApiResponse<T> {
	pub fn new(data: T) -> Self {
		Self { data, pagination: None, req_id: None }
	}

	pub fn with_pagination(data: T, offset: u32, limit: u32, count: usize) -> Self {
		Self { data, pagination: Some(Pagination { offset, limit, count }), req_id: None }
	}

	pub fn with_req_id(mut self, req_id: Option<String>) -> Self {
		self.req_id = req_id;
		self
	}
}

// vim: ts=4
