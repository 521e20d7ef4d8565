//! Configuration scope model
//!
//! A configuration entry applies at exactly one scope. Each scope carries the
//! identifiers it needs and nothing else, so an entry with a company scope but
//! no company id cannot be constructed. Untyped input (query strings, JSON
//! bodies) goes through [`Scope::from_parts`], which is the only place the
//! identifier rules are checked at runtime.

use serde::{Deserialize, Serialize, ser::SerializeStruct};
use std::fmt;
use std::str::FromStr;

use crate::error::{ClResult, Error};

/// Rendering of an absent identifier in composite keys
pub const NULL_SENTINEL: &str = "null";

// ScopeKind //
//***********//
/// Field-less scope discriminant, as stored and as seen on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScopeKind {
	Global,
	Company,
	User,
	Module,
}

impl ScopeKind {
	pub fn as_str(self) -> &'static str {
		match self {
			ScopeKind::Global => "GLOBAL",
			ScopeKind::Company => "COMPANY",
			ScopeKind::User => "USER",
			ScopeKind::Module => "MODULE",
		}
	}
}

impl fmt::Display for ScopeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for ScopeKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_uppercase().as_str() {
			"GLOBAL" => Ok(ScopeKind::Global),
			"COMPANY" => Ok(ScopeKind::Company),
			"USER" => Ok(ScopeKind::User),
			"MODULE" => Ok(ScopeKind::Module),
			_ => Err(Error::ValidationError(format!("unknown scope: {}", s))),
		}
	}
}

// Scope //
//*******//
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
	/// System-wide default
	Global,
	/// Per-tenant value
	Company { company_id: Box<str> },
	/// Per-user value inside a tenant
	User { company_id: Box<str>, user_id: Box<str> },
	/// Module default, independent of tenant
	Module { module_id: Box<str> },
}

fn present(id: Option<&str>) -> Option<&str> {
	id.filter(|s| !s.is_empty())
}

fn required<'a>(kind: ScopeKind, name: &str, id: Option<&'a str>) -> ClResult<&'a str> {
	present(id)
		.ok_or_else(|| Error::ValidationError(format!("{} is required for {} scope", name, kind)))
}

fn forbidden(kind: ScopeKind, name: &str, id: Option<&str>) -> ClResult<()> {
	match present(id) {
		Some(_) => {
			Err(Error::ValidationError(format!("{} is not allowed for {} scope", name, kind)))
		}
		None => Ok(()),
	}
}

impl Scope {
	pub fn company(company_id: impl Into<Box<str>>) -> Scope {
		Scope::Company { company_id: company_id.into() }
	}

	pub fn user(company_id: impl Into<Box<str>>, user_id: impl Into<Box<str>>) -> Scope {
		Scope::User { company_id: company_id.into(), user_id: user_id.into() }
	}

	pub fn module(module_id: impl Into<Box<str>>) -> Scope {
		Scope::Module { module_id: module_id.into() }
	}

	/// Build a scope from a discriminant and loose identifiers.
	///
	/// Empty strings count as absent. Every identifier the scope requires must
	/// be present and every other identifier must be absent.
	pub fn from_parts(
		kind: ScopeKind,
		company_id: Option<&str>,
		user_id: Option<&str>,
		module_id: Option<&str>,
	) -> ClResult<Scope> {
		match kind {
			ScopeKind::Global => {
				forbidden(kind, "companyId", company_id)?;
				forbidden(kind, "userId", user_id)?;
				forbidden(kind, "moduleId", module_id)?;
				Ok(Scope::Global)
			}
			ScopeKind::Company => {
				let company_id = required(kind, "companyId", company_id)?;
				forbidden(kind, "userId", user_id)?;
				forbidden(kind, "moduleId", module_id)?;
				Ok(Scope::company(company_id))
			}
			ScopeKind::User => {
				let company_id = required(kind, "companyId", company_id)?;
				let user_id = required(kind, "userId", user_id)?;
				forbidden(kind, "moduleId", module_id)?;
				Ok(Scope::user(company_id, user_id))
			}
			ScopeKind::Module => {
				let module_id = required(kind, "moduleId", module_id)?;
				forbidden(kind, "companyId", company_id)?;
				forbidden(kind, "userId", user_id)?;
				Ok(Scope::module(module_id))
			}
		}
	}

	pub fn kind(&self) -> ScopeKind {
		match self {
			Scope::Global => ScopeKind::Global,
			Scope::Company { .. } => ScopeKind::Company,
			Scope::User { .. } => ScopeKind::User,
			Scope::Module { .. } => ScopeKind::Module,
		}
	}

	pub fn company_id(&self) -> Option<&str> {
		match self {
			Scope::Company { company_id } | Scope::User { company_id, .. } => Some(&**company_id),
			Scope::Global | Scope::Module { .. } => None,
		}
	}

	pub fn user_id(&self) -> Option<&str> {
		match self {
			Scope::User { user_id, .. } => Some(&**user_id),
			_ => None,
		}
	}

	pub fn module_id(&self) -> Option<&str> {
		match self {
			Scope::Module { module_id } => Some(&**module_id),
			_ => None,
		}
	}

	/// Check that every identifier the scope requires is non-empty.
	///
	/// The plain constructors accept any string, so stores are only reached
	/// with a validated scope.
	pub fn validate(&self) -> ClResult<()> {
		Scope::from_parts(self.kind(), self.company_id(), self.user_id(), self.module_id()).map(drop)
	}
}

impl fmt::Display for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{}:{}:{}:{}",
			self.kind(),
			self.company_id().unwrap_or(NULL_SENTINEL),
			self.user_id().unwrap_or(NULL_SENTINEL),
			self.module_id().unwrap_or(NULL_SENTINEL)
		)
	}
}

/// Serializes as `{scope, companyId, userId, moduleId}` with nulls for unused ids
impl Serialize for Scope {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		let mut s = serializer.serialize_struct("Scope", 4)?;
		s.serialize_field("scope", &self.kind())?;
		s.serialize_field("companyId", &self.company_id())?;
		s.serialize_field("userId", &self.user_id())?;
		s.serialize_field("moduleId", &self.module_id())?;
		s.end()
	}
}

// ScopeIds //
//**********//
/// Identifiers known about a caller, used to build the fallback chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeIds {
	pub company_id: Option<Box<str>>,
	pub user_id: Option<Box<str>>,
	pub module_id: Option<Box<str>>,
}

impl ScopeIds {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn company(mut self, company_id: impl Into<Box<str>>) -> Self {
		self.company_id = Some(company_id.into());
		self
	}

	pub fn user(mut self, user_id: impl Into<Box<str>>) -> Self {
		self.user_id = Some(user_id.into());
		self
	}

	pub fn module(mut self, module_id: impl Into<Box<str>>) -> Self {
		self.module_id = Some(module_id.into());
		self
	}

	/// Scopes to consult, most specific first: USER, COMPANY, MODULE, GLOBAL.
	///
	/// A scope is only included when all of its identifiers are known. GLOBAL
	/// is always last.
	pub fn fallback_chain(&self) -> Vec<Scope> {
		let company_id = present(self.company_id.as_deref());
		let user_id = present(self.user_id.as_deref());
		let module_id = present(self.module_id.as_deref());

		let mut chain = Vec::with_capacity(4);
		if let (Some(company_id), Some(user_id)) = (company_id, user_id) {
			chain.push(Scope::user(company_id, user_id));
		}
		if let Some(company_id) = company_id {
			chain.push(Scope::company(company_id));
		}
		if let Some(module_id) = module_id {
			chain.push(Scope::module(module_id));
		}
		chain.push(Scope::Global);
		chain
	}
}

// ConfigKey //
//***********//
/// Composite address of one configuration slot (cache slot or store row)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigKey {
	pub scope: Scope,
	pub key: Box<str>,
}

impl ConfigKey {
	pub fn new(key: &str, scope: &Scope) -> Self {
		Self { scope: scope.clone(), key: key.into() }
	}
}

/// Renders as `scope:companyId:userId:moduleId:key`
impl fmt::Display for ConfigKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.scope, self.key)
	}
}


// vim: ts=4
