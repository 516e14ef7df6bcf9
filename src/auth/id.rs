//! Strongly typed identifiers of the console domain.
//!
//! Two families exist: opaque text identifiers (subjects, OAuth client ids) and the numeric
//! primary keys the identity service assigns to platforms, users, roles, and permissions.

// std
use std::{borrow::Borrow, num::NonZeroU64, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;

macro_rules! def_id {
	(text $name:ident, $kind:literal, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates and wraps `value`.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				Self::try_from(value.as_ref().to_owned())
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_text($kind, &value).map(|()| Self(value))
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
		def_id!(@fmt $name, $kind);
	};
	(key $name:ident, $kind:literal, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "RawKey", into = "u64")]
		pub struct $name(NonZeroU64);
		impl $name {
			/// Wraps `value`, rejecting zero.
			pub fn new(value: u64) -> Result<Self, IdentifierError> {
				NonZeroU64::new(value).map(Self).ok_or(IdentifierError::Zero { kind: $kind })
			}

			/// Raw numeric value.
			pub fn get(self) -> u64 {
				self.0.get()
			}
		}
		impl TryFrom<RawKey> for $name {
			type Error = IdentifierError;

			fn try_from(raw: RawKey) -> Result<Self, Self::Error> {
				Self::new(raw.into_u64($kind)?)
			}
		}
		impl From<$name> for u64 {
			fn from(value: $name) -> Self {
				value.get()
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::try_from(RawKey::Text(s.to_owned()))
			}
		}
		def_id!(@fmt $name, $kind);
	};
	(@fmt $name:ident, $kind:literal) => {
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}({})", $kind, self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				Display::fmt(&self.0, f)
			}
		}
	};
}

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (principal, client, platform, ...).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier.
		kind: &'static str,
	},
	/// The identifier exceeded the allowed length.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier.
		kind: &'static str,
		/// Maximum permitted length.
		max: usize,
	},
	/// A numeric key was zero.
	#[error("{kind} identifier must be a positive integer.")]
	Zero {
		/// Kind of identifier.
		kind: &'static str,
	},
	/// A numeric key could not be parsed.
	#[error("{kind} identifier is not numeric.")]
	NotNumeric {
		/// Kind of identifier.
		kind: &'static str,
	},
}

/// Wire form of a numeric key; token claims sometimes carry keys as decimal strings.
#[derive(Deserialize)]
#[serde(untagged)]
#[doc(hidden)]
pub enum RawKey {
	/// JSON number.
	Number(u64),
	/// Decimal text.
	Text(String),
}
impl RawKey {
	fn into_u64(self, kind: &'static str) -> Result<u64, IdentifierError> {
		match self {
			Self::Number(value) => Ok(value),
			Self::Text(text) =>
				text.trim().parse().map_err(|_| IdentifierError::NotNumeric { kind }),
		}
	}
}

def_id!(text PrincipalId, "Principal", "Subject identifier of the authenticated operator.");
def_id!(text ClientId, "Client", "OAuth client identifier of a platform.");

def_id!(key PlatformId, "Platform", "Primary key of a platform (tenant/application boundary).");
def_id!(key UserId, "User", "Primary key of a user account.");
def_id!(key RoleId, "Role", "Primary key of a platform-scoped role.");
def_id!(key PermissionId, "Permission", "Primary key of a platform-scoped permission.");

// Decimal text is never empty, has no whitespace, and fits the length limit.
impl From<UserId> for PrincipalId {
	fn from(value: UserId) -> Self {
		Self(value.to_string())
	}
}

fn validate_text(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		Err(IdentifierError::Empty { kind })
	} else if view.chars().any(char::is_whitespace) {
		Err(IdentifierError::ContainsWhitespace { kind })
	} else if view.len() > IDENTIFIER_MAX_LEN {
		Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN })
	} else {
		Ok(())
	}
}
