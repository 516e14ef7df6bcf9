//! Redacting wrapper for bearer strings and passwords.

// self
use crate::_prelude::*;

/// Opaque secret (access token, refresh token, password) that never prints its contents.
///
/// Clones share one allocation; credentials are cloned onto every outbound request.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TokenSecret(Arc<str>);
impl TokenSecret {
	/// Wraps `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(Arc::from(value.into()))
	}

	/// Raw value; keep it out of logs.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns `true` when the secret is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// `Authorization` header value carrying this secret.
	pub fn bearer_header(&self) -> String {
		format!("Bearer {}", self.0)
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}
impl From<TokenSecret> for String {
	fn from(value: TokenSecret) -> Self {
		value.0.as_ref().to_owned()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("TokenSecret(<redacted>)")
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_redact_but_wire_form_does_not() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(<redacted>)");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.bearer_header(), "Bearer super-secret");
		assert_eq!(
			serde_json::to_string(&secret).expect("Secret should serialize."),
			"\"super-secret\""
		);
	}

	#[test]
	fn blank_detection_ignores_whitespace() {
		assert!(TokenSecret::new("  ").is_blank());
		assert!(!TokenSecret::new("a.b.c").is_blank());
	}
}
