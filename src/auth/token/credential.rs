//! Persisted bearer credential, lifecycle helpers, and builder.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Current lifecycle status for a credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CredentialStatus {
	/// Credential is within its known lifetime.
	Active,
	/// Credential exceeded its expiry instant.
	Expired,
	/// No expiry is known; only the server can decide.
	Unbounded,
}

/// Errors produced by [`CredentialBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when the access token is empty.
	#[error("Access token cannot be blank.")]
	BlankAccessToken,
}

/// Access credential (plus optional refresh credential) issued by the identity service.
///
/// Owned by the credential store and mutated only through the session manager.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the service issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the credential was received.
	pub issued_at: OffsetDateTime,
	/// Absolute expiry, when known.
	pub expires_at: Option<OffsetDateTime>,
}
impl Credential {
	/// Returns a builder for constructing credentials.
	pub fn builder() -> CredentialBuilder {
		CredentialBuilder::default()
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> CredentialStatus {
		match self.expires_at {
			None => CredentialStatus::Unbounded,
			Some(expiry) if instant >= expiry => CredentialStatus::Expired,
			Some(_) => CredentialStatus::Active,
		}
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> CredentialStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the credential has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), CredentialStatus::Expired)
	}

	/// Returns `true` if a refresh credential is available.
	pub fn can_refresh(&self) -> bool {
		self.refresh_token.as_ref().is_some_and(|secret| !secret.is_blank())
	}

	/// Returns `true` if `other` carries the same access token.
	pub fn same_access(&self, other: &Credential) -> bool {
		self.access_token == other.access_token
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`Credential`].
#[derive(Clone, Debug, Default)]
pub struct CredentialBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl CredentialBuilder {
	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant when one is known.
	pub fn maybe_expires_at(mut self, instant: Option<OffsetDateTime>) -> Self {
		self.expires_at = instant.or(self.expires_at);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides an already wrapped refresh secret, if any.
	pub fn refresh_secret(mut self, secret: Option<TokenSecret>) -> Self {
		self.refresh_token = secret;

		self
	}

	/// Consumes the builder and produces a [`Credential`].
	///
	/// A relative `expires_in` wins over an absolute instant; blank refresh tokens are dropped.
	pub fn build(self) -> Result<Credential, CredentialBuilderError> {
		let access_token = self.access_token.ok_or(CredentialBuilderError::MissingAccessToken)?;

		if access_token.is_blank() {
			return Err(CredentialBuilderError::BlankAccessToken);
		}

		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_in, self.expires_at) {
			(Some(delta), _) => Some(issued_at + delta),
			(None, instant) => instant,
		};

		Ok(Credential {
			access_token,
			refresh_token: self.refresh_token.filter(|secret| !secret.is_blank()),
			issued_at,
			expires_at,
		})
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn status_transitions_cover_all_states() {
		let credential = Credential::builder()
			.access_token("access")
			.refresh_token("refresh")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_at(macros::datetime!(2025-01-01 01:00 UTC))
			.build()
			.expect("Credential builder should succeed for status transitions.");

		assert_eq!(
			credential.status_at(macros::datetime!(2025-01-01 00:30 UTC)),
			CredentialStatus::Active
		);
		assert_eq!(
			credential.status_at(macros::datetime!(2025-01-01 01:00 UTC)),
			CredentialStatus::Expired
		);

		let unbounded = Credential::builder()
			.access_token("opaque")
			.build()
			.expect("Credential without expiry should build.");

		assert_eq!(unbounded.status(), CredentialStatus::Unbounded);
		assert!(!unbounded.can_refresh());
	}

	#[test]
	fn builder_prefers_relative_expiry() {
		let credential = Credential::builder()
			.access_token("secret")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_at(macros::datetime!(2030-01-01 00:00 UTC))
			.expires_in(Duration::minutes(30))
			.build()
			.expect("Credential builder should support relative expiry calculations.");

		assert_eq!(credential.expires_at, Some(macros::datetime!(2025-01-01 00:30 UTC)));
	}

	#[test]
	fn builder_rejects_missing_or_blank_access() {
		assert_eq!(Credential::builder().build(), Err(CredentialBuilderError::MissingAccessToken));
		assert_eq!(
			Credential::builder().access_token(" ").build(),
			Err(CredentialBuilderError::BlankAccessToken)
		);

		let credential = Credential::builder()
			.access_token("a")
			.refresh_token("")
			.build()
			.expect("Blank refresh tokens should be dropped, not rejected.");

		assert!(credential.refresh_token.is_none());
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let credential = Credential::builder()
			.access_token("visible-access")
			.refresh_token("visible-refresh")
			.build()
			.expect("Credential fixture should build.");
		let rendered = format!("{credential:?}");

		assert!(!rendered.contains("visible-access"));
		assert!(!rendered.contains("visible-refresh"));
	}
}
