//! Client-level error types shared across the session, authorizer, and directory layers.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Nothing here is fatal to the process: terminal session failures degrade to the anonymous
/// state and a login redirect before the error reaches the caller.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Login was rejected; the message is the server's, verbatim.
	#[error("{message}")]
	AuthenticationFailed {
		/// Server-supplied (or fallback) message shown to the operator.
		message: String,
	},
	/// A protected call was answered with 401 and no refresh was possible.
	#[error("Credential expired or was rejected: {message}.")]
	TokenExpiredOrInvalid {
		/// Server-supplied reason, when one was returned.
		message: String,
	},
	/// Refreshing the credential failed; the session has been cleared.
	#[error("Session refresh failed: {reason}.")]
	RefreshFailed {
		/// Why the refresh could not complete.
		reason: String,
		/// Location the operator should return to after logging in again.
		return_to: Option<String>,
	},
	/// Bearer token payload could not be decoded.
	#[error(transparent)]
	MalformedToken(#[from] crate::auth::DecodeError),
	/// Locally cached session data is corrupt.
	#[error("Cached session state is malformed: {reason}.")]
	MalformedCachedState {
		/// Description of the corruption.
		reason: String,
	},
	/// An RBAC assignment would cross platform boundaries.
	#[error(transparent)]
	ScopeViolation(#[from] crate::directory::ScopeViolation),
	/// The identity service answered with a non-success status.
	#[error("Identity service returned HTTP {status}: {message}.")]
	Api {
		/// HTTP status code.
		status: u16,
		/// Server-supplied message, or the canonical reason phrase.
		message: String,
	},
	/// The identity service returned a body that does not match the expected shape.
	#[error("Identity service returned malformed JSON (HTTP {status}).")]
	ResponseParse {
		/// HTTP status code.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns `true` for the network-or-server family: failures the caller should display
	/// and that are never retried automatically.
	pub fn is_network_or_server(&self) -> bool {
		matches!(self, Self::Transport(_) | Self::Api { .. } | Self::ResponseParse { .. })
	}

	/// Returns `true` when the session has ended and the operator must log in again.
	pub fn requires_login(&self) -> bool {
		matches!(self, Self::TokenExpiredOrInvalid { .. } | Self::RefreshFailed { .. })
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Endpoint table could not be read from disk.
	#[error("Endpoint table could not be read from {path}.")]
	EndpointTableRead {
		/// Path that failed.
		path: String,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Endpoint table JSON does not match the expected layout.
	#[error("Endpoint table is malformed.")]
	EndpointTableParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// A built endpoint URL cannot be parsed.
	#[error("Endpoint URL `{url}` is invalid.")]
	InvalidEndpointUrl {
		/// The URL text that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A path template still contains a placeholder after substitution.
	#[error("Endpoint template `{template}` is missing a value for `{param}`.")]
	MissingPathParam {
		/// Template that was being expanded.
		template: String,
		/// Placeholder name left unresolved.
		param: String,
	},
	/// Request payload could not be serialized.
	#[error("Request payload could not be serialized.")]
	RequestEncode(#[from] serde_json::Error),
	/// Credential builder validation failed.
	#[error("Unable to build credential.")]
	CredentialBuild(#[from] crate::auth::CredentialBuilderError),
	/// Server returned a non-positive or out-of-range `expiresIn`.
	#[error("The expiresIn value {value} is not a usable lifetime.")]
	InvalidExpiresIn {
		/// Raw value returned by the server.
		value: i64,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the identity service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the identity service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
