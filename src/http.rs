//! Transport primitives for calls to the identity service.
//!
//! The module exposes [`HttpTransport`] alongside the owned [`ApiRequest`] and [`ApiResponse`]
//! values so downstream crates can plug in custom HTTP stacks (or scripted test doubles). The
//! request authorizer only ever clones requests; it never mutates the caller's value.

// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderName, HeaderValue};
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Header carrying the bearer credential.
pub const AUTHORIZATION: &str = "authorization";
const CONTENT_TYPE: &str = "content-type";
const ACCEPT: &str = "accept";
const JSON: &str = "application/json";

/// HTTP methods used by the console.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
	/// `GET`.
	Get,
	/// `POST`.
	Post,
	/// `PUT`.
	Put,
	/// `DELETE`.
	Delete,
}
impl Method {
	/// Canonical upper-case method name.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Get => "GET",
			Self::Post => "POST",
			Self::Put => "PUT",
			Self::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Owned outbound request.
///
/// Header names are stored lower-cased so lookups are case-insensitive.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL.
	pub url: Url,
	/// Request headers keyed by lower-case name.
	pub headers: BTreeMap<String, String>,
	/// Encoded body, if any.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a body-less request.
	pub fn new(method: Method, url: Url) -> Self {
		let mut headers = BTreeMap::new();

		headers.insert(ACCEPT.into(), JSON.into());

		Self { method, url, headers, body: None }
	}

	/// `GET url`.
	pub fn get(url: Url) -> Self {
		Self::new(Method::Get, url)
	}

	/// `DELETE url`.
	pub fn delete(url: Url) -> Self {
		Self::new(Method::Delete, url)
	}

	/// `POST url` with a JSON body.
	pub fn post_json<B>(url: Url, body: &B) -> Result<Self, serde_json::Error>
	where
		B: ?Sized + Serialize,
	{
		Self::new(Method::Post, url).with_json(body)
	}

	/// `PUT url` with a JSON body.
	pub fn put_json<B>(url: Url, body: &B) -> Result<Self, serde_json::Error>
	where
		B: ?Sized + Serialize,
	{
		Self::new(Method::Put, url).with_json(body)
	}

	/// Replaces the body with the JSON encoding of `body`.
	pub fn with_json<B>(mut self, body: &B) -> Result<Self, serde_json::Error>
	where
		B: ?Sized + Serialize,
	{
		self.body = Some(serde_json::to_vec(body)?);
		self.headers.insert(CONTENT_TYPE.into(), JSON.into());

		Ok(self)
	}

	/// Sets (or replaces) a header.
	pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.insert(name.to_ascii_lowercase(), value.into());

		self
	}

	/// Returns a header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}

	/// Returns a clone carrying `Authorization: Bearer <token>`.
	pub fn bearer(&self, header_value: String) -> Self {
		self.clone().with_header(AUTHORIZATION, header_value)
	}
}
impl Debug for ApiRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				let value = if name == AUTHORIZATION { "<redacted>" } else { value.as_str() };

				(name.as_str(), value)
			})
			.collect::<BTreeMap<_, _>>();

		f.debug_struct("ApiRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("body_len", &self.body.as_ref().map(Vec::len))
			.finish()
	}
}

/// Owned inbound response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers keyed by lower-case name.
	pub headers: BTreeMap<String, String>,
	/// Raw body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a header-less response.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Creates a response whose body is the JSON encoding of `value`.
	pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
		let mut response = Self::new(status, value.to_string());

		response.headers.insert(CONTENT_TYPE.into(), JSON.into());

		response
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` for 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Parses the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let de = &mut serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(de)
			.map_err(|source| Error::ResponseParse { status: self.status, source })
	}

	/// Extracts the server's `message` field (or a plain-text body) for display.
	pub fn error_message(&self) -> Option<String> {
		#[derive(Deserialize)]
		struct ErrorBody {
			#[serde(default, alias = "error", alias = "title")]
			message: Option<String>,
		}

		if let Ok(ErrorBody { message: Some(message) }) = serde_json::from_slice(&self.body)
			&& !message.trim().is_empty()
		{
			return Some(message);
		}

		let text = String::from_utf8_lossy(&self.body);
		let text = text.trim();

		(!text.is_empty() && !text.starts_with('{') && !text.starts_with('['))
			.then(|| text.to_owned())
	}

	/// Converts a non-success response into [`Error::Api`].
	pub fn into_api_error(self) -> Error {
		let message = self.error_message().unwrap_or_else(|| reason_phrase(self.status).to_owned());

		Error::Api { status: self.status, message }
	}
}

/// Abstraction over HTTP stacks capable of executing identity-service calls.
///
/// The trait is the crate's only dependency on an HTTP stack. Implementations must be
/// `Send + Sync` so session and directory clients can be shared across tasks, and the returned
/// future must be `Send`. Non-2xx statuses are responses, not errors; only failures to obtain a
/// response at all map to [`TransportError`].
pub trait HttpTransport
where
	Self: Send + Sync,
{
	/// Executes `request` and buffers the full response.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}
impl<T> HttpTransport for Arc<T>
where
	T: ?Sized + HttpTransport,
{
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		(**self).execute(request)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client with the given per-request timeout.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, crate::error::ConfigError> {
		Ok(Self(ReqwestClient::builder().timeout(timeout).build()?))
	}

	fn build(&self, request: ApiRequest) -> Result<reqwest::Request, TransportError> {
		let method = match request.method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Delete => reqwest::Method::DELETE,
		};
		let mut builder = self.0.request(method, request.url);

		for (name, value) in &request.headers {
			let name = HeaderName::from_bytes(name.as_bytes()).map_err(TransportError::network)?;
			let value = HeaderValue::from_str(value).map_err(TransportError::network)?;

			builder = builder.header(name, value);
		}
		if let Some(body) = request.body {
			builder = builder.body(body);
		}

		Ok(builder.build()?)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let request = self.build(request)?;
			let response = self.0.execute(request).await?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
				})
				.collect();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, headers, body })
		})
	}
}

fn reason_phrase(status: u16) -> &'static str {
	match status {
		400 => "Bad Request",
		401 => "Unauthorized",
		403 => "Forbidden",
		404 => "Not Found",
		409 => "Conflict",
		422 => "Unprocessable Entity",
		429 => "Too Many Requests",
		500 => "Internal Server Error",
		502 => "Bad Gateway",
		503 => "Service Unavailable",
		504 => "Gateway Timeout",
		_ => "Unexpected response",
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn url() -> Url {
		Url::parse("https://ums.example.com/api/users").expect("URL fixture should parse.")
	}

	#[test]
	fn bearer_clones_without_touching_the_original() {
		let original = ApiRequest::get(url());
		let authorized = original.bearer("Bearer abc".into());

		assert_eq!(original.header("Authorization"), None);
		assert_eq!(authorized.header("AUTHORIZATION"), Some("Bearer abc"));
		assert!(!format!("{authorized:?}").contains("abc"));
	}

	#[test]
	fn json_requests_set_content_type() {
		let request = ApiRequest::post_json(url(), &json!({ "name": "ops" }))
			.expect("JSON body should encode.");

		assert_eq!(request.method, Method::Post);
		assert_eq!(request.header("content-type"), Some("application/json"));
		assert_eq!(request.body.as_deref(), Some(br#"{"name":"ops"}"#.as_slice()));
	}

	#[test]
	fn error_message_prefers_json_message_field() {
		let json = ApiResponse::json_body(400, &json!({ "message": "Email already taken" }));
		let text = ApiResponse::new(503, "upstream down");
		let empty = ApiResponse::new(404, "");

		assert_eq!(json.error_message().as_deref(), Some("Email already taken"));
		assert_eq!(text.error_message().as_deref(), Some("upstream down"));
		assert_eq!(empty.error_message(), None);

		match empty.into_api_error() {
			Error::Api { status, message } => {
				assert_eq!(status, 404);
				assert_eq!(message, "Not Found");
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn json_parse_failures_keep_status_and_path() {
		#[derive(Debug, Deserialize)]
		struct Body {
			#[allow(dead_code)]
			count: u32,
		}

		let response = ApiResponse::json_body(200, &json!({ "count": "many" }));
		let err = response.json::<Body>().expect_err("String count should not parse.");

		match err {
			Error::ResponseParse { status, source } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "count");
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}
