//! Display-only decoder for bearer token payloads.
//!
//! [`decode`] never checks signatures. It exists so the console can show who is logged in and
//! which platforms the token covers; the identity service's 401 remains the only authority on
//! validity.

// crates.io
use base64::{
	Engine as _,
	alphabet,
	engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use serde::{Deserializer, de::Error as DeError};
// self
use crate::{_prelude::*, auth::PlatformId};

const PAYLOAD_CONFIG: GeneralPurposeConfig =
	GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PAYLOAD_CONFIG);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PAYLOAD_CONFIG);

/// Errors raised while decoding a bearer token payload.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Token does not have the `header.payload.signature` shape.
	#[error("Token must have 3 dot-delimited segments, found {found}.")]
	SegmentCount {
		/// Number of segments found.
		found: usize,
	},
	/// Payload segment is not valid base64.
	#[error("Token payload is not valid base64.")]
	Base64(#[source] base64::DecodeError),
	/// Payload is not a JSON claim set.
	#[error("Token payload is not a valid claim set.")]
	Json(#[source] serde_path_to_error::Error<serde_json::Error>),
	/// The embedded `platforms` claim is not a valid membership list.
	#[error("Token platforms claim is malformed.")]
	Platforms(#[source] serde_json::Error),
}

/// Platform membership embedded in the access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformMembership {
	/// Platform primary key.
	pub platform_id: PlatformId,
	/// Platform display name.
	pub name: String,
	/// OAuth client identifier of the platform.
	#[serde(default)]
	pub client_id: String,
	/// Allowed post-login redirect targets.
	#[serde(default)]
	pub redirect_uris: Vec<String>,
	/// Allowed post-logout redirect targets.
	#[serde(default)]
	pub post_logout_redirect_uris: Vec<String>,
}

/// Typed claim set extracted from a bearer token.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Claims {
	/// Subject (user) identifier.
	pub sub: Option<String>,
	/// Email address.
	pub email: Option<String>,
	/// Given name.
	pub given_name: Option<String>,
	/// Family name.
	pub family_name: Option<String>,
	/// Login name.
	pub username: Option<String>,
	/// Full display name.
	pub name: Option<String>,
	/// Token identifier.
	pub jti: Option<String>,
	/// Role names; the service emits either a single string or an array.
	pub roles: Vec<String>,
	/// Expiry as seconds since the Unix epoch.
	pub exp: Option<i64>,
	/// Issuer.
	pub iss: Option<String>,
	/// Audiences; a single string or an array on the wire.
	pub aud: Vec<String>,
	/// Platform memberships, decoded from the embedded JSON list.
	pub platforms: Vec<PlatformMembership>,
}
impl Claims {
	/// Absolute expiry derived from `exp`, when present and representable.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.exp.and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
	}

	/// Best display name: `name`, then given + family name, then `username`, then `email`.
	pub fn display_name(&self) -> Option<String> {
		if let Some(name) = self.name.as_ref().filter(|n| !n.trim().is_empty()) {
			return Some(name.clone());
		}

		let joined = [self.given_name.as_deref(), self.family_name.as_deref()]
			.into_iter()
			.flatten()
			.filter(|part| !part.trim().is_empty())
			.collect::<Vec<_>>()
			.join(" ");

		if !joined.is_empty() {
			return Some(joined);
		}

		self.username.clone().or_else(|| self.email.clone())
	}
}

#[derive(Deserialize)]
struct RawClaims {
	#[serde(default)]
	sub: Option<String>,
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	given_name: Option<String>,
	#[serde(default)]
	family_name: Option<String>,
	#[serde(default)]
	username: Option<String>,
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	jti: Option<String>,
	#[serde(default, deserialize_with = "one_or_many")]
	role: Vec<String>,
	#[serde(default)]
	exp: Option<i64>,
	#[serde(default)]
	iss: Option<String>,
	#[serde(default, deserialize_with = "one_or_many")]
	aud: Vec<String>,
	#[serde(default)]
	platforms: Option<EmbeddedPlatforms>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EmbeddedPlatforms {
	Encoded(String),
	Inline(Vec<PlatformMembership>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
	One(String),
	Many(Vec<String>),
}

/// Decodes the payload segment of `token` into [`Claims`].
pub fn decode(token: &str) -> Result<Claims, DecodeError> {
	let segments = token.trim().split('.').collect::<Vec<_>>();

	if segments.len() != 3 {
		return Err(DecodeError::SegmentCount { found: segments.len() });
	}

	let payload = segments[1];
	let bytes = URL_SAFE_LENIENT
		.decode(payload)
		.or_else(|_| STANDARD_LENIENT.decode(payload))
		.map_err(DecodeError::Base64)?;

	parse_claims(&bytes)
}

/// Parses a JSON claim set (a decoded token payload or a user-info response body).
pub fn parse_claims(bytes: &[u8]) -> Result<Claims, DecodeError> {
	let de = &mut serde_json::Deserializer::from_slice(bytes);
	let raw: RawClaims = serde_path_to_error::deserialize(de).map_err(DecodeError::Json)?;
	let platforms = match raw.platforms {
		None => Vec::new(),
		Some(EmbeddedPlatforms::Inline(list)) => list,
		Some(EmbeddedPlatforms::Encoded(text)) if text.trim().is_empty() => Vec::new(),
		Some(EmbeddedPlatforms::Encoded(text)) =>
			serde_json::from_str(&text).map_err(DecodeError::Platforms)?,
	};

	Ok(Claims {
		sub: raw.sub,
		email: raw.email,
		given_name: raw.given_name,
		family_name: raw.family_name,
		username: raw.username,
		name: raw.name,
		jti: raw.jti,
		roles: raw.role,
		exp: raw.exp,
		iss: raw.iss,
		aud: raw.aud,
		platforms,
	})
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<OneOrMany>::deserialize(deserializer) {
		Ok(None) => Ok(Vec::new()),
		Ok(Some(OneOrMany::One(value))) => Ok(vec![value]),
		Ok(Some(OneOrMany::Many(values))) => Ok(values),
		Err(e) => Err(D::Error::custom(format!("expected a string or string array: {e}"))),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::engine::general_purpose::URL_SAFE_NO_PAD;
	use serde_json::json;
	// self
	use super::*;

	fn token_for(payload: serde_json::Value) -> String {
		let header = URL_SAFE_NO_PAD.encode(b"{\"alg\":\"HS256\",\"typ\":\"JWT\"}");
		let body = URL_SAFE_NO_PAD.encode(payload.to_string());

		format!("{header}.{body}.signature")
	}

	#[test]
	fn decodes_standard_claims_and_embedded_platforms() {
		let platforms = json!([
			{ "platformId": 1, "name": "UMS", "clientId": "ums-admin", "redirectUris": ["https://ums.local/cb"], "postLogoutRedirectUris": [] }
		])
		.to_string();
		let token = token_for(json!({
			"sub": "42",
			"email": "ada@example.com",
			"given_name": "Ada",
			"family_name": "Lovelace",
			"role": "Admin",
			"exp": 1_735_693_200_i64,
			"iss": "https://ums.local",
			"aud": "ums-admin",
			"platforms": platforms,
		}));
		let claims = decode(&token).expect("Well-formed token should decode.");

		assert_eq!(claims.sub.as_deref(), Some("42"));
		assert_eq!(claims.roles, vec!["Admin".to_owned()]);
		assert_eq!(claims.aud, vec!["ums-admin".to_owned()]);
		assert_eq!(claims.platforms.len(), 1);
		assert_eq!(claims.platforms[0].platform_id.get(), 1);
		assert_eq!(claims.platforms[0].client_id, "ums-admin");
		assert_eq!(claims.display_name().as_deref(), Some("Ada Lovelace"));
		assert_eq!(
			claims.expires_at(),
			Some(time::macros::datetime!(2025-01-01 01:00 UTC))
		);
	}

	#[test]
	fn decoding_is_idempotent() {
		let token = token_for(json!({ "sub": "7", "role": ["Admin", "Auditor"], "exp": 10 }));
		let first = decode(&token).expect("First decode should succeed.");
		let second = decode(&token).expect("Second decode should succeed.");

		assert_eq!(first, second);
		assert_eq!(first.roles, vec!["Admin".to_owned(), "Auditor".to_owned()]);
	}

	#[test]
	fn accepts_padded_and_standard_alphabet_payloads() {
		let payload = base64::engine::general_purpose::STANDARD.encode("{\"sub\":\"a?>\"}");
		let token = format!("h.{payload}.s");
		let claims = decode(&token).expect("Padded standard base64 should still decode.");

		assert_eq!(claims.sub.as_deref(), Some("a?>"));
	}

	#[test]
	fn parses_plain_user_info_bodies() {
		let body = json!({ "sub": "5", "name": "Grace Hopper", "role": ["Admin"] }).to_string();
		let claims = parse_claims(body.as_bytes()).expect("User-info JSON should parse.");

		assert_eq!(claims.display_name().as_deref(), Some("Grace Hopper"));
		assert_eq!(claims.roles, vec!["Admin".to_owned()]);
	}

	#[test]
	fn rejects_wrong_segment_count() {
		assert!(matches!(decode("only.two"), Err(DecodeError::SegmentCount { found: 2 })));
		assert!(matches!(decode("a.b.c.d"), Err(DecodeError::SegmentCount { found: 4 })));
	}

	#[test]
	fn rejects_non_base64_and_non_json_payloads() {
		assert!(matches!(decode("h.!!!.s"), Err(DecodeError::Base64(_))));

		let not_json = URL_SAFE_NO_PAD.encode("not json");

		assert!(matches!(decode(&format!("h.{not_json}.s")), Err(DecodeError::Json(_))));

		let wrong_type = token_for(json!({ "exp": "tomorrow" }));
		let err = decode(&wrong_type).expect_err("String expiry should be rejected.");

		match err {
			DecodeError::Json(inner) => assert_eq!(inner.path().to_string(), "exp"),
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn rejects_malformed_embedded_platforms() {
		let token = token_for(json!({ "platforms": "[{\"platformId\": 0}]" }));

		assert!(matches!(decode(&token), Err(DecodeError::Platforms(_))));

		let empty = token_for(json!({ "platforms": "" }));

		assert!(decode(&empty).expect("Empty platforms should decode.").platforms.is_empty());
	}
}
