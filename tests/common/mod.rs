//! Shared fixtures for the integration suites.

#![allow(dead_code)]

// std
use std::{
	collections::{BTreeMap, BTreeSet, VecDeque},
	sync::Arc,
};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use parking_lot::Mutex;
use serde_json::Value;
// self
use ums_admin_client::{
	auth::{PlatformId, Principal, PrincipalId, UserId},
	endpoints::EndpointTable,
	http::{ApiRequest, ApiResponse, HttpTransport, TransportFuture},
	store::{
		MemoryStore,
		credential::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY},
	},
	url::Url,
};

/// Transport that answers from a queue of canned responses and records every request.
///
/// An exhausted queue answers `599` so unexpected calls show up as assertion failures rather
/// than hangs.
#[derive(Default)]
pub struct ScriptedTransport {
	responses: Mutex<VecDeque<ApiResponse>>,
	requests: Mutex<Vec<ApiRequest>>,
}
impl ScriptedTransport {
	pub fn with_responses(responses: impl IntoIterator<Item = ApiResponse>) -> Self {
		Self { responses: Mutex::new(responses.into_iter().collect()), requests: Mutex::default() }
	}

	pub fn requests(&self) -> Vec<ApiRequest> {
		self.requests.lock().clone()
	}

	pub fn call_count(&self) -> usize {
		self.requests.lock().len()
	}
}
impl HttpTransport for ScriptedTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		self.requests.lock().push(request);

		let response =
			self.responses.lock().pop_front().unwrap_or_else(|| ApiResponse::new(599, "unscripted"));

		Box::pin(async move { Ok(response) })
	}
}

pub fn endpoints(base_url: &str) -> EndpointTable {
	EndpointTable::with_default_paths(Url::parse(base_url).expect("Base URL fixture should parse."))
}

/// Unsigned JWT-shaped token carrying `payload`.
pub fn jwt(payload: Value) -> String {
	let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
	let body = URL_SAFE_NO_PAD.encode(payload.to_string());

	format!("{header}.{body}.sig")
}

pub fn platform(id: u64) -> PlatformId {
	PlatformId::new(id).expect("Platform fixture should be valid.")
}

pub fn admin_principal() -> Principal {
	Principal {
		id: PrincipalId::new("4").expect("Principal fixture should be valid."),
		user_id: Some(UserId::new(4).expect("User fixture should be valid.")),
		user_name: "ada".into(),
		display_name: "Ada Lovelace".into(),
		email: Some("ada@example.com".into()),
		platform_roles: BTreeMap::from([(platform(1), BTreeSet::from(["Admin".to_owned()]))]),
	}
}

/// Store holding a complete persisted session, ready for `SessionManager::restore`.
pub fn seeded_store(access: &str, refresh: Option<&str>) -> Arc<MemoryStore> {
	let principal =
		serde_json::to_string(&admin_principal()).expect("Principal fixture should serialize.");
	let mut entries = vec![
		(ACCESS_TOKEN_KEY.to_owned(), access.to_owned()),
		(USER_KEY.to_owned(), principal),
	];

	if let Some(refresh) = refresh {
		entries.push((REFRESH_TOKEN_KEY.to_owned(), refresh.to_owned()));
	}

	Arc::new(MemoryStore::with_entries(entries))
}

pub fn user_json() -> Value {
	serde_json::json!({
		"userId": 4,
		"userName": "ada",
		"firstName": "Ada",
		"lastName": "Lovelace",
		"email": "ada@example.com",
		"isActive": true,
		"platformId": 1,
		"platformName": "Console",
		"roles": ["Admin"]
	})
}
