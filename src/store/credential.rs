//! Typed credential + principal persistence on top of a [`KvStore`].

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::{Credential, Principal, TokenSecret},
	store::{KvStore, StoreBatch, StoreError},
};

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key of the RFC 3339 expiry instant.
pub const EXPIRES_AT_KEY: &str = "expiresAt";
/// Storage key of the RFC 3339 issue instant.
pub const ISSUED_AT_KEY: &str = "issuedAt";
/// Storage key of the cached principal (JSON).
pub const USER_KEY: &str = "user";

const ALL_KEYS: [&str; 5] =
	[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, EXPIRES_AT_KEY, ISSUED_AT_KEY, USER_KEY];

/// Fixed-key persistence for the session's credential and principal.
///
/// Malformed credential data is treated as absent and wiped; a malformed principal blob is
/// reported so the session layer can decide how to recover.
#[derive(Clone)]
pub struct CredentialStore {
	backend: Arc<dyn KvStore>,
}
impl CredentialStore {
	/// Wraps a key-value backend.
	pub fn new(backend: Arc<dyn KvStore>) -> Self {
		Self { backend }
	}

	/// Persists `credential` as one batch that also drops keys of absent optional parts.
	pub async fn save(&self, credential: &Credential) -> Result<(), StoreError> {
		self.backend.apply(credential_batch(credential)?).await
	}

	/// Persists credential and principal in one batch.
	pub async fn save_session(
		&self,
		credential: &Credential,
		principal: &Principal,
	) -> Result<(), StoreError> {
		let mut batch = credential_batch(credential)?;

		batch.set.push((USER_KEY.into(), encode_principal(principal)?));

		self.backend.apply(batch).await
	}

	/// Loads the stored credential.
	///
	/// Returns `None` when nothing is stored. Unparseable instants or a blank access token count
	/// as absent and clear every key.
	pub async fn load(&self) -> Result<Option<Credential>, StoreError> {
		let Some(access) = self.backend.get(ACCESS_TOKEN_KEY).await? else {
			return Ok(None);
		};
		let refresh = self.backend.get(REFRESH_TOKEN_KEY).await?;
		let issued_at = self.backend.get(ISSUED_AT_KEY).await?;
		let expires_at = self.backend.get(EXPIRES_AT_KEY).await?;

		match decode_credential(access, refresh, issued_at.as_deref(), expires_at.as_deref()) {
			Some(credential) => Ok(Some(credential)),
			None => {
				crate::obs::warn_event("credential_store", "discarding malformed stored credential");
				self.clear().await?;

				Ok(None)
			},
		}
	}

	/// Persists the principal snapshot.
	pub async fn save_principal(&self, principal: &Principal) -> Result<(), StoreError> {
		self.backend.set_many(vec![(USER_KEY.into(), encode_principal(principal)?)]).await
	}

	/// Loads the principal snapshot.
	///
	/// A blob that does not parse surfaces [`Error::MalformedCachedState`]; nothing is cleared
	/// here.
	pub async fn load_principal(&self) -> Result<Option<Principal>> {
		let Some(raw) = self.backend.get(USER_KEY).await? else {
			return Ok(None);
		};

		serde_json::from_str(&raw)
			.map(Some)
			.map_err(|e| Error::MalformedCachedState { reason: format!("cached user: {e}") })
	}

	/// Removes every session key as one batch.
	pub async fn clear(&self) -> Result<(), StoreError> {
		self.backend.remove_many(ALL_KEYS.iter().map(|key| (*key).to_owned()).collect()).await
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore").finish_non_exhaustive()
	}
}

fn credential_batch(credential: &Credential) -> Result<StoreBatch, StoreError> {
	let mut batch = StoreBatch {
		set: vec![
			(ACCESS_TOKEN_KEY.to_owned(), credential.access_token.expose().to_owned()),
			(ISSUED_AT_KEY.to_owned(), format_instant(credential.issued_at)?),
		],
		remove: Vec::new(),
	};

	match &credential.refresh_token {
		Some(secret) => batch.set.push((REFRESH_TOKEN_KEY.to_owned(), secret.expose().to_owned())),
		None => batch.remove.push(REFRESH_TOKEN_KEY.to_owned()),
	}
	match credential.expires_at {
		Some(instant) => batch.set.push((EXPIRES_AT_KEY.to_owned(), format_instant(instant)?)),
		None => batch.remove.push(EXPIRES_AT_KEY.to_owned()),
	}

	Ok(batch)
}

fn decode_credential(
	access: String,
	refresh: Option<String>,
	issued_at: Option<&str>,
	expires_at: Option<&str>,
) -> Option<Credential> {
	let issued_at = match issued_at {
		Some(raw) => Some(OffsetDateTime::parse(raw, &Rfc3339).ok()?),
		None => None,
	};
	let expires_at = match expires_at {
		Some(raw) => Some(OffsetDateTime::parse(raw, &Rfc3339).ok()?),
		None => None,
	};
	let mut builder = Credential::builder()
		.access_token(access)
		.refresh_secret(refresh.map(TokenSecret::new))
		.maybe_expires_at(expires_at);

	if let Some(instant) = issued_at {
		builder = builder.issued_at(instant);
	}

	builder.build().ok()
}

fn format_instant(instant: OffsetDateTime) -> Result<String, StoreError> {
	instant.format(&Rfc3339).map_err(|e| StoreError::Serialization {
		message: format!("Failed to format instant: {e}"),
	})
}

fn encode_principal(principal: &Principal) -> Result<String, StoreError> {
	serde_json::to_string(principal).map_err(|e| StoreError::Serialization {
		message: format!("Failed to serialize principal: {e}"),
	})
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{
		auth::PrincipalId,
		store::{MemoryStore, StoreFuture},
	};

	#[derive(Default)]
	struct BatchLog {
		inner: MemoryStore,
		batches: Mutex<Vec<StoreBatch>>,
	}
	impl KvStore for BatchLog {
		fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
			self.inner.get(key)
		}

		fn apply(&self, batch: StoreBatch) -> StoreFuture<'_, ()> {
			self.batches.lock().push(batch.clone());
			self.inner.apply(batch)
		}
	}

	fn fixture() -> (Arc<MemoryStore>, CredentialStore) {
		let backend = Arc::new(MemoryStore::default());

		(backend.clone(), CredentialStore::new(backend))
	}

	fn principal() -> Principal {
		Principal {
			id: PrincipalId::new("42").expect("Principal fixture should be valid."),
			user_id: None,
			user_name: "ada".into(),
			display_name: "Ada".into(),
			email: None,
			platform_roles: BTreeMap::new(),
		}
	}

	#[tokio::test]
	async fn credential_round_trips_with_fixed_keys() {
		let (backend, store) = fixture();
		let credential = Credential::builder()
			.access_token("access")
			.refresh_token("refresh")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_at(macros::datetime!(2025-01-01 01:00 UTC))
			.build()
			.expect("Credential fixture should build.");

		store.save(&credential).await.expect("Save should succeed.");

		let keys = backend.snapshot().into_keys().collect::<Vec<_>>();

		assert_eq!(keys, vec!["accessToken", "expiresAt", "issuedAt", "refreshToken"]);
		assert_eq!(store.load().await.expect("Load should succeed."), Some(credential));
	}

	#[tokio::test]
	async fn saving_without_refresh_token_drops_stale_key() {
		let (backend, store) = fixture();
		let first = Credential::builder()
			.access_token("a1")
			.refresh_token("r1")
			.build()
			.expect("First credential should build.");
		let second = Credential::builder().access_token("a2").build().expect("Second should build.");

		store.save(&first).await.expect("First save should succeed.");
		store.save(&second).await.expect("Second save should succeed.");

		assert!(!backend.snapshot().contains_key(REFRESH_TOKEN_KEY));
	}

	#[tokio::test]
	async fn save_dropping_optional_keys_is_one_batch() {
		let backend = Arc::new(BatchLog::default());
		let store = CredentialStore::new(backend.clone());
		let first = Credential::builder()
			.access_token("a1")
			.refresh_token("r1")
			.expires_in(Duration::minutes(5))
			.build()
			.expect("First credential should build.");
		let second = Credential::builder().access_token("a2").build().expect("Second should build.");

		store.save(&first).await.expect("First save should succeed.");
		store.save_session(&second, &principal()).await.expect("Session save should succeed.");

		let batches = backend.batches.lock().clone();

		assert_eq!(batches.len(), 2);
		assert_eq!(batches[1].remove, vec![REFRESH_TOKEN_KEY.to_owned(), EXPIRES_AT_KEY.to_owned()]);
		assert!(batches[1].set.iter().any(|(key, value)| key == ACCESS_TOKEN_KEY && value == "a2"));
		assert!(batches[1].set.iter().any(|(key, _)| key == USER_KEY));
		assert_eq!(
			backend.inner.snapshot().into_keys().collect::<Vec<_>>(),
			vec!["accessToken", "issuedAt", "user"]
		);
	}

	#[tokio::test]
	async fn malformed_instants_clear_everything() {
		let backend = Arc::new(MemoryStore::with_entries([
			(ACCESS_TOKEN_KEY, "access"),
			(EXPIRES_AT_KEY, "yesterday-ish"),
			(USER_KEY, "{}"),
		]));
		let store = CredentialStore::new(backend.clone());

		assert_eq!(store.load().await.expect("Load should not error."), None);
		assert!(backend.is_empty());
	}

	#[tokio::test]
	async fn blank_access_token_is_treated_as_absent() {
		let backend = Arc::new(MemoryStore::with_entries([(ACCESS_TOKEN_KEY, "  ")]));
		let store = CredentialStore::new(backend.clone());

		assert_eq!(store.load().await.expect("Load should not error."), None);
		assert!(backend.is_empty());
	}

	#[tokio::test]
	async fn principal_blob_is_validated() {
		let (backend, store) = fixture();

		store.save_principal(&principal()).await.expect("Principal save should succeed.");

		assert_eq!(
			store.load_principal().await.expect("Principal load should succeed."),
			Some(principal())
		);

		backend
			.set_many(vec![(USER_KEY.into(), "{not json".into())])
			.await
			.expect("Seeding corrupt blob should succeed.");

		assert!(matches!(store.load_principal().await, Err(Error::MalformedCachedState { .. })));
	}

	#[tokio::test]
	async fn clear_removes_all_session_keys_only() {
		let (backend, store) = fixture();

		backend
			.set_many(vec![("theme".into(), "dark".into())])
			.await
			.expect("Seeding unrelated key should succeed.");
		store
			.save_session(
				&Credential::builder().access_token("a").build().expect("Credential should build."),
				&principal(),
			)
			.await
			.expect("Session save should succeed.");
		store.clear().await.expect("Clear should succeed.");

		assert_eq!(backend.snapshot().into_keys().collect::<Vec<_>>(), vec!["theme"]);
	}
}
