//! Session manager: the single owner of the operator's credential and principal.
//!
//! [`SessionManager`] drives the `Anonymous → Authenticating → Authenticated ⇄ Refreshing`
//! state machine, persists through a [`CredentialStore`], and publishes every transition as a
//! [`SessionSnapshot`] on a `tokio::sync::watch` channel. The credential cell and the published
//! snapshot are always updated under one write guard.

pub mod login;
pub mod refresh;
pub mod state;

pub use login::*;
pub use refresh::*;
pub use state::*;

// crates.io
use tokio::sync::watch;
// self
use crate::{
	_prelude::*,
	auth::{self, Claims, ClientId, Credential, PlatformId, PlatformMembership, Principal, TokenSecret},
	endpoints::EndpointTable,
	ext::{Navigator, NoopNavigator},
	http::HttpTransport,
	obs::{self, FlowKind, FlowRecord},
	store::{CredentialStore, KvStore},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Session manager specialized for the crate's default reqwest transport.
pub type ReqwestSession = SessionManager<ReqwestTransport>;

/// Owns the credential lifecycle for one operator.
///
/// Share it behind an [`Arc`]; the request authorizer and directory client hold clones.
pub struct SessionManager<C>
where
	C: ?Sized + HttpTransport,
{
	/// HTTP transport used for every outbound call.
	pub http_client: Arc<C>,
	/// Endpoint table of the identity service.
	pub endpoints: Arc<EndpointTable>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	store: CredentialStore,
	navigator: Arc<dyn Navigator>,
	client_id: Option<ClientId>,
	credential: RwLock<Option<Credential>>,
	snapshot: watch::Sender<SessionSnapshot>,
	refresh_guard: AsyncMutex<()>,
}
impl<C> SessionManager<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates an anonymous session over the caller-provided transport.
	///
	/// Call [`SessionManager::restore`] afterwards to pick up a persisted session.
	pub fn with_http_client(
		endpoints: impl Into<Arc<EndpointTable>>,
		store: Arc<dyn KvStore>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		let (snapshot, _) = watch::channel(SessionSnapshot::anonymous());

		Self {
			http_client: http_client.into(),
			endpoints: endpoints.into(),
			refresh_metrics: Default::default(),
			store: CredentialStore::new(store),
			navigator: Arc::new(NoopNavigator),
			client_id: None,
			credential: RwLock::new(None),
			snapshot,
			refresh_guard: AsyncMutex::new(()),
		}
	}

	/// Routes login redirects through `navigator`.
	pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
		self.navigator = navigator;

		self
	}

	/// Sends `client_id` with login and refresh calls.
	pub fn with_client_id(mut self, client_id: ClientId) -> Self {
		self.client_id = Some(client_id);

		self
	}

	/// Current snapshot.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.snapshot.borrow().clone()
	}

	/// Receiver that observes every future transition.
	pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
		self.snapshot.subscribe()
	}

	/// Current lifecycle state.
	pub fn state(&self) -> SessionState {
		self.snapshot.borrow().state
	}

	/// Returns `true` while a usable credential is held.
	pub fn is_authenticated(&self) -> bool {
		self.state().is_authenticated()
	}

	/// Operator behind the current credential.
	pub fn principal(&self) -> Option<Principal> {
		self.snapshot.borrow().principal.clone()
	}

	/// Current credential.
	pub fn credential(&self) -> Option<Credential> {
		self.credential.read().clone()
	}

	/// Current access token.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.credential.read().as_ref().map(|credential| credential.access_token.clone())
	}

	/// Returns `true` when the operator holds `role` on any platform.
	pub fn has_role(&self, role: &str) -> bool {
		self.snapshot.borrow().principal.as_ref().is_some_and(|principal| principal.has_role(role))
	}

	/// Returns `true` when the operator holds the administrator role.
	pub fn is_admin(&self) -> bool {
		self.snapshot.borrow().principal.as_ref().is_some_and(Principal::is_admin)
	}

	/// Role names the operator holds on `platform`.
	pub fn roles_for(&self, platform: PlatformId) -> Vec<String> {
		self.snapshot
			.borrow()
			.principal
			.as_ref()
			.map(|principal| principal.roles_for(platform).map(str::to_owned).collect())
			.unwrap_or_default()
	}

	/// Decodes the current access token for display.
	///
	/// Returns `Ok(None)` when no credential is held.
	pub fn token_claims(&self) -> Result<Option<Claims>> {
		match self.access_token() {
			Some(token) => Ok(Some(auth::decode(token.expose())?)),
			None => Ok(None),
		}
	}

	/// Platform memberships embedded in the current access token.
	///
	/// Undecodable tokens yield an empty list.
	pub fn platforms_from_token(&self) -> Vec<PlatformMembership> {
		match self.token_claims() {
			Ok(claims) => claims.map(|claims| claims.platforms).unwrap_or_default(),
			Err(e) => {
				obs::warn_event("platforms_from_token", &e.to_string());

				Vec::new()
			},
		}
	}

	/// Restores a persisted session without touching the network.
	///
	/// A credential with a valid cached principal yields `Authenticated`. A malformed principal
	/// or a half-written pair (credential without principal, or the reverse) is wiped and the
	/// session starts `Anonymous`.
	pub async fn restore(&self) -> Result<SessionSnapshot> {
		let flow = FlowRecord::start(FlowKind::Restore, "restore");
		let result = flow
			.instrument(async move {
				let credential = self.store.load().await?;
				let principal = match self.store.load_principal().await {
					Ok(principal) => principal,
					Err(Error::MalformedCachedState { reason }) => {
						obs::warn_event("restore", &reason);
						self.clear_local().await?;

						return Ok(self.snapshot());
					},
					Err(e) => return Err(e),
				};

				match (credential, principal) {
					(Some(credential), Some(principal)) => self.install(credential, principal),
					(None, None) => self.reset(),
					_ => {
						obs::warn_event("restore", "discarding partially persisted session");
						self.clear_local().await?;
					},
				}

				Ok(self.snapshot())
			})
			.await;

		flow.finish(&result);

		result
	}

	fn set_state(&self, state: SessionState) {
		let _guard = self.credential.write();

		self.snapshot.send_modify(|snapshot| snapshot.state = state);
	}

	fn install(&self, credential: Credential, principal: Principal) {
		let mut guard = self.credential.write();

		*guard = Some(credential);
		self.snapshot.send_replace(SessionSnapshot {
			state: SessionState::Authenticated,
			principal: Some(principal),
		});
	}

	fn replace_credential(&self, credential: Credential) {
		let mut guard = self.credential.write();

		*guard = Some(credential);
		self.snapshot.send_modify(|snapshot| snapshot.state = SessionState::Authenticated);
	}

	fn reset(&self) {
		let mut guard = self.credential.write();

		*guard = None;
		self.snapshot.send_replace(SessionSnapshot::anonymous());
	}

	// In-memory state goes first so no request picks up a credential that is being wiped.
	async fn clear_local(&self) -> Result<()> {
		self.reset();

		Ok(self.store.clear().await?)
	}

	async fn clear_local_logged(&self, stage: &'static str) {
		if let Err(e) = self.clear_local().await {
			obs::warn_event(stage, &format!("failed to clear persisted session: {e}"));
		}
	}

	// Session-ending and session-replacing transitions hold the refresh guard, so a refresh
	// that is still waiting on the network finishes first and cannot reinstate its credential
	// after the wipe.
	async fn end_session(&self, stage: &'static str) {
		let _singleflight = self.refresh_guard.lock().await;

		self.clear_local_logged(stage).await;
	}

	/// Ends the session after the server rejected it without a refresh path, then sends the
	/// operator to the login entry point carrying the current location.
	pub(crate) async fn expire(&self) -> Option<String> {
		let return_to = self.navigator.current_location();

		self.end_session("expire").await;
		self.navigator.redirect_to_login(return_to.as_deref());

		return_to
	}
}
#[cfg(feature = "reqwest")]
impl SessionManager<ReqwestTransport> {
	/// Creates an anonymous session backed by a default reqwest transport.
	pub fn new(endpoints: impl Into<Arc<EndpointTable>>, store: Arc<dyn KvStore>) -> Self {
		Self::with_http_client(endpoints, store, ReqwestTransport::default())
	}
}
impl<C> Debug for SessionManager<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionManager")
			.field("base_url", &self.endpoints.base_url.as_str())
			.field("client_id", &self.client_id)
			.field("snapshot", &*self.snapshot.borrow())
			.finish_non_exhaustive()
	}
}
