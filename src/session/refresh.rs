//! Single-flight credential refresh.
//!
//! Every refresh, whether requested explicitly or triggered by a 401, runs under one async
//! guard. A caller that saw its access token rejected re-checks the credential after acquiring
//! the guard: if another caller already rotated it, the newer credential is returned without a
//! network call; if the session has meanwhile ended, the caller fails without issuing a second
//! login redirect.

mod metrics;

pub use metrics::{RefreshMetrics, RefreshStats};

// self
use crate::{
	_prelude::*,
	auth::{self, ClientId, Credential, TokenSecret},
	error::ConfigError,
	http::{ApiRequest, HttpTransport},
	obs::{self, FlowKind, FlowRecord},
	session::{SessionManager, SessionState, login::build_credential},
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshTokenRequest<'a> {
	refresh_token: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	client_id: Option<&'a ClientId>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
	access_token: String,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
}

impl<C> SessionManager<C>
where
	C: ?Sized + HttpTransport,
{
	/// Exchanges the refresh token for a new credential.
	///
	/// On failure the session is wiped, the navigator is sent to the login entry point with the
	/// current location as return target, and [`Error::RefreshFailed`] is returned.
	pub async fn refresh(&self) -> Result<Credential> {
		self.refresh_guarded(None).await
	}

	/// Refresh triggered by the server rejecting `rejected`.
	pub(crate) async fn refresh_rejected(&self, rejected: &TokenSecret) -> Result<Credential> {
		self.refresh_guarded(Some(rejected)).await
	}

	async fn refresh_guarded(&self, rejected: Option<&TokenSecret>) -> Result<Credential> {
		let flow = FlowRecord::start(FlowKind::Refresh, "refresh");
		let result = flow
			.instrument(async move {
				self.refresh_metrics.record_attempt();

				let _singleflight = self.refresh_guard.lock().await;
				let current = self.credential();

				if let Some(stale) = rejected {
					match &current {
						Some(credential) if credential.access_token != *stale => {
							self.refresh_metrics.record_coalesced();
							obs::debug_event("refresh", "credential already rotated by another caller");

							return Ok(credential.clone());
						},
						None => {
							self.refresh_metrics.record_coalesced();

							return Err(Error::RefreshFailed {
								reason: "Session ended while waiting for refresh.".into(),
								return_to: self.navigator.current_location(),
							});
						},
						Some(_) => {},
					}
				}

				let Some(current) = current else {
					return Err(self.fail_refresh("No active session to refresh.".into()).await);
				};
				let Some(refresh_secret) =
					current.refresh_token.clone().filter(|secret| !secret.is_blank())
				else {
					return Err(self.fail_refresh("No refresh token is available.".into()).await);
				};

				self.set_state(SessionState::Refreshing);

				match self.exchange(&refresh_secret).await {
					Ok(credential) => {
						self.replace_credential(credential.clone());
						self.refresh_metrics.record_success();

						Ok(credential)
					},
					Err(e) => Err(self.fail_refresh(e.to_string()).await),
				}
			})
			.await;

		flow.finish(&result);

		result
	}

	async fn exchange(&self, refresh_secret: &TokenSecret) -> Result<Credential> {
		let url = self.endpoints.url(&self.endpoints.auth.refresh, &[])?;
		let body = RefreshTokenRequest {
			refresh_token: refresh_secret.expose(),
			client_id: self.client_id.as_ref(),
		};
		let request = ApiRequest::post_json(url, &body).map_err(ConfigError::from)?;
		let response = self.http_client.execute(request).await?;

		if !response.is_success() {
			return Err(response.into_api_error());
		}

		let body: TokenResponse = response.json()?;
		let claims = auth::decode(&body.access_token).ok();
		// Servers that do not rotate refresh tokens omit the field; keep the previous one.
		let refresh = body
			.refresh_token
			.map(TokenSecret::new)
			.filter(|secret| !secret.is_blank())
			.unwrap_or_else(|| refresh_secret.clone());
		let credential =
			build_credential(body.access_token, Some(refresh), body.expires_in, claims.as_ref())?;

		self.store.save(&credential).await?;

		Ok(credential)
	}

	async fn fail_refresh(&self, reason: String) -> Error {
		self.refresh_metrics.record_failure();

		let return_to = self.navigator.current_location();

		obs::warn_event("refresh", &reason);
		self.clear_local_logged("refresh").await;
		self.navigator.redirect_to_login(return_to.as_deref());

		Error::RefreshFailed { reason, return_to }
	}
}
