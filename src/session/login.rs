//! Login, logout, registration, revocation, and profile flows.

// self
use crate::{
	_prelude::*,
	auth::{self, Claims, ClientId, Credential, PlatformId, Principal, TokenSecret},
	authorizer,
	directory::User,
	error::ConfigError,
	http::{ApiRequest, HttpTransport},
	obs::{self, FlowKind, FlowRecord},
	session::{SessionManager, SessionState},
};

const LOGIN_FAILED: &str = "Login failed.";

/// Password login payload.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: TokenSecret,
	/// Platform the login is for; defaults to the session's configured client.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_id: Option<ClientId>,
	/// Client secret for confidential platforms.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<TokenSecret>,
}
impl LoginRequest {
	/// Creates a login request for the session's default client.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			email: email.into(),
			password: TokenSecret::new(password),
			client_id: None,
			client_secret: None,
		}
	}

	/// Targets a specific platform client.
	pub fn with_client(mut self, client_id: ClientId, secret: Option<TokenSecret>) -> Self {
		self.client_id = Some(client_id);
		self.client_secret = secret;

		self
	}
}

/// Self-registration payload.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
	/// Login name.
	pub user_name: String,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Email address.
	pub email: String,
	/// Chosen password.
	pub password: TokenSecret,
	/// Home platform.
	pub platform_id: PlatformId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
	// The body's `success` flag is ignored; a 2xx status with an access token is what counts.
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	refresh_token: Option<String>,
	#[serde(default)]
	expires_in: Option<i64>,
	#[serde(default)]
	user: Option<User>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LogoutRequest<'a> {
	#[serde(skip_serializing_if = "Option::is_none")]
	refresh_token: Option<&'a str>,
}

impl<C> SessionManager<C>
where
	C: ?Sized + HttpTransport,
{
	/// Authenticates with email + password.
	///
	/// Success requires a 2xx status and a non-empty access token. Any failure leaves the session
	/// `Anonymous` with nothing persisted; server rejections surface as
	/// [`Error::AuthenticationFailed`] carrying the server's message verbatim.
	pub async fn login(&self, request: LoginRequest) -> Result<Principal> {
		let flow = FlowRecord::start(FlowKind::Login, "login");
		let result = flow
			.instrument(async move {
				self.set_state(SessionState::Authenticating);

				match self.login_inner(request).await {
					Ok(principal) => Ok(principal),
					Err(e) => {
						self.end_session("login").await;

						Err(e)
					},
				}
			})
			.await;

		flow.finish(&result);

		result
	}

	async fn login_inner(&self, mut request: LoginRequest) -> Result<Principal> {
		if request.client_id.is_none() {
			request.client_id = self.client_id.clone();
		}

		let url = self.endpoints.url(&self.endpoints.auth.login, &[])?;
		let outbound = ApiRequest::post_json(url, &request).map_err(ConfigError::from)?;
		let response = self.http_client.execute(outbound).await?;

		if !response.is_success() {
			let message = response.error_message().unwrap_or_else(|| LOGIN_FAILED.to_owned());

			return Err(Error::AuthenticationFailed { message });
		}

		let body: LoginResponse = response.json()?;
		let Some(access) = body.access_token.filter(|token| !token.trim().is_empty()) else {
			let message = body
				.message
				.filter(|message| !message.trim().is_empty())
				.unwrap_or_else(|| LOGIN_FAILED.to_owned());

			return Err(Error::AuthenticationFailed { message });
		};
		let claims = auth::decode(&access).ok();
		let credential = build_credential(
			access,
			body.refresh_token.map(TokenSecret::new),
			body.expires_in,
			claims.as_ref(),
		)?;
		let principal = match (body.user, claims) {
			(Some(user), _) => Principal::from_user(&user),
			(None, Some(claims)) if claims.sub.is_some() => principal_from_claims(&claims)?,
			(None, _) => {
				let claims = self.user_info_with(&credential).await?;

				principal_from_claims(&claims)?
			},
		};

		let _singleflight = self.refresh_guard.lock().await;

		self.store.save_session(&credential, &principal).await?;
		self.install(credential, principal.clone());

		Ok(principal)
	}

	/// Ends the session.
	///
	/// The server is asked to revoke the refresh token on a best-effort basis; its failures are
	/// logged and ignored. Local state is always wiped and the navigator is told to show the
	/// login entry point without a return target.
	pub async fn logout(&self) {
		let flow = FlowRecord::start(FlowKind::Logout, "logout");

		flow.instrument(async move {
			if let Some(credential) = self.credential() {
				let revoked = self.revoke_remote(&credential).await;

				if let Err(e) = revoked {
					obs::warn_event("logout", &format!("logout call failed: {e}"));
				}
			}

			self.end_session("logout").await;
			self.navigator.redirect_to_login(None);
		})
		.await;
		flow.succeed();
	}

	async fn revoke_remote(&self, credential: &Credential) -> Result<()> {
		let url = self.endpoints.url(&self.endpoints.auth.logout, &[])?;
		let body = LogoutRequest {
			refresh_token: credential.refresh_token.as_ref().map(TokenSecret::expose),
		};
		let request = ApiRequest::post_json(url, &body)
			.map_err(ConfigError::from)?
			.bearer(credential.access_token.bearer_header());
		let response = self.http_client.execute(request).await?;

		if response.is_success() { Ok(()) } else { Err(response.into_api_error()) }
	}

	/// Registers a new account. The current session is left untouched.
	pub async fn register(&self, request: RegisterRequest) -> Result<User> {
		let flow = FlowRecord::start(FlowKind::Register, "register");
		let result = flow
			.instrument(async move {
				let url = self.endpoints.url(&self.endpoints.auth.register, &[])?;
				let outbound = ApiRequest::post_json(url, &request).map_err(ConfigError::from)?;
				let response = self.http_client.execute(outbound).await?;

				if !response.is_success() {
					return Err(response.into_api_error());
				}

				response.json()
			})
			.await;

		flow.finish(&result);

		result
	}

	/// Revokes every session of the operator (all devices), then wipes local state.
	pub async fn revoke_all(&self) -> Result<()> {
		let flow = FlowRecord::start(FlowKind::RevokeAll, "revoke_all");
		let result = flow
			.instrument(async move {
				let url = self.endpoints.url(&self.endpoints.auth.revoke_all, &[])?;
				let request = ApiRequest::post_json(url, &serde_json::json!({}))
					.map_err(ConfigError::from)?;
				let response = authorizer::authorize(self, &request).await?;

				if !response.is_success() {
					return Err(response.into_api_error());
				}

				{
					let _singleflight = self.refresh_guard.lock().await;

					self.clear_local().await?;
				}

				self.navigator.redirect_to_login(None);

				Ok(())
			})
			.await;

		flow.finish(&result);

		result
	}

	/// Fetches the operator's profile claims from the user-info endpoint.
	pub async fn fetch_user_info(&self) -> Result<Claims> {
		let flow = FlowRecord::start(FlowKind::UserInfo, "fetch_user_info");
		let result = flow
			.instrument(async move {
				let url = self.endpoints.url(&self.endpoints.auth.user_info, &[])?;
				let response = authorizer::authorize(self, &ApiRequest::get(url)).await?;

				if !response.is_success() {
					return Err(response.into_api_error());
				}

				Ok(auth::parse_claims(&response.body)?)
			})
			.await;

		flow.finish(&result);

		result
	}

	// Used during login, before the credential is installed.
	async fn user_info_with(&self, credential: &Credential) -> Result<Claims> {
		let url = self.endpoints.url(&self.endpoints.auth.user_info, &[])?;
		let request = ApiRequest::get(url).bearer(credential.access_token.bearer_header());
		let response = self.http_client.execute(request).await?;

		if !response.is_success() {
			return Err(response.into_api_error());
		}

		Ok(auth::parse_claims(&response.body)?)
	}
}

/// Builds a credential from a token response; `expires_in` wins, then the token's `exp` claim.
pub(crate) fn build_credential(
	access: String,
	refresh: Option<TokenSecret>,
	expires_in: Option<i64>,
	claims: Option<&Claims>,
) -> Result<Credential> {
	let mut builder = Credential::builder()
		.access_token(access)
		.refresh_secret(refresh)
		.maybe_expires_at(claims.and_then(Claims::expires_at));

	match expires_in {
		Some(secs) if secs < 0 => return Err(ConfigError::InvalidExpiresIn { value: secs }.into()),
		Some(0) | None => {},
		Some(secs) => builder = builder.expires_in(Duration::seconds(secs)),
	}

	Ok(builder.build().map_err(ConfigError::from)?)
}

fn principal_from_claims(claims: &Claims) -> Result<Principal> {
	Principal::from_claims(claims).map_err(|e| Error::AuthenticationFailed { message: e.to_string() })
}
