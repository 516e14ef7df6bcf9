//! Request authorizer: bearer attachment plus the refresh-and-retry-once protocol.
//!
//! Every protected call flows through [`Authorizer::dispatch`]:
//!
//! 1. Requests aimed at a credential-issuing endpoint (login, register, refresh, token) pass
//!    through untouched.
//! 2. Otherwise a clone of the request carries `Authorization: Bearer <access token>`.
//! 3. A 401 with a refresh token available triggers the session's single-flight refresh, then one
//!    retry with the new credential; whatever the retry yields is returned. Without a refresh
//!    token the session is ended and [`Error::TokenExpiredOrInvalid`] is returned.
//! 4. Every other status is handed back as-is.

// self
use crate::{
	_prelude::*,
	http::{ApiRequest, ApiResponse, HttpTransport},
	obs,
	session::SessionManager,
};

/// Attaches the session's credential to outbound requests and recovers from rejections.
pub struct Authorizer<C>
where
	C: ?Sized + HttpTransport,
{
	session: Arc<SessionManager<C>>,
}
impl<C> Authorizer<C>
where
	C: ?Sized + HttpTransport,
{
	/// Wraps a shared session.
	pub fn new(session: Arc<SessionManager<C>>) -> Self {
		Self { session }
	}

	/// Session whose credential is attached.
	pub fn session(&self) -> &Arc<SessionManager<C>> {
		&self.session
	}

	/// Sends `request`; the caller's value is never mutated.
	pub async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse> {
		authorize(&self.session, request).await
	}
}
impl<C> Clone for Authorizer<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { session: self.session.clone() }
	}
}
impl<C> Debug for Authorizer<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authorizer").field("session", &self.session).finish()
	}
}

pub(crate) async fn authorize<C>(
	session: &SessionManager<C>,
	request: &ApiRequest,
) -> Result<ApiResponse>
where
	C: ?Sized + HttpTransport,
{
	if session.endpoints.is_credential_issuing(&request.url) {
		obs::debug_event("authorize", "credential-issuing endpoint bypasses bearer attachment");

		return Ok(session.http_client.execute(request.clone()).await?);
	}

	let credential = session.credential();
	let outbound = match &credential {
		Some(credential) => request.bearer(credential.access_token.bearer_header()),
		None => request.clone(),
	};
	let response = session.http_client.execute(outbound).await?;

	if !response.is_unauthorized() {
		return Ok(response);
	}

	match credential {
		Some(credential) if credential.can_refresh() => {
			let refreshed = session.refresh_rejected(&credential.access_token).await?;
			let retry = request.bearer(refreshed.access_token.bearer_header());

			Ok(session.http_client.execute(retry).await?)
		},
		_ => {
			let message =
				response.error_message().unwrap_or_else(|| "Unauthorized".to_owned());

			session.expire().await;

			Err(Error::TokenExpiredOrInvalid { message })
		},
	}
}
