//! Observable lifecycle state of the operator session.

// self
use crate::{_prelude::*, auth::Principal};

/// Lifecycle state of the operator's session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
	/// No credential is held.
	Anonymous,
	/// A login call is in flight.
	Authenticating,
	/// A credential and principal are held.
	Authenticated,
	/// A refresh call is in flight; the previous credential is still held.
	Refreshing,
}
impl SessionState {
	/// Returns `true` while a usable credential is held.
	pub const fn is_authenticated(self) -> bool {
		matches!(self, Self::Authenticated | Self::Refreshing)
	}
}

/// Observable view of the session published to subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
	/// Current lifecycle state.
	pub state: SessionState,
	/// Operator behind the credential, when authenticated.
	pub principal: Option<Principal>,
}
impl SessionSnapshot {
	/// Snapshot of a session with no credential.
	pub const fn anonymous() -> Self {
		Self { state: SessionState::Anonymous, principal: None }
	}

	/// Returns `true` while a usable credential is held.
	pub fn is_authenticated(&self) -> bool {
		self.state.is_authenticated()
	}
}
impl Default for SessionSnapshot {
	fn default() -> Self {
		Self::anonymous()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn refreshing_still_counts_as_authenticated() {
		assert!(SessionState::Refreshing.is_authenticated());
		assert!(SessionState::Authenticated.is_authenticated());
		assert!(!SessionState::Authenticating.is_authenticated());
		assert!(!SessionSnapshot::default().is_authenticated());
	}
}
