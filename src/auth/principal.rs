//! Cached snapshot of the operator behind the current credential.

// self
use crate::{
	_prelude::*,
	auth::{Claims, PlatformId, PrincipalId, UserId},
	directory::User,
};

/// Role name that unlocks the administrative screens.
pub const ADMIN_ROLE: &str = "Admin";

/// Errors raised when a principal cannot be derived.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PrincipalError {
	/// Claims carry no usable subject.
	#[error("Token claims do not identify a subject.")]
	MissingSubject,
}

/// The authenticated operator: identity, display name, and role names per platform.
///
/// Derived from the login response (or decoded claims) and cached next to the credential; the
/// two are invalidated together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
	/// Stable subject identifier.
	pub id: PrincipalId,
	/// Numeric account key, when known.
	#[serde(default)]
	pub user_id: Option<UserId>,
	/// Login name.
	#[serde(default)]
	pub user_name: String,
	/// Human-readable name.
	pub display_name: String,
	/// Email address.
	#[serde(default)]
	pub email: Option<String>,
	/// Role names keyed by the platform they belong to.
	#[serde(default)]
	pub platform_roles: BTreeMap<PlatformId, BTreeSet<String>>,
}
impl Principal {
	/// Builds a principal from the service's user representation.
	pub fn from_user(user: &User) -> Self {
		let display_name = [user.first_name.trim(), user.last_name.trim()]
			.into_iter()
			.filter(|part| !part.is_empty())
			.collect::<Vec<_>>()
			.join(" ");
		let display_name = if display_name.is_empty() { user.user_name.clone() } else { display_name };
		let mut platform_roles = BTreeMap::new();

		platform_roles.insert(user.platform_id, user.roles.iter().cloned().collect());

		Self {
			id: PrincipalId::from(user.user_id),
			user_id: Some(user.user_id),
			user_name: user.user_name.clone(),
			display_name,
			email: Some(user.email.clone()).filter(|email| !email.is_empty()),
			platform_roles,
		}
	}

	/// Builds a principal from decoded token claims.
	///
	/// Every platform listed in the token receives the token's role names.
	pub fn from_claims(claims: &Claims) -> Result<Self, PrincipalError> {
		let subject = claims.sub.as_deref().ok_or(PrincipalError::MissingSubject)?;
		let id = PrincipalId::new(subject).map_err(|_| PrincipalError::MissingSubject)?;
		let roles = claims.roles.iter().cloned().collect::<BTreeSet<_>>();
		let platform_roles = claims
			.platforms
			.iter()
			.map(|membership| (membership.platform_id, roles.clone()))
			.collect();

		Ok(Self {
			user_id: subject.parse().ok(),
			user_name: claims.username.clone().unwrap_or_default(),
			display_name: claims.display_name().unwrap_or_else(|| subject.to_owned()),
			email: claims.email.clone(),
			platform_roles,
			id,
		})
	}

	/// Returns `true` when the principal holds `role` on any platform.
	pub fn has_role(&self, role: &str) -> bool {
		self.platform_roles.values().any(|roles| roles.contains(role))
	}

	/// Returns `true` when the principal holds the administrator role.
	pub fn is_admin(&self) -> bool {
		self.has_role(ADMIN_ROLE)
	}

	/// Role names held on `platform`.
	pub fn roles_for(&self, platform: PlatformId) -> impl Iterator<Item = &str> {
		self.platform_roles.get(&platform).into_iter().flatten().map(String::as_str)
	}

	/// Platforms the principal belongs to.
	pub fn platforms(&self) -> impl Iterator<Item = PlatformId> + '_ {
		self.platform_roles.keys().copied()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::PlatformMembership;

	fn platform(id: u64) -> PlatformId {
		PlatformId::new(id).expect("Platform fixture should be valid.")
	}

	fn user_fixture() -> User {
		serde_json::from_value(serde_json::json!({
			"userId": 12,
			"userName": "ada",
			"firstName": "Ada",
			"lastName": "Lovelace",
			"email": "ada@example.com",
			"isActive": true,
			"platformId": 1,
			"platformName": "UMS",
			"roles": ["Admin", "Auditor"]
		}))
		.expect("User fixture should deserialize.")
	}

	#[test]
	fn user_derived_principal_maps_roles_to_home_platform() {
		let principal = Principal::from_user(&user_fixture());

		assert_eq!(principal.id.as_ref(), "12");
		assert_eq!(principal.display_name, "Ada Lovelace");
		assert!(principal.is_admin());
		assert_eq!(principal.roles_for(platform(1)).collect::<Vec<_>>(), vec!["Admin", "Auditor"]);
		assert_eq!(principal.roles_for(platform(2)).count(), 0);
	}

	#[test]
	fn claims_derived_principal_spreads_roles_over_memberships() {
		let claims = Claims {
			sub: Some("99".into()),
			username: Some("grace".into()),
			roles: vec!["Operator".into()],
			platforms: vec![
				PlatformMembership {
					platform_id: platform(1),
					name: "UMS".into(),
					client_id: "ums".into(),
					redirect_uris: Vec::new(),
					post_logout_redirect_uris: Vec::new(),
				},
				PlatformMembership {
					platform_id: platform(3),
					name: "Billing".into(),
					client_id: "billing".into(),
					redirect_uris: Vec::new(),
					post_logout_redirect_uris: Vec::new(),
				},
			],
			..Claims::default()
		};
		let principal = Principal::from_claims(&claims).expect("Claims with a subject should map.");

		assert_eq!(principal.user_id.map(UserId::get), Some(99));
		assert_eq!(principal.display_name, "grace");
		assert_eq!(principal.platforms().collect::<Vec<_>>(), vec![platform(1), platform(3)]);
		assert!(principal.has_role("Operator"));
		assert!(!principal.is_admin());
	}

	#[test]
	fn claims_without_subject_are_rejected() {
		assert_eq!(Principal::from_claims(&Claims::default()), Err(PrincipalError::MissingSubject));
	}

	#[test]
	fn principal_snapshot_round_trips_through_json() {
		let principal = Principal::from_user(&user_fixture());
		let json = serde_json::to_string(&principal).expect("Principal should serialize.");
		let restored: Principal = serde_json::from_str(&json).expect("Principal should deserialize.");

		assert_eq!(restored, principal);
	}
}
