//! Platform-scoping rules checked before any assignment call leaves the process.
//!
//! Roles and permissions belong to exactly one platform. A user may only hold roles from the
//! platforms it belongs to, and a role may only carry permissions from its own platform. The
//! server enforces the same rules; checking locally keeps invalid combinations out of pickers
//! and saves a round trip.

// self
use crate::{
	_prelude::*,
	auth::{PermissionId, PlatformId, RoleId, UserId},
	directory::{Permission, Role, User},
};

/// Entities owned by exactly one platform.
pub trait PlatformScoped {
	/// Owning platform.
	fn platform_id(&self) -> PlatformId;
}
impl PlatformScoped for Role {
	fn platform_id(&self) -> PlatformId {
		self.platform_id
	}
}
impl PlatformScoped for Permission {
	fn platform_id(&self) -> PlatformId {
		self.platform_id
	}
}

/// An assignment that would cross a platform boundary.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ScopeViolation {
	/// The role's platform is not one of the user's platforms.
	#[error("Role {role} belongs to platform {role_platform}, which user {user} is not a member of.")]
	RoleOutsideUserPlatforms {
		/// User receiving the role.
		user: UserId,
		/// Role being assigned.
		role: RoleId,
		/// Platform owning the role.
		role_platform: PlatformId,
	},
	/// The permission's platform differs from the role's platform.
	#[error(
		"Permission {permission} belongs to platform {permission_platform}, but role {role} belongs to platform {role_platform}."
	)]
	PermissionOutsideRolePlatform {
		/// Role receiving the permission.
		role: RoleId,
		/// Permission being assigned.
		permission: PermissionId,
		/// Platform owning the role.
		role_platform: PlatformId,
		/// Platform owning the permission.
		permission_platform: PlatformId,
	},
}

/// Fails unless `role` may be assigned to `user`.
pub fn ensure_role_assignable(user: &User, role: &Role) -> Result<(), ScopeViolation> {
	if user.belongs_to(role.platform_id()) {
		return Ok(());
	}

	Err(ScopeViolation::RoleOutsideUserPlatforms {
		user: user.user_id,
		role: role.role_id,
		role_platform: role.platform_id(),
	})
}

/// Fails unless `permission` may be assigned to `role`.
pub fn ensure_permission_assignable(
	role: &Role,
	permission: &Permission,
) -> Result<(), ScopeViolation> {
	if permission.platform_id() == role.platform_id() {
		return Ok(());
	}

	Err(ScopeViolation::PermissionOutsideRolePlatform {
		role: role.role_id,
		permission: permission.permission_id,
		role_platform: role.platform_id(),
		permission_platform: permission.platform_id(),
	})
}

/// Roles from `roles` that may be offered to `user`.
pub fn assignable_roles<'a>(user: &User, roles: &'a [Role]) -> Vec<&'a Role> {
	roles.iter().filter(|role| ensure_role_assignable(user, role).is_ok()).collect()
}

/// Permissions from `permissions` that may be offered to `role`.
pub fn assignable_permissions<'a>(role: &Role, permissions: &'a [Permission]) -> Vec<&'a Permission> {
	permissions
		.iter()
		.filter(|permission| ensure_permission_assignable(role, permission).is_ok())
		.collect()
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn user(platform: u64) -> User {
		serde_json::from_value(json!({
			"userId": 4, "userName": "ops", "platformId": platform
		}))
		.expect("User fixture should parse.")
	}

	fn role(id: u64, platform: u64) -> Role {
		serde_json::from_value(json!({ "roleId": id, "platformId": platform, "name": "r" }))
			.expect("Role fixture should parse.")
	}

	fn permission(id: u64, platform: u64) -> Permission {
		serde_json::from_value(json!({ "permissionId": id, "platformId": platform, "name": "p" }))
			.expect("Permission fixture should parse.")
	}

	#[test]
	fn roles_must_share_a_platform_with_the_user() {
		assert_eq!(ensure_role_assignable(&user(1), &role(5, 1)), Ok(()));

		let err = ensure_role_assignable(&user(1), &role(6, 2))
			.expect_err("Cross-platform role should be rejected.");

		assert_eq!(
			err.to_string(),
			"Role 6 belongs to platform 2, which user 4 is not a member of."
		);
	}

	#[test]
	fn permissions_must_match_the_role_platform() {
		assert_eq!(ensure_permission_assignable(&role(5, 1), &permission(9, 1)), Ok(()));
		assert!(matches!(
			ensure_permission_assignable(&role(5, 1), &permission(10, 2)),
			Err(ScopeViolation::PermissionOutsideRolePlatform { .. })
		));
	}

	#[test]
	fn pickers_only_offer_same_platform_candidates() {
		let roles = [role(5, 1), role(6, 2), role(7, 1)];
		let permissions = [permission(9, 1), permission(10, 2)];
		let offered = assignable_roles(&user(1), &roles)
			.into_iter()
			.map(|role| role.role_id.get())
			.collect::<Vec<_>>();

		assert_eq!(offered, vec![5, 7]);
		assert_eq!(assignable_permissions(&role(6, 2), &permissions).len(), 1);
		assert!(assignable_roles(&user(3), &roles).is_empty());
	}
}
