//! Wire representations of the identity service's RBAC entities (camelCase JSON).

// std
use std::iter;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, PermissionId, PlatformId, RoleId, TokenSecret, UserId},
};

fn active() -> bool {
	true
}

/// Audit columns the service attaches to every entity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audit {
	/// Creation timestamp as emitted by the service.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_at: Option<String>,
	/// Creating user.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_by: Option<UserId>,
	/// Last update timestamp as emitted by the service.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_at: Option<String>,
	/// Last updating user.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_by: Option<UserId>,
}

/// A tenant/application boundary with its OAuth client registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Platform {
	/// Primary key.
	pub platform_id: PlatformId,
	/// Display name.
	pub name: String,
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// OAuth client secret; only returned on creation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_secret: Option<TokenSecret>,
	/// Free-form description.
	#[serde(default)]
	pub description: String,
	/// Allowed post-login redirect targets.
	#[serde(default)]
	pub redirect_uris: Vec<String>,
	/// Allowed post-logout redirect targets.
	#[serde(default)]
	pub post_logout_redirect_uris: Vec<String>,
	/// OAuth scopes the client may request.
	#[serde(default)]
	pub allowed_scopes: Vec<String>,
	/// Whether the platform accepts logins.
	#[serde(default = "active")]
	pub is_active: bool,
	/// Audit columns.
	#[serde(flatten)]
	pub audit: Audit,
}

/// A named bundle of permissions, owned by exactly one platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
	/// Primary key.
	pub role_id: RoleId,
	/// Owning platform; immutable after creation.
	pub platform_id: PlatformId,
	/// Role name.
	pub name: String,
	/// Free-form description.
	#[serde(default)]
	pub description: String,
	/// Whether the role is in effect.
	#[serde(default = "active")]
	pub is_active: bool,
	/// Audit columns.
	#[serde(flatten)]
	pub audit: Audit,
}

/// A (resource, action) grant, owned by exactly one platform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
	/// Primary key.
	pub permission_id: PermissionId,
	/// Owning platform.
	pub platform_id: PlatformId,
	/// Owning platform's name, when the service denormalizes it.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub platform_name: Option<String>,
	/// Permission name.
	pub name: String,
	/// Free-form description.
	#[serde(default)]
	pub description: String,
	/// Protected resource.
	#[serde(default)]
	pub resource: String,
	/// Allowed action on the resource.
	#[serde(default)]
	pub action: String,
	/// Whether the permission is in effect.
	#[serde(default = "active")]
	pub is_active: bool,
	/// Audit columns.
	#[serde(flatten)]
	pub audit: Audit,
}

/// A user account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// Primary key.
	pub user_id: UserId,
	/// Login name.
	pub user_name: String,
	/// Given name.
	#[serde(default)]
	pub first_name: String,
	/// Family name.
	#[serde(default)]
	pub last_name: String,
	/// Email address.
	#[serde(default)]
	pub email: String,
	/// Whether the account may log in.
	#[serde(default = "active")]
	pub is_active: bool,
	/// Home platform.
	pub platform_id: PlatformId,
	/// Home platform's name.
	#[serde(default)]
	pub platform_name: String,
	/// Role names currently held.
	#[serde(default)]
	pub roles: Vec<String>,
	/// Audit columns.
	#[serde(flatten)]
	pub audit: Audit,
}
impl User {
	/// Platforms the user belongs to.
	pub fn platform_ids(&self) -> impl Iterator<Item = PlatformId> + use<> {
		iter::once(self.platform_id)
	}

	/// Returns `true` when the user belongs to `platform`.
	pub fn belongs_to(&self, platform: PlatformId) -> bool {
		self.platform_ids().any(|id| id == platform)
	}
}

/// Body of a user creation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
	/// Login name.
	pub user_name: String,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Email address.
	pub email: String,
	/// Initial password.
	pub password: TokenSecret,
	/// Home platform.
	pub platform_id: PlatformId,
}

/// Body of a user update call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
	/// Login name.
	pub user_name: String,
	/// Given name.
	pub first_name: String,
	/// Family name.
	pub last_name: String,
	/// Email address.
	pub email: String,
	/// Whether the account may log in.
	pub is_active: bool,
}

/// Body of a password change call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
	/// Password being replaced.
	pub current_password: TokenSecret,
	/// Replacement password.
	pub new_password: TokenSecret,
}

/// Body of a role creation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoleRequest {
	/// Owning platform.
	pub platform_id: PlatformId,
	/// Role name.
	pub name: String,
	/// Free-form description.
	pub description: String,
}

/// Body of a role update call; a role cannot move between platforms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
	/// Role name.
	pub name: String,
	/// Free-form description.
	pub description: String,
	/// Whether the role is in effect.
	pub is_active: bool,
}

/// Body of a permission creation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermissionRequest {
	/// Permission name.
	pub name: String,
	/// Free-form description.
	pub description: String,
	/// Protected resource.
	pub resource: String,
	/// Allowed action.
	pub action: String,
	/// Owning platform.
	pub platform_id: PlatformId,
}

/// Body of a permission update call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePermissionRequest {
	/// Permission name.
	pub name: String,
	/// Free-form description.
	pub description: String,
	/// Protected resource.
	pub resource: String,
	/// Allowed action.
	pub action: String,
	/// Owning platform.
	pub platform_id: PlatformId,
	/// Whether the permission is in effect.
	pub is_active: bool,
}

/// Body of a platform creation call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlatformRequest {
	/// Display name.
	pub name: String,
	/// Free-form description.
	pub description: String,
	/// Allowed post-login redirect targets.
	pub redirect_uris: Vec<String>,
	/// Allowed post-logout redirect targets.
	pub post_logout_redirect_uris: Vec<String>,
	/// OAuth scopes the client may request.
	pub allowed_scopes: Vec<String>,
}

/// Body of a platform update call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlatformRequest {
	/// Display name.
	pub name: String,
	/// Free-form description.
	pub description: String,
	/// Allowed post-login redirect targets.
	pub redirect_uris: Vec<String>,
	/// Allowed post-logout redirect targets.
	pub post_logout_redirect_uris: Vec<String>,
	/// OAuth scopes the client may request.
	pub allowed_scopes: Vec<String>,
	/// Whether the platform accepts logins.
	pub is_active: bool,
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn entities_parse_service_payloads() {
		let role: Role = serde_json::from_value(json!({
			"roleId": 5,
			"platformId": 1,
			"name": "Auditor",
			"description": "Read-only",
			"isActive": true,
			"createdAt": "2025-01-01T00:00:00",
			"createdBy": 1
		}))
		.expect("Role payload should parse.");

		assert_eq!(role.role_id.get(), 5);
		assert_eq!(role.audit.created_by.map(UserId::get), Some(1));

		let permission: Permission = serde_json::from_value(json!({
			"permissionId": 9,
			"platformId": 1,
			"platformName": "UMS",
			"name": "users.read",
			"resource": "users",
			"action": "read"
		}))
		.expect("Permission payload should parse.");

		assert!(permission.is_active);
		assert_eq!(permission.description, "");
	}

	#[test]
	fn platform_secret_is_redacted_in_debug() {
		let platform: Platform = serde_json::from_value(json!({
			"platformId": 2,
			"name": "Billing",
			"clientId": "billing",
			"clientSecret": "s3cr3t"
		}))
		.expect("Platform payload should parse.");

		assert!(!format!("{platform:?}").contains("s3cr3t"));
		assert_eq!(
			platform.client_secret.as_ref().map(TokenSecret::expose),
			Some("s3cr3t"),
			"Secret must still be readable once on creation."
		);
	}

	#[test]
	fn role_updates_never_carry_a_platform() {
		let body = serde_json::to_value(UpdateRoleRequest {
			name: "Ops".into(),
			description: String::new(),
			is_active: false,
		})
		.expect("Update body should serialize.");

		assert_eq!(body, json!({ "name": "Ops", "description": "", "isActive": false }));
	}

	#[test]
	fn passwords_serialize_but_never_print() {
		let request = ChangePasswordRequest {
			current_password: TokenSecret::new("old-pass"),
			new_password: TokenSecret::new("new-pass"),
		};
		let body = serde_json::to_value(&request).expect("Password body should serialize.");

		assert_eq!(body, json!({ "currentPassword": "old-pass", "newPassword": "new-pass" }));
		assert!(!format!("{request:?}").contains("old-pass"));
	}
}
