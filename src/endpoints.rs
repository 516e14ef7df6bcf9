//! Statically loaded endpoint table (base URL + path templates) for the identity service.
//!
//! The table mirrors the `endpoints.json` file the console ships with. Templates use `{name}`
//! placeholders that [`EndpointTable::url`] fills in and percent-encodes.

// std
use std::{fs, path::Path};
// self
use crate::{_prelude::*, error::ConfigError};

/// Path parameters substituted into a template.
pub type PathParams<'a> = &'a [(&'a str, &'a dyn Display)];

/// Credential issuance, revocation, and profile endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthEndpoints {
	/// OAuth token endpoint.
	pub token: String,
	/// User-info endpoint.
	pub user_info: String,
	/// Password login endpoint.
	pub login: String,
	/// Self-registration endpoint.
	pub register: String,
	/// Logout (refresh token revocation) endpoint.
	pub logout: String,
	/// Refresh endpoint.
	pub refresh: String,
	/// Revoke-all-sessions endpoint.
	pub revoke_all: String,
}

/// User administration endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserEndpoints {
	/// List all users.
	pub list: String,
	/// Fetch one user (`{id}`).
	pub get_by_id: String,
	/// Create a user.
	pub create: String,
	/// Update a user (`{id}`).
	pub update: String,
	/// Delete a user (`{id}`).
	pub delete: String,
	/// Change a user's password (`{id}`).
	pub change_password: String,
	/// Assign a role (`{userId}`, `{roleId}`).
	pub assign_role: String,
	/// Remove a role (`{userId}`, `{roleId}`).
	pub remove_role: String,
}

/// Role administration endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleEndpoints {
	/// List all roles.
	pub list: String,
	/// Fetch one role (`{id}`).
	pub get_by_id: String,
	/// Create a role.
	pub create: String,
	/// Update a role (`{id}`).
	pub update: String,
	/// Delete a role (`{id}`).
	pub delete: String,
	/// List a role's permissions (`{roleId}`).
	pub get_permissions: String,
	/// Assign a permission (`{roleId}`, `{permissionId}`).
	pub assign_permission: String,
	/// Remove a permission (`{roleId}`, `{permissionId}`).
	pub remove_permission: String,
}

/// Permission administration endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionEndpoints {
	/// List all permissions.
	pub list: String,
	/// Fetch one permission (`{id}`).
	pub get_by_id: String,
	/// List permissions of one platform (`{platformId}`).
	pub get_by_platform: String,
	/// Create a permission.
	pub create: String,
	/// Update a permission (`{id}`).
	pub update: String,
	/// Delete a permission (`{id}`).
	pub delete: String,
}

/// Platform administration endpoints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformEndpoints {
	/// List all platforms.
	pub list: String,
	/// Fetch one platform (`{id}`).
	pub get_by_id: String,
	/// Fetch one platform by OAuth client identifier (`{clientId}`).
	pub get_by_client_id: String,
	/// Create a platform.
	pub create: String,
	/// Update a platform (`{id}`).
	pub update: String,
	/// Delete a platform (`{id}`).
	pub delete: String,
}

/// Administrative endpoint groups.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminEndpoints {
	/// User endpoints.
	pub users: UserEndpoints,
	/// Role endpoints.
	pub roles: RoleEndpoints,
	/// Permission endpoints.
	pub permissions: PermissionEndpoints,
	/// Platform endpoints.
	pub platforms: PlatformEndpoints,
}

/// Base URL plus every endpoint template the console calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointTable {
	/// Origin (and optional path prefix) of the identity service.
	pub base_url: Url,
	/// Credential endpoints.
	pub auth: AuthEndpoints,
	/// Administrative endpoints.
	pub admin: AdminEndpoints,
}
impl EndpointTable {
	/// Parses a table from JSON text.
	pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_str(json);

		serde_path_to_error::deserialize(de)
			.map_err(|source| ConfigError::EndpointTableParse { source })
	}

	/// Reads and parses a table from disk.
	pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let text = fs::read_to_string(path).map_err(|source| ConfigError::EndpointTableRead {
			path: path.display().to_string(),
			source,
		})?;

		Self::from_json_str(&text)
	}

	/// Builds a table with the identity service's conventional path layout.
	pub fn with_default_paths(base_url: Url) -> Self {
		fn s(value: &str) -> String {
			value.to_owned()
		}

		Self {
			base_url,
			auth: AuthEndpoints {
				token: s("/connect/token"),
				user_info: s("/connect/userinfo"),
				login: s("/api/auth/login"),
				register: s("/api/auth/register"),
				logout: s("/api/auth/logout"),
				refresh: s("/api/auth/refresh"),
				revoke_all: s("/api/auth/revoke-all"),
			},
			admin: AdminEndpoints {
				users: UserEndpoints {
					list: s("/api/users"),
					get_by_id: s("/api/users/{id}"),
					create: s("/api/users"),
					update: s("/api/users/{id}"),
					delete: s("/api/users/{id}"),
					change_password: s("/api/users/{id}/password"),
					assign_role: s("/api/users/{userId}/roles/{roleId}"),
					remove_role: s("/api/users/{userId}/roles/{roleId}"),
				},
				roles: RoleEndpoints {
					list: s("/api/roles"),
					get_by_id: s("/api/roles/{id}"),
					create: s("/api/roles"),
					update: s("/api/roles/{id}"),
					delete: s("/api/roles/{id}"),
					get_permissions: s("/api/roles/{roleId}/permissions"),
					assign_permission: s("/api/roles/{roleId}/permissions/{permissionId}"),
					remove_permission: s("/api/roles/{roleId}/permissions/{permissionId}"),
				},
				permissions: PermissionEndpoints {
					list: s("/api/permissions"),
					get_by_id: s("/api/permissions/{id}"),
					get_by_platform: s("/api/permissions/platform/{platformId}"),
					create: s("/api/permissions"),
					update: s("/api/permissions/{id}"),
					delete: s("/api/permissions/{id}"),
				},
				platforms: PlatformEndpoints {
					list: s("/api/platforms"),
					get_by_id: s("/api/platforms/{id}"),
					get_by_client_id: s("/api/platforms/client/{clientId}"),
					create: s("/api/platforms"),
					update: s("/api/platforms/{id}"),
					delete: s("/api/platforms/{id}"),
				},
			},
		}
	}

	/// Expands `template` with `params` and appends its segments to the base URL's path.
	///
	/// Each expanded segment is percent-encoded as a path segment, so `/`, `?`, and spaces in
	/// parameter values cannot change which resource is addressed.
	pub fn url(&self, template: &str, params: PathParams<'_>) -> Result<Url, ConfigError> {
		let segments = template
			.split('/')
			.filter(|segment| !segment.is_empty())
			.map(|segment| expand_segment(template, segment, params))
			.collect::<Result<Vec<_>, _>>()?;
		let mut url = self.base_url.clone();

		url.path_segments_mut()
			.map_err(|()| ConfigError::InvalidEndpointUrl {
				url: self.base_url.to_string(),
				source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
			})?
			.pop_if_empty()
			.extend(&segments);

		Ok(url)
	}

	/// Returns `true` if `url` targets an endpoint that issues credentials (login, register,
	/// refresh, token). Such requests must never carry or refresh a bearer credential.
	pub fn is_credential_issuing(&self, url: &Url) -> bool {
		let target = url.path().trim_end_matches('/');

		[&self.auth.login, &self.auth.register, &self.auth.refresh, &self.auth.token]
			.into_iter()
			.filter_map(|template| self.url(template, &[]).ok())
			.any(|candidate| candidate.path().trim_end_matches('/') == target)
	}
}

fn expand_segment(
	template: &str,
	segment: &str,
	params: PathParams<'_>,
) -> Result<String, ConfigError> {
	let mut expanded = String::with_capacity(segment.len());
	let mut rest = segment;

	while let Some(open) = rest.find('{') {
		expanded.push_str(&rest[..open]);

		let tail = &rest[open + 1..];
		let close = tail.find('}').unwrap_or(tail.len());
		let name = &tail[..close];
		let (_, value) = params.iter().find(|(key, _)| *key == name).ok_or_else(|| {
			ConfigError::MissingPathParam { template: template.to_owned(), param: name.to_owned() }
		})?;

		expanded.push_str(&value.to_string());
		rest = tail.get(close + 1..).unwrap_or_default();
	}

	expanded.push_str(rest);

	Ok(expanded)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::{ClientId, RoleId, UserId};

	fn table() -> EndpointTable {
		EndpointTable::with_default_paths(
			Url::parse("https://ums.example.com/").expect("Base URL fixture should parse."),
		)
	}

	#[test]
	fn expands_placeholders_and_joins_base() {
		let table = table();
		let user = UserId::new(4).expect("User fixture should be valid.");
		let role = RoleId::new(9).expect("Role fixture should be valid.");
		let url = table
			.url(&table.admin.users.assign_role, &[("userId", &user), ("roleId", &role)])
			.expect("Assign-role URL should build.");

		assert_eq!(url.as_str(), "https://ums.example.com/api/users/4/roles/9");
	}

	#[test]
	fn percent_encodes_parameter_values() {
		let table = table();
		let client = ClientId::new("ums/admin").expect("Client fixture should be valid.");
		let url = table
			.url(&table.admin.platforms.get_by_client_id, &[("clientId", &client)])
			.expect("Client lookup URL should build.");

		assert_eq!(url.path(), "/api/platforms/client/ums%2Fadmin");
	}

	#[test]
	fn spaces_in_values_are_path_encoded() {
		let table = table();
		let url = table
			.url(&table.admin.platforms.get_by_client_id, &[("clientId", &"billing console")])
			.expect("Client lookup URL should build.");

		assert_eq!(url.path(), "/api/platforms/client/billing%20console");
		assert_eq!(
			url.path_segments().and_then(|mut segments| segments.next_back()),
			Some("billing%20console")
		);
	}

	#[test]
	fn missing_parameters_are_reported() {
		let table = table();
		let err = table
			.url(&table.admin.roles.assign_permission, &[("roleId", &1)])
			.expect_err("Unfilled placeholder should be rejected.");

		assert!(matches!(
			err,
			ConfigError::MissingPathParam { ref param, .. } if param == "permissionId"
		));
	}

	#[test]
	fn credential_issuing_endpoints_are_detected() {
		let table = table();
		let login = table.url(&table.auth.login, &[]).expect("Login URL should build.");
		let refresh = table.url(&table.auth.refresh, &[]).expect("Refresh URL should build.");
		let users = table.url(&table.admin.users.list, &[]).expect("Users URL should build.");
		let logout = table.url(&table.auth.logout, &[]).expect("Logout URL should build.");

		assert!(table.is_credential_issuing(&login));
		assert!(table.is_credential_issuing(&refresh));
		assert!(!table.is_credential_issuing(&users));
		assert!(!table.is_credential_issuing(&logout));
	}

	#[test]
	fn base_url_path_prefix_is_kept() {
		let table = EndpointTable::with_default_paths(
			Url::parse("https://ums.example.com/identity").expect("Prefixed base should parse."),
		);
		let url = table.url(&table.admin.roles.list, &[]).expect("Roles URL should build.");

		assert_eq!(url.as_str(), "https://ums.example.com/identity/api/roles");
	}

	#[test]
	fn parses_endpoint_json_with_path_errors() {
		let json = serde_json::to_string(&table()).expect("Table should serialize.");
		let parsed = EndpointTable::from_json_str(&json).expect("Serialized table should parse.");

		assert_eq!(parsed, table());

		let err = EndpointTable::from_json_str(r#"{"baseUrl":"https://x","auth":{}}"#)
			.expect_err("Incomplete table should be rejected.");

		match err {
			ConfigError::EndpointTableParse { source } =>
				assert!(source.path().to_string().starts_with("auth")),
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}
