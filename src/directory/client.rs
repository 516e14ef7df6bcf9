//! Typed CRUD and assignment calls, dispatched through the request authorizer.
//!
//! Nothing is cached: every call returns the server's current representation. Assignments check
//! the platform-scoping rules first and fail with [`Error::ScopeViolation`] before any request
//! is sent.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, PermissionId, PlatformId, RoleId, UserId},
	authorizer::Authorizer,
	directory::{
		ChangePasswordRequest, CreatePermissionRequest, CreatePlatformRequest, CreateRoleRequest,
		CreateUserRequest, Permission, Platform, Role, UpdatePermissionRequest,
		UpdatePlatformRequest, UpdateRoleRequest, UpdateUserRequest, User, scope,
	},
	endpoints::{EndpointTable, PathParams},
	error::ConfigError,
	http::{ApiRequest, ApiResponse, HttpTransport},
	session::SessionManager,
};

/// Data-access client for the identity service's administrative API.
pub struct DirectoryClient<C>
where
	C: ?Sized + HttpTransport,
{
	authorizer: Authorizer<C>,
}
impl<C> DirectoryClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client that authenticates through `session`.
	pub fn new(session: Arc<SessionManager<C>>) -> Self {
		Self { authorizer: Authorizer::new(session) }
	}

	/// Creates a client sharing an existing authorizer.
	pub fn with_authorizer(authorizer: Authorizer<C>) -> Self {
		Self { authorizer }
	}

	/// Authorizer every call is dispatched through.
	pub fn authorizer(&self) -> &Authorizer<C> {
		&self.authorizer
	}

	fn endpoints(&self) -> &EndpointTable {
		&self.authorizer.session().endpoints
	}

	fn url(&self, template: &str, params: PathParams<'_>) -> Result<Url> {
		Ok(self.endpoints().url(template, params)?)
	}

	async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		let response = self.authorizer.dispatch(&request).await?;

		if response.is_success() {
			return Ok(response);
		}
		if response.is_unauthorized() {
			let message = response.error_message().unwrap_or_else(|| "Unauthorized".to_owned());

			return Err(Error::TokenExpiredOrInvalid { message });
		}

		Err(response.into_api_error())
	}

	async fn fetch<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.send(request).await?.json()
	}

	async fn get<T>(&self, url: Url) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.fetch(ApiRequest::get(url)).await
	}

	async fn post<B, T>(&self, url: Url, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.fetch(ApiRequest::post_json(url, body).map_err(ConfigError::from)?).await
	}

	async fn put<B, T>(&self, url: Url, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.fetch(ApiRequest::put_json(url, body).map_err(ConfigError::from)?).await
	}

	async fn post_empty(&self, url: Url) -> Result<()> {
		let request =
			ApiRequest::post_json(url, &serde_json::json!({})).map_err(ConfigError::from)?;

		self.send(request).await.map(drop)
	}

	async fn delete(&self, url: Url) -> Result<()> {
		self.send(ApiRequest::delete(url)).await.map(drop)
	}

	/// Lists every user.
	pub async fn list_users(&self) -> Result<Vec<User>> {
		self.get(self.url(&self.endpoints().admin.users.list, &[])?).await
	}

	/// Fetches one user.
	pub async fn get_user(&self, id: UserId) -> Result<User> {
		self.get(self.url(&self.endpoints().admin.users.get_by_id, &[("id", &id)])?).await
	}

	/// Creates a user.
	pub async fn create_user(&self, request: &CreateUserRequest) -> Result<User> {
		self.post(self.url(&self.endpoints().admin.users.create, &[])?, request).await
	}

	/// Updates a user.
	pub async fn update_user(&self, id: UserId, request: &UpdateUserRequest) -> Result<User> {
		self.put(self.url(&self.endpoints().admin.users.update, &[("id", &id)])?, request).await
	}

	/// Deletes a user.
	pub async fn delete_user(&self, id: UserId) -> Result<()> {
		self.delete(self.url(&self.endpoints().admin.users.delete, &[("id", &id)])?).await
	}

	/// Changes a user's password.
	pub async fn change_password(&self, id: UserId, request: &ChangePasswordRequest) -> Result<()> {
		let url = self.url(&self.endpoints().admin.users.change_password, &[("id", &id)])?;

		self.send(ApiRequest::put_json(url, request).map_err(ConfigError::from)?).await.map(drop)
	}

	/// Assigns `role` to `user` after checking both share a platform.
	pub async fn assign_role_to_user(&self, user: &User, role: &Role) -> Result<()> {
		scope::ensure_role_assignable(user, role)?;

		let url = self.url(
			&self.endpoints().admin.users.assign_role,
			&[("userId", &user.user_id), ("roleId", &role.role_id)],
		)?;

		self.post_empty(url).await
	}

	/// Removes a role from a user.
	pub async fn remove_role_from_user(&self, user: UserId, role: RoleId) -> Result<()> {
		let url = self.url(
			&self.endpoints().admin.users.remove_role,
			&[("userId", &user), ("roleId", &role)],
		)?;

		self.delete(url).await
	}

	/// Lists every role.
	pub async fn list_roles(&self) -> Result<Vec<Role>> {
		self.get(self.url(&self.endpoints().admin.roles.list, &[])?).await
	}

	/// Fetches one role.
	pub async fn get_role(&self, id: RoleId) -> Result<Role> {
		self.get(self.url(&self.endpoints().admin.roles.get_by_id, &[("id", &id)])?).await
	}

	/// Creates a role on the request's platform.
	pub async fn create_role(&self, request: &CreateRoleRequest) -> Result<Role> {
		self.post(self.url(&self.endpoints().admin.roles.create, &[])?, request).await
	}

	/// Updates a role; its platform never changes.
	pub async fn update_role(&self, id: RoleId, request: &UpdateRoleRequest) -> Result<Role> {
		self.put(self.url(&self.endpoints().admin.roles.update, &[("id", &id)])?, request).await
	}

	/// Deletes a role.
	pub async fn delete_role(&self, id: RoleId) -> Result<()> {
		self.delete(self.url(&self.endpoints().admin.roles.delete, &[("id", &id)])?).await
	}

	/// Lists the permissions carried by a role.
	pub async fn role_permissions(&self, role: RoleId) -> Result<Vec<Permission>> {
		self.get(self.url(&self.endpoints().admin.roles.get_permissions, &[("roleId", &role)])?)
			.await
	}

	/// Assigns `permission` to `role` after checking both belong to the same platform.
	pub async fn assign_permission_to_role(
		&self,
		role: &Role,
		permission: &Permission,
	) -> Result<()> {
		scope::ensure_permission_assignable(role, permission)?;

		let url = self.url(
			&self.endpoints().admin.roles.assign_permission,
			&[("roleId", &role.role_id), ("permissionId", &permission.permission_id)],
		)?;

		self.post_empty(url).await
	}

	/// Removes a permission from a role.
	pub async fn remove_permission_from_role(
		&self,
		role: RoleId,
		permission: PermissionId,
	) -> Result<()> {
		let url = self.url(
			&self.endpoints().admin.roles.remove_permission,
			&[("roleId", &role), ("permissionId", &permission)],
		)?;

		self.delete(url).await
	}

	/// Lists every permission.
	pub async fn list_permissions(&self) -> Result<Vec<Permission>> {
		self.get(self.url(&self.endpoints().admin.permissions.list, &[])?).await
	}

	/// Fetches one permission.
	pub async fn get_permission(&self, id: PermissionId) -> Result<Permission> {
		self.get(self.url(&self.endpoints().admin.permissions.get_by_id, &[("id", &id)])?).await
	}

	/// Lists the permissions owned by `platform`.
	pub async fn permissions_by_platform(&self, platform: PlatformId) -> Result<Vec<Permission>> {
		let url =
			self.url(&self.endpoints().admin.permissions.get_by_platform, &[("platformId", &platform)])?;

		self.get(url).await
	}

	/// Creates a permission.
	pub async fn create_permission(&self, request: &CreatePermissionRequest) -> Result<Permission> {
		self.post(self.url(&self.endpoints().admin.permissions.create, &[])?, request).await
	}

	/// Updates a permission.
	pub async fn update_permission(
		&self,
		id: PermissionId,
		request: &UpdatePermissionRequest,
	) -> Result<Permission> {
		self.put(self.url(&self.endpoints().admin.permissions.update, &[("id", &id)])?, request)
			.await
	}

	/// Deletes a permission.
	pub async fn delete_permission(&self, id: PermissionId) -> Result<()> {
		self.delete(self.url(&self.endpoints().admin.permissions.delete, &[("id", &id)])?).await
	}

	/// Lists every platform.
	pub async fn list_platforms(&self) -> Result<Vec<Platform>> {
		self.get(self.url(&self.endpoints().admin.platforms.list, &[])?).await
	}

	/// Fetches one platform.
	pub async fn get_platform(&self, id: PlatformId) -> Result<Platform> {
		self.get(self.url(&self.endpoints().admin.platforms.get_by_id, &[("id", &id)])?).await
	}

	/// Fetches one platform by its OAuth client identifier.
	pub async fn get_platform_by_client_id(&self, client_id: &ClientId) -> Result<Platform> {
		let url = self
			.url(&self.endpoints().admin.platforms.get_by_client_id, &[("clientId", client_id)])?;

		self.get(url).await
	}

	/// Creates a platform; the response carries the generated client secret.
	pub async fn create_platform(&self, request: &CreatePlatformRequest) -> Result<Platform> {
		self.post(self.url(&self.endpoints().admin.platforms.create, &[])?, request).await
	}

	/// Updates a platform.
	pub async fn update_platform(
		&self,
		id: PlatformId,
		request: &UpdatePlatformRequest,
	) -> Result<Platform> {
		self.put(self.url(&self.endpoints().admin.platforms.update, &[("id", &id)])?, request).await
	}

	/// Deletes a platform.
	pub async fn delete_platform(&self, id: PlatformId) -> Result<()> {
		self.delete(self.url(&self.endpoints().admin.platforms.delete, &[("id", &id)])?).await
	}
}
impl<C> Clone for DirectoryClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { authorizer: self.authorizer.clone() }
	}
}
impl<C> Debug for DirectoryClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DirectoryClient").field("authorizer", &self.authorizer).finish()
	}
}
