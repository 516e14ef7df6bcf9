//! Logs into a mocked identity service, lists its platforms, and logs out, persisting the
//! session through a file-backed store in between.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use ums_admin_client::{
	directory::DirectoryClient,
	endpoints::EndpointTable,
	session::{LoginRequest, SessionManager},
	store::FileStore,
	url::Url,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"accessToken": "demo-access",
					"refreshToken": "demo-refresh",
					"expiresIn": 900,
					"user": {
						"userId": 1,
						"userName": "admin",
						"firstName": "Demo",
						"lastName": "Admin",
						"email": "admin@example.com",
						"platformId": 1,
						"roles": ["Admin"]
					}
				})
				.to_string(),
			);
		})
		.await;
	let platforms_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/platforms").header("authorization", "Bearer demo-access");
			then.status(200).header("content-type", "application/json").body(
				json!([
					{ "platformId": 1, "name": "Admin Console", "clientId": "ums-admin" },
					{ "platformId": 2, "name": "Billing", "clientId": "billing-console" }
				])
				.to_string(),
			);
		})
		.await;
	let logout_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/logout");
			then.status(204);
		})
		.await;
	let store_path = env::temp_dir().join("ums_admin_client_demo_session.json");
	let store = Arc::new(FileStore::open(&store_path)?);
	let endpoints = EndpointTable::with_default_paths(Url::parse(&server.base_url())?);
	let session = Arc::new(SessionManager::new(endpoints, store));

	if !session.restore().await?.state.is_authenticated() {
		let principal =
			session.login(LoginRequest::new("admin@example.com", "correct horse")).await?;

		println!("Signed in as {}.", principal.display_name);
		login_mock.assert_async().await;
	}

	let directory = DirectoryClient::new(session.clone());

	for platform in directory.list_platforms().await? {
		println!("{} ({})", platform.name, platform.client_id);
	}

	session.logout().await;

	println!("Signed out; session file at {} is empty.", store_path.display());

	platforms_mock.assert_async().await;
	logout_mock.assert_async().await;

	Ok(())
}
