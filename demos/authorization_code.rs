//! Walks through connecting a storage account: build the provider redirect, then exchange the
//! returned authorization code against a mocked token endpoint.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use imp_sandbox::{
	oauth::{self, TokenClient, TokenPayload},
	transport::ReqwestTransport,
};

const CLIENT_ID: &str = "demo-client";
const CLIENT_SECRET: &str = "demo-secret";
const REDIRECT_URI: &str = "https://host.example.com/oauth/callback";

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"refresh_token\":\"demo-refresh\",\"token_type\":\"bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let state = oauth::generate_state_token();
	let authorize_url = oauth::build_authorization_url(
		&server.url("/oauth2/authorize"),
		CLIENT_ID,
		&state,
		&["osf.full_read", "osf.full_write"],
		REDIRECT_URI,
	)?;

	println!("Send your user to {authorize_url}.");

	// Simulate the provider redirecting back with the same state and a fresh code.
	let transport = ReqwestTransport::new()?;
	let client = TokenClient::new(&transport, &server.base_url(), CLIENT_ID, CLIENT_SECRET)?;
	let payload = client.exchange_code_for_token(REDIRECT_URI, "demo-code").await?;
	let token = TokenPayload::from_value(payload.clone())?;

	println!("Raw token payload: {payload}.");
	println!(
		"Access token {} expires at {:?}.",
		token.access_token,
		token.expires_at(time::OffsetDateTime::now_utc())
	);

	token_mock.assert_async().await;

	Ok(())
}
