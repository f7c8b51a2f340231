mod common;

// crates.io
use serde_json::json;
// self
use common::{CannedResponse, RecordingTransport};
use imp_sandbox::{
	error::{Error, UpstreamHttpError},
	http::HttpMethod,
	multidict::Multidict,
	oauth::{self, TokenClient, TokenPayload},
};

const CLIENT_ID: &str = "client-it";
const CLIENT_SECRET: &str = "secret-it";
const REDIRECT_URI: &str = "https://host.example.com/oauth/callback";

fn form_of(body: &[u8]) -> Multidict {
	url::form_urlencoded::parse(body).into_owned().collect()
}

#[tokio::test]
async fn code_exchange_posts_form_and_returns_payload_unchanged() {
	let payload = r#"{"access_token":"at-1","token_type":"bearer","expires_in":3600,"custom":{"k":[1]}}"#;
	let transport = RecordingTransport::new(CannedResponse::json(200, payload));
	let value = oauth::exchange_code_for_token(
		&transport,
		"https://accounts.example.com",
		CLIENT_ID,
		CLIENT_SECRET,
		REDIRECT_URI,
		"code-123",
	)
	.await
	.expect("Code exchange should succeed.");

	assert_eq!(
		value,
		json!({ "access_token": "at-1", "token_type": "bearer", "expires_in": 3600, "custom": { "k": [1] } })
	);

	let request = transport.last_request();
	let form = form_of(request.body.as_deref().expect("Token request should carry a body."));

	assert_eq!(request.method, HttpMethod::Post);
	assert_eq!(request.url.as_str(), "https://accounts.example.com/oauth2/token");
	assert_eq!(
		request.headers.get("Content-Type"),
		Some("application/x-www-form-urlencoded")
	);
	assert_eq!(form.get("grant_type"), Some("authorization_code"));
	assert_eq!(form.get("response_type"), Some("code"));
	assert_eq!(form.get("code"), Some("code-123"));
	assert_eq!(form.get("client_id"), Some(CLIENT_ID));
	assert_eq!(form.get("client_secret"), Some(CLIENT_SECRET));
	assert_eq!(form.get("redirect_uri"), Some(REDIRECT_URI));

	let typed = TokenPayload::from_value(value).expect("Payload should decode.");

	assert_eq!(typed.access_token.expose(), "at-1");
	assert_eq!(typed.expires_in, Some(3600));
}

#[tokio::test]
async fn token_endpoint_base_keeps_its_path() {
	let transport = RecordingTransport::new(CannedResponse::json(200, r#"{"access_token":"a"}"#));
	let client = TokenClient::new(&transport, "https://example.com/tenant-a", CLIENT_ID, CLIENT_SECRET)
		.expect("Token client should build.");

	assert_eq!(client.token_url().as_str(), "https://example.com/tenant-a/oauth2/token");

	client.refresh_access_token("rt-1").await.expect("Refresh should succeed.");

	let form = form_of(transport.last_request().body.as_deref().expect("Body should be set."));

	assert_eq!(form.get("grant_type"), Some("refresh_token"));
	assert_eq!(form.get("refresh_token"), Some("rt-1"));
}

#[tokio::test]
async fn non_success_status_surfaces_upstream_error() {
	let transport =
		RecordingTransport::new(CannedResponse::json(400, r#"{"error":"invalid_grant"}"#));
	let err = oauth::exchange_code_for_token(
		&transport,
		"https://accounts.example.com/",
		CLIENT_ID,
		CLIENT_SECRET,
		REDIRECT_URI,
		"stale",
	)
	.await
	.expect_err("Rejected grants must fail.");

	match err {
		Error::Upstream(UpstreamHttpError { status, body }) => {
			assert_eq!(status, 400);
			assert!(body.contains("invalid_grant"));
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn oversized_error_bodies_still_surface_upstream_error() {
	let transport = RecordingTransport::new(CannedResponse::json(
		400,
		r#"{"error":"invalid_grant","error_description":"expired"}"#,
	));
	let client = TokenClient::new(&transport, "https://accounts.example.com", CLIENT_ID, CLIENT_SECRET)
		.expect("Token client should build.")
		.with_max_body_bytes(8);
	let err = client
		.exchange_code_for_token(REDIRECT_URI, "stale")
		.await
		.expect_err("Rejected grants must fail.");

	match err {
		Error::Upstream(UpstreamHttpError { status, body }) => {
			assert_eq!(status, 400);
			assert!(body.is_empty());
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn malformed_inputs_fail_before_any_request() {
	let transport = RecordingTransport::new(CannedResponse::json(200, "{}"));
	let err = oauth::exchange_code_for_token(
		&transport,
		"accounts.example.com",
		CLIENT_ID,
		CLIENT_SECRET,
		REDIRECT_URI,
		"code",
	)
	.await
	.expect_err("Relative token bases must be rejected.");

	assert!(matches!(err, Error::MalformedInput(_)));

	let err = oauth::exchange_code_for_token(
		&transport,
		"https://accounts.example.com",
		CLIENT_ID,
		CLIENT_SECRET,
		"/callback",
		"code",
	)
	.await
	.expect_err("Relative redirect URIs must be rejected.");

	assert!(matches!(err, Error::MalformedInput(_)));
	assert_eq!(transport.calls(), 0);
}

#[cfg(feature = "reqwest")]
#[tokio::test]
async fn code_exchange_over_reqwest() {
	// crates.io
	use httpmock::prelude::*;

	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.header("accept", "application/json");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"access_token":"live","refresh_token":"r","token_type":"bearer"}"#);
		})
		.await;
	let transport = common::test_reqwest_transport();
	let value = oauth::exchange_code_for_token(
		&transport,
		&server.base_url(),
		CLIENT_ID,
		CLIENT_SECRET,
		REDIRECT_URI,
		"live-code",
	)
	.await
	.expect("Code exchange should succeed against the mock server.");

	assert_eq!(value["access_token"], "live");

	mock.assert_async().await;
}

#[test]
fn authorization_url_round_trips_state() {
	let state = oauth::generate_state_token();
	let url = oauth::build_authorization_url(
		"https://accounts.example.com/oauth2/authorize",
		CLIENT_ID,
		&state,
		&["osf.full_write"],
		REDIRECT_URI,
	)
	.expect("Authorization URL should build.");
	let query: Multidict = url.query_pairs().into_owned().collect();

	assert_eq!(query.get("state"), Some(state.as_str()));
	assert_eq!(query.get("response_type"), Some("code"));
	assert_eq!(query.get("client_id"), Some(CLIENT_ID));
	assert_eq!(query.get("scope"), Some("osf.full_write"));
}
