//! OAuth 2.0 authorization-code helpers used by the host while connecting accounts.
//!
//! [`AuthorizationRequest`] builds the provider redirect target; [`TokenClient`] exchanges an
//! authorization code (or a refresh token) at the provider token endpoint. Both run in trusted
//! host code: the token client talks to its transport directly instead of going through a
//! [`ConstrainedRequestor`](crate::requestor::ConstrainedRequestor). No retry is attempted;
//! callers own their retry policy.

// crates.io
use oauth2::{
	AuthUrl, AuthorizationCode, ClientId, ClientSecret, RedirectUrl, RefreshToken, Scope, TokenUrl,
};
use rand::{Rng, distr::Alphanumeric};
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	error::{DecodeError, MalformedInputError, UpstreamHttpError},
	http::{self, HttpMethod},
	multidict::Multidict,
	obs::{self, Operation, Outcome, RequestSpan},
	requestor::{DEFAULT_MAX_BODY_BYTES, PrefixUrl},
	secret::Secret,
	transport::{HttpTransport, TransportExchange, TransportRequest},
};

/// Path joined onto the token endpoint base to reach the token endpoint.
pub const TOKEN_PATH: &str = "oauth2/token";
/// Length of tokens produced by [`generate_state_token`].
pub const STATE_LEN: usize = 32;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Authorization-code redirect parameters.
#[derive(Clone, Debug)]
pub struct AuthorizationRequest {
	/// Provider authorization endpoint.
	pub auth_endpoint: AuthUrl,
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// Opaque CSRF state that must round-trip through the redirect.
	pub state: String,
	/// Where the provider sends the user back.
	pub redirect_uri: RedirectUrl,
	/// Requested scopes, in request order.
	pub scopes: Vec<Scope>,
	/// Separator used when joining scopes.
	pub scope_delimiter: char,
}
impl AuthorizationRequest {
	/// Validates the endpoint and redirect URLs.
	pub fn new(
		auth_endpoint: &str,
		client_id: impl Into<String>,
		state: impl Into<String>,
		redirect_uri: &str,
	) -> Result<Self, MalformedInputError> {
		let auth_endpoint = AuthUrl::new(absolute_url(auth_endpoint, "authorization endpoint")?)
			.map_err(|source| MalformedInputError::InvalidUrl {
				field: "authorization endpoint",
				source,
			})?;
		let redirect_uri = RedirectUrl::new(absolute_url(redirect_uri, "redirect")?).map_err(
			|source| MalformedInputError::InvalidUrl { field: "redirect", source },
		)?;

		Ok(Self {
			auth_endpoint,
			client_id: ClientId::new(client_id.into()),
			state: state.into(),
			redirect_uri,
			scopes: Vec::new(),
			scope_delimiter: ' ',
		})
	}

	/// Sets the requested scopes. Entries must be non-empty and free of whitespace.
	pub fn with_scopes<I, S>(mut self, scopes: I) -> Result<Self, MalformedInputError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.scopes = scopes
			.into_iter()
			.map(|scope| {
				let scope = scope.into();

				if scope.is_empty() || scope.chars().any(char::is_whitespace) {
					Err(MalformedInputError::InvalidScope { scope })
				} else {
					Ok(Scope::new(scope))
				}
			})
			.collect::<Result<_, _>>()?;

		Ok(self)
	}

	/// Overrides the scope separator (defaults to a single space).
	pub fn with_scope_delimiter(mut self, delimiter: char) -> Self {
		self.scope_delimiter = delimiter;

		self
	}

	/// Builds the redirect target.
	///
	/// `scope` is omitted entirely when no scopes were requested.
	pub fn url(&self) -> Url {
		let _span = RequestSpan::new(Operation::AuthorizationUrl, "authorization_url").entered();
		let mut url = self.auth_endpoint.url().clone();
		let mut pairs = url.query_pairs_mut();

		pairs.append_pair("response_type", "code");
		pairs.append_pair("client_id", self.client_id.as_str());
		pairs.append_pair("state", &self.state);
		pairs.append_pair("redirect_uri", self.redirect_uri.url().as_str());

		if let Some(scope) = self.joined_scopes() {
			pairs.append_pair("scope", &scope);
		}

		drop(pairs);

		obs::record_outcome(Operation::AuthorizationUrl, Outcome::Success);

		url
	}

	fn joined_scopes(&self) -> Option<String> {
		if self.scopes.is_empty() {
			return None;
		}

		let mut buf = String::new();

		for (idx, scope) in self.scopes.iter().enumerate() {
			if idx > 0 {
				buf.push(self.scope_delimiter);
			}

			buf.push_str(scope);
		}

		Some(buf)
	}
}

/// Builds an authorization-code redirect URL in one call.
pub fn build_authorization_url(
	auth_endpoint: &str,
	client_id: &str,
	state_token: &str,
	scopes: &[&str],
	redirect_uri: &str,
) -> Result<Url> {
	let request = AuthorizationRequest::new(auth_endpoint, client_id, state_token, redirect_uri)
		.and_then(|request| request.with_scopes(scopes.iter().copied()))
		.inspect_err(|_| obs::record_outcome(Operation::AuthorizationUrl, Outcome::Rejected))?;

	Ok(request.url())
}

/// Generates a random alphanumeric CSRF state token.
pub fn generate_state_token() -> String {
	rand::rng().sample_iter(Alphanumeric).take(STATE_LEN).map(char::from).collect()
}

/// Confidential client for a provider token endpoint.
pub struct TokenClient<'s, T>
where
	T: ?Sized + HttpTransport,
{
	transport: &'s T,
	token_url: TokenUrl,
	client_id: ClientId,
	client_secret: ClientSecret,
	max_body_bytes: usize,
}
impl<'s, T> TokenClient<'s, T>
where
	T: ?Sized + HttpTransport,
{
	/// Resolves [`TOKEN_PATH`] beneath `token_endpoint_base`.
	pub fn new(
		transport: &'s T,
		token_endpoint_base: &str,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Result<Self, MalformedInputError> {
		let base = PrefixUrl::parse(token_endpoint_base, "token endpoint")?;
		let token_url = base
			.as_url()
			.join(TOKEN_PATH)
			.map_err(|source| MalformedInputError::InvalidUrl { field: "token endpoint", source })?;

		Ok(Self {
			transport,
			token_url: TokenUrl::from_url(token_url),
			client_id: ClientId::new(client_id.into()),
			client_secret: ClientSecret::new(client_secret.into()),
			max_body_bytes: DEFAULT_MAX_BODY_BYTES,
		})
	}

	/// Caps how many body bytes a token response may carry.
	pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
		self.max_body_bytes = limit;

		self
	}

	/// Resolved token endpoint.
	pub fn token_url(&self) -> &Url {
		self.token_url.url()
	}

	/// Exchanges an authorization code, returning the token payload unchanged.
	pub async fn exchange_code_for_token(&self, redirect_uri: &str, code: &str) -> Result<Value> {
		const OPERATION: Operation = Operation::TokenExchange;

		let span = RequestSpan::new(OPERATION, "exchange_code_for_token");

		obs::record_outcome(OPERATION, Outcome::Attempt);

		let result: Result<Value> = span
			.instrument(async {
				let redirect_uri = RedirectUrl::new(absolute_url(redirect_uri, "redirect")?)
					.map_err(|source| MalformedInputError::InvalidUrl { field: "redirect", source })?;
				let code = AuthorizationCode::new(code.to_owned());
				let form = Multidict::from([
					("redirect_uri", redirect_uri.url().as_str()),
					("client_id", self.client_id.as_str()),
					("client_secret", self.client_secret.secret().as_str()),
					("grant_type", "authorization_code"),
					("response_type", "code"),
					("code", code.secret().as_str()),
				]);

				self.post_form(form).await
			})
			.await;

		obs::record_outcome(OPERATION, Outcome::of(&result));

		result
	}

	/// Exchanges a refresh token for a fresh token payload.
	pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<Value> {
		const OPERATION: Operation = Operation::TokenRefresh;

		let span = RequestSpan::new(OPERATION, "refresh_access_token");

		obs::record_outcome(OPERATION, Outcome::Attempt);

		let result: Result<Value> = span
			.instrument(async {
				let refresh_token = RefreshToken::new(refresh_token.to_owned());
				let form = Multidict::from([
					("client_id", self.client_id.as_str()),
					("client_secret", self.client_secret.secret().as_str()),
					("grant_type", "refresh_token"),
					("refresh_token", refresh_token.secret().as_str()),
				]);

				self.post_form(form).await
			})
			.await;

		obs::record_outcome(OPERATION, Outcome::of(&result));

		result
	}

	async fn post_form(&self, form: Multidict) -> Result<Value> {
		let request = TransportRequest {
			method: HttpMethod::Post,
			url: self.token_url.url().clone(),
			headers: Multidict::from([
				("Content-Type", FORM_CONTENT_TYPE),
				("Accept", "application/json"),
			]),
			body: Some(form.as_query_string().into_bytes()),
		};
		let exchange = self.transport.execute(request).await?;
		let status = exchange.status();

		if !(200..300).contains(&status) {
			// Body is best effort; the status alone decides the error.
			let body = exchange.read_body(self.max_body_bytes).await.unwrap_or_default();

			return Err(
				UpstreamHttpError { status, body: String::from_utf8_lossy(&body).into_owned() }
					.into(),
			);
		}

		let body = exchange.read_body(self.max_body_bytes).await?;

		Ok(http::decode_json(status, &body)?)
	}
}
impl<T> Debug for TokenClient<'_, T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenClient")
			.field("token_url", self.token_url.url())
			.field("client_id", &self.client_id.as_str())
			.finish_non_exhaustive()
	}
}

/// Exchanges an authorization code in one call. See [`TokenClient::exchange_code_for_token`].
pub async fn exchange_code_for_token<T>(
	transport: &T,
	token_endpoint_base: &str,
	client_id: &str,
	client_secret: &str,
	redirect_uri: &str,
	code: &str,
) -> Result<Value>
where
	T: ?Sized + HttpTransport,
{
	TokenClient::new(transport, token_endpoint_base, client_id, client_secret)?
		.exchange_code_for_token(redirect_uri, code)
		.await
}

/// Typed view over a token endpoint payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
	/// Issued access token.
	pub access_token: Secret,
	/// Token type, usually `bearer`.
	#[serde(default)]
	pub token_type: Option<String>,
	/// Refresh token, when the provider rotates or issues one.
	#[serde(default)]
	pub refresh_token: Option<Secret>,
	/// Lifetime in seconds.
	#[serde(default)]
	pub expires_in: Option<i64>,
	/// Granted scopes as returned by the provider.
	#[serde(default)]
	pub scope: Option<String>,
	/// Provider-specific fields, untouched.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl TokenPayload {
	/// Decodes a payload returned by [`TokenClient`].
	pub fn from_value(value: Value) -> Result<Self> {
		serde_path_to_error::deserialize(value)
			.map_err(|source| DecodeError::Json { source, status: None }.into())
	}

	/// Expiry instant relative to `issued_at`; `None` when the provider sent no lifetime.
	pub fn expires_at(&self, issued_at: OffsetDateTime) -> Option<OffsetDateTime> {
		self.expires_in.map(|secs| issued_at + Duration::seconds(secs))
	}
}

fn absolute_url(raw: &str, field: &'static str) -> Result<String, MalformedInputError> {
	let url = Url::parse(raw).map_err(|source| MalformedInputError::InvalidUrl { field, source })?;

	if url.cannot_be_a_base() {
		return Err(MalformedInputError::UnusableBase { field, url: raw.to_owned() });
	}

	Ok(url.into())
}
