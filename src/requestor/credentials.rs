//! Host-supplied credential material and the headers derived from it.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, multidict::Multidict, secret::Secret};

const AUTHORIZATION: &str = "Authorization";

/// Credential material attached to every request a requestor sends.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
	/// No credential header.
	#[default]
	None,
	/// `Authorization: Bearer <token>`.
	AccessToken(Secret),
	/// `Authorization: Basic <base64(username:password)>`.
	Basic {
		/// Account name.
		username: String,
		/// Account password.
		password: Secret,
	},
	/// Provider-specific header carrying an API key.
	ApiKey {
		/// Header name, e.g. `X-Api-Key`.
		header: String,
		/// Key value.
		value: Secret,
	},
}
impl Credentials {
	/// Bearer access-token credentials.
	pub fn access_token(token: impl Into<Secret>) -> Self {
		Self::AccessToken(token.into())
	}

	/// HTTP basic credentials.
	pub fn basic(username: impl Into<String>, password: impl Into<Secret>) -> Self {
		Self::Basic { username: username.into(), password: password.into() }
	}

	/// API-key credentials sent in `header`.
	pub fn api_key(header: impl Into<String>, value: impl Into<Secret>) -> Self {
		Self::ApiKey { header: header.into(), value: value.into() }
	}

	/// Header name and value derived from the credentials.
	fn header(&self) -> Option<(&str, String)> {
		match self {
			Self::None => None,
			Self::AccessToken(token) => Some((AUTHORIZATION, format!("Bearer {}", token.expose()))),
			Self::Basic { username, password } => {
				let encoded = STANDARD.encode(format!("{username}:{}", password.expose()));

				Some((AUTHORIZATION, format!("Basic {encoded}")))
			},
			Self::ApiKey { header, value } => Some((header.as_str(), value.expose().to_owned())),
		}
	}

	/// Replaces any same-named imp header with the credential header.
	pub(crate) fn apply(&self, headers: &mut Multidict) {
		if let Some((name, value)) = self.header() {
			headers.remove_ignore_ascii_case(name);
			headers.add(name, value);
		}
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::None => f.write_str("Credentials::None"),
			Self::AccessToken(_) => f.write_str("Credentials::AccessToken(..)"),
			Self::Basic { username, .. } => f
				.debug_struct("Credentials::Basic")
				.field("username", username)
				.finish_non_exhaustive(),
			Self::ApiKey { header, .. } => f
				.debug_struct("Credentials::ApiKey")
				.field("header", header)
				.finish_non_exhaustive(),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn bearer_token_overrides_imp_authorization() {
		let mut headers = Multidict::from([("authorization", "Bearer forged"), ("Accept", "*/*")]);

		Credentials::access_token("real").apply(&mut headers);

		assert_eq!(headers.get_all("Authorization").collect::<Vec<_>>(), vec!["Bearer real"]);
		assert!(!headers.contains_key("authorization"));
		assert_eq!(headers.get("Accept"), Some("*/*"));
	}

	#[test]
	fn basic_credentials_encode_pair() {
		let mut headers = Multidict::new();

		Credentials::basic("aladdin", "opensesame").apply(&mut headers);

		assert_eq!(headers.get("Authorization"), Some("Basic YWxhZGRpbjpvcGVuc2VzYW1l"));
	}

	#[test]
	fn api_key_uses_custom_header_and_none_is_noop() {
		let mut headers = Multidict::from([("x-api-key", "forged")]);

		Credentials::api_key("X-Api-Key", "k-123").apply(&mut headers);

		assert_eq!(headers.as_query_string(), "X-Api-Key=k-123");

		let mut untouched = Multidict::from([("Authorization", "imp")]);

		Credentials::None.apply(&mut untouched);

		assert_eq!(untouched.get("Authorization"), Some("imp"));
	}

	#[test]
	fn debug_output_redacts_secrets() {
		let rendered = format!(
			"{:?} {:?} {:?}",
			Credentials::access_token("tok-1"),
			Credentials::basic("user", "pw-1"),
			Credentials::api_key("X-Key", "key-1")
		);

		assert!(!rendered.contains("tok-1"));
		assert!(!rendered.contains("pw-1"));
		assert!(!rendered.contains("key-1"));
		assert!(rendered.contains("user"));
	}
}
