//! Transport-agnostic request/response contract handed to imps.
//!
//! [`HttpRequestor`] is the only surface an imp sees for network I/O. Implementors provide
//! [`HttpRequestor::send`]; the seven per-verb helpers are defined once here and delegate to
//! it. Responses are owned handles implementing [`HttpResponseInfo`]: holding one keeps the
//! underlying transport exchange alive, dropping it (or consuming it through
//! [`HttpResponseInfo::json_content`]) releases the exchange. Dropping the future returned by
//! `send` before it resolves releases any partially established exchange as well.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	error::{DecodeError, MalformedInputError},
	multidict::Multidict,
};

/// Boxed future returned by [`HttpRequestor::send`] and the per-verb helpers.
pub type SendFuture<'a, R> = Pin<Box<dyn Future<Output = Result<R>> + 'a + Send>>;
/// Boxed future returned by the response body decoders.
pub type JsonFuture<T> = Pin<Box<dyn Future<Output = Result<T>> + Send>>;

/// HTTP methods available to imps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	/// `GET`
	Get,
	/// `HEAD`
	Head,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
	/// `OPTIONS`
	Options,
}
impl HttpMethod {
	/// Returns the wire name of the method.
	pub const fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Head => "HEAD",
			HttpMethod::Post => "POST",
			HttpMethod::Put => "PUT",
			HttpMethod::Patch => "PATCH",
			HttpMethod::Delete => "DELETE",
			HttpMethod::Options => "OPTIONS",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Request descriptor built by imp code.
///
/// `path` is relative to whatever prefix the requestor was configured with; it never carries
/// a scheme or host. The descriptor is moved into [`HttpRequestor::send`], so it cannot change
/// once dispatched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequestInfo {
	/// Request method.
	pub method: HttpMethod,
	/// Path relative to the requestor prefix.
	pub path: String,
	/// Query parameters appended to the resolved URL.
	pub query: Multidict,
	/// Imp-supplied headers.
	pub headers: Multidict,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl HttpRequestInfo {
	/// Creates a request without query parameters, headers, or body.
	pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Multidict::new(),
			headers: Multidict::new(),
			body: None,
		}
	}

	/// Replaces the query parameters.
	pub fn with_query(mut self, query: Multidict) -> Self {
		self.query = query;

		self
	}

	/// Replaces the headers.
	pub fn with_headers(mut self, headers: Multidict) -> Self {
		self.headers = headers;

		self
	}

	/// Attaches a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `payload` as the JSON body and sets `Content-Type` accordingly.
	pub fn with_json_body<T>(mut self, payload: &T) -> Result<Self>
	where
		T: ?Sized + Serialize,
	{
		let body = serde_json::to_vec(payload).map_err(|e| {
			MalformedInputError::unsupported_shape(format!("JSON body cannot be encoded: {e}"))
		})?;

		self.headers.set("Content-Type", "application/json");
		self.body = Some(body);

		Ok(self)
	}
}

/// Read-only view of a response.
///
/// The body decoders consume the view: a response body stream is read at most once.
pub trait HttpResponseInfo
where
	Self: 'static + Send + Sized,
{
	/// HTTP status code.
	fn status(&self) -> u16;

	/// Response headers.
	fn headers(&self) -> &Multidict;

	/// Reads the whole body and decodes it into `T`.
	fn json_content_as<T>(self) -> JsonFuture<T>
	where
		T: 'static + Send + DeserializeOwned;

	/// Reads the whole body and decodes it as untyped JSON.
	fn json_content(self) -> JsonFuture<Value> {
		self.json_content_as()
	}
}

/// Request surface exposed to imps.
pub trait HttpRequestor
where
	Self: Send + Sync,
{
	/// Response handle produced by [`send`](Self::send).
	type Response: HttpResponseInfo;

	/// Dispatches `request` and yields the owned response handle.
	fn send(&self, request: HttpRequestInfo) -> SendFuture<'_, Self::Response>;

	/// Builds a request for `method` and dispatches it through [`send`](Self::send).
	fn send_verb(
		&self,
		method: HttpMethod,
		path: &str,
		query: Option<Multidict>,
		headers: Option<Multidict>,
	) -> SendFuture<'_, Self::Response> {
		self.send(
			HttpRequestInfo::new(method, path)
				.with_query(query.unwrap_or_default())
				.with_headers(headers.unwrap_or_default()),
		)
	}

	/// Issues a `GET`.
	fn get(
		&self,
		path: &str,
		query: Option<Multidict>,
		headers: Option<Multidict>,
	) -> SendFuture<'_, Self::Response> {
		self.send_verb(HttpMethod::Get, path, query, headers)
	}

	/// Issues a `HEAD`.
	fn head(
		&self,
		path: &str,
		query: Option<Multidict>,
		headers: Option<Multidict>,
	) -> SendFuture<'_, Self::Response> {
		self.send_verb(HttpMethod::Head, path, query, headers)
	}

	/// Issues a `POST` without a body; use [`send`](Self::send) to attach one.
	fn post(
		&self,
		path: &str,
		query: Option<Multidict>,
		headers: Option<Multidict>,
	) -> SendFuture<'_, Self::Response> {
		self.send_verb(HttpMethod::Post, path, query, headers)
	}

	/// Issues a `PUT` without a body; use [`send`](Self::send) to attach one.
	fn put(
		&self,
		path: &str,
		query: Option<Multidict>,
		headers: Option<Multidict>,
	) -> SendFuture<'_, Self::Response> {
		self.send_verb(HttpMethod::Put, path, query, headers)
	}

	/// Issues a `PATCH` without a body; use [`send`](Self::send) to attach one.
	fn patch(
		&self,
		path: &str,
		query: Option<Multidict>,
		headers: Option<Multidict>,
	) -> SendFuture<'_, Self::Response> {
		self.send_verb(HttpMethod::Patch, path, query, headers)
	}

	/// Issues a `DELETE`.
	fn delete(
		&self,
		path: &str,
		query: Option<Multidict>,
		headers: Option<Multidict>,
	) -> SendFuture<'_, Self::Response> {
		self.send_verb(HttpMethod::Delete, path, query, headers)
	}

	/// Issues an `OPTIONS`.
	fn options(
		&self,
		path: &str,
		query: Option<Multidict>,
		headers: Option<Multidict>,
	) -> SendFuture<'_, Self::Response> {
		self.send_verb(HttpMethod::Options, path, query, headers)
	}
}

/// Fails when the response declares a content type other than JSON.
///
/// A missing `Content-Type` is accepted; the body parser decides.
pub(crate) fn ensure_json_content_type(headers: &Multidict) -> Result<(), DecodeError> {
	let Some(declared) = headers.get_ignore_ascii_case("content-type") else {
		return Ok(());
	};
	let media_type = declared.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

	if media_type == "application/json" || media_type.ends_with("+json") {
		Ok(())
	} else {
		Err(DecodeError::UnexpectedContentType { content_type: declared.to_owned() })
	}
}

/// Decodes a complete JSON document, rejecting trailing data.
pub(crate) fn decode_json<T>(status: u16, body: &[u8]) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);
	let value = serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| DecodeError::Json { source, status: Some(status) })?;

	deserializer.end().map_err(|_| DecodeError::TrailingData { status: Some(status) })?;

	Ok(value)
}
