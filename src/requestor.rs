//! Constrained requestor binding the imp-facing contract to a host transport.
//!
//! A [`ConstrainedRequestor`] is built by the host for one account and handed to imp code,
//! which only sees the [`HttpRequestor`] surface. The transport session, the prefix URL, and
//! the credential material live in private fields: nothing outside this module can read
//! them back, and [`Debug`] output redacts them. Every [`send`](HttpRequestor::send)
//! re-validates the imp-supplied path against the prefix before any transport call, then
//! merges the credential header over the imp headers. Responses are wrapped in
//! [`ConstrainedResponse`], which keeps the raw transport exchange private as well.

pub mod credentials;

mod containment;

pub use credentials::*;

pub(crate) use containment::PrefixUrl;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::MalformedInputError,
	http::{self, HttpRequestInfo, HttpRequestor, HttpResponseInfo, JsonFuture, SendFuture},
	multidict::Multidict,
	obs::{self, Operation, Outcome, RequestSpan},
	transport::{HttpTransport, TransportExchange, TransportRequest},
};

/// Default cap on response bodies read through [`HttpResponseInfo::json_content`].
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Requestor that keeps every call under a fixed prefix and signs it with host credentials.
///
/// The requestor borrows its transport session for `'s`; it never outlives the session and
/// never manages its lifecycle.
pub struct ConstrainedRequestor<'s, T>
where
	T: ?Sized + HttpTransport,
{
	session: &'s T,
	prefix: PrefixUrl,
	credentials: Credentials,
	max_body_bytes: usize,
}
impl<'s, T> ConstrainedRequestor<'s, T>
where
	T: ?Sized + HttpTransport,
{
	/// Starts a builder for a requestor rooted at `prefix_url`.
	pub fn builder(
		session: &'s T,
		prefix_url: impl Into<String>,
	) -> ConstrainedRequestorBuilder<'s, T> {
		ConstrainedRequestorBuilder::new(session, prefix_url)
	}

	/// Creates a requestor with the default body limit.
	pub fn new(
		session: &'s T,
		prefix_url: &str,
		credentials: Credentials,
	) -> Result<Self, MalformedInputError> {
		Self::builder(session, prefix_url).credentials(credentials).build()
	}

	async fn dispatch(
		&self,
		request: HttpRequestInfo,
	) -> Result<ConstrainedResponse<T::Exchange>> {
		let HttpRequestInfo { method, path, query, mut headers, body } = request;
		let mut url = self.prefix.resolve(&path).inspect_err(obs::warn_containment_violation)?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query.iter());
		}

		self.credentials.apply(&mut headers);

		let exchange =
			self.session.execute(TransportRequest { method, url, headers, body }).await?;

		Ok(ConstrainedResponse::new(exchange, self.max_body_bytes))
	}
}
impl<T> HttpRequestor for ConstrainedRequestor<'_, T>
where
	T: ?Sized + HttpTransport,
{
	type Response = ConstrainedResponse<T::Exchange>;

	fn send(&self, request: HttpRequestInfo) -> SendFuture<'_, Self::Response> {
		const OPERATION: Operation = Operation::Send;

		let span = RequestSpan::new(OPERATION, request.method.as_str());

		obs::record_outcome(OPERATION, Outcome::Attempt);

		Box::pin(span.instrument(async move {
			let result = self.dispatch(request).await;

			obs::record_outcome(OPERATION, Outcome::of(&result));

			result
		}))
	}
}
impl<T> Debug for ConstrainedRequestor<'_, T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConstrainedRequestor").finish_non_exhaustive()
	}
}

/// Builder for [`ConstrainedRequestor`] values.
pub struct ConstrainedRequestorBuilder<'s, T>
where
	T: ?Sized + HttpTransport,
{
	session: &'s T,
	prefix_url: String,
	credentials: Credentials,
	max_body_bytes: usize,
}
impl<'s, T> ConstrainedRequestorBuilder<'s, T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a builder without credentials and with the default body limit.
	pub fn new(session: &'s T, prefix_url: impl Into<String>) -> Self {
		Self {
			session,
			prefix_url: prefix_url.into(),
			credentials: Credentials::None,
			max_body_bytes: DEFAULT_MAX_BODY_BYTES,
		}
	}

	/// Sets the credential material attached to every request.
	pub fn credentials(mut self, credentials: Credentials) -> Self {
		self.credentials = credentials;

		self
	}

	/// Caps how many body bytes a response decoder may read.
	pub fn max_body_bytes(mut self, limit: usize) -> Self {
		self.max_body_bytes = limit;

		self
	}

	/// Validates the prefix and produces the requestor.
	pub fn build(self) -> Result<ConstrainedRequestor<'s, T>, MalformedInputError> {
		let prefix = PrefixUrl::parse(&self.prefix_url, "requestor prefix")?;

		Ok(ConstrainedRequestor {
			session: self.session,
			prefix,
			credentials: self.credentials,
			max_body_bytes: self.max_body_bytes,
		})
	}
}
impl<T> Debug for ConstrainedRequestorBuilder<'_, T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConstrainedRequestorBuilder")
			.field("max_body_bytes", &self.max_body_bytes)
			.finish_non_exhaustive()
	}
}

/// Response view handed to imps.
///
/// Only the status, the headers, and the body decoders are reachable; the transport exchange
/// is private. Dropping the view releases the exchange.
pub struct ConstrainedResponse<E>
where
	E: TransportExchange,
{
	exchange: E,
	max_body_bytes: usize,
}
impl<E> ConstrainedResponse<E>
where
	E: TransportExchange,
{
	fn new(exchange: E, max_body_bytes: usize) -> Self {
		Self { exchange, max_body_bytes }
	}

	/// Returns true for `2xx` statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.exchange.status())
	}
}
impl<E> HttpResponseInfo for ConstrainedResponse<E>
where
	E: TransportExchange,
{
	fn status(&self) -> u16 {
		self.exchange.status()
	}

	fn headers(&self) -> &Multidict {
		self.exchange.headers()
	}

	fn json_content_as<D>(self) -> JsonFuture<D>
	where
		D: 'static + Send + DeserializeOwned,
	{
		Box::pin(async move {
			http::ensure_json_content_type(self.exchange.headers())?;

			let status = self.exchange.status();
			let body = self.exchange.read_body(self.max_body_bytes).await?;

			Ok(http::decode_json(status, &body)?)
		})
	}
}
impl<E> Debug for ConstrainedResponse<E>
where
	E: TransportExchange,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ConstrainedResponse")
			.field("status", &self.exchange.status())
			.field("headers", self.exchange.headers())
			.finish_non_exhaustive()
	}
}
