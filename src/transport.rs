//! Pluggable transport sessions executing already-validated requests.
//!
//! Transports are host-side: they only ever receive absolute URLs that a
//! [`ConstrainedRequestor`](crate::requestor::ConstrainedRequestor) or the OAuth helper has
//! resolved. Imp code never holds a transport. [`HttpTransport::execute`] yields a
//! [`TransportExchange`] that owns the in-flight response; dropping the exchange releases the
//! connection, and [`TransportExchange::read_body`] consumes it.

// self
use crate::{_prelude::*, http::HttpMethod, multidict::Multidict};
#[cfg(feature = "reqwest")] use crate::error::TransportError;

/// Boxed future returned by [`HttpTransport::execute`].
pub type ExchangeFuture<'a, E> = Pin<Box<dyn Future<Output = Result<E>> + 'a + Send>>;
/// Boxed future returned by [`TransportExchange::read_body`].
pub type BodyFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send>>;

/// Fully resolved outbound request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportRequest {
	/// Request method.
	pub method: HttpMethod,
	/// Absolute target URL, query included.
	pub url: Url,
	/// Merged outbound headers.
	pub headers: Multidict,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}

/// HTTP stack executing requests on behalf of the sandbox.
///
/// Sessions are shared: requestors borrow them and may issue concurrent calls, so
/// implementations must be safe to use from several tasks at once. Implementations should not
/// follow redirects, since a redirect target is not subject to prefix containment.
pub trait HttpTransport
where
	Self: Send + Sync,
{
	/// In-flight exchange produced by [`execute`](Self::execute).
	type Exchange: TransportExchange;

	/// Sends `request` and resolves once response headers are available.
	fn execute(&self, request: TransportRequest) -> ExchangeFuture<'_, Self::Exchange>;
}

/// Response whose headers have arrived but whose body may still be streaming.
pub trait TransportExchange
where
	Self: 'static + Send,
{
	/// HTTP status code.
	fn status(&self) -> u16;

	/// Response headers.
	fn headers(&self) -> &Multidict;

	/// Reads the remaining body, failing once more than `limit` bytes arrive.
	fn read_body(self, limit: usize) -> BodyFuture;
}

/// Default transport backed by a shared [`ReqwestClient`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a client that never follows redirects.
	pub fn new() -> Result<Self> {
		let client =
			ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	///
	/// Configure the client with `redirect::Policy::none()`; redirects would bypass
	/// prefix containment.
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	type Exchange = ReqwestExchange;

	fn execute(&self, request: TransportRequest) -> ExchangeFuture<'_, Self::Exchange> {
		Box::pin(async move {
			let TransportRequest { method, url, headers, body } = request;
			let mut builder =
				self.0.request(reqwest_method(method), url).headers(headers.to_header_map()?);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response = builder.send().await?;

			Ok(ReqwestExchange::new(response))
		})
	}
}

/// Exchange wrapping a [`reqwest::Response`].
#[cfg(feature = "reqwest")]
#[derive(Debug)]
pub struct ReqwestExchange {
	status: u16,
	headers: Multidict,
	response: reqwest::Response,
}
#[cfg(feature = "reqwest")]
impl ReqwestExchange {
	fn new(response: reqwest::Response) -> Self {
		Self {
			status: response.status().as_u16(),
			headers: Multidict::from_header_map(response.headers()),
			response,
		}
	}
}
#[cfg(feature = "reqwest")]
impl TransportExchange for ReqwestExchange {
	fn status(&self) -> u16 {
		self.status
	}

	fn headers(&self) -> &Multidict {
		&self.headers
	}

	fn read_body(self, limit: usize) -> BodyFuture {
		let mut response = self.response;

		Box::pin(async move {
			if response.content_length().is_some_and(|len| len > limit as u64) {
				return Err(TransportError::BodyTooLarge { limit }.into());
			}

			let mut body = Vec::new();

			while let Some(chunk) = response.chunk().await? {
				if body.len() + chunk.len() > limit {
					return Err(TransportError::BodyTooLarge { limit }.into());
				}

				body.extend_from_slice(&chunk);
			}

			Ok(body)
		})
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: HttpMethod) -> reqwest::Method {
	match method {
		HttpMethod::Get => reqwest::Method::GET,
		HttpMethod::Head => reqwest::Method::HEAD,
		HttpMethod::Post => reqwest::Method::POST,
		HttpMethod::Put => reqwest::Method::PUT,
		HttpMethod::Patch => reqwest::Method::PATCH,
		HttpMethod::Delete => reqwest::Method::DELETE,
		HttpMethod::Options => reqwest::Method::OPTIONS,
	}
}
