//! Shared fixtures for integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use parking_lot::Mutex;
// self
use imp_sandbox::{
	multidict::Multidict,
	transport::{BodyFuture, ExchangeFuture, HttpTransport, TransportExchange, TransportRequest},
};

/// Canned response served by [`RecordingTransport`].
#[derive(Clone, Debug)]
pub struct CannedResponse {
	pub status: u16,
	pub headers: Multidict,
	pub body: Vec<u8>,
}
impl CannedResponse {
	pub fn json(status: u16, body: &str) -> Self {
		Self {
			status,
			headers: Multidict::from([("Content-Type", "application/json")]),
			body: body.as_bytes().to_vec(),
		}
	}

	pub fn with_content_type(mut self, content_type: &str) -> Self {
		self.headers.set("Content-Type", content_type);

		self
	}
}

/// In-memory transport that records every executed request.
#[derive(Clone, Debug)]
pub struct RecordingTransport {
	response: CannedResponse,
	requests: Arc<Mutex<Vec<TransportRequest>>>,
}
impl RecordingTransport {
	pub fn new(response: CannedResponse) -> Self {
		Self { response, requests: Default::default() }
	}

	pub fn calls(&self) -> usize {
		self.requests.lock().len()
	}

	pub fn requests(&self) -> Vec<TransportRequest> {
		self.requests.lock().clone()
	}

	pub fn last_request(&self) -> TransportRequest {
		self.requests.lock().last().cloned().expect("At least one request should be recorded.")
	}
}
impl HttpTransport for RecordingTransport {
	type Exchange = CannedExchange;

	fn execute(&self, request: TransportRequest) -> ExchangeFuture<'_, Self::Exchange> {
		self.requests.lock().push(request);

		let response = self.response.clone();

		Box::pin(async move { Ok(CannedExchange(response)) })
	}
}

/// Exchange handing back a [`CannedResponse`].
#[derive(Debug)]
pub struct CannedExchange(CannedResponse);
impl TransportExchange for CannedExchange {
	fn status(&self) -> u16 {
		self.0.status
	}

	fn headers(&self) -> &Multidict {
		&self.0.headers
	}

	fn read_body(self, limit: usize) -> BodyFuture {
		Box::pin(async move {
			if self.0.body.len() > limit {
				return Err(imp_sandbox::error::TransportError::BodyTooLarge { limit }.into());
			}

			Ok(self.0.body)
		})
	}
}

/// Reqwest transport that trusts the self-signed certificates produced by `httpmock`.
#[cfg(feature = "reqwest")]
pub fn test_reqwest_transport() -> imp_sandbox::transport::ReqwestTransport {
	let client = imp_sandbox::reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.redirect(imp_sandbox::reqwest::redirect::Policy::none())
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	imp_sandbox::transport::ReqwestTransport::with_client(client)
}
