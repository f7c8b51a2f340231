//! Sandbox-level error types shared by containers, requestors, and the OAuth helper.

// self
use crate::_prelude::*;

/// Sandbox-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Caller supplied input of an unsupported shape or format.
	#[error(transparent)]
	MalformedInput(#[from] MalformedInputError),
	/// Imp-supplied path tried to leave the configured prefix.
	#[error(transparent)]
	Containment(#[from] ContainmentViolationError),
	/// Upstream service answered with a non-success status.
	#[error(transparent)]
	Upstream(#[from] UpstreamHttpError),
	/// Response body could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Transport failure (DNS, TCP, TLS, body limits).
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Local precondition failures raised before any I/O happens.
#[derive(Debug, ThisError)]
pub enum MalformedInputError {
	/// Container construction received a value it cannot normalize.
	#[error("Unsupported input shape: {reason}.")]
	UnsupportedShape {
		/// Description of the rejected shape.
		reason: String,
	},
	/// URL failed to parse.
	#[error("The {field} URL is invalid.")]
	InvalidUrl {
		/// Which input carried the URL.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// URL parsed but cannot act as a base for relative references.
	#[error("The {field} URL must be an absolute hierarchical URL without query or fragment: {url}.")]
	UnusableBase {
		/// Which input carried the URL.
		field: &'static str,
		/// Offending URL.
		url: String,
	},
	/// Flag combination requested over an empty list.
	#[error("At least one capability flag is required.")]
	EmptyFlagSet,
	/// Stored mask carries bits no capability flag defines.
	#[error("Capability mask contains unknown bits: {bits:#x}.")]
	UnknownCapabilityBits {
		/// The unknown bits.
		bits: u32,
	},
	/// Header name or value cannot be sent over the wire.
	#[error("Header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
	/// Scope entries cannot be empty or contain whitespace.
	#[error("Scope `{scope}` is invalid.")]
	InvalidScope {
		/// Offending scope.
		scope: String,
	},
}
impl MalformedInputError {
	/// Builds an [`MalformedInputError::UnsupportedShape`] from any displayable reason.
	pub fn unsupported_shape(reason: impl Into<String>) -> Self {
		Self::UnsupportedShape { reason: reason.into() }
	}
}

/// Prefix-containment failures. None of the variants expose the configured prefix.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ContainmentViolationError {
	/// Path carries a scheme or a network location.
	#[error("Path `{path}` must not name a scheme or host.")]
	ForeignOrigin {
		/// Rejected path.
		path: String,
	},
	/// Path is rooted and would replace the prefix path.
	#[error("Path `{path}` must be relative to the configured prefix.")]
	AbsolutePath {
		/// Rejected path.
		path: String,
	},
	/// Path resolves outside the configured prefix.
	#[error("Path `{path}` resolves outside the configured prefix.")]
	EscapesPrefix {
		/// Rejected path.
		path: String,
	},
}

/// Non-success response from an upstream endpoint.
#[derive(Debug, ThisError)]
#[error("Upstream endpoint returned HTTP {status}.")]
pub struct UpstreamHttpError {
	/// HTTP status code.
	pub status: u16,
	/// Response body, lossily decoded, kept for diagnostics.
	pub body: String,
}

/// Response body decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Response declared a content type that is not JSON.
	#[error("Response content type `{content_type}` is not JSON.")]
	UnexpectedContentType {
		/// Declared content type.
		content_type: String,
	},
	/// Body is not valid JSON for the requested shape.
	#[error("Response body is not valid JSON.")]
	Json {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Body holds more than one JSON document.
	#[error("Response body has trailing data after the JSON document.")]
	TrailingData {
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures: network errors and body limits.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the upstream service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Response body exceeded the configured limit.
	#[error("Response body exceeds the {limit}-byte limit.")]
	BodyTooLarge {
		/// Configured limit in bytes.
		limit: usize,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		TransportError::from(e).into()
	}
}
