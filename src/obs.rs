//! Optional observability helpers for sandboxed requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `imp_sandbox.request` with the `operation`
//!   and `stage` fields, plus a warning event whenever a path is rejected by prefix
//!   containment.
//! - Enable `metrics` to increment the `imp_sandbox_request_total` counter for every
//!   attempt/success/rejection/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the sandbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Constrained requestor dispatch.
	Send,
	/// Authorization URL construction.
	AuthorizationUrl,
	/// Authorization code exchange.
	TokenExchange,
	/// Refresh token exchange.
	TokenRefresh,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Send => "send",
			Operation::AuthorizationUrl => "authorization_url",
			Operation::TokenExchange => "token_exchange",
			Operation::TokenRefresh => "token_refresh",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to a sandbox operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Local precondition rejected the call before any I/O.
	Rejected,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Rejected => "rejected",
			Outcome::Failure => "failure",
		}
	}

	/// Classifies a finished call.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => Outcome::Success,
			Err(Error::Containment(_) | Error::MalformedInput(_)) => Outcome::Rejected,
			Err(_) => Outcome::Failure,
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::{ContainmentViolationError, UpstreamHttpError};

	#[test]
	fn outcomes_classify_results() {
		assert_eq!(Outcome::of(&Ok::<_, Error>(())), Outcome::Success);

		let rejected: Result<()> =
			Err(ContainmentViolationError::AbsolutePath { path: "/etc".into() }.into());

		assert_eq!(Outcome::of(&rejected), Outcome::Rejected);

		let failed: Result<()> = Err(UpstreamHttpError { status: 500, body: String::new() }.into());

		assert_eq!(Outcome::of(&failed), Outcome::Failure);
	}
}
