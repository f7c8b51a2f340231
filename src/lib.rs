//! Sandboxed HTTP plumbing for untrusted storage addons ("imps"): prefix-contained requestors,
//! host-held credentials, declarative capability sets, and OAuth 2.0 code-exchange helpers.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod capability;
pub mod error;
pub mod http;
pub mod multidict;
pub mod oauth;
pub mod obs;
pub mod requestor;
pub mod secret;
pub mod transport;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::{Hash, Hasher},
		pin::Pin,
	};

	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, parking_lot as _, tokio as _};
