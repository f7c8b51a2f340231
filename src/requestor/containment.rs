//! Prefix containment for imp-supplied relative paths.

// self
use crate::{
	_prelude::*,
	error::{ContainmentViolationError, MalformedInputError},
};

/// Absolute base URL every resolved request must stay under.
///
/// The stored URL always ends its path with `/` so relative references resolve beneath it
/// instead of replacing its last segment.
#[derive(Clone)]
pub(crate) struct PrefixUrl(Url);
impl PrefixUrl {
	pub(crate) fn parse(raw: &str, field: &'static str) -> Result<Self, MalformedInputError> {
		let mut url =
			Url::parse(raw).map_err(|source| MalformedInputError::InvalidUrl { field, source })?;

		if url.cannot_be_a_base() || url.query().is_some() || url.fragment().is_some() {
			return Err(MalformedInputError::UnusableBase { field, url: raw.to_owned() });
		}
		if !url.path().ends_with('/') {
			let path = format!("{}/", url.path());

			url.set_path(&path);
		}

		Ok(Self(url))
	}

	pub(crate) fn as_url(&self) -> &Url {
		&self.0
	}

	/// Resolves `path` beneath the prefix.
	///
	/// Rejects, in order: scheme or network-path references, rooted paths, and anything whose
	/// resolution does not start with the prefix string.
	pub(crate) fn resolve(&self, path: &str) -> Result<Url, ContainmentViolationError> {
		// Classify the reference the way the URL parser will see it.
		let normalized = path
			.trim_start_matches(|c: char| c.is_ascii_control() || c == ' ')
			.chars()
			.filter(|c| !matches!(c, '\t' | '\n' | '\r'))
			.collect::<String>();

		if has_scheme(&normalized) || normalized.starts_with("//") || normalized.starts_with("\\\\")
		{
			return Err(ContainmentViolationError::ForeignOrigin { path: path.to_owned() });
		}
		if normalized.starts_with(['/', '\\']) {
			return Err(ContainmentViolationError::AbsolutePath { path: path.to_owned() });
		}

		let escapes = || ContainmentViolationError::EscapesPrefix { path: path.to_owned() };
		let resolved = self.0.join(path).map_err(|_| escapes())?;

		if resolved.as_str().starts_with(self.0.as_str()) { Ok(resolved) } else { Err(escapes()) }
	}
}

impl Debug for PrefixUrl {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("PrefixUrl(..)")
	}
}

/// RFC 3986 scheme detection: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`.
fn has_scheme(reference: &str) -> bool {
	let Some((candidate, _)) = reference.split_once(':') else {
		return false;
	};
	let mut chars = candidate.chars();

	chars.next().is_some_and(|c| c.is_ascii_alphabetic())
		&& chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
