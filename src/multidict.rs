//! Ordered, multi-valued string container used for query parameters and headers.

// std
use std::slice::Iter;
// crates.io
use serde_json::Value;
use url::form_urlencoded::Serializer as FormSerializer;
#[cfg(feature = "reqwest")] use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
// self
use crate::{_prelude::*, error::MalformedInputError};

/// Ordered sequence of `(key, value)` pairs.
///
/// Insertion order is preserved, including duplicate keys. [`add`](Self::add) appends while
/// [`set`](Self::set) collapses every existing value for a key into a single entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Multidict {
	pairs: Vec<(String, String)>,
}
impl Multidict {
	/// Creates an empty container.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a pair without touching existing entries for `key`.
	pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.pairs.push((key.into(), value.into()));
	}

	/// Replaces every value stored under `key` with `value`.
	///
	/// The surviving entry keeps the position of the first existing entry for `key`; when the
	/// key is absent the pair is appended.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		let key = key.into();
		let value = value.into();
		let Some(first) = self.pairs.iter().position(|(k, _)| *k == key) else {
			self.pairs.push((key, value));

			return;
		};

		self.pairs[first].1 = value;

		let mut idx = 0;

		self.pairs.retain(|(k, _)| {
			let keep = idx <= first || *k != key;

			idx += 1;

			keep
		});
	}

	/// Removes every entry for `key`, returning the removed values in order.
	pub fn remove(&mut self, key: &str) -> Vec<String> {
		let mut removed = Vec::new();

		self.pairs.retain(|(k, v)| {
			if k == key {
				removed.push(v.clone());

				false
			} else {
				true
			}
		});

		removed
	}

	/// Removes every entry whose key matches `key` ignoring ASCII case.
	pub fn remove_ignore_ascii_case(&mut self, key: &str) {
		self.pairs.retain(|(k, _)| !k.eq_ignore_ascii_case(key));
	}

	/// First value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	/// First value stored under `key`, comparing keys ignoring ASCII case.
	pub fn get_ignore_ascii_case(&self, key: &str) -> Option<&str> {
		self.pairs.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)).map(|(_, v)| v.as_str())
	}

	/// Every value stored under `key`, in insertion order.
	pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
		self.pairs.iter().filter(move |(k, _)| k == key).map(|(_, v)| v.as_str())
	}

	/// Returns true if at least one entry uses `key`.
	pub fn contains_key(&self, key: &str) -> bool {
		self.pairs.iter().any(|(k, _)| k == key)
	}

	/// Number of stored pairs (duplicates included).
	pub fn len(&self) -> usize {
		self.pairs.len()
	}

	/// Returns true when no pairs are stored.
	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	/// Iterator over stored pairs in insertion order.
	pub fn iter(&self) -> MultidictIter<'_> {
		MultidictIter { inner: self.pairs.iter() }
	}

	/// Serializes the pairs as `application/x-www-form-urlencoded` text.
	pub fn as_query_string(&self) -> String {
		let mut serializer = FormSerializer::new(String::new());

		serializer.extend_pairs(self.pairs.iter());

		serializer.finish()
	}

	/// Serializes the pairs as an RFC 822 style header block.
	///
	/// Each pair becomes `Name: value\r\n`; line breaks inside a value (`\r\n`, `\n`, or a bare
	/// `\r`) are folded into continuation lines starting with a single space. The block ends
	/// with an empty line.
	pub fn as_header_block(&self) -> Vec<u8> {
		let mut block = String::new();

		for (name, value) in &self.pairs {
			block.push_str(name);
			block.push_str(": ");

			let value = value.replace("\r\n", "\n").replace('\r', "\n");
			let mut lines = value.lines();

			if let Some(line) = lines.next() {
				block.push_str(line);
			}
			for line in lines {
				block.push_str("\r\n ");
				block.push_str(line);
			}

			block.push_str("\r\n");
		}

		block.push_str("\r\n");

		block.into_bytes()
	}

	/// Converts the pairs into a transport header map.
	#[cfg(feature = "reqwest")]
	pub fn to_header_map(&self) -> Result<HeaderMap, MalformedInputError> {
		let mut map = HeaderMap::with_capacity(self.pairs.len());

		for (name, value) in &self.pairs {
			let invalid = || MalformedInputError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			map.append(header_name, header_value);
		}

		Ok(map)
	}

	/// Collects a transport header map, decoding non-UTF-8 values lossily.
	#[cfg(feature = "reqwest")]
	pub fn from_header_map(headers: &HeaderMap) -> Self {
		headers
			.iter()
			.map(|(name, value)| {
				(name.as_str().to_owned(), String::from_utf8_lossy(value.as_bytes()).into_owned())
			})
			.collect()
	}
}
impl<K, V> Extend<(K, V)> for Multidict
where
	K: Into<String>,
	V: Into<String>,
{
	fn extend<I>(&mut self, iter: I)
	where
		I: IntoIterator<Item = (K, V)>,
	{
		self.pairs.extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
	}
}
impl<K, V> FromIterator<(K, V)> for Multidict
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
	{
		let mut dict = Self::new();

		dict.extend(iter);

		dict
	}
}
impl<K, V> From<Vec<(K, V)>> for Multidict
where
	K: Into<String>,
	V: Into<String>,
{
	fn from(pairs: Vec<(K, V)>) -> Self {
		pairs.into_iter().collect()
	}
}
impl<K, V, const N: usize> From<[(K, V); N]> for Multidict
where
	K: Into<String>,
	V: Into<String>,
{
	fn from(pairs: [(K, V); N]) -> Self {
		pairs.into_iter().collect()
	}
}
impl<K, V> From<BTreeMap<K, V>> for Multidict
where
	K: Into<String>,
	V: Into<String>,
{
	fn from(mapping: BTreeMap<K, V>) -> Self {
		mapping.into_iter().collect()
	}
}
impl TryFrom<Value> for Multidict {
	type Error = MalformedInputError;

	/// Accepts `null`, an object of string values, or an array of `[key, value]` string pairs.
	fn try_from(value: Value) -> Result<Self, Self::Error> {
		match value {
			Value::Null => Ok(Self::new()),
			Value::Object(mapping) => mapping
				.into_iter()
				.map(|(key, value)| match value {
					Value::String(value) => Ok((key, value)),
					other => Err(MalformedInputError::unsupported_shape(format!(
						"value for `{key}` must be a string, found {other}"
					))),
				})
				.collect::<Result<Vec<_>, _>>()
				.map(Self::from),
			Value::Array(items) => items
				.into_iter()
				.map(|item| match item {
					Value::Array(pair) => match <[Value; 2]>::try_from(pair) {
						Ok([Value::String(key), Value::String(value)]) => Ok((key, value)),
						Ok(pair) => Err(MalformedInputError::unsupported_shape(format!(
							"pair must hold two strings, found {:?}",
							pair
						))),
						Err(pair) => Err(MalformedInputError::unsupported_shape(format!(
							"pair must hold exactly two entries, found {}",
							pair.len()
						))),
					},
					other => Err(MalformedInputError::unsupported_shape(format!(
						"expected a [key, value] pair, found {other}"
					))),
				})
				.collect::<Result<Vec<_>, _>>()
				.map(Self::from),
			other => Err(MalformedInputError::unsupported_shape(format!(
				"expected null, an object, or a list of pairs, found {other}"
			))),
		}
	}
}
impl<'a> IntoIterator for &'a Multidict {
	type IntoIter = MultidictIter<'a>;
	type Item = (&'a str, &'a str);

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// Iterator over `(key, value)` pairs of a [`Multidict`].
pub struct MultidictIter<'a> {
	inner: Iter<'a, (String, String)>,
}
impl<'a> Iterator for MultidictIter<'a> {
	type Item = (&'a str, &'a str);

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn octopus() -> Multidict {
		let mut dict = Multidict::from([("a", "two"), ("7", "🐙")]);

		dict.add("a", "three");

		dict
	}

	#[test]
	fn query_string_keeps_duplicates_in_order() {
		let dict = Multidict::from(vec![("a", "a1"), ("a", "a2")]);

		assert_eq!(dict.as_query_string(), "a=a1&a=a2");
	}

	#[test]
	fn query_string_from_mapping_and_empty() {
		let mapping = BTreeMap::from([("a", "aval"), ("b", "bval")]);

		assert_eq!(Multidict::from(mapping).as_query_string(), "a=aval&b=bval");
		assert_eq!(Multidict::new().as_query_string(), "");
	}

	#[test]
	fn query_string_percent_encodes_non_ascii() {
		assert_eq!(octopus().as_query_string(), "a=two&7=%F0%9F%90%99&a=three");
	}

	#[test]
	fn set_collapses_existing_values_in_place() {
		let mut dict = octopus();

		dict.set("a", "five");

		assert_eq!(dict.get_all("a").collect::<Vec<_>>(), vec!["five"]);
		assert_eq!(dict.as_query_string(), "a=five&7=%F0%9F%90%99");

		dict.set("b", "new");

		assert_eq!(dict.as_query_string(), "a=five&7=%F0%9F%90%99&b=new");
	}

	#[test]
	fn remove_and_case_insensitive_helpers() {
		let mut dict = Multidict::from([("Authorization", "x"), ("accept", "json")]);

		assert_eq!(dict.get_ignore_ascii_case("authorization"), Some("x"));

		dict.remove_ignore_ascii_case("AUTHORIZATION");

		assert!(!dict.contains_key("Authorization"));
		assert_eq!(dict.remove("accept"), vec!["json".to_owned()]);
		assert!(dict.is_empty());
	}

	#[test]
	fn header_block_folds_multiline_values() {
		let dict = Multidict::from([("Accept", "application/json"), ("X-Note", "one\ntwo")]);

		assert_eq!(
			dict.as_header_block(),
			b"Accept: application/json\r\nX-Note: one\r\n two\r\n\r\n".to_vec()
		);
		assert_eq!(Multidict::new().as_header_block(), b"\r\n".to_vec());
	}

	#[test]
	fn header_block_folds_bare_carriage_returns() {
		let dict = Multidict::from([("X-A", "v\rInjected: 1"), ("X-B", "a\r\nb")]);

		assert_eq!(
			dict.as_header_block(),
			b"X-A: v\r\n Injected: 1\r\nX-B: a\r\n b\r\n\r\n".to_vec()
		);
	}

	#[test]
	fn json_shapes_normalize_or_fail() {
		assert!(Multidict::try_from(json!(null)).expect("Null should be accepted.").is_empty());

		let pairs = Multidict::try_from(json!([["a", "1"], ["a", "2"]]))
			.expect("Pair lists should be accepted.");

		assert_eq!(pairs.as_query_string(), "a=1&a=2");

		let mapping =
			Multidict::try_from(json!({ "k": "v" })).expect("String mappings should be accepted.");

		assert_eq!(mapping.get("k"), Some("v"));

		for bad in [json!(42), json!("a=b"), json!([["a"]]), json!({ "k": 1 }), json!([1, 2])] {
			let err = Multidict::try_from(bad).expect_err("Unsupported shapes must be rejected.");

			assert!(matches!(err, MalformedInputError::UnsupportedShape { .. }));
		}
	}

	#[test]
	fn clones_do_not_share_storage() {
		let original = Multidict::from([("a", "1")]);
		let mut copy = original.clone();

		copy.add("a", "2");

		assert_eq!(original.len(), 1);
		assert_eq!(copy.len(), 2);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn header_map_conversion_rejects_invalid_names() {
		let dict = Multidict::from([("X-Ok", "1"), ("X-Ok", "2")]);
		let map = dict.to_header_map().expect("Valid headers should convert.");

		assert_eq!(map.get_all("x-ok").iter().count(), 2);
		assert_eq!(Multidict::from_header_map(&map).get_all("x-ok").count(), 2);

		let err = Multidict::from([("bad name", "1")])
			.to_header_map()
			.expect_err("Header names with spaces must be rejected.");

		assert!(matches!(err, MalformedInputError::InvalidHeader { .. }));
	}
}
