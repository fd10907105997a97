//! Route parameters extracted for one activation.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::Serialize;

use crate::error::ParamError;

/// String parameters of an activated route.
///
/// Holds the union of the query string pairs and the named path captures.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteParams(BTreeMap<String, String>);

impl RouteParams {
	/// Creates an empty parameter set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Merges query pairs with path captures.
	///
	/// Query pairs are applied first in order (a repeated key keeps its last
	/// value), then captures; a capture therefore overwrites a query pair of
	/// the same name.
	pub fn merge<Q, C>(query: Q, captures: C) -> Self
	where
		Q: IntoIterator<Item = (String, String)>,
		C: IntoIterator<Item = (String, String)>,
	{
		let mut params = BTreeMap::new();
		params.extend(query);
		params.extend(captures);
		Self(params)
	}

	/// Parses an `application/x-www-form-urlencoded` query string into pairs.
	///
	/// A leading `?` is ignored. Malformed input yields no pairs.
	pub fn parse_query(query: &str) -> Vec<(String, String)> {
		let query = query.strip_prefix('?').unwrap_or(query);
		match serde_urlencoded::from_str::<Vec<(String, String)>>(query) {
			Ok(pairs) => pairs,
			Err(err) => {
				tracing::debug!(query = %query, error = %err, "ignoring malformed query string");
				Vec::new()
			}
		}
	}

	/// Returns the raw value of a parameter.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	/// Parses a parameter into `T`.
	///
	/// # Errors
	///
	/// Returns [`ParamError::Missing`] if the parameter is absent and
	/// [`ParamError::Parse`] if its value does not parse as `T`.
	pub fn get_as<T>(&self, name: &str) -> Result<T, ParamError>
	where
		T: FromStr,
		T::Err: Display,
	{
		let raw = self
			.get(name)
			.ok_or_else(|| ParamError::Missing(name.to_string()))?;
		raw.parse::<T>().map_err(|e| ParamError::Parse {
			name: name.to_string(),
			param_type: std::any::type_name::<T>(),
			raw_value: raw.to_string(),
			reason: e.to_string(),
		})
	}

	/// Sets a parameter, returning the previous value.
	pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
		self.0.insert(name.into(), value.into())
	}

	/// Returns whether the parameter is present.
	pub fn contains_key(&self, name: &str) -> bool {
		self.0.contains_key(name)
	}

	/// Returns the number of parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns whether there are no parameters.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates parameters in name order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}

impl<K, V> FromIterator<(K, V)> for RouteParams
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(
			iter.into_iter()
				.map(|(k, v)| (k.into(), v.into()))
				.collect(),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
		items
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[rstest]
	fn test_capture_overrides_query_on_collision() {
		// Arrange
		let query = pairs(&[("id", "from-query"), ("tab", "stops")]);
		let captures = pairs(&[("id", "from-path")]);

		// Act
		let params = RouteParams::merge(query, captures);

		// Assert
		assert_eq!(params.get("id"), Some("from-path"));
		assert_eq!(params.get("tab"), Some("stops"));
		assert_eq!(params.len(), 2);
	}

	#[rstest]
	#[case("page=2&city=ankara", &[("city", "ankara"), ("page", "2")])]
	#[case("?page=2", &[("page", "2")])]
	#[case("name=K%C4%B1z%C4%B1lay+Square", &[("name", "Kızılay Square")])]
	#[case("", &[])]
	fn test_parse_query(#[case] raw: &str, #[case] expected: &[(&str, &str)]) {
		let params = RouteParams::merge(RouteParams::parse_query(raw), Vec::new());
		let expected: RouteParams = expected.iter().copied().collect();
		assert_eq!(params, expected);
	}

	#[rstest]
	fn test_repeated_query_key_keeps_last() {
		let params = RouteParams::merge(RouteParams::parse_query("page=1&page=3"), Vec::new());
		assert_eq!(params.get("page"), Some("3"));
	}

	#[rstest]
	fn test_get_as_parses() {
		let params: RouteParams = [("page", "4")].into_iter().collect();
		assert_eq!(params.get_as::<u32>("page").unwrap(), 4);
	}

	#[rstest]
	fn test_get_as_missing() {
		let params = RouteParams::new();
		assert_eq!(
			params.get_as::<u32>("page"),
			Err(ParamError::Missing("page".to_string()))
		);
	}

	#[rstest]
	fn test_get_as_parse_error() {
		let params: RouteParams = [("page", "four")].into_iter().collect();
		let err = params.get_as::<u32>("page").unwrap_err();
		assert!(matches!(err, ParamError::Parse { ref raw_value, .. } if raw_value == "four"));
	}

	#[rstest]
	fn test_serializes_as_flat_map() {
		let params: RouteParams = [("id", "7")].into_iter().collect();
		assert_eq!(serde_json::to_string(&params).unwrap(), r#"{"id":"7"}"#);
	}
}
