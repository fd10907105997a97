//! Route path patterns.
//!
//! A pattern is compiled once into an anchored regex that accepts the path
//! either bare (`/routes/42`) or as a hash address (`#/routes/42`, `#!/routes/42`),
//! with an optional trailing slash and an optional query string.

use crate::error::{ParamError, PatternError};
use crate::params::RouteParams;

/// Maximum allowed length for a route pattern string in bytes.
const MAX_PATTERN_LENGTH: usize = 1024;

/// Maximum allowed number of path segments in a route pattern.
const MAX_PATH_SEGMENTS: usize = 32;

/// Maximum allowed size for a compiled pattern regex (in bytes).
const MAX_REGEX_SIZE: usize = 1 << 20; // 1 MiB

const UUID_REGEX: &str = "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}";

/// How a path parameter's value is constrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
	/// One path segment (`{name}`, `{name:str}`, `:name`).
	Str,
	/// Decimal digits (`{name:int}`).
	Int,
	/// Lowercase hyphenated UUID (`{name:uuid}`).
	Uuid,
	/// Letters, digits, hyphens and underscores (`{name:slug}`).
	Slug,
	/// Rest of the path including separators (`{name:*}`, `{name:path}`).
	Path,
}

impl Converter {
	fn parse(param: &str, converter: &str) -> Result<Self, PatternError> {
		match converter {
			"" | "str" => Ok(Self::Str),
			"int" => Ok(Self::Int),
			"uuid" => Ok(Self::Uuid),
			"slug" => Ok(Self::Slug),
			"*" | "path" => Ok(Self::Path),
			other => Err(PatternError::UnknownConverter {
				param: param.to_string(),
				converter: other.to_string(),
			}),
		}
	}

	// Every converter excludes `?` so the query string is never swallowed.
	fn regex(self) -> &'static str {
		match self {
			Self::Str => "[^/?#]+",
			Self::Int => "[0-9]+",
			Self::Uuid => UUID_REGEX,
			Self::Slug => "[-a-zA-Z0-9_]+",
			Self::Path => "[^?#]*",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Param { name: String, converter: Converter },
}

/// Values captured by a successful [`RoutePattern::captures`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternMatch {
	/// Named path parameters in pattern order.
	pub params: Vec<(String, String)>,
	/// Raw query string after `?`, if any.
	pub query: Option<String>,
}

/// A compiled route pattern.
///
/// Supported syntax:
/// - `/stops` - Exact match
/// - `/routes/{id}` or `/routes/:id` - Single path segment
/// - `/routes/{id:uuid}` - Converter constrained segment (`int`, `uuid`, `slug`, `str`)
/// - `/files/{path:*}` - Rest of the path, separators included
#[derive(Debug, Clone)]
pub struct RoutePattern {
	pattern: String,
	segments: Vec<Segment>,
	regex: regex::Regex,
	param_names: Vec<String>,
}

impl RoutePattern {
	/// Compiles a route pattern.
	///
	/// # Errors
	///
	/// Returns [`PatternError`] if the pattern exceeds the length or segment
	/// limits, has a malformed placeholder, or compiles to an invalid regex.
	pub fn new(pattern: &str) -> Result<Self, PatternError> {
		if pattern.len() > MAX_PATTERN_LENGTH {
			return Err(PatternError::TooLong {
				length: pattern.len(),
				max: MAX_PATTERN_LENGTH,
			});
		}

		let segment_count = pattern.split('/').count();
		if segment_count > MAX_PATH_SEGMENTS {
			return Err(PatternError::TooManySegments {
				segments: segment_count,
				max: MAX_PATH_SEGMENTS,
			});
		}

		let body = match pattern.strip_suffix('/') {
			Some(trimmed) if !trimmed.is_empty() => trimmed,
			_ => pattern,
		};
		let segments = Self::parse_segments(body)?;

		let mut regex_str = String::from("^(?:#!?)?");
		let mut param_names = Vec::new();
		for segment in &segments {
			match segment {
				Segment::Literal(text) => regex_str.push_str(&regex::escape(text)),
				Segment::Param { name, converter } => {
					regex_str.push_str(&format!("(?P<{}>{})", name, converter.regex()));
					param_names.push(name.clone());
				}
			}
		}
		regex_str.push_str(r"/?(?:\?(.*))?$");

		let regex = regex::RegexBuilder::new(&regex_str)
			.size_limit(MAX_REGEX_SIZE)
			.build()
			.map_err(|e| PatternError::Regex(e.to_string()))?;

		Ok(Self {
			pattern: pattern.to_string(),
			segments,
			regex,
			param_names,
		})
	}

	fn parse_segments(pattern: &str) -> Result<Vec<Segment>, PatternError> {
		let mut segments = Vec::new();
		let mut literal = String::new();
		let mut chars = pattern.chars().peekable();

		while let Some(c) = chars.next() {
			match c {
				'{' => {
					let mut placeholder = String::new();
					loop {
						match chars.next() {
							Some('}') => break,
							Some(ch) => placeholder.push(ch),
							None => return Err(PatternError::Unterminated(pattern.to_string())),
						}
					}
					let (name, converter) = placeholder
						.split_once(':')
						.unwrap_or((placeholder.as_str(), ""));
					Self::validate_name(name)?;
					if !literal.is_empty() {
						segments.push(Segment::Literal(std::mem::take(&mut literal)));
					}
					segments.push(Segment::Param {
						name: name.to_string(),
						converter: Converter::parse(name, converter)?,
					});
				}
				':' if chars
					.peek()
					.is_some_and(|next| next.is_ascii_alphabetic() || *next == '_') =>
				{
					let mut name = String::new();
					while let Some(&next) = chars.peek() {
						if !(next.is_ascii_alphanumeric() || next == '_') {
							break;
						}
						name.push(next);
						chars.next();
					}
					if !literal.is_empty() {
						segments.push(Segment::Literal(std::mem::take(&mut literal)));
					}
					segments.push(Segment::Param {
						name,
						converter: Converter::Str,
					});
				}
				_ => literal.push(c),
			}
		}

		if !literal.is_empty() {
			segments.push(Segment::Literal(literal));
		}
		Ok(segments)
	}

	fn validate_name(name: &str) -> Result<(), PatternError> {
		let mut chars = name.chars();
		let valid_start = chars
			.next()
			.is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
		if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
			Ok(())
		} else {
			Err(PatternError::InvalidParamName(name.to_string()))
		}
	}

	/// Returns the original pattern string.
	pub fn pattern(&self) -> &str {
		&self.pattern
	}

	/// Returns the parameter names in pattern order.
	pub fn param_names(&self) -> &[String] {
		&self.param_names
	}

	/// Returns whether this pattern has no parameters.
	pub fn is_exact(&self) -> bool {
		self.param_names.is_empty()
	}

	/// Checks if this pattern would match the given location.
	pub fn is_match(&self, location: &str) -> bool {
		self.regex.is_match(location)
	}

	/// Matches a location, returning path parameters and the raw query string.
	pub fn captures(&self, location: &str) -> Option<PatternMatch> {
		let caps = self.regex.captures(location)?;

		let params = self
			.param_names
			.iter()
			.filter_map(|name| {
				caps.name(name)
					.map(|m| (name.clone(), m.as_str().to_string()))
			})
			.collect();

		// Parameter groups come first, the query group is the last one.
		let query = caps
			.get(self.param_names.len() + 1)
			.map(|m| m.as_str().to_string());

		Some(PatternMatch { params, query })
	}

	/// Builds a path from this pattern with the given parameters.
	///
	/// # Errors
	///
	/// Returns [`ParamError::Missing`] for the first parameter not in `params`.
	pub fn reverse(&self, params: &RouteParams) -> Result<String, ParamError> {
		let mut path = String::new();
		for segment in &self.segments {
			match segment {
				Segment::Literal(text) => path.push_str(text),
				Segment::Param { name, .. } => {
					let value = params
						.get(name)
						.ok_or_else(|| ParamError::Missing(name.clone()))?;
					path.push_str(value);
				}
			}
		}
		Ok(path)
	}
}

impl PartialEq for RoutePattern {
	fn eq(&self, other: &Self) -> bool {
		self.pattern == other.pattern
	}
}

impl Eq for RoutePattern {}

impl std::fmt::Display for RoutePattern {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.pattern)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("/stops")]
	#[case("/stops/")]
	#[case("#/stops")]
	#[case("#!/stops")]
	#[case("#/stops?city=ankara")]
	fn test_exact_pattern_accepts_address_forms(#[case] location: &str) {
		let pattern = RoutePattern::new("/stops").unwrap();
		assert!(pattern.is_exact());
		assert!(pattern.is_match(location));
	}

	#[rstest]
	#[case("/stops/42")]
	#[case("#/stopsX")]
	#[case("##/stops")]
	#[case("stops")]
	fn test_exact_pattern_rejects(#[case] location: &str) {
		let pattern = RoutePattern::new("/stops").unwrap();
		assert!(!pattern.is_match(location));
	}

	#[rstest]
	fn test_single_param() {
		let pattern = RoutePattern::new("/routes/{id}").unwrap();
		let matched = pattern.captures("#/routes/42").unwrap();

		assert_eq!(matched.params, vec![("id".to_string(), "42".to_string())]);
		assert_eq!(matched.query, None);
	}

	#[rstest]
	fn test_colon_shorthand_is_single_segment() {
		let pattern = RoutePattern::new("/routes/:id").unwrap();
		assert_eq!(pattern.param_names(), &["id"]);
		assert!(pattern.is_match("#/routes/abc"));
		assert!(!pattern.is_match("#/routes/abc/stops"));
	}

	#[rstest]
	fn test_param_does_not_swallow_query() {
		let pattern = RoutePattern::new("/routes/{id}").unwrap();
		let matched = pattern.captures("#/routes/42?tab=stops").unwrap();

		assert_eq!(matched.params, vec![("id".to_string(), "42".to_string())]);
		assert_eq!(matched.query.as_deref(), Some("tab=stops"));
	}

	#[rstest]
	fn test_multiple_params() {
		let pattern = RoutePattern::new("/cities/{city}/stops/{stop_id:int}/").unwrap();
		let matched = pattern.captures("#/cities/izmir/stops/7/").unwrap();

		assert_eq!(
			matched.params,
			vec![
				("city".to_string(), "izmir".to_string()),
				("stop_id".to_string(), "7".to_string()),
			]
		);
	}

	#[rstest]
	fn test_uuid_converter() {
		let pattern = RoutePattern::new("/routes/{id:uuid}").unwrap();
		assert!(pattern.is_match("#/routes/0b6d8f6e-3c39-4a34-9c0d-1f2e3a4b5c6d"));
		assert!(!pattern.is_match("#/routes/new"));
		assert!(!pattern.is_match("#/routes/0B6D8F6E-3C39-4A34-9C0D-1F2E3A4B5C6D"));
	}

	#[rstest]
	fn test_int_converter_rejects_text() {
		let pattern = RoutePattern::new("/stops/{id:int}").unwrap();
		assert!(pattern.is_match("/stops/12"));
		assert!(!pattern.is_match("/stops/twelve"));
	}

	#[rstest]
	fn test_wildcard_param() {
		let pattern = RoutePattern::new("/files/{path:*}").unwrap();
		let matched = pattern.captures("#/files/banners/2024/summer.png").unwrap();

		assert_eq!(
			matched.params,
			vec![("path".to_string(), "banners/2024/summer.png".to_string())]
		);
	}

	#[rstest]
	fn test_special_chars_escaped() {
		let pattern = RoutePattern::new("/api/v1.0").unwrap();
		assert!(pattern.is_match("/api/v1.0"));
		assert!(!pattern.is_match("/api/v1X0"));
	}

	#[rstest]
	fn test_reverse() {
		let pattern = RoutePattern::new("/cities/{city}/stops/{id:int}").unwrap();
		let params: RouteParams = [("city", "bursa"), ("id", "3")].into_iter().collect();

		assert_eq!(pattern.reverse(&params).unwrap(), "/cities/bursa/stops/3");
	}

	#[rstest]
	fn test_reverse_missing_param() {
		let pattern = RoutePattern::new("/routes/{id}").unwrap();

		assert_eq!(
			pattern.reverse(&RouteParams::new()),
			Err(ParamError::Missing("id".to_string()))
		);
	}

	#[rstest]
	fn test_unknown_converter() {
		let result = RoutePattern::new("/routes/{id:float}");
		assert!(matches!(
			result,
			Err(PatternError::UnknownConverter { converter, .. }) if converter == "float"
		));
	}

	#[rstest]
	fn test_unterminated_param() {
		assert!(matches!(
			RoutePattern::new("/routes/{id"),
			Err(PatternError::Unterminated(_))
		));
	}

	#[rstest]
	#[case("/routes/{1id}")]
	#[case("/routes/{}")]
	#[case("/routes/{id-x}")]
	fn test_invalid_param_name(#[case] pattern: &str) {
		assert!(matches!(
			RoutePattern::new(pattern),
			Err(PatternError::InvalidParamName(_))
		));
	}

	#[rstest]
	fn test_duplicate_param_name_is_regex_error() {
		assert!(matches!(
			RoutePattern::new("/a/{id}/b/{id}"),
			Err(PatternError::Regex(_))
		));
	}

	#[rstest]
	fn test_pattern_rejects_excessive_length() {
		// Arrange
		let long_pattern = "/".to_string() + &"a".repeat(1025);

		// Act
		let result = RoutePattern::new(&long_pattern);

		// Assert
		assert!(matches!(result, Err(PatternError::TooLong { max: 1024, .. })));
	}

	#[rstest]
	fn test_pattern_rejects_excessive_segments() {
		// Arrange
		let segments: Vec<&str> = (0..35).map(|_| "seg").collect();
		let pattern = format!("/{}/", segments.join("/"));

		// Act
		let result = RoutePattern::new(&pattern);

		// Assert
		assert!(matches!(result, Err(PatternError::TooManySegments { .. })));
	}

	#[rstest]
	fn test_pattern_display_and_equality() {
		let p1 = RoutePattern::new("/routes/{id}").unwrap();
		let p2 = RoutePattern::new("/routes/{id}").unwrap();
		let p3 = RoutePattern::new("/routes/{route_id}").unwrap();

		assert_eq!(format!("{}", p1), "/routes/{id}");
		assert_eq!(p1, p2);
		assert_ne!(p1, p3);
	}
}
