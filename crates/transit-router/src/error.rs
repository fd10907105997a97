//! Error types for client-side navigation.
//!
//! Only collaborator malfunctions and invalid configuration are errors here.
//! The expected navigation outcomes (no matching route, access denied, a guard
//! veto) are reported through [`Resolution`](crate::Resolution) instead.

use std::path::PathBuf;

/// Boxed error returned by guards, identity providers and storage backends.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for route pattern compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
	/// Pattern exceeds the maximum length.
	#[error("Pattern length {length} exceeds maximum allowed length of {max} bytes")]
	TooLong {
		/// Actual length in bytes.
		length: usize,
		/// Maximum allowed length in bytes.
		max: usize,
	},
	/// Pattern has too many path segments.
	#[error("Pattern has {segments} path segments, exceeding maximum of {max}")]
	TooManySegments {
		/// Actual number of segments.
		segments: usize,
		/// Maximum allowed number of segments.
		max: usize,
	},
	/// A `{...}` placeholder was never closed.
	#[error("Unterminated parameter in pattern '{0}'")]
	Unterminated(String),
	/// A parameter name is not a valid identifier.
	#[error("Invalid parameter name '{0}'")]
	InvalidParamName(String),
	/// A parameter uses an unknown converter.
	#[error("Unknown converter '{converter}' for parameter '{param}'")]
	UnknownConverter {
		/// Parameter name.
		param: String,
		/// Converter name as written in the pattern.
		converter: String,
	},
	/// The generated regex failed to compile.
	#[error("Failed to compile pattern regex: {0}")]
	Regex(String),
}

/// Error type for route table construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteTableError {
	/// A required sentinel screen is absent.
	#[error("Route table has no '{0}' route")]
	MissingSentinel(&'static str),
	/// Two definitions share one screen name.
	#[error("Screen '{0}' is declared more than once")]
	DuplicateScreen(String),
	/// A definition's path failed to compile.
	#[error("Invalid route pattern '{path}': {source}")]
	InvalidPattern {
		/// The offending path.
		path: String,
		/// Why compilation failed.
		#[source]
		source: PatternError,
	},
}

/// Error type for typed route parameter access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
	/// The parameter is absent.
	#[error("Missing parameter: {0}")]
	Missing(String),
	/// The parameter failed to parse.
	#[error("Failed to parse parameter '{name}' value '{raw_value}' as {param_type}: {reason}")]
	Parse {
		/// Parameter name.
		name: String,
		/// Expected type name.
		param_type: &'static str,
		/// Raw string value that failed to parse.
		raw_value: String,
		/// Error message from parsing.
		reason: String,
	},
}

/// Failure of a navigation that was not a normal outcome.
///
/// When one of these is returned the current route is left untouched and
/// the resolver is back to idle.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
	/// A route's `on_resolve` guard returned an error.
	#[error("Guard for screen '{screen}' failed: {source}")]
	Guard {
		/// Screen whose guard failed.
		screen: String,
		/// The guard's error.
		#[source]
		source: BoxError,
	},
	/// The identity provider failed.
	#[error("Identity lookup failed: {0}")]
	Identity(#[source] BoxError),
	/// Pending navigation events kept producing further redirects.
	#[error("Navigation did not settle after {hops} hops")]
	RedirectLoop {
		/// Number of resolutions performed before giving up.
		hops: usize,
	},
	/// No route is registered for the screen.
	#[error("Unknown screen: {0}")]
	UnknownScreen(String),
	/// Reverse URL generation lacked a parameter.
	#[error(transparent)]
	Param(#[from] ParamError),
}

/// Error type for loading and validating router settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	/// The settings file could not be read.
	#[error("Failed to read settings file {}: {source}", path.display())]
	Io {
		/// Path that was read.
		path: PathBuf,
		/// Underlying IO error.
		#[source]
		source: std::io::Error,
	},
	/// The settings document is not valid TOML for [`RouterSettings`](crate::RouterSettings).
	#[error("Failed to parse settings: {0}")]
	Parse(#[from] toml::de::Error),
	/// A setting holds an unusable value.
	#[error("Invalid setting '{field}': {reason}")]
	Invalid {
		/// Field name.
		field: &'static str,
		/// What is wrong with it.
		reason: String,
	},
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_pattern_error_display() {
		let err = PatternError::TooLong {
			length: 2000,
			max: 1024,
		};
		assert!(err.to_string().contains("2000"));
		assert!(err.to_string().contains("1024"));
	}

	#[rstest]
	fn test_route_table_error_display() {
		assert_eq!(
			RouteTableError::MissingSentinel("Home").to_string(),
			"Route table has no 'Home' route"
		);
		assert_eq!(
			RouteTableError::DuplicateScreen("Stops".to_string()).to_string(),
			"Screen 'Stops' is declared more than once"
		);
	}

	#[rstest]
	fn test_param_error_display() {
		let err = ParamError::Parse {
			name: "id".to_string(),
			param_type: "i64",
			raw_value: "abc".to_string(),
			reason: "invalid digit found in string".to_string(),
		};
		assert!(err.to_string().contains("'id'"));
		assert!(err.to_string().contains("abc"));
		assert!(err.to_string().contains("i64"));
	}

	#[rstest]
	fn test_navigation_error_keeps_guard_source() {
		// Arrange
		let source: BoxError = "backend unreachable".into();

		// Act
		let err = NavigationError::Guard {
			screen: "Routes".to_string(),
			source,
		};

		// Assert
		assert!(err.to_string().contains("Routes"));
		let inner = std::error::Error::source(&err).map(ToString::to_string);
		assert_eq!(inner.as_deref(), Some("backend unreachable"));
	}
}
