//! Router settings.
//!
//! Settings are plain serde data with defaults for every field, so a TOML
//! document only needs the keys it overrides:
//!
//! ```toml
//! cache_capacity = 512
//! login_path = "/sign-in"
//! public_screens = ["SignIn", "404", "AccessDenied"]
//! login_screens = ["SignIn"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Tunables and well-known paths of the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterSettings {
	/// Storage key of the continuity record.
	pub continuity_key: String,
	/// Storage key of the intended destination record.
	pub return_to_key: String,
	/// Remember where an unauthenticated navigation was headed.
	pub remember_intended_destination: bool,
	/// Maximum number of memoized locations.
	pub cache_capacity: usize,
	/// Maximum resolutions one [`Router::settle`](crate::Router::settle) may run.
	pub max_redirect_hops: usize,
	/// Where unauthenticated navigations are sent.
	pub login_path: String,
	/// Where navigations lacking a required role are sent.
	pub access_denied_path: String,
	/// Screens reachable without a session.
	pub public_screens: Vec<String>,
	/// Public screens an authenticated session is bounced away from.
	pub login_screens: Vec<String>,
	/// Extra paths never persisted as the continuity record.
	pub continuity_denylist: Vec<String>,
}

impl Default for RouterSettings {
	fn default() -> Self {
		Self {
			continuity_key: "last-route".to_string(),
			return_to_key: "return-to".to_string(),
			remember_intended_destination: false,
			cache_capacity: 256,
			max_redirect_hops: 16,
			login_path: "/login".to_string(),
			access_denied_path: "/access-denied".to_string(),
			public_screens: vec![
				"Login".to_string(),
				"SignIn".to_string(),
				"404".to_string(),
				"AccessDenied".to_string(),
			],
			login_screens: vec!["Login".to_string(), "SignIn".to_string()],
			continuity_denylist: Vec::new(),
		}
	}
}

impl RouterSettings {
	/// Parses and validates settings from a TOML document.
	pub fn from_toml_str(document: &str) -> Result<Self, SettingsError> {
		let settings: Self = toml::from_str(document)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Reads, parses and validates settings from a TOML file.
	pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
		let path = path.as_ref();
		let document = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&document)
	}

	/// Checks that every setting holds a usable value.
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.continuity_key.is_empty() {
			return Err(SettingsError::Invalid {
				field: "continuity_key",
				reason: "must not be empty".to_string(),
			});
		}
		if self.return_to_key == self.continuity_key {
			return Err(SettingsError::Invalid {
				field: "return_to_key",
				reason: "must differ from continuity_key".to_string(),
			});
		}
		if self.cache_capacity == 0 {
			return Err(SettingsError::Invalid {
				field: "cache_capacity",
				reason: "must be greater than zero".to_string(),
			});
		}
		if self.max_redirect_hops == 0 {
			return Err(SettingsError::Invalid {
				field: "max_redirect_hops",
				reason: "must be greater than zero".to_string(),
			});
		}
		for (field, path) in [
			("login_path", &self.login_path),
			("access_denied_path", &self.access_denied_path),
		] {
			if !path.starts_with('/') {
				return Err(SettingsError::Invalid {
					field,
					reason: format!("'{}' must start with '/'", path),
				});
			}
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Write;

	#[rstest]
	fn test_defaults_are_valid() {
		let settings = RouterSettings::default();
		assert!(settings.validate().is_ok());
		assert_eq!(settings.continuity_key, "last-route");
		assert_eq!(settings.cache_capacity, 256);
	}

	#[rstest]
	fn test_partial_document_keeps_defaults() {
		let settings = RouterSettings::from_toml_str(
			r#"
cache_capacity = 32
login_path = "/sign-in"
"#,
		)
		.unwrap();

		assert_eq!(settings.cache_capacity, 32);
		assert_eq!(settings.login_path, "/sign-in");
		assert_eq!(settings.max_redirect_hops, 16);
		assert_eq!(settings.login_screens, vec!["Login", "SignIn"]);
	}

	#[rstest]
	#[case("cache_capacity = 0", "cache_capacity")]
	#[case("max_redirect_hops = 0", "max_redirect_hops")]
	#[case(r#"continuity_key = """#, "continuity_key")]
	#[case(r#"return_to_key = "last-route""#, "return_to_key")]
	#[case(r#"login_path = "login""#, "login_path")]
	#[case(r#"access_denied_path = "denied""#, "access_denied_path")]
	fn test_invalid_values(#[case] document: &str, #[case] expected_field: &str) {
		let err = RouterSettings::from_toml_str(document).unwrap_err();
		assert!(matches!(err, SettingsError::Invalid { field, .. } if field == expected_field));
	}

	#[rstest]
	fn test_malformed_document() {
		let err = RouterSettings::from_toml_str("cache_capacity = \"many\"").unwrap_err();
		assert!(matches!(err, SettingsError::Parse(_)));
	}

	#[rstest]
	fn test_from_file() {
		// Arrange
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "remember_intended_destination = true").unwrap();

		// Act
		let settings = RouterSettings::from_toml_file(file.path()).unwrap();

		// Assert
		assert!(settings.remember_intended_destination);
	}

	#[rstest]
	fn test_missing_file() {
		let dir = tempfile::tempdir().unwrap();
		let err = RouterSettings::from_toml_file(dir.path().join("router.toml")).unwrap_err();
		assert!(matches!(err, SettingsError::Io { .. }));
	}
}
