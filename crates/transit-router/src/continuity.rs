//! Session continuity: surviving full page reloads.
//!
//! Hash-based navigation state is lost on reload, so the last activated
//! path is kept in session-scoped storage and restored when the router
//! starts on an empty location. Values are stored JSON-encoded, the same
//! way the rest of the application writes to browser storage.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::BoxError;
use crate::route::RouteTable;
use crate::settings::RouterSettings;

/// Durable key-value storage scoped to the browsing session.
pub trait SessionStorage: Send + Sync {
	/// Reads a value.
	fn get(&self, key: &str) -> Option<String>;

	/// Writes a value.
	fn set(&self, key: &str, value: &str) -> Result<(), BoxError>;

	/// Deletes a value.
	fn remove(&self, key: &str);
}

/// In-memory [`SessionStorage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
	entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
	/// Creates empty storage.
	pub fn new() -> Self {
		Self::default()
	}
}

impl SessionStorage for MemoryStorage {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.read().get(key).cloned()
	}

	fn set(&self, key: &str, value: &str) -> Result<(), BoxError> {
		self.entries
			.write()
			.insert(key.to_string(), value.to_string());
		Ok(())
	}

	fn remove(&self, key: &str) {
		self.entries.write().remove(key);
	}
}

/// Normalizes a location into a path: no `#`/`#!` prefix, a leading `/`,
/// and no trailing `/` on the path part (the root stays `/`).
pub fn normalize_path(location: &str) -> String {
	let location = location.trim();
	let location = location.strip_prefix('#').unwrap_or(location);
	let location = location.strip_prefix('!').unwrap_or(location);

	let (path, query) = match location.split_once('?') {
		Some((path, query)) => (path, Some(query)),
		None => (location, None),
	};
	let path = path.trim_end_matches('/');

	let mut normalized = String::with_capacity(location.len() + 1);
	if !path.starts_with('/') {
		normalized.push('/');
	}
	normalized.push_str(path);
	if let Some(query) = query.filter(|query| !query.is_empty()) {
		normalized.push('?');
		normalized.push_str(query);
	}
	normalized
}

fn path_part(path: &str) -> &str {
	path.split_once('?').map_or(path, |(path, _)| path)
}

/// Reads and writes the continuity record.
pub struct Continuity {
	storage: Arc<dyn SessionStorage>,
	key: String,
	return_to_key: String,
	denylist: BTreeSet<String>,
}

impl std::fmt::Debug for Continuity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Continuity")
			.field("key", &self.key)
			.field("return_to_key", &self.return_to_key)
			.field("denylist", &self.denylist)
			.finish()
	}
}

impl Continuity {
	/// Creates the continuity record handler.
	///
	/// The denylist always holds the root, the home and not-found routes,
	/// the login and access-denied paths, plus the configured extra paths.
	pub fn new(
		storage: Arc<dyn SessionStorage>,
		settings: &RouterSettings,
		table: &RouteTable,
	) -> Self {
		let denylist = ["/"]
			.into_iter()
			.chain([table.home().path(), table.not_found().path()])
			.chain([
				settings.login_path.as_str(),
				settings.access_denied_path.as_str(),
			])
			.chain(settings.continuity_denylist.iter().map(String::as_str))
			.map(|path| path_part(&normalize_path(path)).to_string())
			.collect();

		Self {
			storage,
			key: settings.continuity_key.clone(),
			return_to_key: settings.return_to_key.clone(),
			denylist,
		}
	}

	/// Returns whether `location` may never be persisted or restored.
	pub fn is_denied(&self, location: &str) -> bool {
		self.denylist
			.contains(path_part(&normalize_path(location)))
	}

	/// Persists `location` as the last visited path unless it is denylisted.
	///
	/// Returns whether a record was written. A storage failure is logged and
	/// does not affect navigation.
	pub fn remember(&self, location: &str) -> bool {
		if self.is_denied(location) {
			return false;
		}
		self.write(&self.key, &normalize_path(location))
	}

	/// Returns the last visited path, if one is stored and allowed.
	pub fn restore(&self) -> Option<String> {
		let path = self.read(&self.key)?;
		if self.is_denied(&path) {
			tracing::debug!(path = %path, "ignoring denylisted continuity record");
			return None;
		}
		Some(path)
	}

	/// Returns the raw continuity record without denylist filtering.
	pub fn last_path(&self) -> Option<String> {
		self.read(&self.key)
	}

	/// Forgets the last visited path.
	pub fn clear(&self) {
		self.storage.remove(&self.key);
	}

	/// Withdraws the record of `location`, putting back `previous` unless it
	/// names the same path.
	///
	/// Returns `false` without touching storage when the stored record is not
	/// `location`.
	pub fn retract(&self, location: &str, previous: Option<&str>) -> bool {
		let location = normalize_path(location);
		if self.last_path().as_deref() != Some(location.as_str()) {
			return false;
		}
		match previous.filter(|path| *path != location) {
			Some(path) => {
				self.write(&self.key, path);
			}
			None => self.clear(),
		}
		true
	}

	/// Stores where an unauthenticated navigation was headed.
	pub fn remember_intended(&self, location: &str) -> bool {
		if self.is_denied(location) {
			return false;
		}
		self.write(&self.return_to_key, &normalize_path(location))
	}

	/// Takes the stored intended destination, clearing it.
	pub fn take_intended(&self) -> Option<String> {
		let path = self.read(&self.return_to_key);
		self.storage.remove(&self.return_to_key);
		path.filter(|path| !self.is_denied(path))
	}

	fn write(&self, key: &str, path: &str) -> bool {
		let encoded = match serde_json::to_string(path) {
			Ok(encoded) => encoded,
			Err(err) => {
				tracing::warn!(key = %key, error = %err, "failed to encode continuity record");
				return false;
			}
		};
		match self.storage.set(key, &encoded) {
			Ok(()) => true,
			Err(err) => {
				tracing::warn!(key = %key, error = %err, "failed to persist continuity record");
				false
			}
		}
	}

	fn read(&self, key: &str) -> Option<String> {
		let raw = self.storage.get(key)?;
		match serde_json::from_str::<String>(&raw) {
			Ok(path) => Some(normalize_path(&path)),
			Err(err) => {
				tracing::warn!(key = %key, error = %err, "discarding corrupted continuity record");
				None
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::route::{HOME_SCREEN, NOT_FOUND_SCREEN, RouteDefinition};
	use rstest::{fixture, rstest};

	struct Fixture {
		storage: Arc<MemoryStorage>,
		continuity: Continuity,
	}

	#[fixture]
	fn harness() -> Fixture {
		let table = RouteTable::new([
			RouteDefinition::new("/home", HOME_SCREEN),
			RouteDefinition::new("/404", NOT_FOUND_SCREEN),
			RouteDefinition::new("/login", "Login"),
			RouteDefinition::new("/routes", "Routes"),
		])
		.unwrap();
		let storage = Arc::new(MemoryStorage::new());
		let continuity = Continuity::new(storage.clone(), &RouterSettings::default(), &table);
		Fixture {
			storage,
			continuity,
		}
	}

	#[rstest]
	#[case("#/routes", "/routes")]
	#[case("#!/routes/", "/routes")]
	#[case("routes", "/routes")]
	#[case("/routes?page=2", "/routes?page=2")]
	#[case("#/routes/?", "/routes")]
	#[case("#/", "/")]
	#[case("", "/")]
	fn test_normalize_path(#[case] location: &str, #[case] expected: &str) {
		assert_eq!(normalize_path(location), expected);
	}

	#[rstest]
	#[case("/")]
	#[case("#/")]
	#[case("")]
	#[case("/home")]
	#[case("#/login?next=x")]
	#[case("/404")]
	#[case("/access-denied")]
	fn test_denylist(harness: Fixture, #[case] location: &str) {
		assert!(harness.continuity.is_denied(location));
		assert!(!harness.continuity.remember(location));
		assert_eq!(harness.continuity.last_path(), None);
	}

	#[rstest]
	fn test_remember_and_restore(harness: Fixture) {
		assert!(harness.continuity.remember("#/routes?page=3"));

		assert_eq!(
			harness.storage.get("last-route").as_deref(),
			Some(r#""/routes?page=3""#)
		);
		assert_eq!(
			harness.continuity.restore().as_deref(),
			Some("/routes?page=3")
		);
	}

	#[rstest]
	fn test_restore_ignores_denylisted_record(harness: Fixture) {
		// Arrange
		harness
			.storage
			.set("last-route", r#""/login""#)
			.unwrap();

		// Act
		let restored = harness.continuity.restore();

		// Assert
		assert_eq!(restored, None);
		assert_eq!(harness.continuity.last_path().as_deref(), Some("/login"));
	}

	#[rstest]
	fn test_restore_discards_corrupted_record(harness: Fixture) {
		harness.storage.set("last-route", "/routes").unwrap();

		assert_eq!(harness.continuity.restore(), None);
	}

	#[rstest]
	fn test_intended_destination_is_taken_once(harness: Fixture) {
		assert!(harness.continuity.remember_intended("#/routes"));

		assert_eq!(
			harness.continuity.take_intended().as_deref(),
			Some("/routes")
		);
		assert_eq!(harness.continuity.take_intended(), None);
	}

	#[rstest]
	#[case(None, None)]
	#[case(Some("/stops"), Some(r#""/stops""#))]
	#[case(Some("/routes"), None)]
	fn test_retract_puts_back_previous_record(
		harness: Fixture,
		#[case] previous: Option<&str>,
		#[case] expected: Option<&str>,
	) {
		harness.continuity.remember("#/routes");

		assert!(harness.continuity.retract("#/routes/", previous));

		assert_eq!(harness.storage.get("last-route").as_deref(), expected);
	}

	#[rstest]
	fn test_retract_ignores_other_records(harness: Fixture) {
		harness.continuity.remember("/stops");

		assert!(!harness.continuity.retract("/routes", None));

		assert_eq!(harness.continuity.last_path().as_deref(), Some("/stops"));
	}

	#[rstest]
	fn test_clear(harness: Fixture) {
		harness.continuity.remember("/routes");
		harness.continuity.clear();

		assert_eq!(harness.continuity.last_path(), None);
	}
}
