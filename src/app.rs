//! Application bootstrap.

use std::path::Path;
use std::sync::Arc;

use transit_router::{
	AddressBar, IdentityProvider, MemoryAddressBar, MemoryStorage, NavigationError, Resolution,
	RouteTableError, Router, RouterSettings, SessionStorage, SettingsError, StaticIdentity,
};

use crate::routes::admin_routes;

/// Error type for shell bootstrap and startup.
#[derive(Debug, thiserror::Error)]
pub enum ShellError {
	/// The route table failed validation.
	#[error("Invalid route table: {0}")]
	Routes(#[from] RouteTableError),
	/// Settings could not be loaded or are invalid.
	#[error(transparent)]
	Settings(#[from] SettingsError),
	/// The first navigation failed.
	#[error("Initial navigation failed: {0}")]
	Navigation(#[from] NavigationError),
}

/// Host services the router depends on.
#[derive(Clone)]
pub struct Collaborators {
	/// Address bar and its navigation events.
	pub address: Arc<dyn AddressBar>,
	/// Session-scoped storage for the continuity record.
	pub storage: Arc<dyn SessionStorage>,
	/// Source of the signed-in administrator.
	pub identity: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for Collaborators {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Collaborators").finish_non_exhaustive()
	}
}

impl Default for Collaborators {
	/// In-memory address bar and storage, nobody signed in.
	fn default() -> Self {
		Self {
			address: Arc::new(MemoryAddressBar::default()),
			storage: Arc::new(MemoryStorage::new()),
			identity: Arc::new(StaticIdentity::anonymous()),
		}
	}
}

/// The administration application's navigation shell.
///
/// The router is built with the startup gate closed: resolutions requested
/// before [`start`](Self::start) are dropped, and `start` resolves whatever
/// the address shows by then.
#[derive(Debug, Clone)]
pub struct AdminShell {
	router: Arc<Router>,
}

impl AdminShell {
	/// Builds the shell over the administration route table.
	///
	/// # Errors
	///
	/// Returns [`ShellError::Settings`] for invalid settings, or
	/// [`ShellError::Routes`] if the route table does not validate.
	pub fn bootstrap(
		settings: RouterSettings,
		collaborators: Collaborators,
	) -> Result<Self, ShellError> {
		let table = admin_routes()?;
		tracing::info!(routes_count = table.len(), "bootstrapping admin shell");

		let router = Router::builder(table)
			.address(collaborators.address)
			.storage(collaborators.storage)
			.identity(collaborators.identity)
			.settings(settings)
			.defer_until_ready()
			.build()?;

		Ok(Self {
			router: Arc::new(router),
		})
	}

	/// Builds the shell with settings read from a TOML file.
	///
	/// # Errors
	///
	/// Returns [`ShellError::Settings`] if the file cannot be read or parsed.
	pub fn from_settings_file(
		path: impl AsRef<Path>,
		collaborators: Collaborators,
	) -> Result<Self, ShellError> {
		let path = path.as_ref();
		let settings = RouterSettings::from_toml_file(path)?;
		tracing::debug!(path = %path.display(), "loaded router settings");
		Self::bootstrap(settings, collaborators)
	}

	/// Returns the router.
	pub fn router(&self) -> &Arc<Router> {
		&self.router
	}

	/// Opens the startup gate and resolves the current address.
	///
	/// # Errors
	///
	/// Returns [`ShellError::Navigation`] if the initial navigation failed;
	/// the shell stays usable.
	pub async fn start(&self) -> Result<Resolution, ShellError> {
		self.router.mark_ready();
		let resolution = self.router.start().await?;
		tracing::info!(screen = %self.router.current_screen(), "admin shell started");
		Ok(resolution)
	}
}

/// Installs a global `tracing` formatter.
///
/// `RUST_LOG` takes precedence over `default_filter`. Returns `false` when a
/// global subscriber was already installed.
#[cfg(feature = "logging")]
pub fn init_tracing(default_filter: &str) -> bool {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_target(false)
		.try_init()
		.is_ok()
}
