//! The navigation router.
//!
//! A [`Router`] owns the route table, the match cache, the current-route cell
//! and the resolver state. Navigation requests only touch the
//! [`AddressBar`]; the resulting events are turned into route activations by
//! [`Router::resolve`], driven either by [`Router::listen`] or
//! [`Router::settle`].

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::access::{AccessDecision, AccessPolicy, IdentityProvider, StaticIdentity};
use crate::address::{AddressBar, MemoryAddressBar, NavigationEvent};
use crate::continuity::{Continuity, MemoryStorage, SessionStorage, normalize_path};
use crate::current::{CurrentRoute, RouteCell};
use crate::error::{NavigationError, SettingsError};
use crate::matcher::{CacheStats, Matcher};
use crate::params::RouteParams;
use crate::route::{GuardOutcome, RedirectTarget, RouteDefinition, RouteTable};
use crate::settings::RouterSettings;

/// Whether a resolution is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
	/// Ready to accept a resolution.
	Idle,
	/// A resolution is in flight; further requests are dropped.
	Resolving,
}

/// Outcome of one call to [`Router::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
	/// The screen was activated.
	Activated {
		/// Activated screen.
		screen: String,
	},
	/// No route matched; the not-found screen was activated.
	NotFound,
	/// The route's guard vetoed; the not-found screen was activated.
	Vetoed {
		/// Screen whose guard vetoed.
		screen: String,
	},
	/// Access was denied and a redirect was issued.
	Denied(AccessDecision),
	/// The matched route is an alias; navigation continues at `to`.
	Redirected {
		/// Hash navigated to.
		to: String,
	},
	/// The location was empty and the continuity record was restored.
	Restored {
		/// Hash navigated to.
		to: String,
	},
	/// The resolver was busy or not ready; nothing happened.
	Dropped,
}

/// Target of [`Router::go`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
	/// Move through session history by this offset.
	Offset(i32),
	/// Navigate to this path.
	Path(String),
}

impl From<i32> for Destination {
	fn from(delta: i32) -> Self {
		Self::Offset(delta)
	}
}

impl From<&str> for Destination {
	fn from(path: &str) -> Self {
		Self::Path(path.to_string())
	}
}

impl From<String> for Destination {
	fn from(path: String) -> Self {
		Self::Path(path)
	}
}

impl From<&String> for Destination {
	fn from(path: &String) -> Self {
		Self::Path(path.clone())
	}
}

/// Turns a path into the hash address written to the address bar.
///
/// `stops`, `/stops`, `#/stops` and `#!/stops` all become `#/stops`.
pub fn to_hash(path: &str) -> String {
	let path = path.trim();
	let path = path.strip_prefix('#').unwrap_or(path);
	let path = path.strip_prefix('!').unwrap_or(path);
	let path = path.strip_prefix('/').unwrap_or(path);
	format!("#/{}", path)
}

fn is_empty_location(location: &str) -> bool {
	normalize_path(location)
		.split('?')
		.next()
		.is_none_or(|path| path == "/")
}

/// Returns the resolver to idle when dropped.
struct ResolvingFlag<'a>(&'a AtomicBool);

impl<'a> ResolvingFlag<'a> {
	fn acquire(flag: &'a AtomicBool) -> Option<Self> {
		flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
			.ok()
			.map(|_| Self(flag))
	}
}

impl Drop for ResolvingFlag<'_> {
	fn drop(&mut self) {
		self.0.store(false, Ordering::Release);
	}
}

/// Builder for [`Router`].
pub struct RouterBuilder {
	table: Arc<RouteTable>,
	address: Option<Arc<dyn AddressBar>>,
	storage: Option<Arc<dyn SessionStorage>>,
	identity: Option<Arc<dyn IdentityProvider>>,
	settings: RouterSettings,
	ready: bool,
}

impl std::fmt::Debug for RouterBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouterBuilder")
			.field("routes_count", &self.table.len())
			.field("has_address", &self.address.is_some())
			.field("has_storage", &self.storage.is_some())
			.field("has_identity", &self.identity.is_some())
			.field("settings", &self.settings)
			.field("ready", &self.ready)
			.finish()
	}
}

impl RouterBuilder {
	/// Sets the address bar. Defaults to an empty [`MemoryAddressBar`].
	pub fn address(mut self, address: Arc<dyn AddressBar>) -> Self {
		self.address = Some(address);
		self
	}

	/// Sets the session storage. Defaults to [`MemoryStorage`].
	pub fn storage(mut self, storage: Arc<dyn SessionStorage>) -> Self {
		self.storage = Some(storage);
		self
	}

	/// Sets the identity provider. Defaults to an anonymous [`StaticIdentity`].
	pub fn identity(mut self, identity: Arc<dyn IdentityProvider>) -> Self {
		self.identity = Some(identity);
		self
	}

	/// Sets the settings.
	pub fn settings(mut self, settings: RouterSettings) -> Self {
		self.settings = settings;
		self
	}

	/// Drops every resolution until [`Router::mark_ready`] is called.
	pub fn defer_until_ready(mut self) -> Self {
		self.ready = false;
		self
	}

	/// Builds the router. The current route starts at `Home`.
	///
	/// # Errors
	///
	/// Returns [`SettingsError::Invalid`] if the settings do not validate.
	pub fn build(self) -> Result<Router, SettingsError> {
		self.settings.validate()?;
		let capacity =
			NonZeroUsize::new(self.settings.cache_capacity).ok_or(SettingsError::Invalid {
				field: "cache_capacity",
				reason: "must be greater than zero".to_string(),
			})?;

		let address = self
			.address
			.unwrap_or_else(|| Arc::new(MemoryAddressBar::default()));
		let storage = self
			.storage
			.unwrap_or_else(|| Arc::new(MemoryStorage::new()));
		let identity = self
			.identity
			.unwrap_or_else(|| Arc::new(StaticIdentity::anonymous()));

		let continuity = Continuity::new(storage, &self.settings, &self.table);
		let policy = AccessPolicy::from_settings(&self.settings);
		let current = RouteCell::new(CurrentRoute::new(
			Arc::clone(self.table.home()),
			RouteParams::new(),
		));
		let events = address.subscribe();

		tracing::debug!(
			routes_count = self.table.len(),
			cache_capacity = capacity.get(),
			"router constructed"
		);

		Ok(Router {
			matcher: Matcher::new(Arc::clone(&self.table), capacity),
			table: self.table,
			current,
			continuity,
			policy,
			address,
			identity,
			resolving: AtomicBool::new(false),
			ready: AtomicBool::new(self.ready),
			replaced_record: Mutex::new(None),
			events: tokio::sync::Mutex::new(events),
			settings: self.settings,
		})
	}
}

/// Hash-based navigation router.
pub struct Router {
	table: Arc<RouteTable>,
	matcher: Matcher,
	pub(crate) current: RouteCell,
	continuity: Continuity,
	policy: AccessPolicy,
	address: Arc<dyn AddressBar>,
	identity: Arc<dyn IdentityProvider>,
	resolving: AtomicBool,
	ready: AtomicBool,
	/// Record overwritten by the latest eager continuity write.
	replaced_record: Mutex<Option<String>>,
	events: tokio::sync::Mutex<broadcast::Receiver<NavigationEvent>>,
	settings: RouterSettings,
}

impl std::fmt::Debug for Router {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Router")
			.field("matcher", &self.matcher)
			.field("current", &self.current)
			.field("continuity", &self.continuity)
			.field("state", &self.state())
			.field("ready", &self.ready.load(Ordering::Acquire))
			.finish()
	}
}

impl Router {
	/// Starts building a router over `table`.
	pub fn builder(table: impl Into<Arc<RouteTable>>) -> RouterBuilder {
		RouterBuilder {
			table: table.into(),
			address: None,
			storage: None,
			identity: None,
			settings: RouterSettings::default(),
			ready: true,
		}
	}

	/// Returns the route table.
	pub fn table(&self) -> &Arc<RouteTable> {
		&self.table
	}

	/// Returns the settings.
	pub fn settings(&self) -> &RouterSettings {
		&self.settings
	}

	/// Returns the continuity record handler.
	pub fn continuity(&self) -> &Continuity {
		&self.continuity
	}

	/// Returns the match cache counters.
	pub fn cache_stats(&self) -> CacheStats {
		self.matcher.stats()
	}

	/// Returns the resolver state.
	pub fn state(&self) -> ResolverState {
		if self.resolving.load(Ordering::Acquire) {
			ResolverState::Resolving
		} else {
			ResolverState::Idle
		}
	}

	/// Lets resolutions through once the application finished starting up.
	pub fn mark_ready(&self) {
		self.ready.store(true, Ordering::Release);
	}

	/// Resolves the current address into a route activation.
	///
	/// Returns [`Resolution::Dropped`] without side effects when another
	/// resolution is in flight or the router is not ready yet.
	///
	/// # Errors
	///
	/// A failing guard or identity provider aborts the navigation: the
	/// current route is left unchanged and the resolver returns to idle.
	pub async fn resolve(&self) -> Result<Resolution, NavigationError> {
		if !self.ready.load(Ordering::Acquire) {
			tracing::debug!("router not ready, dropping resolution");
			return Ok(Resolution::Dropped);
		}
		let Some(_flag) = ResolvingFlag::acquire(&self.resolving) else {
			tracing::debug!("resolution in flight, dropping request");
			return Ok(Resolution::Dropped);
		};

		let location = self.address.hash();
		let outcome = self.run(&location).await;
		match &outcome {
			Ok(resolution) => {
				tracing::debug!(location = %location, resolution = ?resolution, "resolved");
			}
			Err(err) => {
				tracing::error!(location = %location, error = %err, "navigation aborted");
			}
		}
		outcome
	}

	async fn run(&self, location: &str) -> Result<Resolution, NavigationError> {
		if is_empty_location(location) {
			return Ok(self.resolve_empty());
		}

		let Some(matched) = self.matcher.try_match(location) else {
			tracing::debug!(location = %location, "no route matches");
			self.trigger_not_found();
			return Ok(Resolution::NotFound);
		};

		let decision = self.authorize(&matched.route, location).await?;
		if !decision.is_allowed() {
			return Ok(Resolution::Denied(decision));
		}

		let screen = matched.route.screen().to_string();
		if let Some(guard) = matched.route.guard() {
			let outcome = guard
				.on_resolve(&matched.params)
				.await
				.map_err(|source| NavigationError::Guard {
					screen: screen.clone(),
					source,
				})?;
			if outcome == GuardOutcome::Veto {
				tracing::info!(screen = %screen, "guard vetoed activation");
				self.trigger_not_found();
				return Ok(Resolution::Vetoed { screen });
			}
		}

		match matched.route.redirect_target(&matched.params) {
			Some(RedirectTarget::Path(path)) => {
				let to = self.navigate_to(&path, false);
				tracing::debug!(screen = %screen, to = %to, "alias redirect");
				Ok(Resolution::Redirected { to })
			}
			Some(RedirectTarget::Route(route)) => {
				self.continuity.remember(location);
				let screen = route.screen().to_string();
				self.activate(Arc::new(route), matched.params);
				Ok(Resolution::Activated { screen })
			}
			None => {
				self.continuity.remember(location);
				self.activate(matched.route, matched.params);
				Ok(Resolution::Activated { screen })
			}
		}
	}

	fn resolve_empty(&self) -> Resolution {
		match self.continuity.restore() {
			Some(path) => {
				tracing::info!(path = %path, "restoring last route");
				Resolution::Restored {
					to: self.navigate_to(&path, false),
				}
			}
			None => Resolution::Redirected {
				to: self.navigate_to(self.table.home().path(), false),
			},
		}
	}

	async fn authorize(
		&self,
		route: &RouteDefinition,
		location: &str,
	) -> Result<AccessDecision, NavigationError> {
		let identity = self
			.identity
			.current_identity()
			.await
			.map_err(NavigationError::Identity)?;
		let decision = self.policy.evaluate(route, identity.as_ref(), Utc::now());

		match decision {
			AccessDecision::Allow => {}
			AccessDecision::RedirectHome => {
				tracing::debug!(screen = %route.screen(), "already signed in");
				self.navigate_to(self.table.home().path(), false);
			}
			AccessDecision::RedirectLogin => {
				tracing::info!(screen = %route.screen(), "sign-in required");
				self.retract_denied(location);
				if self.settings.remember_intended_destination {
					self.continuity.remember_intended(location);
				}
				self.navigate_to(&self.settings.login_path, false);
			}
			AccessDecision::Forbidden => {
				tracing::info!(
					screen = %route.screen(),
					required_role = ?route.required_role(),
					"missing required role"
				);
				self.retract_denied(location);
				self.navigate_to(&self.settings.access_denied_path, false);
			}
		}
		Ok(decision)
	}

	fn retract_denied(&self, location: &str) {
		let previous = self.replaced_record.lock().take();
		if self.continuity.retract(location, previous.as_deref()) {
			tracing::debug!(location = %location, "withdrew continuity record of denied destination");
		}
	}

	/// Checks whether the current identity may activate `route`.
	///
	/// On denial the redirect to the login, home or access-denied screen is
	/// issued before returning `false`.
	///
	/// # Errors
	///
	/// Returns [`NavigationError::Identity`] if the identity provider fails.
	pub async fn check_access(
		&self,
		route: &RouteDefinition,
		location: &str,
	) -> Result<bool, NavigationError> {
		Ok(self.authorize(route, location).await?.is_allowed())
	}

	/// Requests navigation.
	///
	/// An offset moves through session history. A path is turned into a
	/// `#/` address, remembered as the continuity record right away, then
	/// written to the address bar, or loaded with a full document
	/// navigation when `force_reload` is set.
	pub fn go(&self, destination: impl Into<Destination>, force_reload: bool) {
		match destination.into() {
			Destination::Offset(delta) => self.address.traverse(delta),
			Destination::Path(path) => {
				self.navigate_to(&path, force_reload);
			}
		}
	}

	/// Navigates to the destination remembered before sign-in, or `Home`.
	///
	/// Returns the hash navigated to.
	pub fn go_to_intended(&self) -> String {
		let path = self
			.continuity
			.take_intended()
			.unwrap_or_else(|| self.table.home().path().to_string());
		self.navigate_to(&path, false)
	}

	fn navigate_to(&self, path: &str, force_reload: bool) -> String {
		let hash = to_hash(path);
		let previous = self.continuity.last_path();
		if self.continuity.remember(&hash) {
			*self.replaced_record.lock() = previous;
		}
		if force_reload {
			tracing::debug!(hash = %hash, "full reload");
			self.address.reload_to(&hash);
		} else {
			self.address.set_hash(&hash);
		}
		hash
	}

	/// Activates the not-found screen with no parameters.
	pub fn trigger_not_found(&self) {
		self.activate(Arc::clone(self.table.not_found()), RouteParams::new());
	}

	fn activate(&self, route: Arc<RouteDefinition>, params: RouteParams) {
		tracing::info!(screen = %route.screen(), "activating screen");
		self.current.replace(CurrentRoute::new(route, params));
	}

	/// Resolves pending navigation events until none are left.
	///
	/// Returns the last resolution, or `None` if nothing was pending. While
	/// [`listen`](Self::listen) is running it owns the event channel: `settle`
	/// returns `None` right away and the listener resolves the events.
	///
	/// # Errors
	///
	/// Returns [`NavigationError::RedirectLoop`] once more than
	/// `max_redirect_hops` resolutions were needed, or the error of the
	/// resolution that failed.
	pub async fn settle(&self) -> Result<Option<Resolution>, NavigationError> {
		let Ok(mut events) = self.events.try_lock() else {
			tracing::debug!("listener owns navigation events, nothing to settle");
			return Ok(None);
		};
		let mut last = None;
		let mut hops = 0;

		loop {
			match events.try_recv() {
				Ok(_) | Err(TryRecvError::Lagged(_)) => {}
				Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(last),
			}
			if hops == self.settings.max_redirect_hops {
				tracing::error!(hops, "navigation did not settle");
				return Err(NavigationError::RedirectLoop { hops });
			}
			hops += 1;
			last = Some(self.resolve().await?);
		}
	}

	/// Resolves the current address, then every navigation it caused.
	///
	/// With a running [`listen`](Self::listen) loop only the first resolution
	/// happens here; the listener picks up the redirects it issued.
	pub async fn start(&self) -> Result<Resolution, NavigationError> {
		let first = self.resolve().await?;
		Ok(self.settle().await?.unwrap_or(first))
	}

	/// Resolves on every navigation event until the address bar goes away.
	///
	/// This is the driver for long-running hosts; tests and one-shot callers
	/// use [`settle`](Self::settle). Failed navigations do not stop the loop.
	pub async fn listen(&self) {
		let mut events = self.events.lock().await;
		loop {
			match events.recv().await {
				Ok(event) => tracing::trace!(event = ?event, "navigation event"),
				Err(RecvError::Lagged(skipped)) => {
					tracing::warn!(skipped, "navigation events lagged");
				}
				Err(RecvError::Closed) => {
					tracing::debug!("address bar closed, listener stopping");
					return;
				}
			}
			if let Err(err) = self.resolve().await {
				tracing::debug!(error = %err, "listener continues after failed navigation");
			}
		}
	}
}
