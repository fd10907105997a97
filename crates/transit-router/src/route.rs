//! Route definitions and the route table.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::access::Role;
use crate::error::{BoxError, RouteTableError};
use crate::params::RouteParams;
use crate::pattern::RoutePattern;

/// Screen name of the landing route every table must declare once.
pub const HOME_SCREEN: &str = "Home";

/// Screen name of the not-found route every table must declare once.
pub const NOT_FOUND_SCREEN: &str = "404";

/// Verdict of an `on_resolve` guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
	/// Activation may continue.
	Proceed,
	/// Activation is refused and the not-found screen is shown instead.
	Veto,
}

impl From<bool> for GuardOutcome {
	fn from(allowed: bool) -> Self {
		if allowed { Self::Proceed } else { Self::Veto }
	}
}

impl From<()> for GuardOutcome {
	fn from((): ()) -> Self {
		Self::Proceed
	}
}

/// Asynchronous predicate run with the extracted parameters before activation.
#[async_trait]
pub trait ResolveGuard: Send + Sync {
	/// Decides whether the matched route may be activated.
	///
	/// An `Err` aborts the navigation and leaves the current route unchanged.
	async fn on_resolve(&self, params: &RouteParams) -> Result<GuardOutcome, BoxError>;
}

/// Adapter turning an async closure into a [`ResolveGuard`].
pub struct GuardFn<F>(F);

#[async_trait]
impl<F, Fut, O, E> ResolveGuard for GuardFn<F>
where
	F: Fn(RouteParams) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<O, E>> + Send + 'static,
	O: Into<GuardOutcome> + Send + 'static,
	E: Into<BoxError> + Send + 'static,
{
	async fn on_resolve(&self, params: &RouteParams) -> Result<GuardOutcome, BoxError> {
		(self.0)(params.clone())
			.await
			.map(Into::into)
			.map_err(Into::into)
	}
}

/// Where a redirecting route sends the navigation.
#[derive(Debug, Clone)]
pub enum RedirectTarget {
	/// Navigate to another address; resolution starts over there.
	Path(String),
	/// Activate this definition directly with the same parameters.
	Route(RouteDefinition),
}

impl From<&str> for RedirectTarget {
	fn from(path: &str) -> Self {
		Self::Path(path.to_string())
	}
}

impl From<String> for RedirectTarget {
	fn from(path: String) -> Self {
		Self::Path(path)
	}
}

impl From<RouteDefinition> for RedirectTarget {
	fn from(route: RouteDefinition) -> Self {
		Self::Route(route)
	}
}

type RedirectFn = Arc<dyn Fn(&RouteParams) -> RedirectTarget + Send + Sync>;

/// A static mapping from a path pattern to a named screen.
#[derive(Clone)]
pub struct RouteDefinition {
	path: String,
	screen: String,
	guard: Option<Arc<dyn ResolveGuard>>,
	redirect: Option<RedirectFn>,
	required_role: Option<Role>,
}

impl std::fmt::Debug for RouteDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouteDefinition")
			.field("path", &self.path)
			.field("screen", &self.screen)
			.field("has_guard", &self.guard.is_some())
			.field("has_redirect", &self.redirect.is_some())
			.field("required_role", &self.required_role)
			.finish()
	}
}

impl RouteDefinition {
	/// Creates a route for `path` activating `screen`.
	pub fn new(path: impl Into<String>, screen: impl Into<String>) -> Self {
		Self {
			path: path.into(),
			screen: screen.into(),
			guard: None,
			redirect: None,
			required_role: None,
		}
	}

	/// Adds an `on_resolve` guard built from an async closure.
	///
	/// The closure may return `Ok(bool)` or `Ok(())`; only `Ok(false)` vetoes.
	pub fn on_resolve<F, Fut, O, E>(self, guard: F) -> Self
	where
		F: Fn(RouteParams) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<O, E>> + Send + 'static,
		O: Into<GuardOutcome> + Send + 'static,
		E: Into<BoxError> + Send + 'static,
	{
		self.with_guard(GuardFn(guard))
	}

	/// Adds an `on_resolve` guard.
	pub fn with_guard<G>(mut self, guard: G) -> Self
	where
		G: ResolveGuard + 'static,
	{
		self.guard = Some(Arc::new(guard));
		self
	}

	/// Makes this route an alias resolved by `redirect`.
	pub fn redirect<F, T>(mut self, redirect: F) -> Self
	where
		F: Fn(&RouteParams) -> T + Send + Sync + 'static,
		T: Into<RedirectTarget>,
	{
		self.redirect = Some(Arc::new(move |params: &RouteParams| redirect(params).into()));
		self
	}

	/// Gates this route behind `role`.
	pub fn requires_role(mut self, role: impl Into<Role>) -> Self {
		self.required_role = Some(role.into());
		self
	}

	/// Returns the path pattern.
	pub fn path(&self) -> &str {
		&self.path
	}

	/// Returns the screen name.
	pub fn screen(&self) -> &str {
		&self.screen
	}

	/// Returns the guard, if any.
	pub fn guard(&self) -> Option<&Arc<dyn ResolveGuard>> {
		self.guard.as_ref()
	}

	/// Evaluates the redirect, if this route is an alias.
	pub fn redirect_target(&self, params: &RouteParams) -> Option<RedirectTarget> {
		self.redirect.as_ref().map(|redirect| redirect(params))
	}

	/// Returns the role this route requires, if any.
	pub fn required_role(&self) -> Option<&Role> {
		self.required_role.as_ref()
	}
}

#[derive(Debug)]
struct TableEntry {
	route: Arc<RouteDefinition>,
	pattern: RoutePattern,
}

/// The ordered, immutable list of routes.
///
/// Declaration order is the match order: more specific patterns must come
/// before more general ones.
#[derive(Debug)]
pub struct RouteTable {
	entries: Vec<TableEntry>,
	home: usize,
	not_found: usize,
}

impl RouteTable {
	/// Compiles and validates a route table.
	///
	/// # Errors
	///
	/// Returns [`RouteTableError`] if a path does not compile, a screen is
	/// declared twice, or the `Home` or `404` route is missing.
	pub fn new<I>(routes: I) -> Result<Self, RouteTableError>
	where
		I: IntoIterator<Item = RouteDefinition>,
	{
		let mut entries = Vec::new();
		let mut screens = HashSet::new();

		for route in routes {
			if !screens.insert(route.screen().to_string()) {
				return Err(RouteTableError::DuplicateScreen(route.screen().to_string()));
			}
			let pattern =
				RoutePattern::new(route.path()).map_err(|source| RouteTableError::InvalidPattern {
					path: route.path().to_string(),
					source,
				})?;
			entries.push(TableEntry {
				route: Arc::new(route),
				pattern,
			});
		}

		let position = |screen: &'static str| {
			entries
				.iter()
				.position(|entry| entry.route.screen() == screen)
				.ok_or(RouteTableError::MissingSentinel(screen))
		};
		let home = position(HOME_SCREEN)?;
		let not_found = position(NOT_FOUND_SCREEN)?;

		Ok(Self {
			entries,
			home,
			not_found,
		})
	}

	/// Returns the `Home` route.
	pub fn home(&self) -> &Arc<RouteDefinition> {
		&self.entries[self.home].route
	}

	/// Returns the `404` route.
	pub fn not_found(&self) -> &Arc<RouteDefinition> {
		&self.entries[self.not_found].route
	}

	/// Finds the route declared for `screen`.
	pub fn find_screen(&self, screen: &str) -> Option<&Arc<RouteDefinition>> {
		self.entries
			.iter()
			.find(|entry| entry.route.screen() == screen)
			.map(|entry| &entry.route)
	}

	/// Returns the compiled pattern of the route declared for `screen`.
	pub fn pattern_for(&self, screen: &str) -> Option<&RoutePattern> {
		self.entries
			.iter()
			.find(|entry| entry.route.screen() == screen)
			.map(|entry| &entry.pattern)
	}

	/// Iterates routes with their compiled patterns in declaration order.
	pub fn iter(&self) -> impl Iterator<Item = (&Arc<RouteDefinition>, &RoutePattern)> {
		self.entries
			.iter()
			.map(|entry| (&entry.route, &entry.pattern))
	}

	/// Returns the number of routes.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns whether the table is empty. A valid table never is.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
