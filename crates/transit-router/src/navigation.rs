//! Read access to the current route for views.

use std::sync::Arc;

use crate::core::Router;
use crate::current::{CurrentRoute, SubscriptionId};
use crate::error::NavigationError;
use crate::params::RouteParams;

impl Router {
	/// Returns the current route.
	pub fn current_route(&self) -> Arc<CurrentRoute> {
		self.current.get()
	}

	/// Returns the current screen name.
	pub fn current_screen(&self) -> String {
		self.current.get().screen().to_string()
	}

	/// Returns whether the current screen is one of `screens`.
	pub fn is_current_screen(&self, screens: &[&str]) -> bool {
		let current = self.current.get();
		screens.contains(&current.screen())
	}

	/// Returns a parameter of the current activation.
	pub fn route_param(&self, name: &str) -> Option<String> {
		self.current.get().param(name).map(str::to_string)
	}

	/// Returns how many activations happened since construction.
	pub fn activation_count(&self) -> u64 {
		self.current.version()
	}

	/// Registers `observer` for every activation.
	///
	/// It is called right away with the current route and no previous one,
	/// then with `(new, old)` on each activation, after earlier observers.
	pub fn on_route_changed<F>(&self, observer: F) -> SubscriptionId
	where
		F: Fn(&CurrentRoute, Option<&CurrentRoute>) + Send + Sync + 'static,
	{
		self.current.subscribe(observer)
	}

	/// Removes an observer registered with [`on_route_changed`](Self::on_route_changed)
	/// or [`on_screen_activated`](Self::on_screen_activated).
	pub fn off_route_changed(&self, id: SubscriptionId) -> bool {
		self.current.unsubscribe(id)
	}

	/// Calls `callback` whenever `screen` becomes active, including right
	/// away if it already is.
	pub fn on_screen_activated<F>(&self, screen: impl Into<String>, callback: F) -> SubscriptionId
	where
		F: Fn(&RouteParams) + Send + Sync + 'static,
	{
		let screen = screen.into();
		self.current.subscribe(move |new, _| {
			if new.screen() == screen {
				callback(new.params());
			}
		})
	}

	/// Builds the path of `screen` from `params`.
	///
	/// # Errors
	///
	/// Returns [`NavigationError::UnknownScreen`] if no route activates
	/// `screen`, or [`NavigationError::Param`] if a parameter is missing.
	pub fn reverse(&self, screen: &str, params: &[(&str, &str)]) -> Result<String, NavigationError> {
		let pattern = self
			.table()
			.pattern_for(screen)
			.ok_or_else(|| NavigationError::UnknownScreen(screen.to_string()))?;
		let params: RouteParams = params.iter().copied().collect();
		Ok(pattern.reverse(&params)?)
	}
}
