//! The observable current-route cell.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::params::RouteParams;
use crate::route::RouteDefinition;

/// The active route merged with the parameters of its activation.
///
/// Values are immutable; every activation produces a new one.
#[derive(Debug, Clone)]
pub struct CurrentRoute {
	route: Arc<RouteDefinition>,
	params: RouteParams,
}

impl CurrentRoute {
	/// Creates a record for `route` activated with `params`.
	pub fn new(route: Arc<RouteDefinition>, params: RouteParams) -> Self {
		Self { route, params }
	}

	/// Returns the active definition.
	pub fn route(&self) -> &Arc<RouteDefinition> {
		&self.route
	}

	/// Returns the active screen name.
	pub fn screen(&self) -> &str {
		self.route.screen()
	}

	/// Returns the path pattern of the active definition.
	pub fn path(&self) -> &str {
		self.route.path()
	}

	/// Returns the activation parameters.
	pub fn params(&self) -> &RouteParams {
		&self.params
	}

	/// Returns one activation parameter.
	pub fn param(&self, name: &str) -> Option<&str> {
		self.params.get(name)
	}
}

/// Handle returned by [`RouteCell::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Arc<dyn Fn(&CurrentRoute, Option<&CurrentRoute>) + Send + Sync>;

/// Holds the current route and notifies observers on replacement.
pub struct RouteCell {
	current: RwLock<Arc<CurrentRoute>>,
	observers: Mutex<Vec<(SubscriptionId, Observer)>>,
	next_id: AtomicU64,
	version: AtomicU64,
}

impl std::fmt::Debug for RouteCell {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("RouteCell")
			.field("screen", &self.current.read().screen())
			.field("observers", &self.observers.lock().len())
			.field("version", &self.version())
			.finish()
	}
}

impl RouteCell {
	/// Creates a cell holding `initial`.
	pub fn new(initial: CurrentRoute) -> Self {
		Self {
			current: RwLock::new(Arc::new(initial)),
			observers: Mutex::new(Vec::new()),
			next_id: AtomicU64::new(0),
			version: AtomicU64::new(0),
		}
	}

	/// Returns the current route.
	pub fn get(&self) -> Arc<CurrentRoute> {
		Arc::clone(&self.current.read())
	}

	/// Returns how many times the value was replaced.
	pub fn version(&self) -> u64 {
		self.version.load(Ordering::Acquire)
	}

	/// Replaces the current route and notifies observers in registration order.
	///
	/// Observers run after the locks are released, so they may read the cell
	/// or register further observers.
	pub fn replace(&self, next: CurrentRoute) {
		let next = Arc::new(next);
		let previous = {
			let mut current = self.current.write();
			std::mem::replace(&mut *current, Arc::clone(&next))
		};
		self.version.fetch_add(1, Ordering::AcqRel);

		let observers: Vec<Observer> = self
			.observers
			.lock()
			.iter()
			.map(|(_, observer)| Arc::clone(observer))
			.collect();
		for observer in observers {
			observer(&next, Some(&previous));
		}
	}

	/// Registers an observer and immediately replays the current value to it
	/// with no previous route.
	pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
	where
		F: Fn(&CurrentRoute, Option<&CurrentRoute>) + Send + Sync + 'static,
	{
		let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
		let observer: Observer = Arc::new(observer);
		self.observers.lock().push((id, Arc::clone(&observer)));

		let current = self.get();
		observer(&current, None);
		id
	}

	/// Removes an observer. Returns whether it was registered.
	pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
		let mut observers = self.observers.lock();
		let before = observers.len();
		observers.retain(|(registered, _)| *registered != id);
		observers.len() != before
	}
}
