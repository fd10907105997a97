//! The address bar the router reads from and writes to.
//!
//! In a browser this is `window.location` plus the `hashchange` and
//! `popstate` events. [`MemoryAddressBar`] keeps the same semantics in
//! process, including a back/forward history stack.

use parking_lot::RwLock;
use tokio::sync::broadcast;

/// Capacity of the navigation event channel of [`MemoryAddressBar`].
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Something happened to the address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
	/// The hash fragment was replaced in place.
	HashChanged {
		/// New hash fragment.
		hash: String,
	},
	/// Session history moved back or forward.
	Traversed {
		/// Offset that was applied.
		delta: i32,
	},
	/// A full document navigation happened.
	Reloaded {
		/// Hash fragment after the reload.
		hash: String,
	},
}

/// The UI-visible location and its change notifications.
pub trait AddressBar: Send + Sync {
	/// Returns the current hash fragment, including the leading `#` when present.
	fn hash(&self) -> String;

	/// Replaces the hash fragment in place. Emits an event when it changed.
	fn set_hash(&self, hash: &str);

	/// Performs a full document navigation to `hash`.
	fn reload_to(&self, hash: &str);

	/// Moves through session history by `delta` entries.
	fn traverse(&self, delta: i32);

	/// Subscribes to navigation events.
	fn subscribe(&self) -> broadcast::Receiver<NavigationEvent>;
}

#[derive(Debug)]
struct History {
	entries: Vec<String>,
	index: usize,
	reloads: usize,
}

/// In-process [`AddressBar`] with a session history stack.
#[derive(Debug)]
pub struct MemoryAddressBar {
	history: RwLock<History>,
	events: broadcast::Sender<NavigationEvent>,
}

impl MemoryAddressBar {
	/// Creates an address bar showing `hash`.
	pub fn new(hash: impl Into<String>) -> Self {
		let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
		Self {
			history: RwLock::new(History {
				entries: vec![hash.into()],
				index: 0,
				reloads: 0,
			}),
			events,
		}
	}

	/// Returns the session history and the index of the current entry.
	pub fn history(&self) -> (Vec<String>, usize) {
		let history = self.history.read();
		(history.entries.clone(), history.index)
	}

	/// Returns how many full document navigations were performed.
	pub fn reload_count(&self) -> usize {
		self.history.read().reloads
	}

	fn emit(&self, event: NavigationEvent) {
		tracing::trace!(event = ?event, "address event");
		// Nobody listening is fine.
		let _ = self.events.send(event);
	}
}

impl Default for MemoryAddressBar {
	fn default() -> Self {
		Self::new("")
	}
}

impl AddressBar for MemoryAddressBar {
	fn hash(&self) -> String {
		let history = self.history.read();
		history.entries[history.index].clone()
	}

	fn set_hash(&self, hash: &str) {
		{
			let mut history = self.history.write();
			if history.entries[history.index] == hash {
				return;
			}
			let next = history.index + 1;
			history.entries.truncate(next);
			history.entries.push(hash.to_string());
			history.index = next;
		}
		self.emit(NavigationEvent::HashChanged {
			hash: hash.to_string(),
		});
	}

	fn reload_to(&self, hash: &str) {
		{
			let mut history = self.history.write();
			let next = history.index + 1;
			history.entries.truncate(next);
			history.entries.push(hash.to_string());
			history.index = next;
			history.reloads += 1;
		}
		self.emit(NavigationEvent::Reloaded {
			hash: hash.to_string(),
		});
	}

	fn traverse(&self, delta: i32) {
		if delta == 0 {
			return;
		}
		{
			let mut history = self.history.write();
			let target = history.index as i64 + i64::from(delta);
			if target < 0 || target >= history.entries.len() as i64 {
				tracing::debug!(delta, "history traversal out of range");
				return;
			}
			history.index = target as usize;
		}
		self.emit(NavigationEvent::Traversed { delta });
	}

	fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
		self.events.subscribe()
	}
}
