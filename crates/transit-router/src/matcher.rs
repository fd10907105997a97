//! Location matching with a bounded memo.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;

use crate::params::RouteParams;
use crate::route::{RouteDefinition, RouteTable};

/// A matched route with extracted parameters.
#[derive(Debug, Clone)]
pub struct RouteMatch {
	/// The matched route.
	pub route: Arc<RouteDefinition>,
	/// Query pairs merged with path captures.
	pub params: RouteParams,
}

/// Hit/miss counters of the match cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
	/// Lookups answered from the cache.
	pub hits: u64,
	/// Lookups that scanned the route table.
	pub misses: u64,
}

/// Resolves locations against a [`RouteTable`].
///
/// Successful matches are memoized by the literal location string. The table
/// is immutable, so entries never go stale; the cache is bounded only to keep
/// long sessions with many distinct deep links from growing it forever.
pub struct Matcher {
	table: Arc<RouteTable>,
	cache: Mutex<LruCache<String, RouteMatch>>,
	hits: AtomicU64,
	misses: AtomicU64,
}

impl std::fmt::Debug for Matcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Matcher")
			.field("routes_count", &self.table.len())
			.field("cached", &self.cached_len())
			.field("stats", &self.stats())
			.finish()
	}
}

impl Matcher {
	/// Creates a matcher holding at most `capacity` memoized locations.
	pub fn new(table: Arc<RouteTable>, capacity: NonZeroUsize) -> Self {
		Self {
			table,
			cache: Mutex::new(LruCache::new(capacity)),
			hits: AtomicU64::new(0),
			misses: AtomicU64::new(0),
		}
	}

	/// Returns the route table.
	pub fn table(&self) -> &Arc<RouteTable> {
		&self.table
	}

	/// Matches `location` against the table.
	///
	/// The first route in declaration order wins. Returns `None` when no
	/// route matches; that outcome is not memoized.
	pub fn try_match(&self, location: &str) -> Option<RouteMatch> {
		let mut cache = self.cache.lock();
		if let Some(cached) = cache.get(location) {
			self.hits.fetch_add(1, Ordering::Relaxed);
			return Some(cached.clone());
		}
		self.misses.fetch_add(1, Ordering::Relaxed);

		let route_match = self.table.iter().find_map(|(route, pattern)| {
			pattern.captures(location).map(|matched| RouteMatch {
				route: Arc::clone(route),
				params: RouteParams::merge(
					matched
						.query
						.as_deref()
						.map(RouteParams::parse_query)
						.unwrap_or_default(),
					matched.params,
				),
			})
		})?;

		tracing::trace!(
			location = %location,
			screen = %route_match.route.screen(),
			"memoizing route match"
		);
		cache.put(location.to_string(), route_match.clone());
		Some(route_match)
	}

	/// Returns the number of memoized locations.
	pub fn cached_len(&self) -> usize {
		self.cache.lock().len()
	}

	/// Returns the cache counters.
	pub fn stats(&self) -> CacheStats {
		CacheStats {
			hits: self.hits.load(Ordering::Relaxed),
			misses: self.misses.load(Ordering::Relaxed),
		}
	}
}
