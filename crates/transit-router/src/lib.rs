//! Hash-based navigation router for single-page applications.
//!
//! A [`Router`] maps `#/path` addresses to named screens through an ordered
//! [`RouteTable`]. Each navigation runs through one resolution:
//!
//! 1. an empty address restores the last visited route or goes `Home`,
//! 2. the address is matched (first declared route wins, memoized),
//! 3. the [`AccessPolicy`] checks the current [`Identity`],
//! 4. the route's `on_resolve` guard may veto,
//! 5. an alias route redirects, any other route is activated.
//!
//! Only one resolution runs at a time; a request arriving meanwhile is
//! dropped. A failing guard or identity provider aborts the navigation and
//! leaves the current route untouched.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use transit_router::{Identity, MemoryAddressBar, RouteDefinition, RouteTable, Router, StaticIdentity};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let table = RouteTable::new([
//! 	RouteDefinition::new("/home", "Home"),
//! 	RouteDefinition::new("/404", "404"),
//! 	RouteDefinition::new("/routes/new", "NewRoute"),
//! 	RouteDefinition::new("/routes/{id}", "RouteDetail"),
//! ])?;
//! let address = Arc::new(MemoryAddressBar::new("#/routes/42"));
//! let router = Router::builder(table)
//! 	.address(address)
//! 	.identity(Arc::new(StaticIdentity::signed_in(Identity::new("ayse"))))
//! 	.build()?;
//!
//! router.start().await?;
//! assert_eq!(router.current_screen(), "RouteDetail");
//! assert_eq!(router.route_param("id").as_deref(), Some("42"));
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod address;
pub mod continuity;
pub mod core;
pub mod current;
pub mod error;
pub mod matcher;
mod navigation;
pub mod params;
pub mod pattern;
pub mod route;
pub mod settings;

pub use access::{AccessDecision, AccessPolicy, Identity, IdentityProvider, Role, StaticIdentity};
pub use address::{AddressBar, MemoryAddressBar, NavigationEvent};
pub use continuity::{Continuity, MemoryStorage, SessionStorage};
pub use core::{Destination, Resolution, ResolverState, Router, RouterBuilder};
pub use current::{CurrentRoute, SubscriptionId};
pub use error::{BoxError, NavigationError, ParamError, PatternError, RouteTableError, SettingsError};
pub use matcher::{CacheStats, RouteMatch};
pub use params::RouteParams;
pub use pattern::RoutePattern;
pub use route::{
	GuardOutcome, HOME_SCREEN, NOT_FOUND_SCREEN, RedirectTarget, ResolveGuard, RouteDefinition,
	RouteTable,
};
pub use settings::RouterSettings;
