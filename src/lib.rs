//! # Transit Admin
//!
//! Navigation shell of the transit administration single-page application.
//!
//! The application manages routes, stops, cities, banners and administrator
//! accounts. This crate owns its route table ([`routes`]) and wires the
//! [`transit_router`] navigation router to the address bar, session storage
//! and identity collaborators of the host ([`app`]).
//!
//! ## Feature Flags
//!
//! - `logging` (default): [`init_tracing`] installs a `tracing-subscriber`
//!   formatter filtered by `RUST_LOG`
//!
//! ## Example
//!
//! ```rust,no_run
//! use transit_admin::{AdminShell, Collaborators};
//! use transit_admin::router::RouterSettings;
//!
//! # async fn example() -> Result<(), transit_admin::ShellError> {
//! let shell = AdminShell::bootstrap(RouterSettings::default(), Collaborators::default())?;
//! shell.start().await?;
//! println!("showing {}", shell.router().current_screen());
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod routes;

/// The navigation router.
pub use transit_router as router;

pub use app::{AdminShell, Collaborators, ShellError};
#[cfg(feature = "logging")]
pub use app::init_tracing;
pub use routes::admin_routes;
