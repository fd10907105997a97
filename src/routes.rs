//! The administration route table.
//!
//! Order matters: `/routes/new` must come before `/routes/{id}`.

use transit_router::{HOME_SCREEN, NOT_FOUND_SCREEN, RouteDefinition, RouteTable, RouteTableError};

/// Screen names.
pub mod screens {
	pub use transit_router::{HOME_SCREEN as HOME, NOT_FOUND_SCREEN as NOT_FOUND};

	pub const LOGIN: &str = "Login";
	pub const ACCESS_DENIED: &str = "AccessDenied";
	pub const STOPS: &str = "Stops";
	pub const STOP_DETAIL: &str = "StopDetail";
	pub const ROUTES: &str = "Routes";
	pub const NEW_ROUTE: &str = "NewRoute";
	pub const ROUTE_DETAIL: &str = "RouteDetail";
	pub const USERS: &str = "Users";
	pub const CITIES: &str = "Cities";
	pub const PROFILE: &str = "Profile";
	pub const BANNERS: &str = "Banners";
	pub const ADMINS: &str = "Admins";
	pub const DASHBOARD: &str = "Dashboard";
}

/// Role held by administrators who may manage other administrators.
pub const SUPER_ADMIN: &str = "super_admin";

/// Builds the route table of the administration application.
///
/// # Errors
///
/// Returns [`RouteTableError`] if a definition fails validation.
pub fn admin_routes() -> Result<RouteTable, RouteTableError> {
	RouteTable::new([
		RouteDefinition::new("/home", HOME_SCREEN),
		RouteDefinition::new("/404", NOT_FOUND_SCREEN),
		RouteDefinition::new("/login", screens::LOGIN),
		RouteDefinition::new("/access-denied", screens::ACCESS_DENIED),
		RouteDefinition::new("/stops/{id:uuid}", screens::STOP_DETAIL),
		RouteDefinition::new("/stops", screens::STOPS),
		RouteDefinition::new("/routes/new", screens::NEW_ROUTE),
		RouteDefinition::new("/routes/{id:uuid}", screens::ROUTE_DETAIL),
		RouteDefinition::new("/routes", screens::ROUTES),
		RouteDefinition::new("/users", screens::USERS),
		RouteDefinition::new("/cities", screens::CITIES),
		RouteDefinition::new("/profile", screens::PROFILE),
		RouteDefinition::new("/banners", screens::BANNERS),
		RouteDefinition::new("/admins", screens::ADMINS).requires_role(SUPER_ADMIN),
		RouteDefinition::new("/dashboard", screens::DASHBOARD).redirect(|_| "/home"),
	])
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_table_is_valid() {
		let table = admin_routes().unwrap();

		assert_eq!(table.home().path(), "/home");
		assert_eq!(table.not_found().path(), "/404");
		assert_eq!(table.len(), 15);
	}

	#[rstest]
	fn test_admins_require_super_admin() {
		let table = admin_routes().unwrap();
		let admins = table.find_screen(screens::ADMINS).unwrap();

		assert_eq!(
			admins.required_role().map(|role| role.as_str()),
			Some(SUPER_ADMIN)
		);
	}

	#[rstest]
	#[case("#/routes/new", screens::NEW_ROUTE)]
	#[case("#/routes/0b7c3e3a-5a0f-4f43-9a8e-1c2d3e4f5a6b", screens::ROUTE_DETAIL)]
	#[case("#/stops/0b7c3e3a-5a0f-4f43-9a8e-1c2d3e4f5a6b", screens::STOP_DETAIL)]
	#[case("#/stops?city=bursa", screens::STOPS)]
	fn test_declaration_order(#[case] location: &str, #[case] screen: &str) {
		let table = admin_routes().unwrap();

		let matched = table
			.iter()
			.find(|(_, pattern)| pattern.is_match(location))
			.map(|(route, _)| route.screen());

		assert_eq!(matched, Some(screen));
	}

	#[rstest]
	fn test_route_ids_must_be_uuids() {
		let table = admin_routes().unwrap();

		let matched = table
			.iter()
			.find(|(_, pattern)| pattern.is_match("#/routes/42"))
			.map(|(route, _)| route.screen());

		assert_eq!(matched, None);
	}
}
