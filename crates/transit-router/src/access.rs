//! Authentication and authorization gating.
//!
//! The router never mutates identity state. It asks an [`IdentityProvider`]
//! for the current principal and feeds the answer to a pure [`AccessPolicy`].

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::BoxError;
use crate::route::RouteDefinition;
use crate::settings::RouterSettings;

/// A capability tag a route may require.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
	/// Creates a role from its tag.
	pub fn new(tag: impl Into<String>) -> Self {
		Self(tag.into())
	}

	/// Returns the tag.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl From<&str> for Role {
	fn from(tag: &str) -> Self {
		Self::new(tag)
	}
}

impl From<String> for Role {
	fn from(tag: String) -> Self {
		Self(tag)
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// An authenticated principal as reported by the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Principal identifier (user name, account id).
	pub principal: String,
	/// Role attributes held by the principal.
	#[serde(default)]
	pub roles: BTreeSet<Role>,
	/// When the credential stops being valid, if it expires at all.
	#[serde(default)]
	pub expires_at: Option<DateTime<Utc>>,
}

impl Identity {
	/// Creates a non-expiring identity without roles.
	pub fn new(principal: impl Into<String>) -> Self {
		Self {
			principal: principal.into(),
			roles: BTreeSet::new(),
			expires_at: None,
		}
	}

	/// Adds a role.
	pub fn with_role(mut self, role: impl Into<Role>) -> Self {
		self.roles.insert(role.into());
		self
	}

	/// Sets the credential expiry.
	pub fn expiring_at(mut self, expires_at: DateTime<Utc>) -> Self {
		self.expires_at = Some(expires_at);
		self
	}

	/// Returns whether the principal holds `role`.
	pub fn has_role(&self, role: &Role) -> bool {
		self.roles.contains(role)
	}

	/// Returns whether the credential is still valid at `now`.
	pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
		self.expires_at.is_none_or(|expires_at| now < expires_at)
	}
}

/// Source of the currently authenticated principal.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
	/// Returns the current principal, or `None` when nobody is signed in.
	async fn current_identity(&self) -> Result<Option<Identity>, BoxError>;
}

/// In-process identity holder.
///
/// Suitable for applications that keep the signed-in user in memory after
/// the login call, and for tests.
#[derive(Debug, Default)]
pub struct StaticIdentity {
	current: RwLock<Option<Identity>>,
}

impl StaticIdentity {
	/// Creates a provider with nobody signed in.
	pub fn anonymous() -> Self {
		Self::default()
	}

	/// Creates a provider with `identity` signed in.
	pub fn signed_in(identity: Identity) -> Self {
		Self {
			current: RwLock::new(Some(identity)),
		}
	}

	/// Replaces the signed-in principal.
	pub fn sign_in(&self, identity: Identity) {
		*self.current.write() = Some(identity);
	}

	/// Clears the signed-in principal.
	pub fn sign_out(&self) {
		*self.current.write() = None;
	}
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
	async fn current_identity(&self) -> Result<Option<Identity>, BoxError> {
		Ok(self.current.read().clone())
	}
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
	/// Navigation may proceed.
	Allow,
	/// An authenticated session targeted a login screen.
	RedirectHome,
	/// No valid session.
	RedirectLogin,
	/// The session lacks the role the route requires.
	Forbidden,
}

impl AccessDecision {
	/// Returns whether the decision lets navigation proceed.
	pub fn is_allowed(self) -> bool {
		self == Self::Allow
	}
}

/// Pure access rules: public screens, login screens and role gates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
	public_screens: BTreeSet<String>,
	login_screens: BTreeSet<String>,
}

impl AccessPolicy {
	/// Creates a policy from explicit screen sets.
	pub fn new<P, L>(public_screens: P, login_screens: L) -> Self
	where
		P: IntoIterator,
		P::Item: Into<String>,
		L: IntoIterator,
		L::Item: Into<String>,
	{
		let login_screens: BTreeSet<String> = login_screens.into_iter().map(Into::into).collect();
		let mut public_screens: BTreeSet<String> =
			public_screens.into_iter().map(Into::into).collect();
		// A login screen is always reachable without a session.
		public_screens.extend(login_screens.iter().cloned());
		Self {
			public_screens,
			login_screens,
		}
	}

	/// Creates the policy described by `settings`.
	pub fn from_settings(settings: &RouterSettings) -> Self {
		Self::new(
			settings.public_screens.iter().cloned(),
			settings.login_screens.iter().cloned(),
		)
	}

	/// Returns whether `screen` is reachable without a session.
	pub fn is_public(&self, screen: &str) -> bool {
		self.public_screens.contains(screen)
	}

	/// Decides whether `identity` may activate `route` at `now`.
	pub fn evaluate(
		&self,
		route: &RouteDefinition,
		identity: Option<&Identity>,
		now: DateTime<Utc>,
	) -> AccessDecision {
		let session = identity.filter(|identity| identity.is_valid_at(now));

		if self.public_screens.contains(route.screen()) {
			if session.is_some() && self.login_screens.contains(route.screen()) {
				return AccessDecision::RedirectHome;
			}
			return AccessDecision::Allow;
		}

		match (session, route.required_role()) {
			(None, _) => AccessDecision::RedirectLogin,
			(Some(identity), Some(role)) if !identity.has_role(role) => AccessDecision::Forbidden,
			(Some(_), _) => AccessDecision::Allow,
		}
	}
}

impl Default for AccessPolicy {
	fn default() -> Self {
		Self::from_settings(&RouterSettings::default())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use chrono::Duration;
	use rstest::{fixture, rstest};

	#[fixture]
	fn policy() -> AccessPolicy {
		AccessPolicy::default()
	}

	fn admin() -> Identity {
		Identity::new("ayse").with_role("super_admin")
	}

	#[rstest]
	fn test_public_route_allows_anonymous(policy: AccessPolicy) {
		let route = RouteDefinition::new("/404", "404");
		assert_eq!(
			policy.evaluate(&route, None, Utc::now()),
			AccessDecision::Allow
		);
	}

	#[rstest]
	fn test_login_route_redirects_authenticated_home(policy: AccessPolicy) {
		let route = RouteDefinition::new("/login", "Login");
		let identity = Identity::new("ayse");

		assert_eq!(
			policy.evaluate(&route, Some(&identity), Utc::now()),
			AccessDecision::RedirectHome
		);
		assert_eq!(
			policy.evaluate(&route, None, Utc::now()),
			AccessDecision::Allow
		);
	}

	#[rstest]
	fn test_private_route_requires_session(policy: AccessPolicy) {
		let route = RouteDefinition::new("/stops", "Stops");
		assert_eq!(
			policy.evaluate(&route, None, Utc::now()),
			AccessDecision::RedirectLogin
		);
	}

	#[rstest]
	fn test_expired_credential_counts_as_anonymous(policy: AccessPolicy) {
		// Arrange
		let now = Utc::now();
		let route = RouteDefinition::new("/stops", "Stops");
		let expired = Identity::new("ayse").expiring_at(now - Duration::minutes(1));

		// Act
		let decision = policy.evaluate(&route, Some(&expired), now);

		// Assert
		assert_eq!(decision, AccessDecision::RedirectLogin);
	}

	#[rstest]
	fn test_expired_credential_may_see_login(policy: AccessPolicy) {
		let now = Utc::now();
		let route = RouteDefinition::new("/login", "Login");
		let expired = Identity::new("ayse").expiring_at(now - Duration::seconds(1));

		assert_eq!(
			policy.evaluate(&route, Some(&expired), now),
			AccessDecision::Allow
		);
	}

	#[rstest]
	fn test_role_gate(policy: AccessPolicy) {
		let route = RouteDefinition::new("/admins", "Admins").requires_role("super_admin");
		let plain = Identity::new("mehmet");

		assert_eq!(
			policy.evaluate(&route, Some(&plain), Utc::now()),
			AccessDecision::Forbidden
		);
		assert_eq!(
			policy.evaluate(&route, Some(&admin()), Utc::now()),
			AccessDecision::Allow
		);
	}

	#[rstest]
	fn test_login_screens_are_implicitly_public() {
		let policy = AccessPolicy::new(Vec::<String>::new(), ["Login"]);
		assert!(policy.is_public("Login"));
		assert!(!policy.is_public("Stops"));
	}

	#[tokio::test]
	async fn test_static_identity_sign_in_and_out() {
		let provider = StaticIdentity::anonymous();
		assert_eq!(provider.current_identity().await.unwrap(), None);

		provider.sign_in(admin());
		assert_eq!(provider.current_identity().await.unwrap(), Some(admin()));

		provider.sign_out();
		assert_eq!(provider.current_identity().await.unwrap(), None);
	}
}
