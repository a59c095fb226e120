//! Screens, navigation history and the gate in front of protected screens.
//!
//! The `RouteGuard` is the only place that decides whether a protected
//! screen may render. It asks the `TokenStore` on every navigation and
//! swaps the entry for `Login` with a replace, so a path the user was not
//! allowed to see never ends up in back-history.

use std::sync::Arc;

use tracing::{debug, info};

use crate::auth::TokenStore;
use crate::utils::path_of;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    ForgotPassword,
    ResetPassword,
    OAuthCallback,
    Dashboard,
    History,
    Score,
    Analytics,
    Billing,
    Settings,
    Connections,
}

impl Route {
    /// Protected screens in navigation-tab order.
    pub const PROTECTED: [Route; 7] = [
        Route::Dashboard,
        Route::History,
        Route::Score,
        Route::Analytics,
        Route::Billing,
        Route::Settings,
        Route::Connections,
    ];

    pub fn is_protected(&self) -> bool {
        !matches!(
            self,
            Route::Login
                | Route::Register
                | Route::ForgotPassword
                | Route::ResetPassword
                | Route::OAuthCallback
        )
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::ForgotPassword => "/forgot-password",
            Route::ResetPassword => "/reset-password",
            Route::OAuthCallback => "/oauth-success",
            Route::Dashboard => "/",
            Route::History => "/history",
            Route::Score => "/score",
            Route::Analytics => "/analytics",
            Route::Billing => "/billing",
            Route::Settings => "/settings",
            Route::Connections => "/connections",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Route::Login => "Sign In",
            Route::Register => "Create Account",
            Route::ForgotPassword => "Forgot Password",
            Route::ResetPassword => "Reset Password",
            Route::OAuthCallback => "Google Sign-In",
            Route::Dashboard => "Dashboard",
            Route::History => "History",
            Route::Score => "Score Lead",
            Route::Analytics => "Analytics",
            Route::Billing => "Billing",
            Route::Settings => "Settings",
            Route::Connections => "Connections",
        }
    }

    /// Resolve a URL-like location. Query strings and fragments are ignored;
    /// anything unknown lands on the dashboard.
    pub fn parse(location: &str) -> Route {
        let path = path_of(location);
        match path.trim_end_matches('/') {
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/forgot-password" => Route::ForgotPassword,
            "/reset-password" => Route::ResetPassword,
            "/oauth-success" => Route::OAuthCallback,
            "/history" => Route::History,
            "/score" => Route::Score,
            "/analytics" => Route::Analytics,
            "/billing" => Route::Billing,
            "/settings" => Route::Settings,
            "/connections" => Route::Connections,
            _ => Route::Dashboard,
        }
    }
}

/// Back-history of visited routes. Never empty.
#[derive(Debug, Clone)]
pub struct Navigator {
    history: Vec<Route>,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self {
            history: vec![start],
        }
    }

    pub fn current(&self) -> Route {
        // history always holds at least the start entry
        self.history.last().copied().unwrap_or(Route::Dashboard)
    }

    pub fn history(&self) -> &[Route] {
        &self.history
    }

    pub fn push(&mut self, route: Route) {
        if self.current() != route {
            self.history.push(route);
        }
    }

    /// Swap the current entry without growing history.
    pub fn replace(&mut self, route: Route) {
        if let Some(last) = self.history.last_mut() {
            *last = route;
        }
    }

    /// Pop one entry. The last remaining entry is never popped.
    pub fn back(&mut self) -> bool {
        if self.history.len() > 1 {
            self.history.pop();
            true
        } else {
            false
        }
    }

    /// Drop all history and start over at `route`.
    pub fn reset(&mut self, route: Route) {
        self.history.clear();
        self.history.push(route);
    }
}

/// Gate in front of every protected route.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    store: Arc<TokenStore>,
}

impl RouteGuard {
    pub fn new(store: Arc<TokenStore>) -> Self {
        Self { store }
    }

    pub fn allows(&self, route: Route) -> bool {
        !route.is_protected() || self.store.is_present()
    }

    /// Go to `route`, or to `Login` if it is protected and nobody is signed
    /// in. Returns the route that will actually render.
    pub fn navigate(&self, nav: &mut Navigator, route: Route) -> Route {
        nav.push(route);
        self.enforce(nav)
    }

    /// Re-check the current entry. Call after a logout, an authentication
    /// failure or a back-navigation.
    pub fn enforce(&self, nav: &mut Navigator) -> Route {
        let current = nav.current();
        if self.allows(current) {
            debug!(route = current.path(), "Route allowed");
            return current;
        }
        info!(route = current.path(), "No session, redirecting to login");
        nav.replace(Route::Login);
        // Collapse a Login pushed on top of an existing Login
        if nav.history.len() > 1 && nav.history[nav.history.len() - 2] == Route::Login {
            nav.history.pop();
        }
        Route::Login
    }

    pub fn back(&self, nav: &mut Navigator) -> Route {
        nav.back();
        self.enforce(nav)
    }

    /// Land on `route` with a fresh history, e.g. right after sign-in.
    pub fn reset(&self, nav: &mut Navigator, route: Route) -> Route {
        nav.reset(route);
        self.enforce(nav)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionCredential;

    fn guard(signed_in: bool) -> (RouteGuard, Arc<TokenStore>) {
        let store = Arc::new(TokenStore::in_memory());
        if signed_in {
            store
                .set(SessionCredential::new("tok", None))
                .expect("set");
        }
        (RouteGuard::new(Arc::clone(&store)), store)
    }

    #[test]
    fn test_parse_paths() {
        assert_eq!(Route::parse("/"), Route::Dashboard);
        assert_eq!(Route::parse("/history"), Route::History);
        assert_eq!(Route::parse("/billing/"), Route::Billing);
        assert_eq!(Route::parse("/oauth-success?token=abc"), Route::OAuthCallback);
        assert_eq!(Route::parse("/reset-password?token=abc"), Route::ResetPassword);
        assert_eq!(Route::parse("/no-such-page"), Route::Dashboard);
        assert_eq!(Route::parse(""), Route::Dashboard);
    }

    #[test]
    fn test_paths_round_trip() {
        for route in Route::PROTECTED {
            assert_eq!(Route::parse(route.path()), route);
            assert!(route.is_protected());
        }
        assert!(!Route::Login.is_protected());
        assert!(!Route::OAuthCallback.is_protected());
    }

    #[test]
    fn test_protected_without_session_renders_login() {
        let (guard, _) = guard(false);
        let mut nav = Navigator::new(Route::Login);

        let rendered = guard.navigate(&mut nav, Route::Billing);
        assert_eq!(rendered, Route::Login);
        assert_eq!(nav.current(), Route::Login);
        assert!(!nav.history().contains(&Route::Billing));
        assert_eq!(nav.history(), &[Route::Login]);
    }

    #[test]
    fn test_protected_with_session_renders() {
        let (guard, _) = guard(true);
        let mut nav = Navigator::new(Route::Dashboard);

        assert_eq!(guard.navigate(&mut nav, Route::History), Route::History);
        assert_eq!(nav.history(), &[Route::Dashboard, Route::History]);
    }

    #[test]
    fn test_public_routes_always_allowed() {
        let (guard, _) = guard(false);
        let mut nav = Navigator::new(Route::Login);
        assert_eq!(guard.navigate(&mut nav, Route::Register), Route::Register);
        assert_eq!(guard.back(&mut nav), Route::Login);
    }

    #[test]
    fn test_enforce_after_logout() {
        let (guard, store) = guard(true);
        let mut nav = Navigator::new(Route::Dashboard);
        guard.navigate(&mut nav, Route::Settings);

        store.clear().expect("clear");
        assert_eq!(guard.enforce(&mut nav), Route::Login);
        assert!(!nav.history().contains(&Route::Settings));

        // Going back reveals a protected entry, which is guarded again
        assert_eq!(guard.back(&mut nav), Route::Login);
        assert_eq!(nav.current(), Route::Login);
    }

    #[test]
    fn test_back_never_empties_history() {
        let mut nav = Navigator::new(Route::Login);
        assert!(!nav.back());
        assert_eq!(nav.current(), Route::Login);
    }

    #[test]
    fn test_reset_after_sign_in() {
        let (guard, _) = guard(true);
        let mut nav = Navigator::new(Route::Login);
        guard.navigate(&mut nav, Route::OAuthCallback);

        assert_eq!(guard.reset(&mut nav, Route::Dashboard), Route::Dashboard);
        assert_eq!(nav.history(), &[Route::Dashboard]);
    }
}
