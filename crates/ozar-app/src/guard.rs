use serde::Serialize;

use ozar_types::models::Role;

use crate::session::SessionState;

/// Client-side routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Route {
    Home,
    Login,
    Signup,
    Services,
    PremiumLabs,
    Pricing,
    Blog,
    Downloads,
    Profile,
    Dashboard,
    AdminDashboard,
    NotFound,
}

/// What a route demands of the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Public,
    Authenticated,
    Admin,
}

impl Route {
    pub const ALL: [Route; 11] = [
        Route::Home,
        Route::Login,
        Route::Signup,
        Route::Services,
        Route::PremiumLabs,
        Route::Pricing,
        Route::Blog,
        Route::Downloads,
        Route::Profile,
        Route::Dashboard,
        Route::AdminDashboard,
    ];

    /// Unknown paths map to [`Route::NotFound`]. A trailing slash is ignored.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        let normalized = if trimmed.is_empty() { "/" } else { trimmed };
        Route::ALL
            .into_iter()
            .find(|r| r.path() == normalized)
            .unwrap_or(Route::NotFound)
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Services => "/services",
            Route::PremiumLabs => "/premium-labs",
            Route::Pricing => "/pricing",
            Route::Blog => "/blog",
            Route::Downloads => "/downloads",
            Route::Profile => "/profile",
            Route::Dashboard => "/dashboard",
            Route::AdminDashboard => "/admin-dashboard",
            Route::NotFound => "*",
        }
    }

    pub fn requirement(&self) -> Requirement {
        match self {
            Route::Profile | Route::Dashboard => Requirement::Authenticated,
            Route::AdminDashboard => Requirement::Admin,
            Route::Home
            | Route::Login
            | Route::Signup
            | Route::Services
            | Route::PremiumLabs
            | Route::Pricing
            | Route::Blog
            | Route::Downloads
            | Route::NotFound => Requirement::Public,
        }
    }
}

/// Where the visitor stands, as far as the guard is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Loading,
    Unauthenticated,
    Authenticated { role: Option<Role> },
}

impl GuardState {
    pub fn from_session(state: &SessionState) -> Self {
        if state.is_loading() {
            GuardState::Loading
        } else if state.user.is_none() {
            GuardState::Unauthenticated
        } else {
            GuardState::Authenticated { role: state.role() }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "to", rename_all = "lowercase")]
pub enum GuardDecision {
    /// Session still resolving; show a placeholder.
    Placeholder,
    Redirect(&'static str),
    Render,
}

pub fn is_admin(role: Role) -> bool {
    match role {
        Role::Admin => true,
        Role::User | Role::Student | Role::Premium => false,
    }
}

pub fn evaluate(state: GuardState, requirement: Requirement) -> GuardDecision {
    match (requirement, state) {
        (Requirement::Public, _) => GuardDecision::Render,
        (_, GuardState::Loading) => GuardDecision::Placeholder,
        (_, GuardState::Unauthenticated) => GuardDecision::Redirect(Route::Login.path()),
        (Requirement::Authenticated, GuardState::Authenticated { .. }) => GuardDecision::Render,
        (Requirement::Admin, GuardState::Authenticated { role }) => {
            if role.is_some_and(is_admin) {
                GuardDecision::Render
            } else {
                GuardDecision::Redirect(Route::Dashboard.path())
            }
        }
    }
}

pub fn guard(route: Route, session: &SessionState) -> GuardDecision {
    evaluate(GuardState::from_session(session), route.requirement())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_and_unknown_paths() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/premium-labs/"), Route::PremiumLabs);
        assert_eq!(Route::parse("/blog?page=2"), Route::Blog);
        assert_eq!(Route::parse("/admin"), Route::NotFound);
        for route in Route::ALL {
            assert_eq!(Route::parse(route.path()), route);
        }
    }

    #[test]
    fn unauthenticated_profile_redirects_to_login() {
        assert_eq!(
            evaluate(GuardState::Unauthenticated, Route::Profile.requirement()),
            GuardDecision::Redirect("/login")
        );
    }

    #[test]
    fn non_admin_on_admin_dashboard_goes_to_dashboard() {
        for role in [Some(Role::User), Some(Role::Student), Some(Role::Premium), None] {
            assert_eq!(
                evaluate(GuardState::Authenticated { role }, Requirement::Admin),
                GuardDecision::Redirect("/dashboard")
            );
        }
        assert_eq!(
            evaluate(GuardState::Authenticated { role: Some(Role::Admin) }, Requirement::Admin),
            GuardDecision::Render
        );
    }

    #[test]
    fn loading_shows_placeholder_for_gated_routes_only() {
        assert_eq!(evaluate(GuardState::Loading, Requirement::Authenticated), GuardDecision::Placeholder);
        assert_eq!(evaluate(GuardState::Loading, Requirement::Admin), GuardDecision::Placeholder);
        assert_eq!(evaluate(GuardState::Loading, Requirement::Public), GuardDecision::Render);
    }
}
