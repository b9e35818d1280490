//! Route access control.
//!
//! `evaluate` decides whether a session may open a route. Authentication is
//! always checked before roles: an anonymous visitor asking for an admin
//! page is sent to login, not home.

use crate::identity::Role;
use crate::session::Session;

/// Path of the login page.
pub const LOGIN_PATH: &str = "/inicio-sesion";

/// Path of the home page.
pub const HOME_PATH: &str = "/";

/// How a route treats authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Open to everyone
    Public,
    /// Only for visitors who are not logged in (login, sign-up)
    PublicOnly,
    /// Requires an authenticated session
    Private,
}

/// Roles allowed on a route. Empty means any role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteRequirement {
    roles: Vec<Role>,
}

impl RouteRequirement {
    /// Any authenticated role.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn roles(roles: &[Role]) -> Self {
        let mut unique = Vec::with_capacity(roles.len());
        for role in roles {
            if !unique.contains(role) {
                unique.push(*role);
            }
        }
        Self { roles: unique }
    }

    pub fn permits(&self, role: Role) -> bool {
        self.roles.is_empty() || self.roles.contains(&role)
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectLogin,
    RedirectHome,
}

impl Decision {
    /// Where to navigate instead, if anywhere.
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            Decision::Allow => None,
            Decision::RedirectLogin => Some(LOGIN_PATH),
            Decision::RedirectHome => Some(HOME_PATH),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Decide access to a route of `class` requiring `requirement`.
pub fn evaluate(session: &Session, class: RouteClass, requirement: &RouteRequirement) -> Decision {
    let role = session.role();

    match class {
        RouteClass::PublicOnly if role.is_some() => return Decision::RedirectHome,
        RouteClass::Private if role.is_none() => return Decision::RedirectLogin,
        _ => {}
    }

    match role {
        Some(role) if !requirement.permits(role) => Decision::RedirectHome,
        _ => Decision::Allow,
    }
}

/// A route pattern: exact path, or a prefix when it ends in `/*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub pattern: &'static str,
    pub class: RouteClass,
    pub requirement: RouteRequirement,
}

impl Route {
    pub fn new(pattern: &'static str, class: RouteClass, requirement: RouteRequirement) -> Self {
        Self {
            pattern,
            class,
            requirement,
        }
    }

    /// Whether `path` (without query or trailing slash) matches this route.
    pub fn matches(&self, path: &str) -> bool {
        match self.pattern.strip_suffix("/*") {
            Some(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            None => path == self.pattern,
        }
    }
}

/// Ordered list of routes; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Routes of the hotel front-end.
    pub fn hotel() -> Self {
        use RouteClass::*;

        let staff = RouteRequirement::roles(&[Role::Admin, Role::Employee]);
        let admin = RouteRequirement::roles(&[Role::Admin]);

        Self::new(vec![
            Route::new("/", Public, RouteRequirement::any()),
            Route::new(LOGIN_PATH, PublicOnly, RouteRequirement::any()),
            Route::new("/registro", PublicOnly, RouteRequirement::any()),
            Route::new("/perfil", Private, RouteRequirement::any()),
            Route::new("/habitaciones/*", Private, RouteRequirement::any()),
            Route::new("/reservas/*", Private, RouteRequirement::any()),
            Route::new("/clientes/*", Private, staff),
            Route::new("/usuarios/roles", Private, admin),
        ])
    }

    /// Find the route serving `path`. Query strings and trailing slashes are ignored.
    pub fn resolve(&self, path: &str) -> Option<&Route> {
        let path = normalize(path);
        self.routes.iter().find(|route| route.matches(path))
    }

    /// Decide access to `path`. Unknown paths are public.
    pub fn check(&self, session: &Session, path: &str) -> Decision {
        match self.resolve(path) {
            Some(route) => evaluate(session, route.class, &route.requirement),
            None => evaluate(session, RouteClass::Public, &RouteRequirement::any()),
        }
    }
}

fn normalize(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}
