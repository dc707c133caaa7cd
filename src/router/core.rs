//! Router core module - hot path for request routing.

use crate::pattern::{compile, Params, PatternError, RoutePattern};
use http::Method;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

/// HTTP methods accepted at registration time.
pub const SUPPORTED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// Error returned when a route cannot be registered.
///
/// Registration errors are configuration errors: they can never be healed at
/// request time, so setup code should fail fast on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteError {
    /// The template did not compile
    Pattern(PatternError),
    /// Only GET, POST, PUT and DELETE routes can be registered
    UnsupportedMethod { method: String },
}

impl fmt::Display for RouteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteError::Pattern(e) => write!(f, "invalid route: {e}"),
            RouteError::UnsupportedMethod { method } => write!(
                f,
                "invalid route: method {method} is not supported (expected GET, POST, PUT or DELETE)"
            ),
        }
    }
}

impl std::error::Error for RouteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RouteError::Pattern(e) => Some(e),
            RouteError::UnsupportedMethod { .. } => None,
        }
    }
}

impl From<PatternError> for RouteError {
    fn from(e: PatternError) -> Self {
        RouteError::Pattern(e)
    }
}

/// Per-route registration options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    /// Stable route name (e.g. `customers-detail`), reported in logs and by the
    /// navigator's current route
    pub name: Option<String>,
    /// Names of middleware steps this route is exempt from
    pub skip_middleware: Vec<String>,
}

impl RouteOptions {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            skip_middleware: Vec::new(),
        }
    }

    /// Exempt the route from the middleware step called `middleware`
    #[must_use]
    pub fn skip(mut self, middleware: impl Into<String>) -> Self {
        self.skip_middleware.push(middleware.into());
        self
    }
}

/// A registered route. Immutable once registered.
#[derive(Debug, Clone)]
pub struct Route<H> {
    method: Method,
    pattern: RoutePattern,
    handler: H,
    options: RouteOptions,
}

impl<H> Route<H> {
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    #[must_use]
    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    #[must_use]
    pub fn options(&self) -> &RouteOptions {
        &self.options
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.options.name.as_deref()
    }

    /// Name used in logs: the route name, or the template when unnamed
    #[must_use]
    pub fn label(&self) -> &str {
        self.name().unwrap_or_else(|| self.template())
    }

    /// True when the route opted out of the middleware step `middleware`
    #[must_use]
    pub fn skips(&self, middleware: &str) -> bool {
        self.options.skip_middleware.iter().any(|m| m == middleware)
    }
}

/// Result of successfully matching a request path to a route
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    /// The matched route
    pub route: &'a Route<H>,
    /// Path parameters extracted from the URL (e.g., `:id` → `{"id": "123"}`)
    pub params: Params,
}

/// Ordered route table. Insertion order is the tie-break between overlapping
/// patterns.
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
    /// Literal templates reachable through the exact shortcut, per method
    exact: HashMap<Method, HashMap<Box<str>, usize>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> RouteTable<H> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            exact: HashMap::new(),
        }
    }

    /// Register a route with default options.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when the method is unsupported or the template is
    /// malformed.
    pub fn register(&mut self, method: Method, template: &str, handler: H) -> Result<(), RouteError> {
        self.register_with(method, template, RouteOptions::default(), handler)
    }

    /// Register a route with explicit options.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when the method is unsupported or the template is
    /// malformed.
    pub fn register_with(
        &mut self,
        method: Method,
        template: &str,
        options: RouteOptions,
        handler: H,
    ) -> Result<(), RouteError> {
        if !SUPPORTED_METHODS.contains(&method) {
            return Err(RouteError::UnsupportedMethod {
                method: method.to_string(),
            });
        }
        let pattern = compile(template)?;
        let index = self.routes.len();

        if pattern.is_literal() {
            let shadowed_by = self
                .routes
                .iter()
                .find(|r| r.method == method && r.pattern.match_path(template).is_some());
            match shadowed_by {
                Some(earlier) => {
                    warn!(
                        method = %method,
                        template = %template,
                        shadowed_by = %earlier.template(),
                        "Literal route is shadowed by an earlier route and will never match"
                    );
                }
                None => {
                    self.exact
                        .entry(method.clone())
                        .or_default()
                        .insert(template.into(), index);
                }
            }
        }

        debug!(
            method = %method,
            template = %template,
            route_name = ?options.name,
            params = pattern.param_names().len(),
            index = index,
            "Route registered"
        );

        self.routes.push(Route {
            method,
            pattern,
            handler,
            options,
        });
        Ok(())
    }

    /// Match a request to a route.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `path` - Request path without query string or fragment
    ///
    /// # Returns
    ///
    /// * `Some(RouteMatch)` - The first route, in registration order, that matches
    /// * `None` - If no route matches (results in 404)
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, H>> {
        // RT1: Route match attempt
        debug!(method = %method, path = %path, routes = self.routes.len(), "Route match attempt");

        let exact = self
            .exact
            .get(method)
            .and_then(|by_template| by_template.get(path))
            .and_then(|&index| self.routes.get(index));
        if let Some(route) = exact {
            // RT2: Exact literal match
            info!(
                method = %method,
                path = %path,
                route = %route.label(),
                "Route matched (exact)"
            );
            return Some(RouteMatch {
                route,
                params: Params::new(),
            });
        }

        for route in self.routes.iter().filter(|r| &r.method == method) {
            if let Some(params) = route.pattern.match_path(path) {
                // RT3: Route matched
                info!(
                    method = %method,
                    path = %path,
                    route = %route.label(),
                    route_pattern = %route.template(),
                    path_params = ?params,
                    "Route matched"
                );
                return Some(RouteMatch { route, params });
            }
        }

        // RT4: No route found (404)
        warn!(method = %method, path = %path, "No route matched");
        None
    }

    /// Routes in registration order
    pub fn routes(&self) -> impl Iterator<Item = &Route<H>> {
        self.routes.iter()
    }

    /// Find a route by its registered name
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Route<H>> {
        self.routes.iter().find(|r| r.name() == Some(name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Index of the route the exact shortcut serves for `method path`
    #[cfg(test)]
    pub(crate) fn exact_index(&self, method: &Method, path: &str) -> Option<usize> {
        self.exact.get(method)?.get(path).copied()
    }

    /// One `METHOD template [name]` line per route, in registration order
    #[must_use]
    pub fn describe(&self) -> Vec<String> {
        self.routes
            .iter()
            .map(|r| match r.name() {
                Some(name) => format!("{} {} [{}]", r.method, r.template(), name),
                None => format!("{} {}", r.method, r.template()),
            })
            .collect()
    }
}
