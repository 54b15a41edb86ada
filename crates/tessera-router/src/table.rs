//! Registration-ordered route table.
//!
//! Routes are checked in the order they were added; the first route whose
//! pattern and method both match wins. When a pattern matches but no route
//! accepts the method, the outcome is [`RouteMatch::MethodNotAllowed`]
//! carrying every method that would have been accepted.

use http::Method;

use crate::PathParams;

/// The tri-state outcome of matching a request against a [`RouteTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch<H> {
    /// A route accepted the method and path.
    Found {
        /// The handler registered for the route.
        handler: H,
        /// Captured path parameters, in pattern order.
        params: PathParams,
    },
    /// No route pattern matches the path.
    NotFound,
    /// The path matches, but not for this method.
    MethodNotAllowed {
        /// Methods that would have matched, in registration order.
        allowed: Vec<Method>,
    },
}

impl<H> RouteMatch<H> {
    /// Returns `true` for [`RouteMatch::Found`].
    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route<H> {
    method: Method,
    segments: Vec<Segment>,
    pattern: String,
    handler: H,
}

impl<H> Route<H> {
    fn new(method: Method, pattern: &str, handler: H) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            method,
            segments,
            pattern: pattern.to_string(),
            handler,
        }
    }

    fn match_path(&self, segments: &[&str]) -> Option<PathParams> {
        if segments.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (pattern, actual) in self.segments.iter().zip(segments) {
            match pattern {
                Segment::Literal(expected) if expected != actual => return None,
                Segment::Literal(_) => {}
                Segment::Param(name) => params.push(name.as_str(), *actual),
            }
        }
        Some(params)
    }
}

/// A table of `(method, pattern, handler)` routes.
///
/// Patterns consist of literal segments and `{name}` parameter segments.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use tessera_router::{RouteMatch, RouteTable};
///
/// let mut routes: RouteTable<&str> = RouteTable::new();
/// routes.get("/users/{id}", "UserController@show");
///
/// match routes.match_route(&Method::GET, "/users/42") {
///     RouteMatch::Found { handler, params } => {
///         assert_eq!(handler, "UserController@show");
///         assert_eq!(params.nth(0), Some("42"));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
///
/// assert!(matches!(
///     routes.match_route(&Method::DELETE, "/users/42"),
///     RouteMatch::MethodNotAllowed { .. }
/// ));
/// assert_eq!(routes.match_route(&Method::GET, "/nope"), RouteMatch::NotFound);
/// ```
#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    routes: Vec<Route<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<H: Clone> RouteTable<H> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route.
    pub fn add(&mut self, method: Method, pattern: impl AsRef<str>, handler: impl Into<H>) -> &mut Self {
        self.routes
            .push(Route::new(method, pattern.as_ref(), handler.into()));
        self
    }

    /// Adds a `GET` route.
    pub fn get(&mut self, pattern: impl AsRef<str>, handler: impl Into<H>) -> &mut Self {
        self.add(Method::GET, pattern, handler)
    }

    /// Adds a `POST` route.
    pub fn post(&mut self, pattern: impl AsRef<str>, handler: impl Into<H>) -> &mut Self {
        self.add(Method::POST, pattern, handler)
    }

    /// Adds a `PUT` route.
    pub fn put(&mut self, pattern: impl AsRef<str>, handler: impl Into<H>) -> &mut Self {
        self.add(Method::PUT, pattern, handler)
    }

    /// Adds a `PATCH` route.
    pub fn patch(&mut self, pattern: impl AsRef<str>, handler: impl Into<H>) -> &mut Self {
        self.add(Method::PATCH, pattern, handler)
    }

    /// Adds a `DELETE` route.
    pub fn delete(&mut self, pattern: impl AsRef<str>, handler: impl Into<H>) -> &mut Self {
        self.add(Method::DELETE, pattern, handler)
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates over `(method, pattern)` pairs in registration order.
    pub fn patterns(&self) -> impl Iterator<Item = (&Method, &str)> {
        self.routes.iter().map(|r| (&r.method, r.pattern.as_str()))
    }

    /// Matches a request method and path.
    ///
    /// A `HEAD` request with no explicit `HEAD` route falls back to the
    /// `GET` route for the same path.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> RouteMatch<H> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let mut allowed = Vec::new();
        let mut head_fallback = None;

        for route in &self.routes {
            let Some(params) = route.match_path(&segments) else {
                continue;
            };

            if route.method == *method {
                return RouteMatch::Found {
                    handler: route.handler.clone(),
                    params,
                };
            }

            if *method == Method::HEAD && route.method == Method::GET && head_fallback.is_none() {
                head_fallback = Some((route.handler.clone(), params));
            }

            if !allowed.contains(&route.method) {
                allowed.push(route.method.clone());
            }
        }

        if let Some((handler, params)) = head_fallback {
            return RouteMatch::Found { handler, params };
        }

        if allowed.is_empty() {
            RouteMatch::NotFound
        } else {
            RouteMatch::MethodNotAllowed { allowed }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable<&'static str> {
        let mut routes: RouteTable<&'static str> = RouteTable::new();
        routes
            .get("/users", "list")
            .post("/users", "create")
            .get("/users/{id}", "show")
            .delete("/users/{id}", "destroy")
            .get("/orgs/{org}/users/{id}", "org_user");
        routes
    }

    #[test]
    fn test_found_with_ordered_params() {
        match table().match_route(&Method::GET, "/orgs/acme/users/7") {
            RouteMatch::Found { handler, params } => {
                assert_eq!(handler, "org_user");
                assert_eq!(params.values().collect::<Vec<_>>(), vec!["acme", "7"]);
                assert_eq!(params.get("org"), Some("acme"));
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_users_id_scenario() {
        match table().match_route(&Method::GET, "/users/42") {
            RouteMatch::Found { handler, params } => {
                assert_eq!(handler, "show");
                assert_eq!(params.into_values(), vec!["42".to_string()]);
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn test_not_found() {
        assert_eq!(table().match_route(&Method::GET, "/products"), RouteMatch::NotFound);
        assert_eq!(table().match_route(&Method::GET, "/users/1/extra"), RouteMatch::NotFound);
    }

    #[test]
    fn test_method_not_allowed_lists_methods() {
        match table().match_route(&Method::PUT, "/users") {
            RouteMatch::MethodNotAllowed { allowed } => {
                assert_eq!(allowed, vec![Method::GET, Method::POST]);
            }
            other => panic!("expected MethodNotAllowed, got {other:?}"),
        }
    }

    #[test]
    fn test_first_registered_route_wins() {
        let mut routes: RouteTable<&str> = RouteTable::new();
        routes.get("/users/me", "me").get("/users/{id}", "show");

        assert!(matches!(
            routes.match_route(&Method::GET, "/users/me"),
            RouteMatch::Found { handler: "me", .. }
        ));
        assert!(matches!(
            routes.match_route(&Method::GET, "/users/5"),
            RouteMatch::Found { handler: "show", .. }
        ));
    }

    #[test]
    fn test_head_falls_back_to_get() {
        assert!(matches!(
            table().match_route(&Method::HEAD, "/users"),
            RouteMatch::Found { handler: "list", .. }
        ));
    }

    #[test]
    fn test_trailing_and_duplicate_slashes_are_ignored() {
        assert!(table().match_route(&Method::GET, "/users/").is_found());
        assert!(table().match_route(&Method::GET, "//users//3").is_found());
    }

    #[test]
    fn test_root_route() {
        let mut routes: RouteTable<&str> = RouteTable::new();
        routes.get("/", "home");
        assert!(routes.match_route(&Method::GET, "/").is_found());
        assert_eq!(routes.len(), 1);
        assert_eq!(routes.patterns().next(), Some((&Method::GET, "/")));
    }
}
