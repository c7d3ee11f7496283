//! Request routing.
//!
//! Maps a method and path to an [`Operation`]. Path templates use
//! `{param}` segments; captured values are percent-decoded.
//!
//! ```rust
//! use roster_server::{Operation, Router};
//! use http::Method;
//!
//! let router = Router::roster();
//!
//! let m = router.match_route(&Method::PUT, "/api/employees/0190a1b2").unwrap();
//! assert_eq!(m.operation(), Operation::UpdateEmployee);
//! assert_eq!(m.param("id"), Some("0190a1b2"));
//!
//! assert!(router.match_route(&Method::PATCH, "/api/employees/0190a1b2").is_none());
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use http::Method;

/// Everything the service can do for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `GET /`
    Root,
    /// `GET /health`
    Health,
    /// `GET /ready`
    Ready,
    /// `GET /uploads/{file}`
    ServeUpload,
    /// `GET /api/employees`
    ListEmployees,
    /// `POST /api/employees`
    CreateEmployee,
    /// `GET /api/employees/{id}`
    GetEmployee,
    /// `PUT /api/employees/{id}`
    UpdateEmployee,
    /// `DELETE /api/employees/{id}`
    DeleteEmployee,
}

impl Operation {
    /// Returns the operation id used in logs.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Health => "health",
            Self::Ready => "ready",
            Self::ServeUpload => "serveUpload",
            Self::ListEmployees => "listEmployees",
            Self::CreateEmployee => "createEmployee",
            Self::GetEmployee => "getEmployee",
            Self::UpdateEmployee => "updateEmployee",
            Self::DeleteEmployee => "deleteEmployee",
        }
    }

    /// Returns `true` for operations behind the authentication stage.
    #[must_use]
    pub const fn is_protected(self) -> bool {
        matches!(
            self,
            Self::ListEmployees
                | Self::CreateEmployee
                | Self::GetEmployee
                | Self::UpdateEmployee
                | Self::DeleteEmployee
        )
    }

    /// Returns `true` for operations that read a mutation payload.
    #[must_use]
    pub const fn accepts_payload(self) -> bool {
        matches!(self, Self::CreateEmployee | Self::UpdateEmployee)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A resolved route with its captured path parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    operation: Operation,
    params: HashMap<String, String>,
}

impl RouteMatch {
    /// Returns the matched operation.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        self.operation
    }

    /// Returns one captured parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
struct Route {
    method: Method,
    segments: Vec<PathSegment>,
    operation: Operation,
}

impl Route {
    fn new(method: Method, pattern: &str, operation: Operation) -> Self {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => PathSegment::Param(name.to_string()),
                None => PathSegment::Literal(s.to_string()),
            })
            .collect();

        Self {
            method,
            segments,
            operation,
        }
    }

    fn match_path(&self, path: &str) -> Option<HashMap<String, String>> {
        let actual: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if actual.len() != self.segments.len() {
            return None;
        }

        let mut params = HashMap::new();
        for (pattern, segment) in self.segments.iter().zip(actual) {
            match pattern {
                PathSegment::Literal(expected) if expected == segment => {}
                PathSegment::Literal(_) => return None,
                PathSegment::Param(name) => {
                    params.insert(name.clone(), percent_decode(segment)?);
                }
            }
        }
        Some(params)
    }
}

/// Method and path to [`Operation`] table. First match wins.
#[derive(Debug, Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Creates an empty router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the router with every route the service serves.
    #[must_use]
    pub fn roster() -> Self {
        let mut router = Self::new();
        router.add_route(Method::GET, "/", Operation::Root);
        router.add_route(Method::GET, "/health", Operation::Health);
        router.add_route(Method::GET, "/ready", Operation::Ready);
        router.add_route(Method::GET, "/uploads/{file}", Operation::ServeUpload);
        router.add_route(Method::GET, "/api/employees", Operation::ListEmployees);
        router.add_route(Method::POST, "/api/employees", Operation::CreateEmployee);
        router.add_route(Method::GET, "/api/employees/{id}", Operation::GetEmployee);
        router.add_route(Method::PUT, "/api/employees/{id}", Operation::UpdateEmployee);
        router.add_route(Method::DELETE, "/api/employees/{id}", Operation::DeleteEmployee);
        router
    }

    /// Registers a route.
    pub fn add_route(&mut self, method: Method, pattern: &str, operation: Operation) {
        self.routes.push(Route::new(method, pattern, operation));
    }

    /// Returns the number of registered routes.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Resolves a request. `HEAD` is served by `GET` routes.
    #[must_use]
    pub fn match_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let method = if method == Method::HEAD {
            &Method::GET
        } else {
            method
        };

        self.routes
            .iter()
            .filter(|route| route.method == *method)
            .find_map(|route| {
                route.match_path(path).map(|params| RouteMatch {
                    operation: route.operation,
                    params,
                })
            })
    }
}

/// Decodes `%XX` escapes; `None` when the result is not UTF-8.
///
/// Escapes that are not two hex digits are kept literally.
fn percent_decode(segment: &str) -> Option<String> {
    urlencoding::decode(segment).ok().map(Cow::into_owned)
}
