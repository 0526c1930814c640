//! Request routing.
//!
//! The [`GateRouter`] recognizes three kinds of request:
//!
//! - `GET /health` - liveness probe
//! - `<prefix>/{resource_id}` - the gated object route, exactly one path segment
//! - anything else - not found
//!
//! `<prefix>` and `<prefix>/` also map to the object route, with no resource id,
//! so the gate can reject them as malformed instead of hiding them behind a 404.

use http::Method;
use percent_encoding::percent_decode_str;

/// Paths answered by the health check.
const HEALTH_PATH: &str = "/health";

/// The outcome of routing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Liveness probe.
    Health,
    /// The gated object route.
    Object {
        /// The percent-decoded path segment, or `None` when the path named no
        /// resource or the segment was not valid UTF-8.
        resource_id: Option<String>,
    },
    /// Nothing is served at this path.
    NotFound,
}

/// Maps request paths to [`Route`]s.
#[derive(Debug, Clone)]
pub struct GateRouter {
    prefix: String,
}

impl GateRouter {
    /// Create a router for the object route under `prefix` (e.g. `/storage`).
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_owned(),
        }
    }

    /// The object route prefix, without a trailing slash.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Resolve a request method and path.
    ///
    /// # Examples
    ///
    /// ```
    /// use http::Method;
    /// use signgate_http::router::{GateRouter, Route};
    ///
    /// let router = GateRouter::new("/storage");
    /// assert_eq!(
    ///     router.resolve(&Method::GET, "/storage/a%20b"),
    ///     Route::Object { resource_id: Some("a b".to_owned()) }
    /// );
    /// assert_eq!(router.resolve(&Method::GET, "/storage/a/b"), Route::NotFound);
    /// ```
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> Route {
        if *method == Method::GET && path == HEALTH_PATH {
            return Route::Health;
        }

        let Some(rest) = path.strip_prefix(self.prefix.as_str()) else {
            return Route::NotFound;
        };

        match rest {
            "" | "/" => Route::Object { resource_id: None },
            _ => match rest.strip_prefix('/') {
                Some(segment) if !segment.contains('/') => Route::Object {
                    resource_id: decode_segment(segment),
                },
                _ => Route::NotFound,
            },
        }
    }
}

fn decode_segment(segment: &str) -> Option<String> {
    percent_decode_str(segment)
        .decode_utf8()
        .ok()
        .map(std::borrow::Cow::into_owned)
}
