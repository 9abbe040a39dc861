//! Dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request URI
//!     → request.rs (strip base, format, query → alias)
//!     → AliasRouter::route_for (alias → route)
//!     → target.rs (route → controller/action/args)
//!     → Dispatcher (application code produces the response)
//! ```
//!
//! # Design Decisions
//! - The dispatcher is a trait object supplied by the application
//! - Deciding that a controller/action does not exist (404) belongs to the
//!   dispatcher, never to the resolver
//! - The built-in `EchoDispatcher` only describes what it would call

pub mod request;
pub mod target;

use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub use request::RequestPath;
pub use target::RouteTarget;

/// Everything a dispatcher gets to know about a routed request.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRequest {
    pub request_id: String,
    #[serde(serialize_with = "serialize_method")]
    pub method: Method,
    /// Alias as requested.
    pub alias: String,
    /// Route the alias resolved to.
    pub route: String,
    pub target: RouteTarget,
    pub format: Option<String>,
    pub query: Option<String>,
}

fn serialize_method<S: serde::Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

/// Application hook invoked for every request that is not redirected.
pub trait Dispatcher: Send + Sync + 'static {
    fn dispatch(&self, request: DispatchRequest) -> Response;
}

impl<F> Dispatcher for F
where
    F: Fn(DispatchRequest) -> Response + Send + Sync + 'static,
{
    fn dispatch(&self, request: DispatchRequest) -> Response {
        self(request)
    }
}

/// Answers every request with a JSON description of its dispatch target.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoDispatcher;

impl Dispatcher for EchoDispatcher {
    fn dispatch(&self, request: DispatchRequest) -> Response {
        (StatusCode::OK, Json(request)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(route: &str) -> DispatchRequest {
        DispatchRequest {
            request_id: "test".into(),
            method: Method::GET,
            alias: "a".into(),
            route: route.into(),
            target: RouteTarget::from_route(route, "Index", "index"),
            format: None,
            query: None,
        }
    }

    #[test]
    fn test_echo_dispatcher() {
        let response = EchoDispatcher.dispatch(request("Blog/show/1"));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_closure_dispatcher() {
        let dispatcher = |req: DispatchRequest| {
            if req.target.controller == "Blog" {
                StatusCode::OK.into_response()
            } else {
                StatusCode::NOT_FOUND.into_response()
            }
        };
        assert_eq!(dispatcher.dispatch(request("Blog/show")).status(), StatusCode::OK);
        assert_eq!(dispatcher.dispatch(request("Nope")).status(), StatusCode::NOT_FOUND);
    }
}
