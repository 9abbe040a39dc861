//! Alias dispatcher library.
//!
//! Bidirectional rewriting between public URL aliases and internal
//! `controller/action/args` routes, with an HTTP front end that redirects to
//! canonical aliases and hands resolved routes to an application dispatcher.

pub mod admin;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;

pub use config::schema::AppConfig;
pub use dispatch::{DispatchRequest, Dispatcher, EchoDispatcher, RouteTarget};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::AliasRouter;
