//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID generated or propagated)
//!     → dispatch (path → alias → route)
//!     → response.rs (canonical redirect) or Dispatcher response
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
