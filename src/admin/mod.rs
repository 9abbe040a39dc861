//! Admin API.
//!
//! # Data Flow
//! ```text
//! Bearer request on the admin listener
//!     → auth.rs (API key check)
//!     → handlers.rs (inspect or mutate the binding table)
//!     → AliasRouter (same instance the dispatcher resolves through)
//! ```
//!
//! # Design Decisions
//! - Served on its own listener so it can stay on a private interface
//! - Bindings added here are validated like config bindings
//! - Runtime bindings persist through the router cache, not the config file

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route(
            "/admin/bindings",
            get(list_bindings).post(add_binding).delete(remove_binding),
        )
        .route("/admin/resolve", get(resolve))
        .route("/admin/flush", post(flush))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
