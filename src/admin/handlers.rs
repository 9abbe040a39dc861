use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::config::check_binding;
use crate::http::server::AppState;
use crate::routing::{BindingView, Direction};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub bindings: usize,
    pub memoized_routes: usize,
    pub memoized_aliases: usize,
    pub dirty: bool,
}

#[derive(Serialize)]
pub struct BindingChange {
    pub changed: bool,
}

#[derive(Deserialize)]
pub struct UnbindRequest {
    pub alias: String,
}

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub alias: Option<String>,
    pub route: Option<String>,
}

#[derive(Serialize)]
pub struct Resolution {
    pub alias: String,
    pub route: String,
}

#[derive(Serialize)]
pub struct FlushResult {
    pub written: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    errors: Vec<String>,
}

fn error_response(status: StatusCode, errors: Vec<String>) -> Response {
    (status, Json(ErrorBody { errors })).into_response()
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        bindings: state.router.len(),
        memoized_routes: state.router.memoized(Direction::ToRoute),
        memoized_aliases: state.router.memoized(Direction::ToAlias),
        dirty: state.router.is_dirty(),
    })
}

pub async fn list_bindings(State(state): State<AppState>) -> Json<Vec<BindingView>> {
    Json(state.router.bindings())
}

pub async fn add_binding(
    State(state): State<AppState>,
    Json(binding): Json<BindingView>,
) -> Response {
    let problems = check_binding(&binding.alias, &binding.route);
    if !problems.is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            problems.iter().map(ToString::to_string).collect(),
        );
    }

    let changed = state.router.bind(&binding.alias, &binding.route);
    let status = if changed { StatusCode::CREATED } else { StatusCode::OK };
    (status, Json(BindingChange { changed })).into_response()
}

pub async fn remove_binding(
    State(state): State<AppState>,
    Json(request): Json<UnbindRequest>,
) -> Response {
    if state.router.unbind(&request.alias) {
        Json(BindingChange { changed: true }).into_response()
    } else {
        error_response(
            StatusCode::NOT_FOUND,
            vec![format!("no binding for alias {:?}", request.alias)],
        )
    }
}

pub async fn resolve(
    State(state): State<AppState>,
    Query(query): Query<ResolveQuery>,
) -> Response {
    match (query.alias, query.route) {
        (Some(alias), None) => {
            let route = state.router.route_for(&alias);
            Json(Resolution { alias, route }).into_response()
        }
        (None, Some(route)) => {
            let alias = state.router.alias_for(&route);
            Json(Resolution { alias, route }).into_response()
        }
        _ => error_response(
            StatusCode::BAD_REQUEST,
            vec!["exactly one of `alias` or `route` is required".to_string()],
        ),
    }
}

pub async fn flush(State(state): State<AppState>) -> Response {
    match state.router.flush() {
        Ok(written) => Json(FlushResult { written }).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Admin flush failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, vec![e.to_string()])
        }
    }
}
