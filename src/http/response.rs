//! Response helpers.
//!
//! # Design Decisions
//! - Canonical redirects are permanent (301) so clients and crawlers update
//!   their links
//! - A location that cannot be expressed as a header value is reported to the
//!   caller, which then serves the request in place

use axum::http::header::{InvalidHeaderValue, LOCATION};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

/// `301 Moved Permanently` to `location`.
pub fn permanent_redirect(location: &str) -> Result<Response, InvalidHeaderValue> {
    let location = HeaderValue::from_str(location)?;
    Ok((StatusCode::MOVED_PERMANENTLY, [(LOCATION, location)]).into_response())
}
