//! Route handlers organized by resource

pub mod health;
pub mod metrics;
pub mod schools;
pub mod setup;

use axum::http::Method;
use axum::response::{IntoResponse, Response};

use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::metrics::Route;

/// Settle a handler outcome into a response and count it.
///
/// Every counted handler ends here, so each terminal response records
/// exactly one sample under its route template.
pub(crate) fn finish(
    state: &AppState,
    method: Method,
    route: Route,
    outcome: Result<Response, ApiError>,
) -> Response {
    let response = outcome.unwrap_or_else(IntoResponse::into_response);
    state.recorder.record(&method, route, response.status());
    response
}
