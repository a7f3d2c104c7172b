//! Table bootstrap endpoint

use std::sync::Arc;

use axum::{
    extract::State,
    http::Method,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::finish;
use crate::http::error::ApiError;
use crate::http::server::AppState;
use crate::metrics::Route;

/// GET /setup - create the table and seed it when empty
async fn setup(State(state): State<Arc<AppState>>) -> Response {
    let outcome = run_setup(&state).await;
    finish(&state, Method::GET, Route::Setup, outcome)
}

async fn run_setup(state: &AppState) -> Result<Response, ApiError> {
    state.store.setup().await?;
    Ok(Json(json!({ "message": "Table ready with some data" })).into_response())
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/setup", get(setup))
}
