//! School CRUD endpoints
//!
//! Each handler is a thin shell: the inner function talks to the store and
//! returns `Result<Response, ApiError>`, the shell hands that to
//! [`finish`] which produces the response and records the metric.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use super::finish;
use crate::http::error::{require, ApiError};
use crate::http::server::AppState;
use crate::metrics::Route;
use crate::models::{School, SchoolInput};

type RawBody = Result<Bytes, BytesRejection>;

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
    pub deleted: School,
}

/// Ids that are not integers cannot match a row.
fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// Decode a create/update body.
///
/// Only a non-empty `application/json` body is parsed; anything else
/// carries no fields. A parse failure or a bare scalar is a 400.
fn read_input(headers: &HeaderMap, body: RawBody) -> Result<SchoolInput, ApiError> {
    let bytes = body?;
    if !is_json(headers) || bytes.is_empty() {
        return Ok(SchoolInput::default());
    }

    let value: Value = serde_json::from_slice(&bytes).map_err(|_| ApiError::MalformedBody)?;
    if !(value.is_object() || value.is_array()) {
        return Err(ApiError::MalformedBody);
    }
    Ok(SchoolInput::from_json(&value))
}

/// POST /schools - insert a school
async fn create_school(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: RawBody,
) -> Response {
    let outcome = insert(&state, &headers, body).await;
    finish(&state, Method::POST, Route::Schools, outcome)
}

async fn insert(
    state: &AppState,
    headers: &HeaderMap,
    body: RawBody,
) -> Result<Response, ApiError> {
    let input = read_input(headers, body)?;
    let school = state.store.create(&input).await?;
    Ok((StatusCode::CREATED, Json(school)).into_response())
}

/// GET /schools - all schools by ascending id
async fn list_schools(State(state): State<Arc<AppState>>) -> Response {
    let outcome = select_all(&state).await;
    finish(&state, Method::GET, Route::Schools, outcome)
}

async fn select_all(state: &AppState) -> Result<Response, ApiError> {
    let schools = state.store.list().await?;
    Ok(Json(schools).into_response())
}

/// GET /schools/{id} - a single school
async fn get_school(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let outcome = select_one(&state, &id).await;
    finish(&state, Method::GET, Route::SchoolById, outcome)
}

async fn select_one(state: &AppState, id: &str) -> Result<Response, ApiError> {
    let id = parse_id(id)?;
    let school = require(state.store.get(id).await)?;
    Ok(Json(school).into_response())
}

/// PUT /schools/{id} - replace name and address
async fn update_school(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: RawBody,
) -> Response {
    let outcome = replace(&state, &id, &headers, body).await;
    finish(&state, Method::PUT, Route::SchoolById, outcome)
}

async fn replace(
    state: &AppState,
    id: &str,
    headers: &HeaderMap,
    body: RawBody,
) -> Result<Response, ApiError> {
    let input = read_input(headers, body)?;
    let id = parse_id(id)?;
    let school = require(state.store.update(id, &input).await)?;
    Ok(Json(school).into_response())
}

/// DELETE /schools/{id} - remove a school, echoing what was removed
async fn delete_school(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    let outcome = remove(&state, &id).await;
    finish(&state, Method::DELETE, Route::SchoolById, outcome)
}

async fn remove(state: &AppState, id: &str) -> Result<Response, ApiError> {
    let id = parse_id(id)?;
    let deleted = require(state.store.delete(id).await)?;
    Ok(Json(DeletedResponse {
        message: "Deleted successfully",
        deleted,
    })
    .into_response())
}

/// School routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/schools", get(list_schools).post(create_school))
        .route(
            "/schools/{id}",
            get(get_school).put(update_school).delete(delete_school),
        )
}
