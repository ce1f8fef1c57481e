use axum::{response::Json, http::StatusCode};
use serde_json::{json, Value};

use crate::error::ApiError;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Contractor Management System API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Fallback for unknown routes; keeps the `{"detail": ...}` envelope so error
/// bodies stay uniform across the API.
pub async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}
