use axum::{http::StatusCode, response::IntoResponse};

use super::messages;

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, messages::english("not_found"))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "All is well")
}
