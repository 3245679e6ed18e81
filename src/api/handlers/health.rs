/*
 * Responsibility
 * - GET /api/health (疎通用)
 * - `/api` は除外 prefix なので gate を通らない
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
