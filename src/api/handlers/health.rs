/*
 * Responsibility
 * - GET /actuator/health (疎通用)
 * - sits behind the auth filter: whitelist it to probe without a token
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "UP"})))
}
