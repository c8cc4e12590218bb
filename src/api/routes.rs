/*
 * Responsibility
 * - gateway 自身の URL (/actuator/health)
 * - それ以外は fallback で upstream へ
 */
use axum::{Router, routing::get};

use crate::api::handlers::{health::health, proxy::proxy};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/actuator/health", get(health))
        .fallback(proxy)
}
