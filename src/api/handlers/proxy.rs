use axum::{body::Body, extract::State, http::Request, response::Response};

use crate::error::AppError;
use crate::state::AppState;

/// Fallback: everything the gateway does not answer itself goes upstream.
pub async fn proxy(
    State(state): State<AppState>,
    req: Request<Body>,
) -> Result<Response, AppError> {
    state.upstream.forward(req).await.map_err(|err| {
        tracing::warn!(error = %err, "upstream request failed");
        AppError::from(err)
    })
}
