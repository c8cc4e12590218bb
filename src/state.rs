/*
 * Responsibility
 * - Router に紐づける共有コンテキスト (AppState)
 *   - auth: gateway authentication (whitelist, verifier, session store)
 *   - upstream: pooled client towards the backend
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::{auth::GatewayAuth, upstream::UpstreamClient};

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: GatewayAuth,
    pub upstream: Arc<UpstreamClient>,
}

impl AppState {
    pub fn new(auth: GatewayAuth, upstream: Arc<UpstreamClient>) -> Self {
        Self { auth, upstream }
    }
}
