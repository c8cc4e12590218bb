/// Factory: build `GatewayAuth` from application `Config`.
use std::sync::Arc;

use crate::config::AuthSettings;
use crate::services::auth::{
    GatewayAuth, PathWhitelist, TokenVerifier,
    session::{CacheSessionStore, SessionError},
    whitelist::WhitelistError,
};

#[derive(Debug, thiserror::Error)]
pub enum AuthSetupError {
    #[error(transparent)]
    Whitelist(#[from] WhitelistError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub async fn build_gateway_auth(
    settings: &AuthSettings,
    redis_url: &str,
) -> Result<GatewayAuth, AuthSetupError> {
    let whitelist = PathWhitelist::new(settings.whitelist.iter().cloned())?;
    let verifier = TokenVerifier::new(&settings.jwt_secret, settings.token_leeway_seconds);
    let sessions =
        CacheSessionStore::connect(redis_url, settings.login_token_key_prefix.clone()).await?;

    tracing::info!(
        whitelist = ?whitelist.patterns(),
        key_prefix = %settings.login_token_key_prefix,
        "gateway authentication configured"
    );

    Ok(GatewayAuth::new(
        whitelist,
        settings.token_prefix.clone(),
        verifier,
        Arc::new(sessions),
    ))
}
