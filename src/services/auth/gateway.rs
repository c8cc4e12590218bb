//! Gateway authentication decision, independent of the HTTP framework.
//!
//! Order of checks for a protected path:
//! token present -> signature/time valid -> session live -> identity claims complete.
//! Each step either passes or ends the request with an `AuthError`; nothing is retried.

use axum::http::HeaderMap;
use std::sync::Arc;

use crate::services::auth::{
    error::AuthError,
    jwt::{Claims, TokenVerifier},
    session::SessionStore,
    token::extract_token,
    whitelist::PathWhitelist,
};

/// Shared, read-only authentication context. Cheap to clone.
#[derive(Clone)]
pub struct GatewayAuth {
    whitelist: Arc<PathWhitelist>,
    token_prefix: Arc<str>,
    verifier: Arc<TokenVerifier>,
    sessions: Arc<dyn SessionStore>,
}

impl std::fmt::Debug for GatewayAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayAuth")
            .field("whitelist", &self.whitelist.patterns())
            .field("token_prefix", &self.token_prefix)
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl GatewayAuth {
    pub fn new(
        whitelist: PathWhitelist,
        token_prefix: impl Into<Arc<str>>,
        verifier: TokenVerifier,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            whitelist: Arc::new(whitelist),
            token_prefix: token_prefix.into(),
            verifier: Arc::new(verifier),
            sessions,
        }
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.whitelist.is_exempt(path)
    }

    /// Authenticate a request on a protected path from its headers.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Claims, AuthError> {
        let token = extract_token(headers, &self.token_prefix).ok_or(AuthError::MissingToken)?;

        let claims = self.verifier.verify(&token).map_err(|err| {
            tracing::warn!(error = %err, "token verification failed");
            AuthError::from(&err)
        })?;

        // An empty session key names no login record; skip the lookup.
        let live = if claims.session_key.is_empty() {
            false
        } else {
            // Fail closed: a cache outage must not let revoked sessions through.
            match self.sessions.is_live(&claims.session_key).await {
                Ok(live) => live,
                Err(err) => {
                    tracing::warn!(error = %err, "session store failure");
                    false
                }
            }
        };
        if !live {
            return Err(AuthError::SessionNotLive);
        }

        claims.require_identity().map_err(|err| {
            tracing::warn!(error = %err, "token identity incomplete");
            AuthError::from(&err)
        })?;

        Ok(claims)
    }
}
