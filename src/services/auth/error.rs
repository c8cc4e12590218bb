use thiserror::Error;

use crate::services::auth::jwt::VerifyError;

/// Why a request was refused at the gateway.
///
/// Every variant ends in the same 401; only the message differs.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("token must not be empty")]
    MissingToken,
    #[error("token has expired or failed validation")]
    TokenInvalidOrExpired,
    #[error("login state has expired")]
    SessionNotLive,
    #[error("token validation failed")]
    IncompleteClaims,
}

impl From<&VerifyError> for AuthError {
    fn from(e: &VerifyError) -> Self {
        match e {
            VerifyError::TokenInvalidOrExpired(_) => Self::TokenInvalidOrExpired,
            VerifyError::IncompleteClaims(_) => Self::IncompleteClaims,
        }
    }
}
