use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Claim names written by the login service.
pub const CLAIM_USER_ID: &str = "user_id";
pub const CLAIM_USERNAME: &str = "username";

// Errors returned by token verification.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// Malformed token, bad signature, wrong algorithm, expired or not yet valid.
    #[error("token rejected: {0}")]
    TokenInvalidOrExpired(#[source] jsonwebtoken::errors::Error),
    /// Signature is good but `user_id` or `username` is missing or empty.
    #[error("missing or empty '{0}' claim")]
    IncompleteClaims(&'static str),
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::TokenInvalidOrExpired(e)
    }
}

/// Raw payload as it comes off the wire.
///
/// `user_id` is kept as a `Value` because issuers encode numeric ids either as
/// JSON numbers or as strings.
#[derive(Debug, Deserialize)]
struct RawClaims {
    #[serde(default)]
    user_key: Option<String>,
    #[serde(default)]
    user_id: Option<serde_json::Value>,
    #[serde(default)]
    username: Option<String>,
    exp: u64,
}

/// Payload of a token whose signature and time claims checked out.
///
/// Identity fields may still be empty here; `require_identity` is the gate
/// before they are handed downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub session_key: String,
    pub user_id: String,
    pub user_name: String,
    pub exp: u64,
}

/// HMAC (HS256/HS384/HS512) token verifier.
///
/// Built once at start-up; key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(secret: &[u8], leeway_seconds: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.set_required_spec_claims(&["exp"]);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        // Tokens are minted for the whole platform; no audience is pinned here.
        validation.validate_aud = false;
        validation.leeway = leeway_seconds;

        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verify signature and time claims.
    ///
    /// Missing identity claims decode as empty strings; completeness is checked
    /// later by `Claims::require_identity`, once the session is known to be live.
    /// Never panics on malformed input: every parse failure becomes
    /// `VerifyError::TokenInvalidOrExpired`.
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let data =
            jsonwebtoken::decode::<RawClaims>(token, &self.decoding_key, &self.validation)?;
        let raw = data.claims;

        Ok(Claims {
            session_key: raw.user_key.unwrap_or_default(),
            user_id: raw.user_id.and_then(value_to_string).unwrap_or_default(),
            user_name: raw.username.unwrap_or_default(),
            exp: raw.exp,
        })
    }
}

impl Claims {
    pub fn require_identity(&self) -> Result<(), VerifyError> {
        if self.user_id.is_empty() {
            return Err(VerifyError::IncompleteClaims(CLAIM_USER_ID));
        }
        if self.user_name.is_empty() {
            return Err(VerifyError::IncompleteClaims(CLAIM_USERNAME));
        }
        Ok(())
    }
}

fn value_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
