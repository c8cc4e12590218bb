use axum::http::{HeaderMap, header};

/// Default scheme label clients put in front of the token.
pub const DEFAULT_TOKEN_PREFIX: &str = "Bearer ";

/// Pull the token out of the `Authorization` header.
///
/// The configured prefix is removed once when present; a value without the
/// prefix is passed through as-is. A missing, unreadable or empty value yields
/// `None`, which the caller reports as a missing token.
pub fn extract_token(headers: &HeaderMap, prefix: &str) -> Option<String> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())?;

    let token = if prefix.is_empty() {
        raw
    } else {
        raw.strip_prefix(prefix).unwrap_or(raw)
    };

    if token.is_empty() {
        return None;
    }

    Some(token.to_string())
}
