//! Identity headers handed to downstream services.
//!
//! Downstream services trust these headers only because the gateway sets them,
//! so whatever the client sent under the same names never survives.

use axum::http::{HeaderMap, HeaderName, HeaderValue};

use crate::services::auth::Claims;

pub const HEADER_USER_KEY: HeaderName = HeaderName::from_static("user-key");
pub const HEADER_USER_ID: HeaderName = HeaderName::from_static("user-id");
pub const HEADER_USER_NAME: HeaderName = HeaderName::from_static("user-name");

/// Internal trust-source marker. Only internal callers behind the gateway may
/// set it; the gateway itself only ever removes it.
pub const HEADER_FROM_SOURCE: HeaderName = HeaderName::from_static("from-source");

/// Strip the trust-source marker, then inject the verified identity if any.
///
/// Values are form-urlencoded (UTF-8) so non-ASCII names fit in a header.
pub fn rewrite_identity(headers: &mut HeaderMap, claims: Option<&Claims>) {
    headers.remove(HEADER_FROM_SOURCE);

    let Some(claims) = claims else {
        return;
    };

    add_header(headers, HEADER_USER_KEY, Some(&claims.session_key));
    add_header(headers, HEADER_USER_ID, Some(&claims.user_id));
    add_header(headers, HEADER_USER_NAME, Some(&claims.user_name));
}

fn add_header(headers: &mut HeaderMap, name: HeaderName, value: Option<&str>) {
    let Some(value) = value else {
        return;
    };

    let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();

    match HeaderValue::from_str(&encoded) {
        // insert() replaces every client-sent value under the same name
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(err) => tracing::warn!(header = %name, error = %err, "identity header skipped"),
    }
}
