//! Gateway authentication filter.
//!
//! whitelist? -> forward | token -> verify -> session -> identity headers -> forward
//!
//! The path is canonicalized first (dot segments resolved, the same way the
//! upstream client builds its target URL) and written back into the request, so
//! the whitelist decides on exactly the path that gets forwarded. Paths carrying
//! encoded separators are refused with a 400.
//!
//! Any auth failure ends the request here with a 401; the next service never sees it.
//! Header rewriting happens only on the way to `next`, so a rejected request is
//! never partially rewritten and forwarded.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, Uri, uri::PathAndQuery},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::error::AppError;
use crate::middleware::auth::identity::rewrite_identity;
use crate::services::auth::{AuthError, GatewayAuth};

/// Put the authentication filter in front of every route (and the fallback) of `router`.
///
/// Example:
/// ```ignore
/// let app = Router::new().fallback(proxy).with_state(state);
/// let app = middleware::auth::gateway::apply(app, auth);
/// ```
pub fn apply<S>(router: Router<S>, auth: GatewayAuth) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(auth, gateway_auth_middleware))
}

async fn gateway_auth_middleware(
    State(auth): State<GatewayAuth>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(uri) = canonical_uri(req.uri()) else {
        tracing::warn!(uri = %req.uri(), "rejecting non-canonical request path");
        return AppError::BadRequest.into_response();
    };
    *req.uri_mut() = uri;
    let path = req.uri().path().to_owned();

    if auth.is_exempt(&path) {
        tracing::debug!(path = %path, "whitelisted path, skipping authentication");
        rewrite_identity(req.headers_mut(), None);
        return next.run(req).await;
    }

    match auth.authenticate(req.headers()).await {
        Ok(claims) => {
            tracing::debug!(
                path = %path,
                user_id = %claims.user_id,
                expires_at = claims.exp,
                "authenticated"
            );
            rewrite_identity(req.headers_mut(), Some(&claims));
            next.run(req).await
        }
        Err(err) => unauthorized_response(&path, err),
    }
}

// Resolve `.`/`..` (plain or percent-encoded) and `\` separators with the URL
// parser the upstream client uses. `%2f`/`%5c` would let a segment turn into a
// separator after decoding downstream, so those paths have no canonical form.
fn canonical_uri(uri: &Uri) -> Option<Uri> {
    let raw = uri.path();
    let lower = raw.to_ascii_lowercase();
    if lower.contains("%2f") || lower.contains("%5c") {
        return None;
    }

    let mut url = Url::parse("http://gateway.invalid/").ok()?;
    url.set_path(raw);
    if url.path() == raw {
        return Some(uri.clone());
    }

    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };

    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
    Uri::from_parts(parts).ok()
}

fn unauthorized_response(path: &str, err: AuthError) -> Response {
    tracing::error!(path = %path, message = %err, "gateway authentication rejected");
    AppError::from(err).into_response()
}
