//! Pooled HTTP client that hands authenticated requests to the upstream.
//!
//! This is plain forwarding to a single base URL: method, path, query, headers
//! (minus hop-by-hop) and a streamed body. Route selection, retries and load
//! balancing belong to the routing layer, not here.

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, Request, Uri, header},
    response::Response,
};
use url::Url;

use crate::config::UpstreamSettings;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("upstream timed out: {0}")]
    Timeout(#[source] reqwest::Error),
    #[error("upstream request failed: {0}")]
    Upstream(#[source] reqwest::Error),
    #[error("request uri cannot be mapped onto the upstream")]
    InvalidUri,
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e)
        } else {
            Self::Upstream(e)
        }
    }
}

// Connection-scoped headers (RFC 9110 §7.6.1); never forwarded in either direction.
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    base: Url,
}

impl UpstreamClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, ProxyError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .pool_max_idle_per_host(settings.pool_max_idle_per_host)
            .pool_idle_timeout(settings.pool_idle_timeout)
            // Redirects are the client's business; pass them through untouched.
            .redirect(reqwest::redirect::Policy::none());

        if let Some(timeout) = settings.response_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base: settings.url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Map an inbound request URI onto the upstream base URL.
    pub fn target_url(&self, uri: &Uri) -> Result<Url, ProxyError> {
        let path = uri.path();
        if !path.starts_with('/') {
            return Err(ProxyError::InvalidUri);
        }

        let mut url = self.base.clone();
        let base_path = self.base.path().trim_end_matches('/');
        url.set_path(&format!("{}{}", base_path, path));
        url.set_query(uri.query());
        Ok(url)
    }

    pub async fn forward(&self, req: Request<Body>) -> Result<Response, ProxyError> {
        let (parts, body) = req.into_parts();
        let url = self.target_url(&parts.uri)?;

        let mut headers = parts.headers;
        strip_hop_by_hop(&mut headers);
        headers.remove(header::HOST);

        tracing::debug!(method = %parts.method, %url, "forwarding to upstream");

        let upstream = self
            .client
            .request(parts.method, url)
            .headers(headers)
            .body(reqwest::Body::wrap_stream(body.into_data_stream()))
            .send()
            .await?;

        let status = upstream.status();
        let mut resp_headers = upstream.headers().clone();
        strip_hop_by_hop(&mut resp_headers);

        let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
        *response.status_mut() = status;
        *response.headers_mut() = resp_headers;
        Ok(response)
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // Headers named in `Connection` are hop-by-hop too.
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}
