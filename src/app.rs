/*
 * Responsibility
 * - Config読み込み → 依存生成 → Router 組み立て
 * - Middleware の適用 (auth filter の外側に http layers)
 * - axum::serve() で起動, SIGTERM/Ctrl-C で graceful shutdown
 */
use anyhow::{Context, Result};
use axum::Router;
use std::{panic, process, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::{auth::build_gateway_auth, upstream::UpstreamClient};
use crate::state::AppState;
use crate::{api, middleware};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,edge_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get "lost".
        tracing::error!(?info, "panic");

        // Development: crash the whole process so we notice immediately.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gateway in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    tracing::info!(upstream = %state.upstream.base_url(), "upstream configured");

    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("gateway stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    // Process-level services, built once and shared read-only by every request.
    let auth = build_gateway_auth(&config.auth, &config.redis_url)
        .await
        .context("building gateway authentication")?;
    let upstream =
        UpstreamClient::new(&config.upstream).context("building upstream http client")?;

    Ok(AppState::new(auth, Arc::new(upstream)))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = compose(state);
    middleware::http::apply(router, config.request_body_limit_bytes, config.request_timeout)
}

// Routes + auth filter, without transport-level layers.
fn compose(state: AppState) -> Router {
    let auth = state.auth.clone();
    let router = api::routes().with_state(state);
    middleware::auth::gateway::apply(router, auth)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamSettings;
    use crate::services::auth::{
        CacheSessionStore, GatewayAuth, LOGIN_TOKEN_KEY_PREFIX, PathWhitelist, TokenVerifier,
    };
    use crate::services::cache::MemoryCache;
    use axum::{
        body::Body,
        http::{HeaderMap, Request, StatusCode, Uri, header},
    };
    use jsonwebtoken::{Algorithm, EncodingKey, Header, get_current_timestamp};
    use serde_json::{Value, json};
    use std::time::Duration;
    use tower::ServiceExt;

    const SECRET: &[u8] = b"app-test-secret-app-test-secret-app";

    // Upstream stand-in that reports the path and identity headers it was given.
    async fn spawn_upstream() -> url::Url {
        async fn whoami(uri: Uri, headers: HeaderMap) -> axum::Json<Value> {
            let get = |name: &str| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            };
            axum::Json(json!({
                "path": uri.path(),
                "user_key": get("user-key"),
                "user_id": get("user-id"),
                "user_name": get("user-name"),
                "from_source": get("from-source"),
            }))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().fallback(whoami))
                .await
                .unwrap();
        });
        url::Url::parse(&format!("http://{addr}")).unwrap()
    }

    async fn gateway(cache: MemoryCache) -> Router {
        let upstream = UpstreamClient::new(&UpstreamSettings {
            url: spawn_upstream().await,
            connect_timeout: Duration::from_secs(2),
            response_timeout: Some(Duration::from_secs(5)),
            pool_max_idle_per_host: 2,
            pool_idle_timeout: None,
        })
        .unwrap();

        let auth = GatewayAuth::new(
            PathWhitelist::new(["/actuator/**", "/auth/**"]).unwrap(),
            "Bearer ",
            TokenVerifier::new(SECRET, 0),
            Arc::new(CacheSessionStore::new_with_cache(
                Arc::new(cache),
                LOGIN_TOKEN_KEY_PREFIX,
            )),
        );

        compose(AppState::new(auth, Arc::new(upstream)))
    }

    async fn read_json(resp: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_served_locally_when_whitelisted() {
        let app = gateway(MemoryCache::new()).await;

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/actuator/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(read_json(resp).await["status"], "UP");
    }

    #[tokio::test]
    async fn protected_route_without_token_never_reaches_upstream() {
        let app = gateway(MemoryCache::new()).await;

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/system/user/list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = read_json(resp).await;
        assert_eq!(body["error"]["message"], "token must not be empty");
        assert!(body.get("user_id").is_none());
    }

    #[tokio::test]
    async fn authenticated_request_is_forwarded_with_identity() {
        let cache = MemoryCache::new();
        cache.insert("login_tokens:k-77");
        let app = gateway(cache).await;

        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS512),
            &json!({
                "user_key": "k-77",
                "user_id": "77",
                "username": "ops admin",
                "exp": get_current_timestamp() + 600,
            }),
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/system/user/list?page=1")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header("from-source", "inner")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert_eq!(body["user_key"], "k-77");
        assert_eq!(body["user_id"], "77");
        assert_eq!(body["user_name"], "ops+admin");
        assert!(body["from_source"].is_null());
    }

    #[tokio::test]
    async fn whitelisted_upstream_route_is_forwarded_anonymously() {
        let app = gateway(MemoryCache::new()).await;

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/auth/login")
                    .header("from-source", "inner")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = read_json(resp).await;
        assert!(body["user_id"].is_null());
        assert!(body["from_source"].is_null());
    }

    #[tokio::test]
    async fn dot_segments_do_not_smuggle_protected_paths_past_the_whitelist() {
        let app = gateway(MemoryCache::new()).await;

        for path in [
            "/auth/../system/user/list",
            "/auth/%2e%2e/system/user/list",
            "/actuator/.%2E/system/user/list",
        ] {
            let resp = app
                .clone()
                .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{path}");
            let body = read_json(resp).await;
            assert_eq!(body["error"]["message"], "token must not be empty");
        }
    }

    #[tokio::test]
    async fn upstream_sees_the_path_the_whitelist_matched() {
        let app = gateway(MemoryCache::new()).await;

        for (raw, forwarded) in [
            ("/system/../auth/login", "/auth/login"),
            ("/auth/./login", "/auth/login"),
            ("/auth//../captcha", "/auth/captcha"),
        ] {
            let resp = app
                .clone()
                .oneshot(Request::builder().uri(raw).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(resp.status(), StatusCode::OK, "{raw}");
            let body = read_json(resp).await;
            assert_eq!(body["path"], forwarded);
            assert!(body["user_id"].is_null());
        }
    }

    #[tokio::test]
    async fn encoded_slash_is_refused_before_forwarding() {
        let app = gateway(MemoryCache::new()).await;

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/auth/..%2Fsystem/user/list")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
