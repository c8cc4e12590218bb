/*
 * Responsibility
 * - Load settings from the environment (.env supported) once at start-up
 * - Validate them (missing/invalid values abort start-up)
 * - Everything here is read-only after `from_env` returns
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use base64::Engine;
use url::Url;

use crate::services::auth::{LOGIN_TOKEN_KEY_PREFIX, token::DEFAULT_TOKEN_PREFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings of the authentication filter.
#[derive(Clone)]
pub struct AuthSettings {
    pub whitelist: Vec<String>,
    pub token_prefix: String,
    pub login_token_key_prefix: String,
    pub jwt_secret: Vec<u8>,
    pub token_leeway_seconds: u64,
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("AuthSettings")
            .field("whitelist", &self.whitelist)
            .field("token_prefix", &self.token_prefix)
            .field("login_token_key_prefix", &self.login_token_key_prefix)
            .field("token_leeway_seconds", &self.token_leeway_seconds)
            .finish_non_exhaustive()
    }
}

/// Settings of the pooled HTTP client used to reach the upstream.
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub url: Url,
    pub connect_timeout: Duration,
    // None = no per-response deadline (the global request timeout still applies)
    pub response_timeout: Option<Duration>,
    pub pool_max_idle_per_host: usize,
    // None = keep idle connections until the upstream closes them
    pub pool_idle_timeout: Option<Duration>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub redis_url: String,
    pub auth: AuthSettings,
    pub upstream: UpstreamSettings,
    pub request_body_limit_bytes: usize,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::from_env();

        let redis_url = std::env::var("REDIS_URL").map_err(|_| ConfigError::Missing("REDIS_URL"))?;

        let auth = AuthSettings {
            whitelist: parse_list(&std::env::var("AUTH_WHITELIST").unwrap_or_default()),
            token_prefix: std::env::var("AUTH_TOKEN_PREFIX")
                .unwrap_or_else(|_| DEFAULT_TOKEN_PREFIX.to_string()),
            login_token_key_prefix: std::env::var("AUTH_LOGIN_TOKEN_KEY_PREFIX")
                .unwrap_or_else(|_| LOGIN_TOKEN_KEY_PREFIX.to_string()),
            jwt_secret: parse_secret(
                &std::env::var("AUTH_JWT_SECRET")
                    .map_err(|_| ConfigError::Missing("AUTH_JWT_SECRET"))?,
                parse_bool(std::env::var("AUTH_JWT_SECRET_BASE64").ok().as_deref()),
            )?,
            token_leeway_seconds: parse_or("AUTH_TOKEN_LEEWAY_SECONDS", 0)?,
        };

        let upstream_url = std::env::var("UPSTREAM_URL")
            .map_err(|_| ConfigError::Missing("UPSTREAM_URL"))?;
        let upstream = UpstreamSettings {
            url: parse_upstream_url(&upstream_url)?,
            connect_timeout: Duration::from_millis(parse_or(
                "UPSTREAM_CONNECT_TIMEOUT_MS",
                45_000,
            )?),
            response_timeout: parse_opt::<u64>("UPSTREAM_RESPONSE_TIMEOUT_MS")?
                .map(Duration::from_millis),
            pool_max_idle_per_host: parse_or("UPSTREAM_POOL_MAX_IDLE_PER_HOST", 32)?,
            pool_idle_timeout: parse_opt::<u64>("UPSTREAM_POOL_IDLE_TIMEOUT_MS")?
                .map(Duration::from_millis),
        };

        let request_body_limit_bytes = parse_or("REQUEST_BODY_LIMIT_BYTES", 10 * 1024 * 1024)?;
        let request_timeout = Duration::from_secs(parse_or("REQUEST_TIMEOUT_SECONDS", 60)?);

        Ok(Self {
            addr,
            app_env,
            redis_url,
            auth,
            upstream,
            request_body_limit_bytes,
            request_timeout,
        })
    }
}

// Comma-separated list; blanks are dropped, order is kept.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|s| s.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

fn parse_secret(raw: &str, base64_encoded: bool) -> Result<Vec<u8>, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::Invalid("AUTH_JWT_SECRET"));
    }
    if !base64_encoded {
        return Ok(raw.as_bytes().to_vec());
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(raw.trim())
        .map_err(|_| ConfigError::Invalid("AUTH_JWT_SECRET"))?;
    if bytes.is_empty() {
        return Err(ConfigError::Invalid("AUTH_JWT_SECRET"));
    }
    Ok(bytes)
}

fn parse_upstream_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|_| ConfigError::Invalid("UPSTREAM_URL"))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(ConfigError::Invalid("UPSTREAM_URL")),
    }
}

// Unset => default; set but unparsable => start-up error.
fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    Ok(parse_opt(key)?.unwrap_or(default))
}

fn parse_opt<T: FromStr>(key: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => v
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(key)),
        _ => Ok(None),
    }
}
