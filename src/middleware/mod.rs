/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: gateway authentication filter + identity headers
 * - http: request id / body limit / timeout / access log
 */
pub mod auth;
pub mod http;
