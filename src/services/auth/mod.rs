pub mod error;
pub mod factory;
pub mod gateway;
pub mod jwt;
pub mod session;
pub mod token;
pub mod whitelist;

pub use error::AuthError;
pub use factory::build_gateway_auth;
pub use gateway::GatewayAuth;
pub use jwt::{Claims, TokenVerifier};
pub use session::{CacheSessionStore, LOGIN_TOKEN_KEY_PREFIX};
pub use whitelist::PathWhitelist;
