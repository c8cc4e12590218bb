pub mod cache;
pub mod store;

pub use cache::{CacheSessionStore, LOGIN_TOKEN_KEY_PREFIX};
pub use store::{SessionError, SessionStore};
