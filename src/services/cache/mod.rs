pub mod client;
#[cfg(test)]
pub mod memory;
pub mod valkey;

pub use client::{CacheClient, CacheError};
#[cfg(test)]
pub use memory::MemoryCache;
pub use valkey::ValkeyClient;
