pub mod gateway;
pub mod identity;
