/*
 * Responsibility
 * - gateway が自分で応答する route と upstream への fallback (routes() の re-export)
 */
pub mod handlers;
mod routes;

pub use routes::routes;
