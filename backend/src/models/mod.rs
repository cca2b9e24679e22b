//! Data models shared across database access and API handlers.

pub mod live_stream;
pub mod user;
