pub mod auth;
pub mod health;
pub mod live_streams;
pub mod webhooks;
