use std::sync::Arc;

use crate::{
    config::Config, repositories::user::UserRepository, services::live_stream::LiveStreamService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub live_streams: Arc<LiveStreamService>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    pub fn new(
        config: Config,
        live_streams: Arc<LiveStreamService>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            config,
            live_streams,
            users,
        }
    }

    /// Secret for verifying platform webhook signatures, if configured.
    pub fn webhook_secret(&self) -> Option<&str> {
        self.config
            .mux
            .webhook_secret
            .as_deref()
            .filter(|secret| !secret.is_empty())
    }
}
