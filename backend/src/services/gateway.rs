//! Contract for the remote live-video platform.
//!
//! The session manager only ever talks to the platform through
//! [`LiveStreamGateway`]; the Mux HTTP adapter lives in [`crate::services::mux`].

use async_trait::async_trait;
use serde::Serialize;

use crate::models::live_stream::LiveStreamStatus;

/// Who may play back a stream's media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPolicy {
    Public,
    Signed,
}

/// Identifiers assigned by the platform when a stream is provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLiveStream {
    pub remote_id: String,
    pub stream_key: String,
    pub playback_id: String,
    pub status: LiveStreamStatus,
    pub remote_created_at: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("live video platform credentials are not configured")]
    Unconfigured,
    #[error("live video platform request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("live video platform rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("live video platform returned a malformed response: {0}")]
    Malformed(String),
}

/// Control-plane operations the session manager needs from the platform.
///
/// Timeouts are the implementation's concern and surface as ordinary errors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LiveStreamGateway: Send + Sync {
    /// Provisions a new remote stream.
    async fn create_live_stream(
        &self,
        playback_policy: PlaybackPolicy,
    ) -> Result<RemoteLiveStream, GatewayError>;

    /// Deletes a remote stream by its platform identifier.
    async fn delete_live_stream(&self, remote_id: &str) -> Result<(), GatewayError>;
}
