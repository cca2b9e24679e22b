//! Live stream lifecycle manager.
//!
//! Keeps the local store and the remote platform consistent:
//! - creation provisions the remote stream first and persists nothing if that fails;
//! - deletion always removes the local row, even when the remote delete fails;
//! - caller activation moves the activation flag and status together, while
//!   platform notifications only ever touch status.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use validator::Validate;

use crate::config::{MuxConfig, DEFAULT_MUX_PLAYBACK_BASE_URL, DEFAULT_MUX_RTMP_BASE_URL};
use crate::error::validation_messages;
use crate::models::live_stream::{
    CreateLiveStreamRequest, LiveStream, LiveStreamResponse, LiveStreamStatus, NewLiveStream,
    PublicLiveStreamResponse,
};
use crate::models::user::User;
use crate::repositories::live_stream::LiveStreamRepository;
use crate::repositories::user::UserRepository;
use crate::services::gateway::{GatewayError, LiveStreamGateway, PlaybackPolicy};
use crate::types::{LiveStreamId, UserId};

#[derive(Debug, thiserror::Error)]
pub enum LiveStreamError {
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
    /// Covers both missing streams and streams owned by someone else.
    #[error("live stream not found")]
    NotFound,
    #[error("remote provisioning failed: {0}")]
    RemoteProvisioningFailed(#[source] GatewayError),
    #[error("data integrity violation: {0}")]
    DataIntegrity(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Derives ingest and playback URLs from the stored identifiers.
///
/// URLs are computed on every read so endpoint changes need no data migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamUrls {
    rtmp_base_url: String,
    playback_base_url: String,
}

impl StreamUrls {
    pub fn new(rtmp_base_url: impl Into<String>, playback_base_url: impl Into<String>) -> Self {
        Self {
            rtmp_base_url: rtmp_base_url.into().trim_end_matches('/').to_string(),
            playback_base_url: playback_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &MuxConfig) -> Self {
        Self::new(&config.rtmp_base_url, &config.playback_base_url)
    }

    /// RTMPS ingest URL for the given stream key.
    pub fn ingest_url(&self, stream_key: &str) -> String {
        format!("{}/{}", self.rtmp_base_url, stream_key)
    }

    /// HLS playback URL for the given playback id.
    pub fn playback_url(&self, playback_id: &str) -> String {
        format!("{}/{}.m3u8", self.playback_base_url, playback_id)
    }
}

impl Default for StreamUrls {
    fn default() -> Self {
        Self::new(DEFAULT_MUX_RTMP_BASE_URL, DEFAULT_MUX_PLAYBACK_BASE_URL)
    }
}

/// Ownership guard shared by every mutating operation.
///
/// A stream owned by someone else is reported exactly like a missing one.
pub fn authorize_owner(stream: LiveStream, caller: UserId) -> Result<LiveStream, LiveStreamError> {
    if stream.owner_id == caller {
        Ok(stream)
    } else {
        tracing::debug!(
            stream_id = %stream.id,
            caller_id = %caller,
            "Ownership check failed for live stream"
        );
        Err(LiveStreamError::NotFound)
    }
}

#[derive(Clone)]
pub struct LiveStreamService {
    streams: Arc<dyn LiveStreamRepository>,
    users: Arc<dyn UserRepository>,
    gateway: Arc<dyn LiveStreamGateway>,
    urls: StreamUrls,
}

impl LiveStreamService {
    pub fn new(
        streams: Arc<dyn LiveStreamRepository>,
        users: Arc<dyn UserRepository>,
        gateway: Arc<dyn LiveStreamGateway>,
        urls: StreamUrls,
    ) -> Self {
        Self {
            streams,
            users,
            gateway,
            urls,
        }
    }

    pub fn urls(&self) -> &StreamUrls {
        &self.urls
    }

    /// Provisions a remote stream, then persists the local record.
    pub async fn create(
        &self,
        request: CreateLiveStreamRequest,
        owner_id: UserId,
    ) -> Result<LiveStream, LiveStreamError> {
        request
            .validate()
            .map_err(|errors| LiveStreamError::Validation(validation_messages(&errors)))?;

        tracing::info!(owner_id = %owner_id, "Creating live stream");
        let remote = self
            .gateway
            .create_live_stream(PlaybackPolicy::Public)
            .await
            .map_err(|err| {
                tracing::warn!(owner_id = %owner_id, error = %err, "Remote live stream provisioning failed");
                LiveStreamError::RemoteProvisioningFailed(err)
            })?;

        let stream = NewLiveStream {
            remote_stream_id: remote.remote_id.clone(),
            stream_key: remote.stream_key,
            playback_id: remote.playback_id,
            title: request.title,
            description: request.description,
            status: remote.status,
            owner_id,
            remote_created_at: remote.remote_created_at,
        }
        .into_live_stream(Utc::now());

        match self.streams.insert(&stream).await {
            Ok(stored) => {
                tracing::info!(
                    stream_id = %stored.id,
                    remote_stream_id = %stored.remote_stream_id,
                    owner_id = %owner_id,
                    "Live stream created"
                );
                Ok(stored)
            }
            Err(err) => {
                // Nothing local references the remote stream, so take it down again.
                if let Err(cleanup) = self.gateway.delete_live_stream(&remote.remote_id).await {
                    tracing::warn!(
                        remote_stream_id = %remote.remote_id,
                        error = %cleanup,
                        "Failed to remove remote live stream after local insert failure"
                    );
                }
                Err(LiveStreamError::Store(err))
            }
        }
    }

    pub async fn get_by_id(&self, id: LiveStreamId) -> Result<LiveStream, LiveStreamError> {
        self.streams
            .find_by_id(id)
            .await?
            .ok_or(LiveStreamError::NotFound)
    }

    pub async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<LiveStream>, LiveStreamError> {
        Ok(self.streams.list_by_owner(owner_id).await?)
    }

    /// Streams that are ingesting and enabled; render with [`Self::render_public_many`].
    pub async fn list_active(&self) -> Result<Vec<LiveStream>, LiveStreamError> {
        Ok(self.streams.list_live().await?)
    }

    /// Removes the stream locally regardless of what the platform answers.
    pub async fn delete(&self, id: LiveStreamId, caller: UserId) -> Result<(), LiveStreamError> {
        let stream = self.find_owned(id, caller).await?;

        match self.gateway.delete_live_stream(&stream.remote_stream_id).await {
            Ok(()) => tracing::info!(
                stream_id = %id,
                remote_stream_id = %stream.remote_stream_id,
                "Deleted remote live stream"
            ),
            Err(err) => tracing::warn!(
                stream_id = %id,
                remote_stream_id = %stream.remote_stream_id,
                error = %err,
                "Failed to delete remote live stream; removing local record anyway"
            ),
        }

        if !self.streams.delete(id).await? {
            tracing::debug!(stream_id = %id, "Live stream was already removed");
        }
        Ok(())
    }

    /// Enables or disables discovery; status follows (`active` / `idle`).
    pub async fn set_activation(
        &self,
        id: LiveStreamId,
        caller: UserId,
        active: bool,
    ) -> Result<LiveStream, LiveStreamError> {
        let stream = self.find_owned(id, caller).await?;
        let status = if active {
            LiveStreamStatus::Active
        } else {
            LiveStreamStatus::Idle
        };

        let updated = self
            .streams
            .update_activation(stream.id, caller, active, status)
            .await?
            // Deleted between the guard and the update.
            .ok_or(LiveStreamError::NotFound)?;

        tracing::info!(stream_id = %id, is_active = active, status = %status, "Live stream activation changed");
        Ok(updated)
    }

    /// Applies a platform status notification. Unknown remote ids are ignored.
    pub async fn reconcile_remote_status(
        &self,
        remote_id: &str,
        status: LiveStreamStatus,
    ) -> Result<Option<LiveStream>, LiveStreamError> {
        let updated = self
            .streams
            .update_status_by_remote_id(remote_id, status)
            .await?;
        match &updated {
            Some(stream) => tracing::info!(
                stream_id = %stream.id,
                remote_stream_id = %remote_id,
                status = %status,
                "Reconciled live stream status"
            ),
            None => tracing::debug!(
                remote_stream_id = %remote_id,
                status = %status,
                "Ignoring status update for unknown live stream"
            ),
        }
        Ok(updated)
    }

    /// Links the finished recording to its stream. Unknown remote ids are ignored.
    pub async fn attach_recording(
        &self,
        remote_id: &str,
        asset_id: &str,
    ) -> Result<Option<LiveStream>, LiveStreamError> {
        let updated = self
            .streams
            .set_asset_by_remote_id(remote_id, asset_id)
            .await?;
        match &updated {
            Some(stream) => tracing::info!(
                stream_id = %stream.id,
                remote_stream_id = %remote_id,
                asset_id = %asset_id,
                "Attached recording to live stream"
            ),
            None => tracing::debug!(
                remote_stream_id = %remote_id,
                asset_id = %asset_id,
                "Ignoring recording for unknown live stream"
            ),
        }
        Ok(updated)
    }

    /// Owner-facing view including the stream key and ingest URL.
    pub async fn render_owned(
        &self,
        stream: LiveStream,
    ) -> Result<LiveStreamResponse, LiveStreamError> {
        let owner = self.owner_of(&stream).await?;
        let stream_url = self.urls.ingest_url(&stream.stream_key);
        let playback_url = self.urls.playback_url(&stream.playback_id);
        Ok(LiveStreamResponse::new(stream, &owner, stream_url, playback_url))
    }

    pub async fn render_owned_many(
        &self,
        streams: Vec<LiveStream>,
    ) -> Result<Vec<LiveStreamResponse>, LiveStreamError> {
        let owners = self.owners_of(&streams).await?;
        streams
            .into_iter()
            .map(|stream| {
                let owner = lookup_owner(&owners, &stream)?;
                let stream_url = self.urls.ingest_url(&stream.stream_key);
                let playback_url = self.urls.playback_url(&stream.playback_id);
                Ok(LiveStreamResponse::new(stream, owner, stream_url, playback_url))
            })
            .collect()
    }

    /// Public view without ingest credentials or remote identifiers.
    pub async fn render_public(
        &self,
        stream: LiveStream,
    ) -> Result<PublicLiveStreamResponse, LiveStreamError> {
        let owner = self.owner_of(&stream).await?;
        let playback_url = self.urls.playback_url(&stream.playback_id);
        Ok(PublicLiveStreamResponse::new(stream, &owner, playback_url))
    }

    pub async fn render_public_many(
        &self,
        streams: Vec<LiveStream>,
    ) -> Result<Vec<PublicLiveStreamResponse>, LiveStreamError> {
        let owners = self.owners_of(&streams).await?;
        streams
            .into_iter()
            .map(|stream| {
                let owner = lookup_owner(&owners, &stream)?;
                let playback_url = self.urls.playback_url(&stream.playback_id);
                Ok(PublicLiveStreamResponse::new(stream, owner, playback_url))
            })
            .collect()
    }

    async fn find_owned(
        &self,
        id: LiveStreamId,
        caller: UserId,
    ) -> Result<LiveStream, LiveStreamError> {
        let stream = self.get_by_id(id).await?;
        authorize_owner(stream, caller)
    }

    async fn owner_of(&self, stream: &LiveStream) -> Result<User, LiveStreamError> {
        match self.users.find_by_id(stream.owner_id).await? {
            Some(owner) => Ok(owner),
            None => Err(missing_owner(stream)),
        }
    }

    async fn owners_of(
        &self,
        streams: &[LiveStream],
    ) -> Result<HashMap<UserId, User>, LiveStreamError> {
        let mut ids: Vec<UserId> = streams.iter().map(|stream| stream.owner_id).collect();
        ids.sort();
        ids.dedup();
        let owners = self.users.find_by_ids(&ids).await?;
        Ok(owners.into_iter().map(|user| (user.id, user)).collect())
    }
}

fn lookup_owner<'a>(
    owners: &'a HashMap<UserId, User>,
    stream: &LiveStream,
) -> Result<&'a User, LiveStreamError> {
    owners
        .get(&stream.owner_id)
        .ok_or_else(|| missing_owner(stream))
}

fn missing_owner(stream: &LiveStream) -> LiveStreamError {
    tracing::error!(
        integrity_violation = true,
        stream_id = %stream.id,
        owner_id = %stream.owner_id,
        "Live stream owner is missing from the user directory"
    );
    LiveStreamError::DataIntegrity(format!(
        "owner {} of live stream {} does not exist",
        stream.owner_id, stream.id
    ))
}
