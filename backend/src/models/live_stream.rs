//! Models for live streams mirrored between the local store and Mux.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::models::user::User;
use crate::types::{LiveStreamId, UserId};

/// Ingest state of a live stream, mirroring the platform's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveStreamStatus {
    /// Created but no encoder is publishing.
    #[default]
    Idle,
    /// The encoder is connected and media is being ingested.
    Active,
    /// The encoder dropped; the platform is waiting for a reconnect.
    Disconnected,
}

impl LiveStreamStatus {
    /// Returns the canonical snake_case representation stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            LiveStreamStatus::Idle => "idle",
            LiveStreamStatus::Active => "active",
            LiveStreamStatus::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for LiveStreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown live stream status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for LiveStreamStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Ok(LiveStreamStatus::Idle),
            "active" => Ok(LiveStreamStatus::Active),
            "disconnected" => Ok(LiveStreamStatus::Disconnected),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for LiveStreamStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
/// Database representation of a live stream.
pub struct LiveStream {
    /// Locally generated identifier.
    pub id: LiveStreamId,
    /// Identifier of the stream on the Mux side.
    pub remote_stream_id: String,
    /// Secret ingest credential. Only ever shown to the owner.
    pub stream_key: String,
    /// Public playback identifier.
    pub playback_id: String,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: LiveStreamStatus,
    /// Owner-controlled discovery flag, independent of `status`.
    pub is_active: bool,
    pub owner_id: UserId,
    /// Recorded asset produced once the platform finalizes the broadcast.
    pub asset_id: Option<String>,
    /// Creation timestamp reported by the platform, kept verbatim.
    pub remote_created_at: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LiveStream {
    /// Returns `true` when the stream belongs in the public "who is live" listing.
    pub fn is_publicly_live(&self) -> bool {
        self.is_active && self.status == LiveStreamStatus::Active
    }
}

/// Values required to persist a freshly provisioned stream.
#[derive(Debug, Clone)]
pub struct NewLiveStream {
    pub remote_stream_id: String,
    pub stream_key: String,
    pub playback_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: LiveStreamStatus,
    pub owner_id: UserId,
    pub remote_created_at: Option<String>,
}

impl NewLiveStream {
    /// Builds the stored record; new streams always start administratively enabled.
    pub fn into_live_stream(self, now: DateTime<Utc>) -> LiveStream {
        LiveStream {
            id: LiveStreamId::new(),
            remote_stream_id: self.remote_stream_id,
            stream_key: self.stream_key,
            playback_id: self.playback_id,
            title: self.title,
            description: self.description,
            status: self.status,
            is_active: true,
            owner_id: self.owner_id,
            asset_id: None,
            remote_created_at: self.remote_created_at,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
/// Payload for creating a live stream.
pub struct CreateLiveStreamRequest {
    #[validate(length(min = 3, max = 255))]
    pub title: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Owner details shown to the owner themself.
pub struct OwnerResponse {
    pub id: UserId,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Owner details safe to expose to anyone.
pub struct PublicOwnerResponse {
    pub id: UserId,
    pub name: String,
}

impl From<&User> for OwnerResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.display_name.clone(),
        }
    }
}

impl From<&User> for PublicOwnerResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.display_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
/// Full record returned to the stream owner, including ingest credentials.
pub struct LiveStreamResponse {
    pub id: LiveStreamId,
    pub remote_stream_id: String,
    pub stream_key: String,
    pub playback_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: LiveStreamStatus,
    pub is_active: bool,
    pub asset_id: Option<String>,
    pub owner: OwnerResponse,
    /// RTMPS ingest URL for OBS and similar encoders.
    pub stream_url: String,
    /// HLS playback URL.
    pub playback_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LiveStreamResponse {
    pub fn new(
        stream: LiveStream,
        owner: &User,
        stream_url: String,
        playback_url: String,
    ) -> Self {
        Self {
            id: stream.id,
            remote_stream_id: stream.remote_stream_id,
            stream_key: stream.stream_key,
            playback_id: stream.playback_id,
            title: stream.title,
            description: stream.description,
            status: stream.status,
            is_active: stream.is_active,
            asset_id: stream.asset_id,
            owner: OwnerResponse::from(owner),
            stream_url,
            playback_url,
            created_at: stream.created_at,
            updated_at: stream.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
/// Redacted record: no stream key, no remote identifier.
pub struct PublicLiveStreamResponse {
    pub id: LiveStreamId,
    pub playback_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: LiveStreamStatus,
    pub owner: PublicOwnerResponse,
    pub playback_url: String,
    pub created_at: DateTime<Utc>,
}

impl PublicLiveStreamResponse {
    pub fn new(stream: LiveStream, owner: &User, playback_url: String) -> Self {
        Self {
            id: stream.id,
            playback_id: stream.playback_id,
            title: stream.title,
            description: stream.description,
            status: stream.status,
            owner: PublicOwnerResponse::from(owner),
            playback_url,
            created_at: stream.created_at,
        }
    }
}
