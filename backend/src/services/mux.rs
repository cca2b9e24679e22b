//! Mux Video API adapter for [`LiveStreamGateway`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::MuxConfig;
use crate::models::live_stream::LiveStreamStatus;
use crate::services::gateway::{GatewayError, LiveStreamGateway, PlaybackPolicy, RemoteLiveStream};

const LIVE_STREAMS_PATH: &str = "/video/v1/live-streams";
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Clone)]
pub struct MuxClient {
    http: Client,
    base_url: String,
    token_id: String,
    token_secret: String,
}

impl MuxClient {
    pub fn new(config: &MuxConfig) -> Result<Self, GatewayError> {
        if config.token_id.trim().is_empty() || config.token_secret.trim().is_empty() {
            return Err(GatewayError::Unconfigured);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token_id: config.token_id.clone(),
            token_secret: config.token_secret.clone(),
        })
    }

    fn live_streams_url(&self) -> String {
        format!("{}{}", self.base_url, LIVE_STREAMS_PATH)
    }
}

#[derive(Debug, Serialize)]
struct CreateLiveStreamBody {
    playback_policy: Vec<PlaybackPolicy>,
    new_asset_settings: NewAssetSettings,
}

#[derive(Debug, Serialize)]
struct NewAssetSettings {
    playback_policy: Vec<PlaybackPolicy>,
}

#[derive(Debug, Deserialize)]
struct MuxEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct MuxLiveStream {
    id: String,
    stream_key: Option<String>,
    #[serde(default)]
    playback_ids: Vec<MuxPlaybackId>,
    status: Option<String>,
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MuxPlaybackId {
    id: String,
}

impl TryFrom<MuxLiveStream> for RemoteLiveStream {
    type Error = GatewayError;

    fn try_from(stream: MuxLiveStream) -> Result<Self, Self::Error> {
        if stream.id.trim().is_empty() {
            return Err(GatewayError::Malformed("live stream id is empty".into()));
        }
        let stream_key = stream
            .stream_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| GatewayError::Malformed("live stream has no stream key".into()))?;
        let playback_id = stream
            .playback_ids
            .into_iter()
            .map(|playback| playback.id)
            .find(|id| !id.is_empty())
            .ok_or_else(|| GatewayError::Malformed("live stream has no playback id".into()))?;
        // Mux may report states we do not track (e.g. "enabled"); those start idle.
        let status = stream
            .status
            .as_deref()
            .and_then(|raw| raw.parse::<LiveStreamStatus>().ok())
            .unwrap_or_default();

        Ok(RemoteLiveStream {
            remote_id: stream.id,
            stream_key,
            playback_id,
            status,
            remote_created_at: stream.created_at,
        })
    }
}

async fn rejected(response: reqwest::Response) -> GatewayError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_default()
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect();
    GatewayError::Rejected { status, body }
}

#[async_trait]
impl LiveStreamGateway for MuxClient {
    async fn create_live_stream(
        &self,
        playback_policy: PlaybackPolicy,
    ) -> Result<RemoteLiveStream, GatewayError> {
        let body = CreateLiveStreamBody {
            playback_policy: vec![playback_policy],
            new_asset_settings: NewAssetSettings {
                playback_policy: vec![playback_policy],
            },
        };

        let response = self
            .http
            .post(self.live_streams_url())
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(rejected(response).await);
        }

        let envelope: MuxEnvelope<MuxLiveStream> = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;
        let remote = RemoteLiveStream::try_from(envelope.data)?;
        tracing::debug!(remote_stream_id = %remote.remote_id, "Mux live stream provisioned");
        Ok(remote)
    }

    async fn delete_live_stream(&self, remote_id: &str) -> Result<(), GatewayError> {
        let response = self
            .http
            .delete(format!("{}/{}", self.live_streams_url(), remote_id))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            _ => Err(rejected(response).await),
        }
    }
}
