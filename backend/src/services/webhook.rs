//! Mux webhook ingestion: signature verification and event dispatch.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::models::live_stream::{LiveStream, LiveStreamStatus};
use crate::services::live_stream::{LiveStreamError, LiveStreamService};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "mux-signature";
/// Maximum age of a signed delivery, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: u64 = 300;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WebhookError {
    #[error("missing webhook signature")]
    MissingSignature,
    #[error("invalid webhook signature")]
    InvalidSignature,
    #[error("webhook signature timestamp outside tolerance")]
    StaleSignature,
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: EventData,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventData {
    pub id: Option<String>,
    pub live_stream_id: Option<String>,
}

/// What an event asks the session manager to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    Reconcile {
        remote_id: String,
        status: LiveStreamStatus,
    },
    AttachRecording {
        remote_id: String,
        asset_id: String,
    },
    Ignore,
}

impl WebhookEvent {
    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        serde_json::from_slice(body).map_err(|e| WebhookError::MalformedPayload(e.to_string()))
    }

    pub fn action(&self) -> Result<WebhookAction, WebhookError> {
        let status = match self.event_type.as_str() {
            "video.live_stream.idle" => LiveStreamStatus::Idle,
            "video.live_stream.active" => LiveStreamStatus::Active,
            "video.live_stream.disconnected" => LiveStreamStatus::Disconnected,
            "video.asset.live_stream_completed" => {
                return Ok(WebhookAction::AttachRecording {
                    remote_id: required(&self.data.live_stream_id, "data.live_stream_id")?,
                    asset_id: required(&self.data.id, "data.id")?,
                });
            }
            // connected/recording and everything else carry no status change.
            _ => return Ok(WebhookAction::Ignore),
        };
        Ok(WebhookAction::Reconcile {
            remote_id: required(&self.data.id, "data.id")?,
            status,
        })
    }
}

fn required(value: &Option<String>, field: &str) -> Result<String, WebhookError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| WebhookError::MalformedPayload(format!("{field} is required")))
}

/// Verifies a `t=<unix>,v1=<hex>` signature over `"<t>.<body>"`.
pub fn verify_signature(
    secret: &str,
    header: Option<&str>,
    body: &[u8],
    now: i64,
) -> Result<(), WebhookError> {
    let header = header.ok_or(WebhookError::MissingSignature)?;

    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => signatures.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(WebhookError::InvalidSignature)?;
    let issued_at: i64 = timestamp
        .parse()
        .map_err(|_| WebhookError::InvalidSignature)?;
    if now.abs_diff(issued_at) > SIGNATURE_TOLERANCE_SECS {
        return Err(WebhookError::StaleSignature);
    }

    let mac = signed_payload_mac(secret, timestamp, body)?;
    let matched = signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|expected| mac.clone().verify_slice(&expected).is_ok())
            .unwrap_or(false)
    });
    if matched {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

/// Builds a signature header value; used by tests and local tooling.
pub fn sign(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, WebhookError> {
    let mac = signed_payload_mac(secret, &timestamp.to_string(), body)?;
    Ok(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    ))
}

fn signed_payload_mac(
    secret: &str,
    timestamp: &str,
    body: &[u8],
) -> Result<HmacSha256, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

/// Applies an event to the session manager.
pub async fn dispatch(
    service: &LiveStreamService,
    action: WebhookAction,
) -> Result<Option<LiveStream>, LiveStreamError> {
    match action {
        WebhookAction::Reconcile { remote_id, status } => {
            service.reconcile_remote_status(&remote_id, status).await
        }
        WebhookAction::AttachRecording {
            remote_id,
            asset_id,
        } => service.attach_recording(&remote_id, &asset_id).await,
        WebhookAction::Ignore => Ok(None),
    }
}
