use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use chrono::Utc;

use crate::{
    error::AppError,
    services::webhook::{self, WebhookError, WebhookEvent, SIGNATURE_HEADER},
    state::AppState,
};

/// Receives Mux deliveries. Events for unknown streams are acknowledged.
pub async fn receive_mux_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    if let Some(secret) = state.webhook_secret() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());
        webhook::verify_signature(secret, signature, &body, Utc::now().timestamp())
            .map_err(|err| {
                tracing::warn!(error = %err, "Rejected webhook delivery");
                AppError::Unauthorized("Invalid webhook signature".into())
            })?;
    }

    let event = WebhookEvent::parse(&body).map_err(bad_payload)?;
    let action = event.action().map_err(bad_payload)?;
    tracing::debug!(event_type = %event.event_type, ?action, "Received webhook event");

    webhook::dispatch(&state.live_streams, action).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn bad_payload(err: WebhookError) -> AppError {
    AppError::BadRequest(err.to_string())
}
