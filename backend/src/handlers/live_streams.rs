use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppError,
    extract::ApiJson,
    models::{
        live_stream::{CreateLiveStreamRequest, LiveStreamResponse, PublicLiveStreamResponse},
        user::User,
    },
    state::AppState,
    types::LiveStreamId,
};

pub async fn create_live_stream(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    ApiJson(payload): ApiJson<CreateLiveStreamRequest>,
) -> Result<(StatusCode, Json<LiveStreamResponse>), AppError> {
    let stream = state.live_streams.create(payload, user.id).await?;
    let response = state.live_streams.render_owned(stream).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn list_my_live_streams(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<LiveStreamResponse>>, AppError> {
    let streams = state.live_streams.list_by_owner(user.id).await?;
    Ok(Json(state.live_streams.render_owned_many(streams).await?))
}

pub async fn list_active_live_streams(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicLiveStreamResponse>>, AppError> {
    let streams = state.live_streams.list_active().await?;
    Ok(Json(state.live_streams.render_public_many(streams).await?))
}

pub async fn get_live_stream(
    State(state): State<AppState>,
    Path(id): Path<LiveStreamId>,
) -> Result<Json<PublicLiveStreamResponse>, AppError> {
    let stream = state.live_streams.get_by_id(id).await?;
    Ok(Json(state.live_streams.render_public(stream).await?))
}

pub async fn delete_live_stream(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<LiveStreamId>,
) -> Result<StatusCode, AppError> {
    state.live_streams.delete(id, user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn activate_live_stream(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<LiveStreamId>,
) -> Result<Json<LiveStreamResponse>, AppError> {
    set_activation(state, user, id, true).await
}

pub async fn deactivate_live_stream(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<LiveStreamId>,
) -> Result<Json<LiveStreamResponse>, AppError> {
    set_activation(state, user, id, false).await
}

async fn set_activation(
    state: AppState,
    user: User,
    id: LiveStreamId,
    active: bool,
) -> Result<Json<LiveStreamResponse>, AppError> {
    let stream = state
        .live_streams
        .set_activation(id, user.id, active)
        .await?;
    Ok(Json(state.live_streams.render_owned(stream).await?))
}
