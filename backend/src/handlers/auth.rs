use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppError,
    extract::ApiJson,
    models::user::{AuthResponse, LoginRequest, RegisterRequest, User, UserResponse},
    state::AppState,
    utils::{
        jwt::create_access_token,
        password::{hash_password, verify_against_unknown_account, verify_password},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let password_hash = hash_password(&payload.password)?;
    let user = User::new(email, payload.display_name.trim().to_string(), password_hash);

    let user = state
        .users
        .create(&user)
        .await?
        .ok_or_else(|| AppError::Conflict("Email is already registered".into()))?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok((StatusCode::CREATED, Json(issue_token(&state, &user)?)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&payload.email);
    let Some(user) = state.users.find_by_email(&email).await? else {
        verify_against_unknown_account(&payload.password);
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    Ok(Json(issue_token(&state, &user)?))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

fn issue_token(state: &AppState, user: &User) -> Result<AuthResponse, AppError> {
    let hours = state.config.jwt_expiration_hours;
    let (access_token, _claims) = create_access_token(
        user.id.to_string(),
        user.email.clone(),
        &state.config.jwt_secret,
        hours,
    )?;
    Ok(AuthResponse {
        access_token,
        token_type: "Bearer".into(),
        expires_in: hours * 3600,
        user: UserResponse::from(user),
    })
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
