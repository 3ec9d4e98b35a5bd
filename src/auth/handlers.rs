use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{instrument, warn};

use crate::{
    auth::dto::{AuthResponse, Credentials},
    error::{AuthError, AuthResult},
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Unreadable bodies (wrong content type, bad JSON, non-string fields) are
/// reported like missing fields.
fn credentials(payload: Result<Json<Credentials>, JsonRejection>) -> AuthResult<Credentials> {
    payload.map(|Json(creds)| creds).map_err(|rejection| {
        warn!(error = %rejection, "unreadable credentials body");
        AuthError::InvalidInput
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> AuthResult<(StatusCode, Json<AuthResponse>)> {
    let session = state.auth.register(credentials(payload)?).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse::new("User registered successfully", session)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> AuthResult<Json<AuthResponse>> {
    let session = state.auth.login(credentials(payload)?).await?;
    Ok(Json(AuthResponse::new("Login successful", session)))
}
