use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::SessionResponse,
        extractors::Principal,
        password, policy, token,
        validator::{validate, UserDraft, ValidationContext},
    },
    error::ApiError,
    state::AppState,
    users::{
        dto::{PublicUser, SignupRequest, UpdateUserRequest},
        repo::{is_unique_violation, User},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", get(show_user).put(update_user))
}

fn location_header(user_id: Uuid) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = format!("/api/users/{}", user_id).parse() {
        headers.insert(axum::http::header::LOCATION, value);
    }
    headers
}

/// Signup, or activation of an invited (pending) account. Creating a user
/// is the one mutation that requires no prior identity.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<(StatusCode, HeaderMap, Json<SessionResponse>), ApiError> {
    let email = payload.email.trim().to_lowercase();
    let existing = User::find_by_email(&state.db, &email).await?;

    match existing {
        Some(user) if user.pending => activate_invited(state, user, payload).await,
        existing => {
            let draft = UserDraft {
                email: &email,
                password: payload.password.as_deref(),
                password_confirmation: payload.password_confirmation.as_deref(),
            };
            let ctx = ValidationContext {
                is_new: true,
                email_changed: false,
                email_taken: existing.is_some(),
            };
            let errors = validate(&draft, ctx);
            if !errors.is_empty() {
                return Err(ApiError::Validation(errors));
            }

            // Validation guarantees the password is present here.
            let plain = payload.password.as_deref().unwrap_or_default();
            let hash = password::hash_password(plain)?;

            let user = User::create(&state.db, &email, payload.username.as_deref(), &hash)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        // Lost the signup race; same outward error as the
                        // advisory check.
                        warn!(email = %email, "unique index rejected signup");
                        ApiError::validation("email", "address is already registered.")
                    } else {
                        ApiError::Internal(e.into())
                    }
                })?;

            let remember_token = token::issue(&state.db, user.id).await?;
            info!(user_id = %user.id, "user created");
            Ok((
                StatusCode::CREATED,
                location_header(user.id),
                Json(SessionResponse {
                    remember_token,
                    user: PublicUser::from(user),
                }),
            ))
        }
    }
}

async fn activate_invited(
    state: AppState,
    user: User,
    payload: SignupRequest,
) -> Result<(StatusCode, HeaderMap, Json<SessionResponse>), ApiError> {
    let draft = UserDraft {
        email: &user.email,
        password: payload.password.as_deref(),
        password_confirmation: payload.password_confirmation.as_deref(),
    };
    // The record exists and keeps its email; only the supplied password is
    // validated. A missing password leaves the account pending, so require
    // one here the same way a new record would.
    let ctx = ValidationContext {
        is_new: true,
        email_changed: false,
        email_taken: false,
    };
    let errors = validate(&draft, ctx);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let plain = payload.password.as_deref().unwrap_or_default();
    let hash = password::hash_password(plain)?;
    let user = User::activate(&state.db, user.id, payload.username.as_deref(), &hash).await?;

    let remember_token = token::issue(&state.db, user.id).await?;
    info!(user_id = %user.id, "invited user activated");
    Ok((
        StatusCode::CREATED,
        location_header(user.id),
        Json(SessionResponse {
            remember_token,
            user: PublicUser::from(user),
        }),
    ))
}

#[instrument(skip(state, principal))]
pub async fn show_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, ApiError> {
    if !policy::user_access(principal.0.id, id).is_permitted() {
        return Err(ApiError::NotFound);
    }
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(PublicUser::from(user)))
}

#[instrument(skip(state, principal, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<(HeaderMap, Json<PublicUser>), ApiError> {
    if !policy::user_access(principal.0.id, id).is_permitted() {
        return Err(ApiError::NotFound);
    }
    let user = principal.0;

    let new_email = payload
        .email
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_else(|| user.email.clone());
    let email_changed = new_email != user.email;

    let email_taken = if email_changed {
        match User::find_by_email(&state.db, &new_email).await? {
            Some(other) => other.id != user.id,
            None => false,
        }
    } else {
        false
    };

    let draft = UserDraft {
        email: &new_email,
        password: payload.password.as_deref(),
        password_confirmation: payload.password_confirmation.as_deref(),
    };
    let ctx = ValidationContext {
        is_new: false,
        email_changed,
        email_taken,
    };
    let errors = validate(&draft, ctx);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let password_hash = match payload.password.as_deref().filter(|p| !p.is_empty()) {
        Some(plain) => Some(password::hash_password(plain)?),
        None => None,
    };

    let user = User::update(
        &state.db,
        user.id,
        &new_email,
        payload.username.as_deref(),
        password_hash.as_deref(),
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::validation("email", "address is already registered.")
        } else {
            ApiError::Internal(e.into())
        }
    })?;

    info!(user_id = %user.id, "user updated");
    Ok((location_header(user.id), Json(PublicUser::from(user))))
}
