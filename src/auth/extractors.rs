use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::token;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::User;

/// The authenticated user, resolved from the remember token presented in
/// the Authorization header.
///
/// Rejection is 404, not 401: resource endpoints must not reveal whether a
/// resource exists to unauthenticated callers. Handlers that need the 403
/// mapping (creation that requires identity) take `Option<Principal>`.
pub struct Principal(pub User);

#[async_trait]
impl FromRequestParts<AppState> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(ApiError::NotFound)?;

        let presented = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(ApiError::NotFound)?;

        let user = User::find_by_remember_digest(&state.db, &token::digest(presented))
            .await?
            .ok_or(ApiError::NotFound)?;

        // The digest lookup found a candidate; confirm with the
        // constant-time comparison before trusting it.
        if !token::verify(user.remember_token_digest.as_deref(), presented) {
            return Err(ApiError::NotFound);
        }

        Ok(Principal(user))
    }
}
