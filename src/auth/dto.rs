use serde::{Deserialize, Serialize};

use crate::users::dto::PublicUser;

/// Request body for password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for a password reset. The new password travels out-of-band,
/// never in the response.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
}

/// Response returned after login or signup: the public user plus the
/// plaintext remember token for the client to hold.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub remember_token: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn session_response_serialization() {
        let response = SessionResponse {
            remember_token: "tok".into(),
            user: PublicUser {
                id: Uuid::new_v4(),
                email: "test@example.com".into(),
                username: Some("xX_hagrid_Xx".into()),
            },
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("remember_token"));
    }
}
