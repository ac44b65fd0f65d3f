//! Password reset by immediate credential replacement.
//!
//! There is no reset-link flow: a reset generates a brand-new random
//! password on the spot, which is then delivered out-of-band. Resetting
//! also rotates the remember-token digest so every previously issued
//! session token stops verifying.

use rand::distributions::{Alphanumeric, DistString};
use rand::rngs::OsRng;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{password, token};

const GENERATED_PASSWORD_LENGTH: usize = 24;

/// Generate a replacement password. Alphanumeric, well inside the
/// validator's 8..=50 window.
pub fn generate_password() -> String {
    Alphanumeric.sample_string(&mut OsRng, GENERATED_PASSWORD_LENGTH)
}

/// Replacement column values for a reset.
#[derive(Debug)]
pub struct ResetCredentials {
    pub password_hash: String,
    pub remember_token_digest: String,
}

/// Compute the stored credentials for a new password. The rotated remember
/// digest belongs to a fresh token whose plaintext is dropped here, so no
/// client holds a token that still verifies.
pub fn reset_credentials(new_password: &str) -> anyhow::Result<ResetCredentials> {
    Ok(ResetCredentials {
        password_hash: password::hash_password(new_password)?,
        remember_token_digest: token::digest(&token::generate_token()),
    })
}

/// Reset a resolved user's password. Returns the plaintext exactly once so
/// the caller can hand it to out-of-band delivery; it is never logged or
/// persisted. Resolving the user (and the NotFound for an unknown email) is
/// the caller's job.
pub async fn reset_password(db: &PgPool, user_id: Uuid) -> anyhow::Result<String> {
    let new_password = generate_password();
    let creds = reset_credentials(&new_password)?;
    sqlx::query(
        "UPDATE users SET password_hash = $1, remember_token_digest = $2 WHERE id = $3",
    )
    .bind(&creds.password_hash)
    .bind(&creds.remember_token_digest)
    .bind(user_id)
    .execute(db)
    .await?;
    info!(user_id = %user_id, "password reset");
    Ok(new_password)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::validator::{validate, UserDraft, ValidationContext};

    #[test]
    fn generated_passwords_are_distinct_and_valid() {
        let a = generate_password();
        let b = generate_password();
        assert_ne!(a, b);
        assert_eq!(a.chars().count(), GENERATED_PASSWORD_LENGTH);

        let draft = UserDraft {
            email: "mcgonagol@hogwarts.com",
            password: Some(&a),
            password_confirmation: Some(&a),
        };
        let ctx = ValidationContext {
            is_new: true,
            email_changed: false,
            email_taken: false,
        };
        assert!(validate(&draft, ctx).is_empty());
    }

    #[test]
    fn reset_changes_the_password_hash() {
        let old_hash = password::hash_password("stupify123").expect("hash");
        let new_password = generate_password();
        let creds = reset_credentials(&new_password).expect("reset credentials");

        assert_ne!(creds.password_hash, old_hash);
        assert!(password::verify_password(&new_password, &creds.password_hash));
        assert!(!password::verify_password("stupify123", &creds.password_hash));
    }

    #[test]
    fn reset_invalidates_a_previously_issued_token() {
        let issued = token::generate_token();
        let stored = token::digest(&issued);
        assert!(token::verify(Some(&stored), &issued));

        let creds = reset_credentials(&generate_password()).expect("reset credentials");
        assert!(!token::verify(Some(&creds.remember_token_digest), &issued));
    }
}
