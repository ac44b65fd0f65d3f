//! Remember tokens: opaque session credentials held by the client.
//!
//! Only the SHA-256 digest of a token is ever persisted, so a read-only
//! storage exposure is not enough to forge a session. A fast hash is the
//! right primitive here (unlike passwords) because tokens are 256 bits of
//! OS randomness, not guessable secrets.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

const TOKEN_BYTES: usize = 32;

/// Generate a fresh url-safe remember token from the OS RNG.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest a token for storage or lookup.
pub fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (byte_a, byte_b) in a.iter().zip(b.iter()) {
        result |= byte_a ^ byte_b;
    }
    result == 0
}

/// Check a presented token against the stored digest.
///
/// Returns `false` both when the user has no active token and when the
/// token is wrong; callers cannot tell the two apart. The comparison runs
/// in constant time over the digests.
pub fn verify(stored_digest: Option<&str>, presented: &str) -> bool {
    let Some(stored) = stored_digest else {
        return false;
    };
    constant_time_eq(digest(presented).as_bytes(), stored.as_bytes())
}

/// Issue a new remember token for the user, replacing any previous one.
/// Returns the plaintext for the client; only the digest is stored.
pub async fn issue(db: &PgPool, user_id: Uuid) -> anyhow::Result<String> {
    let token = generate_token();
    sqlx::query("UPDATE users SET remember_token_digest = $1 WHERE id = $2")
        .bind(digest(&token))
        .bind(user_id)
        .execute(db)
        .await?;
    debug!(user_id = %user_id, "remember token issued");
    Ok(token)
}

/// Clear the user's remember token. Idempotent.
pub async fn revoke(db: &PgPool, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("UPDATE users SET remember_token_digest = NULL WHERE id = $1")
        .bind(user_id)
        .execute(db)
        .await?;
    debug!(user_id = %user_id, "remember token revoked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        // 32 bytes -> 43 chars of unpadded base64url
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn verify_accepts_the_issued_token_only() {
        let token = generate_token();
        let stored = digest(&token);
        assert!(verify(Some(&stored), &token));
        assert!(!verify(Some(&stored), &generate_token()));
        assert!(!verify(Some(&stored), ""));
    }

    #[test]
    fn verify_is_false_without_a_stored_digest() {
        assert!(!verify(None, &generate_token()));
        assert!(!verify(None, ""));
    }

    #[test]
    fn replacing_the_digest_invalidates_the_old_token() {
        let old = generate_token();
        let new = generate_token();
        let stored = digest(&new);
        assert!(!verify(Some(&stored), &old));
        assert!(verify(Some(&stored), &new));
    }

    #[test]
    fn digest_is_deterministic_and_one_way() {
        let token = generate_token();
        assert_eq!(digest(&token), digest(&token));
        assert_ne!(digest(&token), token);
    }

    #[test]
    fn constant_time_eq_matches_equality() {
        assert!(constant_time_eq(b"hello", b"hello"));
        assert!(!constant_time_eq(b"hello", b"world"));
        assert!(!constant_time_eq(b"hello", b"hell"));
        assert!(!constant_time_eq(b"", b"a"));
        assert!(constant_time_eq(b"", b""));
    }
}
