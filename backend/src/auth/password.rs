//! bcrypt password hashing.
//!
//! bcrypt is CPU bound, so both operations run on the blocking pool.

use bcrypt::{hash, verify, DEFAULT_COST};
use log::warn;

use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

fn hashing_failed(operation: &str, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::internal_with_context(
        format!("Password hashing failed: {}", err),
        ErrorContext::new(operation),
    )
}

pub async fn hash_password(password: String) -> RepositoryResult<String> {
    tokio::task::spawn_blocking(move || hash(password, DEFAULT_COST))
        .await
        .map_err(|e| hashing_failed("hash_password", e))?
        .map_err(|e| hashing_failed("hash_password", e))
}

/// `false` for a wrong password and for a malformed stored hash.
pub async fn verify_password(password: String, password_hash: String) -> RepositoryResult<bool> {
    let outcome = tokio::task::spawn_blocking(move || verify(password, &password_hash))
        .await
        .map_err(|e| hashing_failed("verify_password", e))?;
    match outcome {
        Ok(valid) => Ok(valid),
        Err(e) => {
            warn!("Stored password hash could not be verified: {}", e);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hashed = hash_password("password123".into()).await.unwrap();
        assert_ne!(hashed, "password123");
        assert!(verify_password("password123".into(), hashed.clone()).await.unwrap());
        assert!(!verify_password("password124".into(), hashed).await.unwrap());
    }

    #[tokio::test]
    async fn test_malformed_hash_is_a_mismatch() {
        assert!(!verify_password("password123".into(), "hash".into()).await.unwrap());
    }
}
