//! JWT token handler.

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::debug;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Claims of a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).context("Token subject is not a user id")
    }
}

pub struct JwtHandler {
    secret: String,
    expiration_hours: i64,
}

impl JwtHandler {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiration_hours: DEFAULT_EXPIRATION_HOURS,
        }
    }

    pub fn with_expiration_hours(mut self, hours: i64) -> Self {
        self.expiration_hours = hours;
        self
    }

    /// Build from `JWT_SECRET` and `JWT_EXPIRATION_HOURS`.
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }
        let hours = match std::env::var("JWT_EXPIRATION_HOURS") {
            Ok(value) => value
                .parse::<i64>()
                .context("JWT_EXPIRATION_HOURS must be an integer")?,
            Err(_) => DEFAULT_EXPIRATION_HOURS,
        };
        Ok(Self::new(secret).with_expiration_hours(hours))
    }

    /// Lifetime of issued tokens in seconds.
    pub fn expires_in(&self) -> usize {
        (self.expiration_hours * 3600).max(0) as usize
    }

    /// Issue a token for `user_id`. Returns the token and its lifetime in seconds.
    pub fn generate_token(&self, user_id: Uuid) -> Result<(String, usize)> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(chrono::Duration::hours(self.expiration_hours))
            .context("Invalid timestamp")?;

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expiration.timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        debug!(
            "Generating session token for user {}, expires in {}h",
            user_id, self.expiration_hours
        );

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate JWT")?;

        Ok((token, self.expires_in()))
    }

    /// Validate signature and expiry.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .context("Invalid or expired token")?;
        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let handler = JwtHandler::new("test-secret-key-12345");
        let user_id = Uuid::new_v4();

        let (token, expires_in) = handler.generate_token(user_id).unwrap();
        assert_eq!(expires_in, 24 * 3600);

        let claims = handler.validate_token(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_rejects_foreign_and_garbage_tokens() {
        let issuer = JwtHandler::new("secret-one");
        let verifier = JwtHandler::new("secret-two");
        let (token, _) = issuer.generate_token(Uuid::new_v4()).unwrap();

        assert!(verifier.validate_token(&token).is_err());
        assert!(verifier.validate_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        // Beyond the default 60s leeway.
        let handler = JwtHandler::new("secret").with_expiration_hours(-1);
        let (token, expires_in) = handler.generate_token(Uuid::new_v4()).unwrap();
        assert_eq!(expires_in, 0);
        assert!(handler.validate_token(&token).is_err());
    }
}
