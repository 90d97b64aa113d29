//! Registration and sign-in.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::JwtHandler;
use super::password::{hash_password, verify_password};
use crate::api::{NewUser, User};
use crate::db::repository::{ErrorContext, FullRepository, RepositoryError, RepositoryResult};
use crate::db::services::validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Body returned by register and sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub data: User,
    pub token: String,
    /// Token lifetime in seconds, used for the cookie `Max-Age`
    #[serde(skip)]
    pub expires_in: usize,
}

fn validate_credentials(email: &str, password: &str) -> RepositoryResult<()> {
    validate::email(email)?;
    validate::length("password", password, 8, 255)
}

fn issue(jwt: &JwtHandler, user: User, operation: &str) -> RepositoryResult<AuthResponse> {
    let (token, expires_in) = jwt.generate_token(user.id).map_err(|e| {
        RepositoryError::internal_with_context(e.to_string(), ErrorContext::new(operation))
    })?;
    Ok(AuthResponse {
        data: user,
        token,
        expires_in,
    })
}

/// Create an account and open a session for it.
pub async fn register<R: FullRepository + ?Sized>(
    repo: &R,
    jwt: &JwtHandler,
    request: RegisterRequest,
) -> RepositoryResult<AuthResponse> {
    validate_credentials(&request.email, &request.password)?;
    validate::length("name", &request.name, 0, 255)?;

    if repo.find_user_by_email(&request.email).await?.is_some() {
        return Err(RepositoryError::conflict_with_context(
            "Email already registered",
            ErrorContext::new("register").with_entity("user"),
        ));
    }

    let password_hash = hash_password(request.password).await?;
    let user = repo
        .create_user(NewUser {
            name: request.name,
            email: request.email,
            password_hash,
        })
        .await?;
    info!("Registered user {}", user.id);
    issue(jwt, user, "register")
}

/// Check credentials. Unknown e-mail and wrong password both give `Unauthorized`.
pub async fn sign_in<R: FullRepository + ?Sized>(
    repo: &R,
    jwt: &JwtHandler,
    request: SignInRequest,
) -> RepositoryResult<AuthResponse> {
    validate_credentials(&request.email, &request.password)?;

    let rejected = || {
        RepositoryError::unauthorized_with_context(
            "Invalid email or password",
            ErrorContext::new("sign_in").with_entity("user"),
        )
    };

    let user = match repo.find_user_by_email(&request.email).await? {
        Some(user) => user,
        None => {
            warn!("Sign-in for unknown email");
            return Err(rejected());
        }
    };
    if !verify_password(request.password, user.password_hash.clone()).await? {
        warn!("Failed sign-in for user {}", user.id);
        return Err(rejected());
    }

    info!("User {} signed in", user.id);
    issue(jwt, user, "sign_in")
}

/// The user behind a validated session.
pub async fn current_user<R: FullRepository + ?Sized>(
    repo: &R,
    user_id: Uuid,
) -> RepositoryResult<User> {
    repo.get_user(user_id).await.map_err(|e| match e {
        RepositoryError::NotFound { .. } => RepositoryError::unauthorized_with_context(
            "Session user no longer exists",
            ErrorContext::new("current_user").with_entity_id(user_id),
        ),
        other => other,
    })
}
