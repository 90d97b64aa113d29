//! Session authentication.
//!
//! - [`jwt`]: HS256 session tokens carrying the user id
//! - [`password`]: bcrypt hashing, run off the async executor
//! - [`service`]: register and sign-in on top of the repository

pub mod jwt;
pub mod password;
pub mod service;

pub use jwt::{Claims, JwtHandler};
pub use service::{AuthResponse, RegisterRequest, SignInRequest};
