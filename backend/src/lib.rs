//! # Squad Backend
//!
//! REST backend for managing football teams: teams and their owners,
//! athletes and their careers, matches with per-athlete performances,
//! trainings with classes and attendance, and aggregate statistics.
//!
//! ## Architecture
//!
//! - [`api`]: domain types shared by the repository, services and HTTP layer
//! - [`auth`]: password hashing and session tokens
//! - [`db`]: repository pattern, persistence backends and the service layer
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! Two repository backends are available: an in-memory one (`local-repo`,
//! the default) and PostgreSQL through Diesel (`postgres-repo`).

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod api;
pub mod auth;
pub mod db;

#[cfg(feature = "http-server")]
pub mod http;
