//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Centralizes partner signup and login business logic under the service
//! crate; the HTTP layer only maps errors and sets the session cookie.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::AuthService;
