//! Shared building blocks for the outreach services: layered configuration,
//! the error taxonomy, request/response shapes, and the credential cache.

pub mod config;
pub mod credentials;
pub mod domain;
pub mod errors;

pub use credentials::CredentialCache;
pub use errors::{ApplicationError, InterfaceError};
