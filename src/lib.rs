//! # Document Grant Library
//!
//! Issues signed, time-bounded access grants for documents opened in an
//! external document-editing service, and builds the editor configuration
//! object that carries them.
//!
//! Modules:
//! - `config` — service configuration and validation
//! - `grant` — access levels, claim schema, issuer and verifier
//! - `secret` — the shared signing secret
//! - `editor` — editor configuration object
//! - `server` — HTTP routes

pub mod config;
pub mod editor;
pub mod grant;
pub mod helpers;
pub mod observability;
pub mod secret;
pub mod server;
pub mod utils;

#[cfg(test)]
pub mod tests;

pub use crate::config::service::ServiceConfig;
pub use crate::grant::access_level::AccessLevel;
pub use crate::grant::error::GrantError;
pub use crate::grant::issuer::{GrantIssuer, IssuedGrant};
