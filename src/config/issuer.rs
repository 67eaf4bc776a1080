use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_MAX_VALIDITY_MINUTES, DEFAULT_MIN_SECRET_BYTES, DEFAULT_VALIDITY_MINUTES,
};

/// ================================
/// Grant issuer
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct IssuerConfig {
    #[serde(default)]
    pub algorithm: SigningAlgorithm,
    pub secret: SecretConfig,
    #[serde(default = "default_min_secret_bytes")]
    pub min_secret_bytes: usize,
    #[serde(default = "default_validity_minutes")]
    pub default_validity_minutes: u64,
    #[serde(default = "default_max_validity_minutes")]
    pub max_validity_minutes: u64,
    /// tolerance applied to `exp` when verifying
    #[serde(default)]
    pub leeway_seconds: u64,
}

/// Symmetric algorithms agreed upon with the editing service.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SigningAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl From<SigningAlgorithm> for jsonwebtoken::Algorithm {
    fn from(algorithm: SigningAlgorithm) -> Self {
        match algorithm {
            SigningAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            SigningAlgorithm::HS384 => jsonwebtoken::Algorithm::HS384,
            SigningAlgorithm::HS512 => jsonwebtoken::Algorithm::HS512,
        }
    }
}

/// Where the shared signing secret comes from and how it is encoded.
#[derive(Debug, Deserialize, Clone)]
pub struct SecretConfig {
    #[serde(flatten)]
    pub source: SecretSource,
    #[serde(default)]
    pub encoding: SecretEncoding,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum SecretSource {
    Literal { value: String },
    FromEnv { from_env: String },
    FromFile { path: String },
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SecretEncoding {
    #[default]
    Plain,
    Base64,
}

/// ================================
/// Editor configuration object
/// ================================
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EditorSettings {
    /// where the editor posts document status changes
    pub callback_url: Option<String>,
}

fn default_min_secret_bytes() -> usize {
    DEFAULT_MIN_SECRET_BYTES
}

fn default_validity_minutes() -> u64 {
    DEFAULT_VALIDITY_MINUTES
}

fn default_max_validity_minutes() -> u64 {
    DEFAULT_MAX_VALIDITY_MINUTES
}
