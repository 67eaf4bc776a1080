use std::fmt;
use std::fs;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, error};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::config::issuer::{SecretConfig, SecretEncoding, SecretSource};
use crate::grant::error::{GrantError, GrantResult};

/// Symmetric key shared with the editing service.
///
/// Loaded once at start-up and kept read-only for the life of the process.
/// The bytes are wiped when the last owner drops it.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: Vec<u8>,
}

impl SharedSecret {
    pub fn from_bytes(bytes: Vec<u8>, min_bytes: usize) -> GrantResult<Self> {
        if bytes.is_empty() {
            return Err(GrantError::SigningError("shared secret is empty".to_string()));
        }
        if bytes.len() < min_bytes {
            return Err(GrantError::SigningError(format!(
                "shared secret is {} bytes, at least {} required",
                bytes.len(),
                min_bytes
            )));
        }
        Ok(Self { bytes })
    }

    /// Resolve the configured source and decode it.
    pub fn load(config: &SecretConfig, min_bytes: usize) -> GrantResult<Self> {
        let mut raw = match &config.source {
            SecretSource::Literal { value } => value.to_owned(),
            SecretSource::FromEnv { from_env } => std::env::var(from_env).map_err(|e| {
                error!("shared secret env '{}' unavailable: {}", from_env, e);
                GrantError::SigningError(format!("env '{}' unavailable: {}", from_env, e))
            })?,
            SecretSource::FromFile { path } => fs::read_to_string(path)
                .map(|content| content.trim().to_string())
                .map_err(|e| {
                    error!("shared secret file '{}' unreadable: {}", path, e);
                    GrantError::SigningError(format!("file '{}' unreadable: {}", path, e))
                })?,
        };

        let decoded = match config.encoding {
            SecretEncoding::Plain => Ok(raw.as_bytes().to_vec()),
            SecretEncoding::Base64 => STANDARD
                .decode(raw.trim())
                .map_err(|e| GrantError::SigningError(format!("secret is not valid base64: {}", e))),
        };
        raw.zeroize();

        let secret = Self::from_bytes(decoded?, min_bytes)?;
        debug!("shared secret loaded ({} bytes)", secret.len());
        Ok(secret)
    }

    pub fn expose(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSecret")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}
