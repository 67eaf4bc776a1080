//! Claim layout expected by the external editor.
//!
//! Field names and nesting are a compatibility contract with the editing
//! service, which validates the token with the same shared secret:
//!
//! ```json
//! {
//!   "document": { "url": "...", "permissions": { "view": true, "comment": true, "edit": true } },
//!   "permissions": 2,
//!   "iat": 1700000000,
//!   "exp": 1700003600
//! }
//! ```

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::grant::access_level::AccessLevel;
use crate::grant::error::{GrantError, GrantResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantClaims {
    pub document: DocumentClaim,
    /// Integer access level code.
    pub permissions: AccessLevel,
    /// Issued at, unix seconds.
    pub iat: i64,
    /// Expires at, unix seconds.
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentClaim {
    pub url: String,
    pub permissions: PermissionFlags,
}

/// Per-capability flags, derived from the access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionFlags {
    pub view: bool,
    pub comment: bool,
    pub edit: bool,
}

impl From<AccessLevel> for PermissionFlags {
    fn from(level: AccessLevel) -> Self {
        Self {
            view: true,
            comment: level.can_comment(),
            edit: level.can_edit(),
        }
    }
}

/// Decoded, immutable access grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessGrant {
    pub document_reference: String,
    pub access_level: AccessLevel,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn to_claims(&self) -> GrantClaims {
        GrantClaims {
            document: DocumentClaim {
                url: self.document_reference.clone(),
                permissions: self.access_level.into(),
            },
            permissions: self.access_level,
            iat: self.issued_at.timestamp(),
            exp: self.expires_at.timestamp(),
        }
    }

    pub fn validity_seconds(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }
}

impl TryFrom<GrantClaims> for AccessGrant {
    type Error = GrantError;

    fn try_from(claims: GrantClaims) -> GrantResult<Self> {
        if claims.document.url.trim().is_empty() {
            return Err(GrantError::Malformed("document.url is empty".to_string()));
        }
        if claims.document.permissions != PermissionFlags::from(claims.permissions) {
            return Err(GrantError::Malformed(format!(
                "document.permissions {:?} do not match access level '{}'",
                claims.document.permissions, claims.permissions
            )));
        }
        if claims.exp <= claims.iat {
            return Err(GrantError::Malformed(format!(
                "exp ({}) must be after iat ({})",
                claims.exp, claims.iat
            )));
        }
        Ok(Self {
            document_reference: claims.document.url,
            access_level: claims.permissions,
            issued_at: unix_to_datetime(claims.iat)?,
            expires_at: unix_to_datetime(claims.exp)?,
        })
    }
}

fn unix_to_datetime(ts: i64) -> GrantResult<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| GrantError::Malformed(format!("invalid timestamp {}", ts)))
}
