use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::grant::error::GrantError;

/// Capability conferred by a grant. Higher code means more capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AccessLevel {
    ViewOnly = 0,
    Comment = 1,
    Edit = 2,
}

impl AccessLevel {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::ViewOnly => "view_only",
            AccessLevel::Comment => "comment",
            AccessLevel::Edit => "edit",
        }
    }

    pub fn can_comment(self) -> bool {
        self >= AccessLevel::Comment
    }

    pub fn can_edit(self) -> bool {
        self >= AccessLevel::Edit
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AccessLevel> for u8 {
    fn from(level: AccessLevel) -> Self {
        level.code()
    }
}

impl TryFrom<u8> for AccessLevel {
    type Error = GrantError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(AccessLevel::ViewOnly),
            1 => Ok(AccessLevel::Comment),
            2 => Ok(AccessLevel::Edit),
            other => Err(GrantError::InvalidInput(format!(
                "access level code {} is not recognized; allowed: 0 (view_only), 1 (comment), 2 (edit)",
                other
            ))),
        }
    }
}

impl FromStr for AccessLevel {
    type Err = GrantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "view_only" | "view" => Ok(AccessLevel::ViewOnly),
            "comment" => Ok(AccessLevel::Comment),
            "edit" => Ok(AccessLevel::Edit),
            other => Err(GrantError::InvalidInput(format!(
                "access level '{}' is not recognized; allowed: view_only, comment, edit",
                other
            ))),
        }
    }
}

/// Access level as it arrives from a client: either the integer code or the name.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawAccessLevel {
    Code(i64),
    Name(String),
}

impl TryFrom<RawAccessLevel> for AccessLevel {
    type Error = GrantError;

    fn try_from(raw: RawAccessLevel) -> Result<Self, Self::Error> {
        match raw {
            RawAccessLevel::Code(code) => u8::try_from(code)
                .map_err(|_| {
                    GrantError::InvalidInput(format!("access level code {} is not recognized", code))
                })
                .and_then(AccessLevel::try_from),
            RawAccessLevel::Name(name) => name.parse(),
        }
    }
}
