pub mod access_level;
pub mod claims;
pub mod error;
pub mod issuer;
