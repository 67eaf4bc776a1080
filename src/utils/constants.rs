//! Shared constants and invariants

pub const DEFAULT_CONFIG_PATH: &str = "doc-grant-agent.yaml";

pub const DEFAULT_VALIDITY_MINUTES: u64 = 60;
pub const DEFAULT_MAX_VALIDITY_MINUTES: u64 = 24 * 60;
/// one year
pub const MAX_VALIDITY_MINUTES_LIMIT: u64 = 365 * 24 * 60;

pub const DEFAULT_MIN_SECRET_BYTES: usize = 32;
pub const MIN_SECRET_BYTES_FLOOR: usize = 16;

pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
