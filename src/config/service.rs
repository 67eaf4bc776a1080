use serde::Deserialize;

use crate::config::issuer::{EditorSettings, IssuerConfig};
use crate::config::settings::SettingsConfig;

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub issuer: IssuerConfig,
    #[serde(default)]
    pub editor: EditorSettings,
}
