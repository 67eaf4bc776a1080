//! Configuration object handed to the editor widget's constructor.
//!
//! The token is embedded verbatim; the editor re-validates it with the shared
//! secret before opening the document.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Serialize;

use crate::config::issuer::EditorSettings;
use crate::grant::access_level::AccessLevel;
use crate::grant::error::{GrantError, GrantResult};
use crate::grant::issuer::IssuedGrant;

const MAX_KEY_CHARS: usize = 128;
const MAX_KEY_PREFIX_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    pub document: EditorDocument,
    pub document_type: DocumentType,
    pub editor_config: EditorOptions,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorDocument {
    pub file_type: String,
    pub key: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Word,
    Cell,
    Slide,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    Edit,
    View,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EditorOptions {
    pub mode: EditorMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// Caller-provided overrides.
#[derive(Debug, Clone, Default)]
pub struct EditorOverrides {
    pub title: Option<String>,
    pub key: Option<String>,
}

impl EditorOverrides {
    /// The editor refuses document keys longer than 128 characters.
    pub fn validate(&self) -> GrantResult<()> {
        match &self.key {
            Some(key) if key.chars().count() > MAX_KEY_CHARS => Err(GrantError::InvalidInput(format!(
                "key is {} characters, at most {} allowed",
                key.chars().count(),
                MAX_KEY_CHARS
            ))),
            _ => Ok(()),
        }
    }
}

impl EditorConfig {
    pub fn build(
        issued: &IssuedGrant,
        overrides: EditorOverrides,
        settings: &EditorSettings,
    ) -> GrantResult<Self> {
        overrides.validate()?;

        let url = issued.grant.document_reference.clone();
        let file_name = last_segment(&url);
        let file_type = extension(file_name);

        let key = overrides
            .key
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| document_key(&url, issued.grant.issued_at.timestamp()));
        let title = overrides
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| file_name.to_string());

        Ok(Self {
            document_type: DocumentType::from_extension(&file_type),
            document: EditorDocument { file_type, key, title, url },
            editor_config: EditorOptions {
                mode: EditorMode::from(issued.grant.access_level),
                callback_url: settings.callback_url.clone(),
            },
            token: issued.token.clone(),
        })
    }
}

impl DocumentType {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "xls" | "xlsx" | "ods" | "csv" => DocumentType::Cell,
            "ppt" | "pptx" | "odp" => DocumentType::Slide,
            _ => DocumentType::Word,
        }
    }
}

impl From<AccessLevel> for EditorMode {
    // comment-only is carried by the token's permission flags
    fn from(level: AccessLevel) -> Self {
        match level {
            AccessLevel::ViewOnly => EditorMode::View,
            AccessLevel::Comment | AccessLevel::Edit => EditorMode::Edit,
        }
    }
}

fn last_segment(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or_default()
}

fn extension(file_name: &str) -> String {
    file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// `<base64url(url)>-<iat>`, bounded to fit the editor's 128-char key limit.
fn document_key(url: &str, issued_at: i64) -> String {
    let encoded = URL_SAFE_NO_PAD.encode(url.as_bytes());
    let start = encoded.len().saturating_sub(MAX_KEY_PREFIX_CHARS);
    format!("{}-{}", &encoded[start..], issued_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grant::claims::AccessGrant;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn issued(url: &str, level: AccessLevel) -> IssuedGrant {
        IssuedGrant {
            token: "h.p.s".to_string(),
            grant: AccessGrant {
                document_reference: url.to_string(),
                access_level: level,
                issued_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                expires_at: Utc.timestamp_opt(1_700_003_600, 0).unwrap(),
            },
        }
    }

    #[test]
    fn builds_editor_object_with_token_verbatim() {
        let settings = EditorSettings {
            callback_url: Some("https://app.example.com/cb".to_string()),
        };
        let cfg = EditorConfig::build(
            &issued("https://host/docs/Report.DOCX?v=3", AccessLevel::Edit),
            EditorOverrides { title: None, key: Some("k-1".into()) },
            &settings,
        )
        .unwrap();

        assert_eq!(
            serde_json::to_value(&cfg).unwrap(),
            json!({
                "document": {
                    "fileType": "docx",
                    "key": "k-1",
                    "title": "Report.DOCX",
                    "url": "https://host/docs/Report.DOCX?v=3"
                },
                "documentType": "word",
                "editorConfig": { "mode": "edit", "callbackUrl": "https://app.example.com/cb" },
                "token": "h.p.s"
            })
        );
    }

    #[test]
    fn view_only_spreadsheet_without_callback() {
        let cfg = EditorConfig::build(
            &issued("/files/budget.xlsx", AccessLevel::ViewOnly),
            EditorOverrides::default(),
            &EditorSettings::default(),
        )
        .unwrap();
        assert_eq!(cfg.document_type, DocumentType::Cell);
        assert_eq!(cfg.editor_config.mode, EditorMode::View);
        assert!(cfg.editor_config.callback_url.is_none());
        assert!(cfg.document.key.ends_with("-1700000000"));

        let value = serde_json::to_value(&cfg).unwrap();
        assert!(value["editorConfig"].get("callbackUrl").is_none());
    }

    #[test]
    fn generated_key_is_bounded() {
        let long_url = format!("https://host/{}.pptx", "a".repeat(500));
        let cfg = EditorConfig::build(
            &issued(&long_url, AccessLevel::Comment),
            EditorOverrides::default(),
            &EditorSettings::default(),
        )
        .unwrap();
        assert!(cfg.document.key.len() <= 128);
        assert_eq!(cfg.document_type, DocumentType::Slide);
        assert_eq!(cfg.editor_config.mode, EditorMode::Edit);
    }

    #[test]
    fn oversized_caller_key_is_rejected() {
        let too_long = EditorOverrides { title: None, key: Some("k".repeat(129)) };
        assert!(matches!(too_long.validate(), Err(GrantError::InvalidInput(_))));
        assert!(matches!(
            EditorConfig::build(
                &issued("/files/a.docx", AccessLevel::Edit),
                too_long,
                &EditorSettings::default(),
            ),
            Err(GrantError::InvalidInput(_))
        ));

        let at_limit = EditorOverrides { title: None, key: Some("k".repeat(128)) };
        let cfg = EditorConfig::build(
            &issued("/files/a.docx", AccessLevel::Edit),
            at_limit,
            &EditorSettings::default(),
        )
        .unwrap();
        assert_eq!(cfg.document.key.len(), 128);
    }
}
