use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::config::issuer::EditorSettings;
use crate::editor::editor_config::{EditorConfig, EditorOverrides};
use crate::grant::access_level::{AccessLevel, RawAccessLevel};
use crate::grant::claims::AccessGrant;
use crate::grant::error::GrantError;
use crate::grant::issuer::{GrantIssuer, IssuedGrant};
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::server::server::AppState;

static VALID_MSG: &str = "valid";

#[derive(Clone)]
pub struct GrantState {
    issuer: Arc<GrantIssuer>,
    editor: Arc<EditorSettings>,
}

impl GrantState {
    pub fn new(issuer: Arc<GrantIssuer>, editor: EditorSettings) -> Self {
        Self {
            issuer,
            editor: Arc::new(editor),
        }
    }

    pub fn router(&self) -> Router<AppState> {
        Router::new()
            .route("/api/grants", post(issue_grant))
            .route("/api/grants/verify", post(verify_grant))
            .route("/api/editor-config", post(editor_config))
    }
}

#[derive(Debug, Deserialize)]
pub struct IssueGrantRequest {
    pub document: String,
    pub access_level: RawAccessLevel,
    #[serde(default)]
    pub validity_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct EditorConfigRequest {
    #[serde(flatten)]
    pub grant: IssueGrantRequest,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyGrantRequest {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct GrantView {
    pub document: String,
    pub access_level: &'static str,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<&AccessGrant> for GrantView {
    fn from(grant: &AccessGrant) -> Self {
        Self {
            document: grant.document_reference.clone(),
            access_level: grant.access_level.as_str(),
            issued_at: grant.issued_at,
            expires_at: grant.expires_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IssueGrantResponse {
    pub token: String,
    #[serde(flatten)]
    pub grant: GrantView,
}

/// Error body: `{"error": "<kind>", "message": "..."}`.
pub struct ApiError(GrantError);

impl From<GrantError> for ApiError {
    fn from(err: GrantError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            GrantError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GrantError::SigningError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GrantError::Expired | GrantError::InvalidSignature | GrantError::Malformed(_) => {
                StatusCode::UNAUTHORIZED
            }
        };
        // signing problems are operator-facing; keep details in the log
        let message = match &self.0 {
            GrantError::SigningError(_) => "grant could not be signed".to_string(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": self.0.kind(), "message": message }))).into_response()
    }
}

async fn issue_grant(
    State(state): State<AppState>,
    payload: Result<Json<IssueGrantRequest>, JsonRejection>,
) -> Result<Json<IssueGrantResponse>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return Err(issue_failed(invalid_body(rejection), None).await.into()),
    };
    let issued = issue(&state.grant_state.issuer, request).await?;
    Ok(Json(IssueGrantResponse {
        grant: GrantView::from(&issued.grant),
        token: issued.token,
    }))
}

async fn editor_config(
    State(state): State<AppState>,
    payload: Result<Json<EditorConfigRequest>, JsonRejection>,
) -> Result<Json<EditorConfig>, ApiError> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return Err(issue_failed(invalid_body(rejection), None).await.into()),
    };
    let overrides = EditorOverrides {
        title: request.title,
        key: request.key,
    };
    if let Err(e) = overrides.validate() {
        return Err(issue_failed(e, Some(&request.grant.document)).await.into());
    }
    let issued = issue(&state.grant_state.issuer, request.grant).await?;
    let config = EditorConfig::build(&issued, overrides, &state.grant_state.editor)?;
    Ok(Json(config))
}

async fn verify_grant(
    State(state): State<AppState>,
    payload: Result<Json<VerifyGrantRequest>, JsonRejection>,
) -> Result<Json<GrantView>, ApiError> {
    let metrics = get_metrics().await;
    let result = payload
        .map_err(invalid_body)
        .and_then(|Json(request)| state.grant_state.issuer.verify_grant(&request.token));
    match result {
        Ok(grant) => {
            metrics.grant_verifications.with_label_values(&[VALID_MSG]).inc();
            Ok(Json(GrantView::from(&grant)))
        }
        Err(e) => {
            metrics.grant_verifications.with_label_values(&[e.kind()]).inc();
            Err(e.into())
        }
    }
}

/// Missing fields, wrong JSON types and unreadable bodies are client input errors.
fn invalid_body(rejection: JsonRejection) -> GrantError {
    GrantError::InvalidInput(rejection.body_text())
}

async fn issue_failed(e: GrantError, document: Option<&str>) -> GrantError {
    get_metrics()
        .await
        .grant_issue_failures
        .with_label_values(&[e.kind()])
        .inc();
    warn!("grant issue failed for document='{}': {}", document.unwrap_or_default(), e);
    e
}

/// Shared by the grant and editor-config routes: convert raw request values,
/// sign, and record metrics.
async fn issue(issuer: &GrantIssuer, request: IssueGrantRequest) -> Result<IssuedGrant, GrantError> {
    let metrics = get_metrics().await;
    let start = get_instant();

    let result = AccessLevel::try_from(request.access_level).and_then(|access_level| {
        let validity = validity_from_seconds(request.validity_seconds)?;
        issuer.issue_grant(&request.document, access_level, validity)
    });
    metrics
        .grant_issue_duration
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(issued) => {
            metrics
                .grants_issued
                .with_label_values(&[issued.grant.access_level.as_str()])
                .inc();
            info!(
                "grant issued: document='{}', access_level={}, expires_at={}",
                issued.grant.document_reference, issued.grant.access_level, issued.grant.expires_at
            );
            Ok(issued)
        }
        Err(e) => Err(issue_failed(e, Some(&request.document)).await),
    }
}

fn validity_from_seconds(seconds: Option<i64>) -> Result<Option<Duration>, GrantError> {
    seconds
        .map(|s| {
            Duration::try_seconds(s).ok_or_else(|| {
                GrantError::InvalidInput(format!("validity_seconds {} is out of range", s))
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn signing_error_is_500_without_cause() {
        let response =
            ApiError(GrantError::SigningError("secret detail".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_of(response).await;
        assert_eq!(body["error"], "signing_error");
        assert!(!body.to_string().contains("secret detail"));
    }

    #[tokio::test]
    async fn error_kinds_map_to_statuses() {
        let cases = [
            (GrantError::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (GrantError::Expired, StatusCode::UNAUTHORIZED),
            (GrantError::InvalidSignature, StatusCode::UNAUTHORIZED),
            (GrantError::Malformed("x".into()), StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            let kind = err.kind();
            let response = ApiError(err).into_response();
            assert_eq!(response.status(), status);
            assert_eq!(body_of(response).await["error"], kind);
        }
    }
}
