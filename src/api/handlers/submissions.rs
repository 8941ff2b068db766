use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    api::state::AppState,
    domain::Submission,
    error::{AppError, Result},
    repository::{SubmissionFilter, SubmissionKind},
    service::aggregation::semester_start,
    service::submission_service::{EvidenceUpload, NewSubmissionRequest},
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    member_id: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    /// Restrict to rows created since the start of the current semester.
    #[serde(default)]
    current_semester_only: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Submission>>> {
    let kind = match params.kind.as_deref() {
        None | Some("points") => SubmissionKind::Points,
        Some("attendance") => SubmissionKind::Attendance,
        Some("all") => SubmissionKind::All,
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unknown submission kind: {}",
                other
            )))
        }
    };

    let filter = SubmissionFilter {
        member_id: params.member_id,
        kind,
        since: params
            .current_semester_only
            .then(|| semester_start(Utc::now())),
    };

    let submissions = state.service_context.submission_repo.list(filter).await?;

    Ok(Json(submissions))
}

/// Member-facing submit flow. Multipart form: a `request` part carrying the
/// submission JSON and an optional `file` part with the evidence image.
pub async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Submission>>)> {
    let mut request: Option<NewSubmissionRequest> = None;
    let mut evidence: Option<EvidenceUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("request") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid request part: {}", e)))?;
                request = Some(
                    serde_json::from_str(&text)
                        .map_err(|e| AppError::BadRequest(format!("Malformed request JSON: {}", e)))?,
                );
            }
            Some("file") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid file part: {}", e)))?;
                if !bytes.is_empty() {
                    evidence = Some(EvidenceUpload {
                        bytes: bytes.to_vec(),
                        content_type,
                    });
                }
            }
            _ => {}
        }
    }

    let request =
        request.ok_or_else(|| AppError::BadRequest("Missing request part".to_string()))?;

    let rows = state
        .service_context
        .submission_service
        .create_submission(request, evidence)
        .await?;

    Ok((StatusCode::CREATED, Json(rows)))
}
