use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{PointConfig, Submission, SubmissionStatus},
    error::{AppError, Result},
    invalidation::{InvalidationManager, InvalidationTag},
    repository::{EventRepository, SubmissionFilter, SubmissionKind, SubmissionRepository},
    storage::ObjectStorage,
};

/// Maximum evidence file size (15 MiB).
const MAX_UPLOAD_SIZE: usize = 15 * 1024 * 1024;

/// A member's claim to a point, as posted from the submit form. Extra
/// member ids let one upload credit everyone who attended together.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSubmissionRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[validate(length(min = 1))]
    pub member_id: String,
    #[validate(length(min = 1))]
    pub event_id: String,
    pub submission_type: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub additional_member_ids: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EvidenceUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

pub struct SubmissionService {
    event_repo: Arc<dyn EventRepository>,
    submission_repo: Arc<dyn SubmissionRepository>,
    config: PointConfig,
    storage: Arc<dyn ObjectStorage>,
    invalidation: Arc<InvalidationManager>,
}

impl SubmissionService {
    pub fn new(
        event_repo: Arc<dyn EventRepository>,
        submission_repo: Arc<dyn SubmissionRepository>,
        config: PointConfig,
        storage: Arc<dyn ObjectStorage>,
        invalidation: Arc<InvalidationManager>,
    ) -> Self {
        Self {
            event_repo,
            submission_repo,
            config,
            storage,
            invalidation,
        }
    }

    /// A code checks out when it matches the event's current verification
    /// code and the event's type is a configured category.
    pub async fn verify_code(&self, event_id: &str, code: &str) -> Result<bool> {
        let Some(event) = self.event_repo.find_by_id(event_id).await? else {
            return Ok(false);
        };

        Ok(event.verification_code.as_deref() == Some(code)
            && self.config.is_known(&event.event_type))
    }

    /// Create one submission row per participant. The evidence object is
    /// written before any row: a storage failure aborts the whole flow so a
    /// submission can never point at an upload that was not stored.
    pub async fn create_submission(
        &self,
        request: NewSubmissionRequest,
        evidence: Option<EvidenceUpload>,
    ) -> Result<Vec<Submission>> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let mut participants: Vec<String> = Vec::new();
        for id in std::iter::once(&request.member_id).chain(request.additional_member_ids.iter()) {
            let id = id.trim();
            if !id.is_empty() && !participants.iter().any(|p| p == id) {
                participants.push(id.to_string());
            }
        }
        if participants.is_empty() {
            return Err(AppError::BadRequest("No participants given".to_string()));
        }

        let event = self.event_repo.find_by_id(&request.event_id).await?;
        let code = request.code.as_deref().filter(|c| !c.is_empty());

        if code.is_some() && !event.as_ref().map(|e| e.has_qr_submission).unwrap_or(false) {
            return Err(AppError::BadRequest(
                "This event does not accept verification codes".to_string(),
            ));
        }
        if let Some(code) = code {
            if !self.verify_code(&request.event_id, code).await? {
                return Err(AppError::Validation("Invalid verification code".to_string()));
            }
        }
        if code.is_none() && evidence.is_none() {
            return Err(AppError::BadRequest(
                "A verification code or an evidence file is required".to_string(),
            ));
        }

        // Code-verified submissions are unique per (event, member). Photo
        // submissions have no duplicate check; they are moderated manually.
        if code.is_some() {
            let existing = self
                .submission_repo
                .list(SubmissionFilter {
                    kind: SubmissionKind::All,
                    ..Default::default()
                })
                .await?;
            if existing.iter().any(|s| {
                s.event_id == request.event_id
                    && s.status != SubmissionStatus::Cancelled
                    && participants.iter().any(|p| *p == s.member_id)
            }) {
                return Err(AppError::Conflict(
                    "Attendance for this event was already submitted".to_string(),
                ));
            }
        }

        let upload_link = match &evidence {
            Some(upload) => {
                if upload.bytes.len() > MAX_UPLOAD_SIZE {
                    return Err(AppError::Validation(format!(
                        "File size exceeds the {} MB limit",
                        MAX_UPLOAD_SIZE / (1024 * 1024)
                    )));
                }
                let key = format!(
                    "{}.{}",
                    Uuid::new_v4(),
                    extension_for_content_type(&upload.content_type)
                );
                self.storage
                    .put_object(&key, &upload.bytes, &upload.content_type)
                    .await?;
                Some(key)
            }
            None => None,
        };

        let now = Utc::now();
        let event_date = request
            .event_date
            .or_else(|| event.as_ref().and_then(|e| e.date))
            .unwrap_or(now);
        let status = if code.is_some() {
            SubmissionStatus::AutoApproved
        } else {
            SubmissionStatus::Pending
        };

        let rows: Vec<Submission> = participants
            .iter()
            .enumerate()
            .map(|(idx, member_id)| Submission {
                id: if idx == 0 {
                    request.id.unwrap_or_else(Uuid::new_v4)
                } else {
                    Uuid::new_v4()
                },
                member_id: member_id.clone(),
                event_id: request.event_id.clone(),
                submission_type: self.config.normalize_type(&request.submission_type),
                status,
                description: request.description.clone(),
                officer_notes: None,
                upload_link: upload_link.clone(),
                event_date: Some(event_date),
                created_at: now,
                updated_at: now,
            })
            .collect();

        self.submission_repo.insert_many(&rows).await?;

        self.invalidation
            .notify(&[InvalidationTag::Submissions])
            .await;

        Ok(rows)
    }
}

fn extension_for_content_type(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/heic" | "image/heif" => "heic",
        _ => "bin",
    }
}
