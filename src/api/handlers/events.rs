use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{api::state::AppState, domain::Event, error::Result};

/// Event view for the member-facing app: everything except the
/// verification code, which only officers may see.
#[derive(Debug, Serialize)]
pub struct SafeEventDto {
    id: String,
    name: String,
    notes: Option<String>,
    location: Option<String>,
    event_type: String,
    has_qr_submission: bool,
    needs_additional_info: bool,
    date: Option<DateTime<Utc>>,
}

impl From<Event> for SafeEventDto {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            notes: event.notes,
            location: event.location,
            event_type: event.event_type,
            has_qr_submission: event.has_qr_submission,
            needs_additional_info: event.needs_additional_info,
            date: event.date,
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<SafeEventDto>>> {
    let events = state.service_context.event_repo.list().await?;

    Ok(Json(events.into_iter().map(Into::into).collect()))
}

/// Officer view, verification codes included.
pub async fn list_with_codes(State(state): State<AppState>) -> Result<Json<Vec<Event>>> {
    let events = state.service_context.event_repo.list().await?;

    Ok(Json(events))
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyCodeResponse {
    pub valid: bool,
}

pub async fn verify_code(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<VerifyCodeRequest>,
) -> Result<Json<VerifyCodeResponse>> {
    let valid = state
        .service_context
        .submission_service
        .verify_code(&id, &request.code)
        .await?;

    Ok(Json(VerifyCodeResponse { valid }))
}

pub async fn regenerate_code(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Event>> {
    let event = state
        .service_context
        .event_repo
        .regenerate_verification_code(&id)
        .await?;

    Ok(Json(event))
}
