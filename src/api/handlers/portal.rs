use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::{
    api::state::AppState,
    auth::Caller,
    domain::{OfficerEntry, SubmissionEntry},
    error::Result,
    repository::{SubmissionFilter, SubmissionKind},
    service::aggregation::{build_report, Report},
    service::reconciliation::{EventSnapshot, MemberSnapshot, ResetScope},
};

pub async fn save_members(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(snapshot): Json<MemberSnapshot>,
) -> Result<StatusCode> {
    state
        .service_context
        .reconciliation_service
        .reconcile_members(&caller, snapshot)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct OfficersPayload {
    pub officers: Vec<OfficerEntry>,
}

pub async fn save_officers(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<OfficersPayload>,
) -> Result<StatusCode> {
    state
        .service_context
        .reconciliation_service
        .reconcile_officers(&caller, payload.officers)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn save_events(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(snapshot): Json<EventSnapshot>,
) -> Result<StatusCode> {
    state
        .service_context
        .reconciliation_service
        .reconcile_events(&caller, snapshot)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SubmissionsPayload {
    pub submissions: Vec<SubmissionEntry>,
}

pub async fn save_submissions(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<SubmissionsPayload>,
) -> Result<StatusCode> {
    state
        .service_context
        .reconciliation_service
        .review_submissions(&caller, payload.submissions)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ResetPayload {
    pub scope: ResetScope,
}

pub async fn reset(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(payload): Json<ResetPayload>,
) -> Result<StatusCode> {
    state
        .service_context
        .reconciliation_service
        .reset(&caller, payload.scope)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// The printable portal report: per-event rollups, the attendance roll,
/// and roster-wide standings.
pub async fn report(State(state): State<AppState>) -> Result<Json<Report>> {
    let ctx = &state.service_context;

    let members = ctx.member_repo.list(false).await?;
    let events = ctx.event_repo.list().await?;
    let submissions = ctx
        .submission_repo
        .list(SubmissionFilter {
            kind: SubmissionKind::Points,
            ..Default::default()
        })
        .await?;
    let attendance = ctx
        .submission_repo
        .list(SubmissionFilter {
            kind: SubmissionKind::Attendance,
            ..Default::default()
        })
        .await?;

    Ok(Json(build_report(
        &members,
        &events,
        &submissions,
        &attendance,
        &ctx.point_config,
    )))
}
