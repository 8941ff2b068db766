use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::{
    api::state::AppState,
    domain::{Member, Role},
    error::Result,
    repository::{SubmissionFilter, SubmissionKind},
    service::aggregation::{member_standing, CategoryStanding},
};

#[derive(Debug, Serialize)]
pub struct MemberDto {
    id: String,
    first_name: String,
    last_name: String,
    role: Role,
    role_name: String,
}

impl From<Member> for MemberDto {
    fn from(member: Member) -> Self {
        Self {
            id: member.id,
            first_name: member.first_name,
            last_name: member.last_name,
            role: member.role,
            role_name: member.role_name,
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<MemberDto>>> {
    let members = state.service_context.member_repo.list(false).await?;

    Ok(Json(members.into_iter().map(Into::into).collect()))
}

/// Per-category totals and eligibility for one member, derived fresh from
/// the full submission list on every read.
pub async fn standings(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CategoryStanding>>> {
    let submissions = state
        .service_context
        .submission_repo
        .list(SubmissionFilter {
            kind: SubmissionKind::Points,
            ..Default::default()
        })
        .await?;

    let standings = member_standing(
        &submissions,
        Some(id.as_str()),
        &state.service_context.point_config,
    );

    Ok(Json(standings))
}
