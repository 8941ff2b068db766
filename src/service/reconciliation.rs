//! Snapshot reconciliation: officers edit a client-held copy of the roster,
//! events, and submissions, then post the whole thing back. This service
//! diffs each snapshot against the store and applies inserts, updates, and
//! deletes transactionally. The snapshot is authoritative for what should
//! exist within the caller's permission scope; rows absent from it are
//! deleted unless protected.
//!
//! Concurrency: two officers reconciling overlapping snapshots race with
//! last-write-wins semantics at the row level. There are no optimistic
//! concurrency tokens; this is an accepted limitation of the snapshot model.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::{
    auth::Caller,
    domain::{
        event_slug_id, member_slug_id, staff_member_id, EventEntry, MemberEntry, OfficerEntry,
        PointConfig, Provenance, Role, Submission, SubmissionEntry, SubmissionStatus,
        POINT_BOOST_EVENT_ID,
    },
    error::{AppError, Result},
    invalidation::{InvalidationManager, InvalidationTag},
    repository::{MemberRepository, SubmissionFilter, SubmissionKind, SubmissionRepository},
    storage::ObjectStorage,
};

/// Full-replacement roster snapshot from the member editor, plus the
/// requested point-boost counts per member and category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub members: Vec<MemberEntry>,
    /// member id -> category id -> requested boost count
    #[serde(default)]
    pub point_boosts: HashMap<String, HashMap<String, i64>>,
}

/// Full-replacement snapshot from the bulk event editor. Submissions ride
/// along because adding a participant to an event creates both rows at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub events: Vec<EventEntry>,
    #[serde(default)]
    pub members: Vec<MemberEntry>,
    #[serde(default)]
    pub submissions: Vec<SubmissionEntry>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResetScope {
    /// Wipe submissions only.
    Submissions,
    /// Wipe submissions, events, and every member below staff.
    All,
}

pub struct ReconciliationService {
    pool: SqlitePool,
    member_repo: Arc<dyn MemberRepository>,
    submission_repo: Arc<dyn SubmissionRepository>,
    config: PointConfig,
    max_boost: i64,
    storage: Arc<dyn ObjectStorage>,
    invalidation: Arc<InvalidationManager>,
}

impl ReconciliationService {
    pub fn new(
        pool: SqlitePool,
        member_repo: Arc<dyn MemberRepository>,
        submission_repo: Arc<dyn SubmissionRepository>,
        config: PointConfig,
        max_boost: i64,
        storage: Arc<dyn ObjectStorage>,
        invalidation: Arc<InvalidationManager>,
    ) -> Self {
        Self {
            pool,
            member_repo,
            submission_repo,
            config,
            max_boost,
            storage,
            invalidation,
        }
    }

    fn require_reviewer(&self, caller: &Caller) -> Result<()> {
        if caller.role.is_reviewer() {
            Ok(())
        } else {
            tracing::warn!(caller = %caller.id, "Snapshot save rejected: not an officer");
            Err(AppError::Forbidden)
        }
    }

    fn require_super(&self, caller: &Caller) -> Result<()> {
        if caller.role.is_super() {
            Ok(())
        } else {
            tracing::warn!(caller = %caller.id, "Destructive operation rejected: not owner or staff");
            Err(AppError::Forbidden)
        }
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reconcile the member roster and point boosts. Member upserts/deletes
    /// commit first; boost rows go in a second transaction because they
    /// reference the members just written.
    pub async fn reconcile_members(&self, caller: &Caller, snapshot: MemberSnapshot) -> Result<()> {
        self.require_reviewer(caller)?;

        let existing = self
            .submission_repo
            .list(SubmissionFilter {
                kind: SubmissionKind::All,
                ..Default::default()
            })
            .await?;

        let mut tx = self.begin().await?;
        let now = Utc::now().naive_utc();

        // Keep-set: canonical ids recomputed from the snapshot. Rows absent
        // from it are deleted, except protected roles and members still
        // referenced by stored submissions.
        let mut keep: HashSet<String> = HashSet::new();
        for entry in &snapshot.members {
            if entry.first_name.is_empty() || entry.last_name.is_empty() {
                tracing::debug!("Skipping member entry with an empty name");
                continue;
            }
            keep.insert(member_slug_id(&entry.last_name, &entry.first_name));
        }

        delete_members_absent(&mut tx, &keep, "role NOT IN ('owner', 'staff')").await?;

        for entry in &snapshot.members {
            if entry.first_name.is_empty() || entry.last_name.is_empty() {
                continue;
            }
            let id = member_slug_id(&entry.last_name, &entry.first_name);

            // Only the member/participant toggle is writable from this
            // snapshot; any other role value is preserved server-side, as
            // are role_name and email.
            let (insert_role, insert_role_name, role_writable) = match entry.role {
                Some(Role::Participant) => (Role::Participant, "Participant", true),
                Some(Role::Member) => (Role::Member, "Member", true),
                _ => (Role::Member, "Member", false),
            };

            sqlx::query(
                r#"
                INSERT INTO members (id, first_name, last_name, role, role_name, email, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, '', ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    role = CASE
                        WHEN ? AND members.role IN ('member', 'participant') THEN excluded.role
                        ELSE members.role
                    END,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&id)
            .bind(entry.first_name.trim())
            .bind(entry.last_name.trim())
            .bind(insert_role.as_str())
            .bind(insert_role_name)
            .bind(now)
            .bind(now)
            .bind(role_writable)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.apply_point_boosts(caller, &snapshot.point_boosts, &existing)
            .await?;

        self.invalidation
            .notify(&[InvalidationTag::Members, InvalidationTag::Submissions])
            .await;

        Ok(())
    }

    /// Bring each (member, category) boost count to its requested value,
    /// clamped to [0, max]. Shortfalls become synthetic auto-approved rows
    /// against the sentinel event; excess rows are deleted oldest-first.
    async fn apply_point_boosts(
        &self,
        caller: &Caller,
        point_boosts: &HashMap<String, HashMap<String, i64>>,
        existing: &[Submission],
    ) -> Result<()> {
        if point_boosts.is_empty() {
            return Ok(());
        }

        let mut tx = self.begin().await?;
        let now = Utc::now();

        for (member_id, per_type) in point_boosts {
            for (requested_type, value) in per_type {
                let safe_type = self.config.normalize_type(requested_type);

                let mut current: Vec<&Submission> = existing
                    .iter()
                    .filter(|s| {
                        s.event_id == POINT_BOOST_EVENT_ID
                            && s.member_id == *member_id
                            && s.submission_type == safe_type
                    })
                    .collect();

                let target = (*value).clamp(0, self.max_boost) as usize;

                if current.len() < target {
                    for _ in current.len()..target {
                        sqlx::query(
                            r#"
                            INSERT INTO submissions (
                                id, member_id, event_id, submission_type, status, description,
                                officer_notes, upload_link, event_date, created_at, updated_at
                            ) VALUES (?, ?, ?, ?, 'auto-approved', '', ?, '', ?, ?, ?)
                            "#,
                        )
                        .bind(Uuid::new_v4().to_string())
                        .bind(member_id)
                        .bind(POINT_BOOST_EVENT_ID)
                        .bind(&safe_type)
                        .bind(Provenance::AddedBy(caller.id.clone()).tag())
                        .bind(now.naive_utc())
                        .bind(now.naive_utc())
                        .bind(now.naive_utc())
                        .execute(&mut *tx)
                        .await
                        .map_err(|e| AppError::Database(e.to_string()))?;
                    }
                } else if current.len() > target {
                    current.sort_by_key(|s| s.created_at);
                    for excess in current.iter().take(current.len() - target) {
                        sqlx::query("DELETE FROM submissions WHERE id = ?")
                            .bind(excess.id.to_string())
                            .execute(&mut *tx)
                            .await
                            .map_err(|e| AppError::Database(e.to_string()))?;
                    }
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Reconcile the officer roster. Unlike the other snapshots, duplicate
    /// derived ids or emails abort the whole save: officer rows carry login
    /// identity, and a half-applied roster is worse than a rejected one.
    pub async fn reconcile_officers(&self, caller: &Caller, entries: Vec<OfficerEntry>) -> Result<()> {
        self.require_reviewer(caller)?;

        let member_list = self.member_repo.list(true).await?;
        let is_super = caller.role.is_super();

        let mut ids_in_form: HashSet<String> = HashSet::new();
        let mut emails: HashSet<String> = HashSet::new();
        for entry in &entries {
            if entry.id.is_empty() && entry.email.is_empty() {
                continue;
            }
            let id = resolve_officer_id(entry, &member_list);
            if !ids_in_form.insert(id.clone()) {
                return Err(AppError::Validation(format!(
                    "Duplicate officer entry with id {}",
                    id
                )));
            }
            if !entry.email.is_empty() && !emails.insert(entry.email.clone()) {
                return Err(AppError::Validation(format!(
                    "Email {} is already used by another member",
                    entry.email
                )));
            }
        }

        let mut tx = self.begin().await?;
        let now = Utc::now().naive_utc();

        // Staff rows absent from the snapshot are removed, but only by
        // owner/staff callers, and never while submissions reference them.
        if is_super {
            delete_members_absent(&mut tx, &ids_in_form, "role = 'staff'").await?;
        }

        // Everyone else absent from the snapshot is demoted back to a plain
        // member with no login email. The caller's tier bounds who can be
        // touched: officers cannot demote staff or the owner.
        let demote_filter = if caller.role == Role::Owner {
            "role IN ('staff', 'officer')"
        } else {
            "role = 'officer'"
        };
        demote_members_absent(&mut tx, &ids_in_form, demote_filter, now).await?;

        for entry in &entries {
            if entry.role_name.is_empty() || (entry.id.is_empty() && entry.email.is_empty()) {
                tracing::debug!("Skipping incomplete officer entry");
                continue;
            }

            let id = resolve_officer_id(entry, &member_list);
            let existing = member_list.iter().find(|m| m.id == id);

            // Staff escalation is capped for non-super callers, and staff
            // rows are entirely read-only to them.
            let wants_staff = entry.role_name == "Staff";
            let (role, role_name) = if wants_staff && is_super {
                (Role::Staff, "Staff".to_string())
            } else if wants_staff {
                (Role::Officer, "Officer".to_string())
            } else {
                (Role::Officer, entry.role_name.clone())
            };

            match existing {
                Some(stored) => {
                    let cannot_edit = stored.role == Role::Staff && !is_super;
                    if cannot_edit {
                        tracing::debug!(member = %id, "Holding staff row against non-super edit");
                        continue;
                    }

                    sqlx::query(
                        r#"
                        UPDATE members
                        SET role = ?, role_name = ?, email = ?, updated_at = ?
                        WHERE id = ?
                        "#,
                    )
                    .bind(role.as_str())
                    .bind(&role_name)
                    .bind(&entry.email)
                    .bind(now)
                    .bind(&id)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO members (id, first_name, last_name, role, role_name, email, created_at, updated_at)
                        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                        ON CONFLICT(id) DO NOTHING
                        "#,
                    )
                    .bind(&id)
                    .bind(&entry.first_name)
                    .bind(&entry.last_name)
                    .bind(role.as_str())
                    .bind(&role_name)
                    .bind(&entry.email)
                    .bind(now)
                    .bind(now)
                    .execute(&mut *tx)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.invalidation.notify(&[InvalidationTag::Members]).await;

        Ok(())
    }

    /// Reconcile the bulk event editor's snapshot. Events and participants
    /// commit first, then submissions, because submissions reference both.
    /// The two transactions are independent failure domains: a submission
    /// failure leaves the already-committed event/member changes in place.
    pub async fn reconcile_events(&self, caller: &Caller, snapshot: EventSnapshot) -> Result<()> {
        self.require_reviewer(caller)?;

        let stored_submissions = self
            .submission_repo
            .list(SubmissionFilter {
                kind: SubmissionKind::Points,
                ..Default::default()
            })
            .await?;

        let mut tx = self.begin().await?;
        let now = Utc::now();

        let mut event_ids: HashSet<String> = HashSet::new();
        for entry in &snapshot.events {
            if entry.name.is_empty() {
                continue;
            }
            event_ids.insert(event_slug_id(&entry.name));
        }

        let mut member_keep: HashSet<String> = HashSet::new();
        for entry in &snapshot.members {
            if entry.first_name.is_empty() || entry.last_name.is_empty() {
                continue;
            }
            member_keep.insert(member_slug_id(&entry.last_name, &entry.first_name));
        }
        for submission in &stored_submissions {
            member_keep.insert(submission.member_id.clone());
        }

        let submission_keep: HashSet<String> = snapshot
            .submissions
            .iter()
            .filter_map(|s| s.parsed_id())
            .map(|id| id.to_string())
            .collect();

        // Participants dropped from the snapshot go away; configured-type
        // events and their submissions follow the same diff-by-absence rule.
        delete_members_absent(&mut tx, &member_keep, "role = 'participant'").await?;
        delete_events_absent(&mut tx, &event_ids, &self.config).await?;
        delete_submissions_absent(&mut tx, &submission_keep, &event_ids, &self.config).await?;

        // Canonical ids are recomputed from names; any snapshot submission
        // still holding the client-side id is remapped in memory before the
        // submission transaction runs.
        let mut submissions = snapshot.submissions.clone();
        for entry in &snapshot.members {
            if entry.first_name.is_empty() || entry.last_name.is_empty() {
                tracing::debug!("Skipping participant entry with an empty name");
                continue;
            }
            let id = member_slug_id(&entry.last_name, &entry.first_name);

            if !entry.id.is_empty() && entry.id != id {
                for submission in submissions.iter_mut() {
                    if submission.member_id == entry.id {
                        submission.member_id = id.clone();
                    }
                }
            }

            sqlx::query(
                r#"
                INSERT INTO members (id, first_name, last_name, role, role_name, email, created_at, updated_at)
                VALUES (?, ?, ?, 'participant', 'Participant', '', ?, ?)
                ON CONFLICT(id) DO NOTHING
                "#,
            )
            .bind(&id)
            .bind(entry.first_name.trim())
            .bind(entry.last_name.trim())
            .bind(now.naive_utc())
            .bind(now.naive_utc())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        for entry in &snapshot.events {
            if entry.id.is_empty() || entry.name.is_empty() {
                tracing::debug!("Skipping event entry with an empty id or name");
                continue;
            }
            let id = event_slug_id(&entry.name);
            let event_type = self.config.normalize_type(&entry.event_type);

            sqlx::query(
                r#"
                INSERT INTO events (
                    id, name, notes, location, event_type, has_qr_submission,
                    needs_additional_info, verification_code, date, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    notes = excluded.notes,
                    location = excluded.location,
                    event_type = excluded.event_type,
                    has_qr_submission = excluded.has_qr_submission,
                    needs_additional_info = excluded.needs_additional_info,
                    verification_code = excluded.verification_code,
                    date = excluded.date,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&id)
            .bind(entry.name.trim())
            .bind(&entry.notes)
            .bind(&entry.location)
            .bind(&event_type)
            .bind(entry.has_qr_submission as i32)
            .bind(entry.needs_additional_info as i32)
            .bind(&entry.verification_code)
            .bind(entry.date.map(|d| d.naive_utc()))
            .bind(now.naive_utc())
            .bind(now.naive_utc())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.upsert_submissions(caller, &submissions, &stored_submissions)
            .await?;

        self.invalidation
            .notify(&[
                InvalidationTag::Members,
                InvalidationTag::Events,
                InvalidationTag::Submissions,
            ])
            .await;

        Ok(())
    }

    async fn upsert_submissions(
        &self,
        caller: &Caller,
        entries: &[SubmissionEntry],
        stored_submissions: &[Submission],
    ) -> Result<()> {
        let mut tx = self.begin().await?;
        let now = Utc::now();

        for entry in entries {
            let Some(id) = entry.parsed_id() else {
                tracing::debug!("Skipping submission entry with a malformed id");
                continue;
            };
            let stored = stored_submissions.iter().find(|s| s.id == id);

            // Officer-tier callers cannot move a decided submission; the
            // stored status and notes win, silently, per row.
            let held = !caller.role.is_super()
                && stored.map(|s| s.status.is_decided()).unwrap_or(false);

            let status = if held {
                stored.map(|s| s.status).unwrap_or(entry.status)
            } else {
                entry.status
            };

            let officer_notes = if held {
                stored.and_then(|s| s.officer_notes.clone())
            } else if entry.status == SubmissionStatus::Approved
                && stored.map(|s| s.status != SubmissionStatus::Approved).unwrap_or(true)
            {
                Some(Provenance::ApprovedBy(caller.id.clone()).tag())
            } else {
                stored
                    .and_then(|s| s.officer_notes.clone())
                    .or_else(|| entry.officer_notes.clone())
            };

            sqlx::query(
                r#"
                INSERT INTO submissions (
                    id, member_id, event_id, submission_type, status, description,
                    officer_notes, upload_link, event_date, created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    member_id = excluded.member_id,
                    event_id = excluded.event_id,
                    submission_type = excluded.submission_type,
                    status = excluded.status,
                    description = excluded.description,
                    officer_notes = excluded.officer_notes,
                    event_date = excluded.event_date,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(id.to_string())
            .bind(&entry.member_id)
            .bind(&entry.event_id)
            .bind(&entry.submission_type)
            .bind(status.as_str())
            .bind(&entry.description)
            .bind(&officer_notes)
            .bind(entry.upload_link.as_deref().unwrap_or(""))
            .bind(entry.event_date.map(|d| d.naive_utc()))
            .bind(now.naive_utc())
            .bind(now.naive_utc())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Apply the review queue's accumulated decisions. Only existing rows
    /// are touched; a decided row's evidence object is purged after commit.
    pub async fn review_submissions(&self, caller: &Caller, entries: Vec<SubmissionEntry>) -> Result<()> {
        self.require_reviewer(caller)?;

        let stored_submissions = self
            .submission_repo
            .list(SubmissionFilter {
                kind: SubmissionKind::Points,
                ..Default::default()
            })
            .await?;

        let mut tx = self.begin().await?;
        let now = Utc::now().naive_utc();
        let mut purge: Vec<String> = Vec::new();

        for entry in &entries {
            let Some(id) = entry.parsed_id() else {
                tracing::debug!("Skipping review entry with a malformed id");
                continue;
            };
            let Some(stored) = stored_submissions.iter().find(|s| s.id == id) else {
                tracing::debug!(submission = %id, "Skipping review entry for an unknown submission");
                continue;
            };

            if !caller.role.is_super() && stored.status.is_decided() {
                // Already decided; this tier cannot re-decide it.
                continue;
            }

            let officer_notes = if entry.status == SubmissionStatus::Approved
                && stored.status != SubmissionStatus::Approved
            {
                Some(Provenance::ApprovedBy(caller.id.clone()).tag())
            } else {
                entry.officer_notes.clone()
            };

            // Evidence is only retained while a submission is pending.
            let clear_upload = entry.status != SubmissionStatus::Pending;

            sqlx::query(
                r#"
                UPDATE submissions
                SET status = ?, officer_notes = ?, description = ?,
                    upload_link = CASE WHEN ? THEN '' ELSE upload_link END,
                    updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(entry.status.as_str())
            .bind(&officer_notes)
            .bind(&entry.description)
            .bind(clear_upload)
            .bind(now)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

            if clear_upload {
                if let Some(key) = &stored.upload_link {
                    purge.push(key.clone());
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Object deletion happens outside the transaction; a failed purge
        // leaves an orphaned object, not an inconsistent store.
        for key in purge {
            if let Err(e) = self.storage.delete_object(&key).await {
                tracing::warn!(key = %key, "Failed to delete reviewed evidence: {}", e);
            }
        }

        self.invalidation
            .notify(&[InvalidationTag::Submissions])
            .await;

        Ok(())
    }

    /// Wipe submissions, or everything below the staff tier. Owner/staff only.
    pub async fn reset(&self, caller: &Caller, scope: ResetScope) -> Result<()> {
        self.require_super(caller)?;

        let mut tx = self.begin().await?;

        sqlx::query("DELETE FROM submissions")
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if scope == ResetScope::All {
            sqlx::query("DELETE FROM events")
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            sqlx::query("DELETE FROM members WHERE role NOT IN ('owner', 'staff')")
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(caller = %caller.id, ?scope, "Store reset");

        self.invalidation
            .notify(&[
                InvalidationTag::Members,
                InvalidationTag::Events,
                InvalidationTag::Submissions,
            ])
            .await;

        Ok(())
    }
}

fn resolve_officer_id(entry: &OfficerEntry, member_list: &[crate::domain::Member]) -> String {
    // Existing non-derived ids are honored so a roster member promoted to
    // officer keeps their slug id; everything else derives from the email.
    if !entry.id.is_empty()
        && !entry.id.starts_with("staff_")
        && member_list.iter().any(|m| m.id == entry.id)
    {
        entry.id.clone()
    } else {
        staff_member_id(&entry.email)
    }
}

fn sql_placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Delete members matching `role_filter` that are absent from `keep`,
/// skipping any member still referenced by a submission.
async fn delete_members_absent(
    tx: &mut Transaction<'_, Sqlite>,
    keep: &HashSet<String>,
    role_filter: &str,
) -> Result<()> {
    let mut query = format!(
        "DELETE FROM members WHERE {} \
         AND id NOT IN (SELECT DISTINCT member_id FROM submissions)",
        role_filter
    );
    if !keep.is_empty() {
        query.push_str(&format!(" AND id NOT IN ({})", sql_placeholders(keep.len())));
    }

    let mut q = sqlx::query(&query);
    for id in keep {
        q = q.bind(id);
    }
    let result = q
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

    if result.rows_affected() > 0 {
        tracing::debug!(count = result.rows_affected(), "Deleted members absent from snapshot");
    }
    Ok(())
}

async fn demote_members_absent(
    tx: &mut Transaction<'_, Sqlite>,
    keep: &HashSet<String>,
    role_filter: &str,
    now: chrono::NaiveDateTime,
) -> Result<()> {
    let mut query = format!(
        "UPDATE members SET role = 'member', role_name = 'Member', email = '', updated_at = ? WHERE {}",
        role_filter
    );
    if !keep.is_empty() {
        query.push_str(&format!(" AND id NOT IN ({})", sql_placeholders(keep.len())));
    }

    let mut q = sqlx::query(&query).bind(now);
    for id in keep {
        q = q.bind(id);
    }
    q.execute(&mut **tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(())
}

async fn delete_events_absent(
    tx: &mut Transaction<'_, Sqlite>,
    keep: &HashSet<String>,
    config: &PointConfig,
) -> Result<()> {
    let type_ids = config.ids();
    if type_ids.is_empty() {
        return Ok(());
    }

    let mut query = format!(
        "DELETE FROM events WHERE event_type IN ({})",
        sql_placeholders(type_ids.len())
    );
    if !keep.is_empty() {
        query.push_str(&format!(" AND id NOT IN ({})", sql_placeholders(keep.len())));
    }

    let mut q = sqlx::query(&query);
    for ty in &type_ids {
        q = q.bind(ty);
    }
    for id in keep {
        q = q.bind(id);
    }
    q.execute(&mut **tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(())
}

/// Submissions are only deleted out from under events present in the
/// snapshot: the editor is authoritative for the events it shows, nothing
/// else.
async fn delete_submissions_absent(
    tx: &mut Transaction<'_, Sqlite>,
    keep: &HashSet<String>,
    event_ids: &HashSet<String>,
    config: &PointConfig,
) -> Result<()> {
    let type_ids = config.ids();
    if type_ids.is_empty() || event_ids.is_empty() {
        return Ok(());
    }

    let mut query = format!(
        "DELETE FROM submissions WHERE submission_type IN ({}) AND event_id IN ({})",
        sql_placeholders(type_ids.len()),
        sql_placeholders(event_ids.len())
    );
    if !keep.is_empty() {
        query.push_str(&format!(" AND id NOT IN ({})", sql_placeholders(keep.len())));
    }

    let mut q = sqlx::query(&query);
    for ty in &type_ids {
        q = q.bind(ty);
    }
    for id in event_ids {
        q = q.bind(id);
    }
    for id in keep {
        q = q.bind(id);
    }
    q.execute(&mut **tx)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    Ok(())
}
