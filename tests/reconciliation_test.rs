use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use laurel::{
    auth::Caller,
    domain::{
        EventEntry, MemberEntry, OfficerEntry, PointCategory, PointConfig, Role, Submission,
        SubmissionEntry, SubmissionStatus, POINT_BOOST_EVENT_ID,
    },
    repository::{SubmissionFilter, SubmissionKind},
    service::reconciliation::{EventSnapshot, MemberSnapshot, ResetScope},
    service::ServiceContext,
    storage::FsObjectStorage,
};

fn test_config() -> PointConfig {
    PointConfig::from_categories(vec![
        PointCategory {
            id: "service".to_string(),
            name: "Service".to_string(),
            icon: "heart".to_string(),
            minimum_points: 5,
            color: Some("green".to_string()),
        },
        PointCategory {
            id: "social".to_string(),
            name: "Social".to_string(),
            icon: "users".to_string(),
            minimum_points: 2,
            color: Some("sky".to_string()),
        },
    ])
}

async fn context() -> anyhow::Result<ServiceContext> {
    // In-memory SQLite gives every connection its own database; the pool
    // must stay at a single connection.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let dir = std::env::temp_dir().join(format!("laurel-test-{}", Uuid::new_v4()));
    let storage = Arc::new(FsObjectStorage::new(dir));

    Ok(ServiceContext::new(pool, test_config(), 5, storage))
}

fn owner() -> Caller {
    Caller::new("owner", Role::Owner, "owner@example.edu")
}

fn staff() -> Caller {
    Caller::new("staff_advisor", Role::Staff, "advisor@example.edu")
}

fn officer() -> Caller {
    Caller::new("staff_vp", Role::Officer, "vp@example.edu")
}

fn member_entry(first: &str, last: &str) -> MemberEntry {
    MemberEntry {
        id: String::new(),
        first_name: first.to_string(),
        last_name: last.to_string(),
        role: Some(Role::Member),
    }
}

fn event_entry(name: &str, event_type: &str) -> EventEntry {
    EventEntry {
        id: "client-tmp".to_string(),
        name: name.to_string(),
        notes: None,
        location: None,
        event_type: event_type.to_string(),
        has_qr_submission: false,
        needs_additional_info: false,
        verification_code: None,
        date: None,
    }
}

fn stored_submission(member_id: &str, event_id: &str, status: SubmissionStatus) -> Submission {
    let now = Utc::now();
    Submission {
        id: Uuid::new_v4(),
        member_id: member_id.to_string(),
        event_id: event_id.to_string(),
        submission_type: "service".to_string(),
        status,
        description: None,
        officer_notes: None,
        upload_link: None,
        event_date: Some(now),
        created_at: now,
        updated_at: now,
    }
}

fn review_entry(id: Uuid, member_id: &str, event_id: &str, status: SubmissionStatus) -> SubmissionEntry {
    SubmissionEntry {
        id: id.to_string(),
        member_id: member_id.to_string(),
        event_id: event_id.to_string(),
        submission_type: "service".to_string(),
        status,
        description: None,
        officer_notes: None,
        upload_link: None,
        event_date: None,
    }
}

async fn all_submissions(ctx: &ServiceContext) -> anyhow::Result<Vec<Submission>> {
    Ok(ctx
        .submission_repo
        .list(SubmissionFilter {
            kind: SubmissionKind::All,
            ..Default::default()
        })
        .await?)
}

#[tokio::test]
async fn test_member_reconciliation_is_idempotent() -> anyhow::Result<()> {
    let ctx = context().await?;

    let snapshot = MemberSnapshot {
        members: vec![member_entry("Jane", "Doe"), member_entry("Rick", "Roe")],
        point_boosts: HashMap::new(),
    };

    ctx.reconciliation_service
        .reconcile_members(&owner(), snapshot.clone())
        .await?;
    let first: Vec<String> = ctx
        .member_repo
        .list(true)
        .await?
        .into_iter()
        .map(|m| m.id)
        .collect();

    ctx.reconciliation_service
        .reconcile_members(&owner(), snapshot)
        .await?;
    let second: Vec<String> = ctx
        .member_repo
        .list(true)
        .await?
        .into_iter()
        .map(|m| m.id)
        .collect();

    assert_eq!(first, vec!["doe.jane".to_string(), "roe.rick".to_string()]);
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_unchanged_name_keeps_id_and_submissions() -> anyhow::Result<()> {
    let ctx = context().await?;

    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![member_entry("Jane", "Doe")],
                point_boosts: HashMap::new(),
            },
        )
        .await?;

    let submission = stored_submission("doe.jane", "bake_sale", SubmissionStatus::Approved);
    ctx.submission_repo.insert_many(&[submission.clone()]).await?;

    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![member_entry("Jane", "Doe")],
                point_boosts: HashMap::new(),
            },
        )
        .await?;

    assert!(ctx.member_repo.find_by_id("doe.jane").await?.is_some());
    let stored = ctx.submission_repo.find_by_id(submission.id).await?.unwrap();
    assert_eq!(stored.member_id, "doe.jane");
    Ok(())
}

#[tokio::test]
async fn test_rename_remaps_submissions_to_new_id() -> anyhow::Result<()> {
    let ctx = context().await?;

    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![member_entry("John", "Doe")],
                point_boosts: HashMap::new(),
            },
        )
        .await?;

    let submission = stored_submission("doe.john", "bake_sale", SubmissionStatus::Pending);
    ctx.submission_repo.insert_many(&[submission.clone()]).await?;

    // The officer renames "Doe, John" to "Doe, Jon" in the event editor;
    // the snapshot still references the old client-held id.
    let snapshot = EventSnapshot {
        events: vec![event_entry("Bake Sale", "service")],
        members: vec![MemberEntry {
            id: "doe.john".to_string(),
            first_name: "Jon".to_string(),
            last_name: "Doe".to_string(),
            role: None,
        }],
        submissions: vec![review_entry(
            submission.id,
            "doe.john",
            "bake_sale",
            SubmissionStatus::Pending,
        )],
    };

    ctx.reconciliation_service
        .reconcile_events(&owner(), snapshot)
        .await?;

    assert!(ctx.member_repo.find_by_id("doe.jon").await?.is_some());
    let stored = ctx.submission_repo.find_by_id(submission.id).await?.unwrap();
    assert_eq!(stored.member_id, "doe.jon");

    // No submission may reference a nonexistent member afterwards.
    let member_ids: Vec<String> = ctx
        .member_repo
        .list(true)
        .await?
        .into_iter()
        .map(|m| m.id)
        .collect();
    for submission in all_submissions(&ctx).await? {
        assert!(member_ids.contains(&submission.member_id));
    }
    Ok(())
}

#[tokio::test]
async fn test_boost_request_clamps_to_maximum() -> anyhow::Result<()> {
    let ctx = context().await?;

    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![member_entry("Jane", "Doe")],
                point_boosts: HashMap::from([(
                    "doe.jane".to_string(),
                    HashMap::from([("service".to_string(), 10)]),
                )]),
            },
        )
        .await?;

    let boosts: Vec<Submission> = all_submissions(&ctx)
        .await?
        .into_iter()
        .filter(|s| s.event_id == POINT_BOOST_EVENT_ID)
        .collect();

    assert_eq!(boosts.len(), 5);
    assert!(boosts
        .iter()
        .all(|s| s.status == SubmissionStatus::AutoApproved && s.submission_type == "service"));
    assert!(boosts
        .iter()
        .all(|s| s.officer_notes.as_deref() == Some("<added by owner>")));
    Ok(())
}

#[tokio::test]
async fn test_lowering_boosts_deletes_oldest_first() -> anyhow::Result<()> {
    let ctx = context().await?;

    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![member_entry("Jane", "Doe")],
                point_boosts: HashMap::new(),
            },
        )
        .await?;

    // Four boosts with distinct ages.
    let now = Utc::now();
    let mut rows = Vec::new();
    for age in 0..4 {
        let mut row = stored_submission("doe.jane", POINT_BOOST_EVENT_ID, SubmissionStatus::AutoApproved);
        row.created_at = now - Duration::hours(4 - age);
        rows.push(row);
    }
    ctx.submission_repo.insert_many(&rows).await?;
    let newest: Vec<Uuid> = vec![rows[2].id, rows[3].id];

    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![member_entry("Jane", "Doe")],
                point_boosts: HashMap::from([(
                    "doe.jane".to_string(),
                    HashMap::from([("service".to_string(), 2)]),
                )]),
            },
        )
        .await?;

    let mut surviving: Vec<Uuid> = all_submissions(&ctx)
        .await?
        .into_iter()
        .filter(|s| s.event_id == POINT_BOOST_EVENT_ID)
        .map(|s| s.id)
        .collect();
    surviving.sort();
    let mut expected = newest;
    expected.sort();
    assert_eq!(surviving, expected);
    Ok(())
}

#[tokio::test]
async fn test_officer_cannot_redecide_a_decided_submission() -> anyhow::Result<()> {
    let ctx = context().await?;

    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![member_entry("Jane", "Doe")],
                point_boosts: HashMap::new(),
            },
        )
        .await?;

    let approved = stored_submission("doe.jane", "bake_sale", SubmissionStatus::Approved);
    ctx.submission_repo.insert_many(&[approved.clone()]).await?;

    // The officer tries to move it back to pending: silent per-row no-op.
    ctx.reconciliation_service
        .review_submissions(
            &officer(),
            vec![review_entry(
                approved.id,
                "doe.jane",
                "bake_sale",
                SubmissionStatus::Pending,
            )],
        )
        .await?;

    let stored = ctx.submission_repo.find_by_id(approved.id).await?.unwrap();
    assert_eq!(stored.status, SubmissionStatus::Approved);

    // Owner and staff can always re-decide.
    ctx.reconciliation_service
        .review_submissions(
            &staff(),
            vec![review_entry(
                approved.id,
                "doe.jane",
                "bake_sale",
                SubmissionStatus::Pending,
            )],
        )
        .await?;

    let stored = ctx.submission_repo.find_by_id(approved.id).await?.unwrap();
    assert_eq!(stored.status, SubmissionStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn test_approval_records_provenance_tag() -> anyhow::Result<()> {
    let ctx = context().await?;

    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![member_entry("Jane", "Doe")],
                point_boosts: HashMap::new(),
            },
        )
        .await?;

    let pending = stored_submission("doe.jane", "bake_sale", SubmissionStatus::Pending);
    ctx.submission_repo.insert_many(&[pending.clone()]).await?;

    ctx.reconciliation_service
        .review_submissions(
            &officer(),
            vec![review_entry(
                pending.id,
                "doe.jane",
                "bake_sale",
                SubmissionStatus::Approved,
            )],
        )
        .await?;

    let stored = ctx.submission_repo.find_by_id(pending.id).await?.unwrap();
    assert_eq!(stored.status, SubmissionStatus::Approved);
    assert_eq!(stored.officer_notes.as_deref(), Some("<approved by staff_vp>"));
    Ok(())
}

#[tokio::test]
async fn test_rejection_keeps_officer_reason() -> anyhow::Result<()> {
    let ctx = context().await?;

    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![member_entry("Jane", "Doe")],
                point_boosts: HashMap::new(),
            },
        )
        .await?;

    let pending = stored_submission("doe.jane", "bake_sale", SubmissionStatus::Pending);
    ctx.submission_repo.insert_many(&[pending.clone()]).await?;

    let mut entry = review_entry(pending.id, "doe.jane", "bake_sale", SubmissionStatus::Rejected);
    entry.officer_notes = Some("No evidence attached".to_string());

    ctx.reconciliation_service
        .review_submissions(&officer(), vec![entry])
        .await?;

    let stored = ctx.submission_repo.find_by_id(pending.id).await?.unwrap();
    assert_eq!(stored.status, SubmissionStatus::Rejected);
    assert_eq!(stored.officer_notes.as_deref(), Some("No evidence attached"));
    Ok(())
}

#[tokio::test]
async fn test_absent_members_are_deleted_unless_referenced_or_protected() -> anyhow::Result<()> {
    let ctx = context().await?;

    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![member_entry("Alice", "Doe"), member_entry("Bob", "Doe")],
                point_boosts: HashMap::new(),
            },
        )
        .await?;

    // Bob has a submission; a staff row exists outside the roster editor.
    let submission = stored_submission("doe.bob", "bake_sale", SubmissionStatus::Approved);
    ctx.submission_repo.insert_many(&[submission]).await?;

    let now = Utc::now().naive_utc();
    sqlx::query(
        "INSERT INTO members (id, first_name, last_name, role, role_name, email, created_at, updated_at) \
         VALUES ('staff_advisor', 'Ada', 'Advisor', 'staff', 'Staff', 'advisor@example.edu', ?, ?)",
    )
    .bind(now)
    .bind(now)
    .execute(&ctx.db_pool)
    .await?;

    // An empty snapshot: everything deletable goes away.
    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![],
                point_boosts: HashMap::new(),
            },
        )
        .await?;

    assert!(ctx.member_repo.find_by_id("doe.alice").await?.is_none());
    assert!(ctx.member_repo.find_by_id("doe.bob").await?.is_some());
    assert!(ctx.member_repo.find_by_id("staff_advisor").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_event_reconciliation_is_idempotent() -> anyhow::Result<()> {
    let ctx = context().await?;

    let snapshot = EventSnapshot {
        events: vec![
            event_entry("Bake Sale", "service"),
            event_entry("Game Night", "social"),
        ],
        members: vec![MemberEntry {
            id: String::new(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            role: None,
        }],
        submissions: vec![],
    };

    ctx.reconciliation_service
        .reconcile_events(&owner(), snapshot.clone())
        .await?;
    ctx.reconciliation_service
        .reconcile_events(&owner(), snapshot)
        .await?;

    let events = ctx.event_repo.list().await?;
    let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["bake_sale", "game_night"]);

    // Unknown category types normalize to "other" and survive deletion.
    ctx.reconciliation_service
        .reconcile_events(
            &owner(),
            EventSnapshot {
                events: vec![event_entry("Mystery Meetup", "interpretive-dance")],
                members: vec![],
                submissions: vec![],
            },
        )
        .await?;
    let mystery = ctx.event_repo.find_by_id("mystery_meetup").await?.unwrap();
    assert_eq!(mystery.event_type, "other");
    Ok(())
}

#[tokio::test]
async fn test_officer_snapshot_rejects_duplicate_emails() -> anyhow::Result<()> {
    let ctx = context().await?;

    let entries = vec![
        OfficerEntry {
            id: String::new(),
            first_name: "Val".to_string(),
            last_name: "President".to_string(),
            role_name: "Vice President".to_string(),
            email: "vp@example.edu".to_string(),
        },
        OfficerEntry {
            id: String::new(),
            first_name: "Treas".to_string(),
            last_name: "Urer".to_string(),
            role_name: "Treasurer".to_string(),
            email: "vp@example.edu".to_string(),
        },
    ];

    let result = ctx
        .reconciliation_service
        .reconcile_officers(&owner(), entries)
        .await;
    assert!(result.is_err());
    assert!(ctx.member_repo.list(true).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_officer_roster_derives_staff_ids_and_caps_escalation() -> anyhow::Result<()> {
    let ctx = context().await?;

    // Owner creates one officer.
    ctx.reconciliation_service
        .reconcile_officers(
            &owner(),
            vec![OfficerEntry {
                id: String::new(),
                first_name: "Val".to_string(),
                last_name: "President".to_string(),
                role_name: "Vice President".to_string(),
                email: "vp@example.edu".to_string(),
            }],
        )
        .await?;

    let vp = ctx.member_repo.find_by_id("staff_vp").await?.unwrap();
    assert_eq!(vp.role, Role::Officer);
    assert_eq!(vp.role_name, "Vice President");
    assert_eq!(vp.email.as_deref(), Some("vp@example.edu"));

    // An officer asking for Staff gets capped at Officer.
    ctx.reconciliation_service
        .reconcile_officers(
            &officer(),
            vec![
                OfficerEntry {
                    id: "staff_vp".to_string(),
                    first_name: "Val".to_string(),
                    last_name: "President".to_string(),
                    role_name: "Vice President".to_string(),
                    email: "vp@example.edu".to_string(),
                },
                OfficerEntry {
                    id: String::new(),
                    first_name: "New".to_string(),
                    last_name: "Advisor".to_string(),
                    role_name: "Staff".to_string(),
                    email: "new-advisor@example.edu".to_string(),
                },
            ],
        )
        .await?;

    let advisor = ctx.member_repo.find_by_id("staff_new-advisor").await?.unwrap();
    assert_eq!(advisor.role, Role::Officer);
    assert_eq!(advisor.role_name, "Officer");

    // The owner can grant staff for real.
    ctx.reconciliation_service
        .reconcile_officers(
            &owner(),
            vec![
                OfficerEntry {
                    id: "staff_vp".to_string(),
                    first_name: "Val".to_string(),
                    last_name: "President".to_string(),
                    role_name: "Vice President".to_string(),
                    email: "vp@example.edu".to_string(),
                },
                OfficerEntry {
                    id: "staff_new-advisor".to_string(),
                    first_name: "New".to_string(),
                    last_name: "Advisor".to_string(),
                    role_name: "Staff".to_string(),
                    email: "new-advisor@example.edu".to_string(),
                },
            ],
        )
        .await?;
    let advisor = ctx.member_repo.find_by_id("staff_new-advisor").await?.unwrap();
    assert_eq!(advisor.role, Role::Staff);
    Ok(())
}

#[tokio::test]
async fn test_dropped_officers_are_demoted_not_deleted() -> anyhow::Result<()> {
    let ctx = context().await?;

    ctx.reconciliation_service
        .reconcile_officers(
            &owner(),
            vec![OfficerEntry {
                id: String::new(),
                first_name: "Val".to_string(),
                last_name: "President".to_string(),
                role_name: "Vice President".to_string(),
                email: "vp@example.edu".to_string(),
            }],
        )
        .await?;

    ctx.reconciliation_service
        .reconcile_officers(&owner(), vec![])
        .await?;

    let vp = ctx.member_repo.find_by_id("staff_vp").await?.unwrap();
    assert_eq!(vp.role, Role::Member);
    assert_eq!(vp.role_name, "Member");
    assert_eq!(vp.email, None);
    Ok(())
}

#[tokio::test]
async fn test_save_fails_closed_below_officer_tier() -> anyhow::Result<()> {
    let ctx = context().await?;

    let plain = Caller::new("doe.jane", Role::Member, "jane@example.edu");
    let result = ctx
        .reconciliation_service
        .reconcile_members(
            &plain,
            MemberSnapshot {
                members: vec![member_entry("Eve", "Il")],
                point_boosts: HashMap::new(),
            },
        )
        .await;

    assert!(result.is_err());
    assert!(ctx.member_repo.list(true).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_reset_scopes() -> anyhow::Result<()> {
    let ctx = context().await?;

    ctx.reconciliation_service
        .reconcile_members(
            &owner(),
            MemberSnapshot {
                members: vec![member_entry("Jane", "Doe")],
                point_boosts: HashMap::new(),
            },
        )
        .await?;
    ctx.reconciliation_service
        .reconcile_events(
            &owner(),
            EventSnapshot {
                events: vec![event_entry("Bake Sale", "service")],
                members: vec![],
                submissions: vec![],
            },
        )
        .await?;
    ctx.submission_repo
        .insert_many(&[stored_submission("doe.jane", "bake_sale", SubmissionStatus::Pending)])
        .await?;

    // Officers cannot reset anything.
    assert!(ctx
        .reconciliation_service
        .reset(&officer(), ResetScope::Submissions)
        .await
        .is_err());
    assert_eq!(all_submissions(&ctx).await?.len(), 1);

    ctx.reconciliation_service
        .reset(&staff(), ResetScope::Submissions)
        .await?;
    assert!(all_submissions(&ctx).await?.is_empty());
    assert_eq!(ctx.event_repo.list().await?.len(), 1);
    assert_eq!(ctx.member_repo.list(true).await?.len(), 1);

    ctx.reconciliation_service
        .reset(&staff(), ResetScope::All)
        .await?;
    assert!(ctx.event_repo.list().await?.is_empty());
    assert!(ctx.member_repo.list(true).await?.is_empty());
    Ok(())
}
