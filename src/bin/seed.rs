use std::sync::Arc;

use chrono::{Duration, Utc};
use clap::Parser;
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::seq::SliceRandom;
use rand::Rng;
use sqlx::sqlite::SqlitePoolOptions;
use uuid::Uuid;

use laurel::{
    auth::{Caller, DEV_OWNER_ID},
    domain::{
        EventEntry, MemberEntry, PointCategory, PointConfig, Role, Submission, SubmissionStatus,
    },
    service::reconciliation::{EventSnapshot, MemberSnapshot},
    service::ServiceContext,
    storage::FsObjectStorage,
};

/// Populate a development database with fake members, events, and
/// submissions, routed through the real reconciliation path.
#[derive(Parser)]
struct Args {
    #[arg(long, default_value = "sqlite:laurel.db")]
    database_url: String,

    #[arg(long, default_value_t = 24)]
    members: usize,

    #[arg(long, default_value_t = 8)]
    events: usize,

    #[arg(long, default_value_t = 48)]
    submissions: usize,
}

fn sample_point_config() -> PointConfig {
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
        PointCategory {
            id: "fundraising".to_string(),
            name: "Fundraising".to_string(),
            icon: "piggy-bank".to_string(),
            minimum_points: 3,
            color: Some("amber".to_string()),
        },
    ])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🌱 Seeding {}...", args.database_url);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&args.database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let storage = Arc::new(FsObjectStorage::new("uploads"));
    let ctx = ServiceContext::new(db_pool.clone(), sample_point_config(), 5, storage);
    let caller = Caller::new(DEV_OWNER_ID, Role::Owner, "owner@laurel.local");

    // Members, through the roster reconciliation path
    println!("👥 Creating {} members...", args.members);
    let member_entries: Vec<MemberEntry> = (0..args.members)
        .map(|_| MemberEntry {
            id: String::new(),
            first_name: FirstName().fake(),
            last_name: LastName().fake(),
            role: Some(Role::Member),
        })
        .collect();

    ctx.reconciliation_service
        .reconcile_members(
            &caller,
            MemberSnapshot {
                members: member_entries,
                point_boosts: Default::default(),
            },
        )
        .await?;

    // Events
    println!("📅 Creating {} events...", args.events);
    let categories = ["service", "social", "fundraising"];
    let venues = ["Student Union", "Rec Center", "Downtown", "Campus Green"];
    let mut rng = rand::thread_rng();

    let event_entries: Vec<EventEntry> = (0..args.events)
        .map(|i| EventEntry {
            id: format!("seed-{}", i),
            name: format!("{} Event {}", capitalize(categories[i % categories.len()]), i + 1),
            notes: None,
            location: Some(venues[i % venues.len()].to_string()),
            event_type: categories[i % categories.len()].to_string(),
            has_qr_submission: i % 2 == 0,
            needs_additional_info: false,
            verification_code: Some(laurel::domain::generate_verification_code()),
            date: Some(Utc::now() + Duration::days(rng.gen_range(-30..30))),
        })
        .collect();

    ctx.reconciliation_service
        .reconcile_events(
            &caller,
            EventSnapshot {
                events: event_entries,
                members: Vec::new(),
                submissions: Vec::new(),
            },
        )
        .await?;

    // Submissions: a spread of statuses, staggered so the review queue has
    // a meaningful oldest-first order.
    println!("📝 Creating {} submissions...", args.submissions);
    let members = ctx.member_repo.list(false).await?;
    let events = ctx.event_repo.list().await?;
    anyhow::ensure!(!members.is_empty() && !events.is_empty(), "nothing to reference");

    let statuses = [
        SubmissionStatus::Pending,
        SubmissionStatus::Pending,
        SubmissionStatus::Approved,
        SubmissionStatus::AutoApproved,
        SubmissionStatus::Rejected,
    ];

    let now = Utc::now();
    let rows: Vec<Submission> = (0..args.submissions)
        .map(|i| {
            let member = members.choose(&mut rng).unwrap();
            let event = events.choose(&mut rng).unwrap();
            let status = *statuses.choose(&mut rng).unwrap();
            Submission {
                id: Uuid::new_v4(),
                member_id: member.id.clone(),
                event_id: event.id.clone(),
                submission_type: event.event_type.clone(),
                status,
                description: Some(format!("Seeded claim for {}", event.name)),
                officer_notes: None,
                upload_link: None,
                event_date: event.date,
                created_at: now - Duration::minutes((args.submissions - i) as i64),
                updated_at: now,
            }
        })
        .collect();

    ctx.submission_repo.insert_many(&rows).await?;

    println!(
        "✅ Seeded {} members, {} events, {} submissions",
        members.len(),
        events.len(),
        rows.len()
    );

    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
