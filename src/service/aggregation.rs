//! Pure point-aggregation and eligibility computation. Nothing here touches
//! the store: every function is a fold over a submission slice, recomputed on
//! each read so displayed totals can never go stale relative to their inputs.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

use crate::domain::{
    Event, Member, PointConfig, Submission, SubmissionStatus, POINT_BOOST_EVENT_ID,
};

/// One member's progress in one point category.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryStanding {
    pub category_id: String,
    pub approved: usize,
    pub boosts: usize,
    pub pending: usize,
    pub total: usize,
    pub minimum_points: i64,
    pub eligible: bool,
}

/// Compute per-category standings for one member. `member_id` of `None`
/// means no member is selected (nothing matches, all counts zero).
pub fn member_standing(
    submissions: &[Submission],
    member_id: Option<&str>,
    config: &PointConfig,
) -> Vec<CategoryStanding> {
    config
        .categories()
        .iter()
        .map(|category| {
            let matches_member =
                |s: &Submission| member_id.map(|id| s.member_id == id).unwrap_or(false);

            let approved = submissions
                .iter()
                .filter(|s| {
                    matches_member(s)
                        && s.submission_type == category.id
                        && s.event_id != POINT_BOOST_EVENT_ID
                        && s.status.is_approved()
                })
                .count();

            let boosts = submissions
                .iter()
                .filter(|s| {
                    matches_member(s)
                        && s.submission_type == category.id
                        && s.event_id == POINT_BOOST_EVENT_ID
                })
                .count();

            let pending = submissions
                .iter()
                .filter(|s| {
                    matches_member(s)
                        && s.submission_type == category.id
                        && s.status == SubmissionStatus::Pending
                })
                .count();

            let total = approved + boosts;

            CategoryStanding {
                category_id: category.id.clone(),
                approved,
                boosts,
                pending,
                total,
                minimum_points: category.minimum_points,
                eligible: total as i64 >= category.minimum_points,
            }
        })
        .collect()
}

/// Submission counts partitioned by outcome. Cancelled rows count as
/// rejected here; they never count toward totals anywhere.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct StatusBuckets {
    pub approved: usize,
    pub pending: usize,
    pub rejected: usize,
}

pub fn status_buckets<'a>(submissions: impl Iterator<Item = &'a Submission>) -> StatusBuckets {
    let mut buckets = StatusBuckets::default();
    for submission in submissions {
        match submission.status {
            SubmissionStatus::Approved | SubmissionStatus::AutoApproved => buckets.approved += 1,
            SubmissionStatus::Pending => buckets.pending += 1,
            SubmissionStatus::Rejected | SubmissionStatus::Cancelled => buckets.rejected += 1,
        }
    }
    buckets
}

#[derive(Debug, Clone, Serialize)]
pub struct EventReport {
    pub event_id: String,
    pub name: String,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub event_type: String,
    pub counts: StatusBuckets,
    pub approved: Vec<ReportEntry>,
    pub pending: Vec<ReportEntry>,
    pub rejected: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub member_id: String,
    pub member_name: String,
    pub status: SubmissionStatus,
    /// Rejection reason, when one was recorded.
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReport {
    pub event_id: String,
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub attendees: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberReport {
    pub member_id: String,
    pub member_name: String,
    pub role_name: String,
    pub standings: Vec<CategoryStanding>,
}

/// The printable portal report: per-event outcome rollups, the attendance
/// roll, and every member's standings across the whole roster.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub totals: StatusBuckets,
    pub events: Vec<EventReport>,
    pub attendance: Vec<AttendanceReport>,
    pub members: Vec<MemberReport>,
}

pub fn build_report(
    members: &[Member],
    events: &[Event],
    submissions: &[Submission],
    attendance: &[Submission],
    config: &PointConfig,
) -> Report {
    let member_name = |id: &str| -> String {
        members
            .iter()
            .find(|m| m.id == id)
            .map(|m| format!("{}, {}", m.last_name, m.first_name))
            .unwrap_or_else(|| id.to_string())
    };

    let entry = |s: &Submission| ReportEntry {
        member_id: s.member_id.clone(),
        member_name: member_name(&s.member_id),
        status: s.status,
        reason: match s.status {
            SubmissionStatus::Rejected | SubmissionStatus::Cancelled => s
                .officer_notes
                .clone()
                .or_else(|| s.description.clone())
                .filter(|r| !r.is_empty()),
            _ => None,
        },
    };

    let event_reports = events
        .iter()
        .filter(|e| e.event_type != crate::domain::ATTENDANCE_TYPE)
        .map(|event| {
            let rows: Vec<&Submission> = submissions
                .iter()
                .filter(|s| s.event_id == event.id)
                .collect();

            EventReport {
                event_id: event.id.clone(),
                name: event.name.clone(),
                date: event.date,
                location: event.location.clone(),
                event_type: event.event_type.clone(),
                counts: status_buckets(rows.iter().copied()),
                approved: rows
                    .iter()
                    .copied()
                    .filter(|s| s.status.is_approved())
                    .map(&entry)
                    .collect(),
                pending: rows
                    .iter()
                    .copied()
                    .filter(|s| s.status == SubmissionStatus::Pending)
                    .map(&entry)
                    .collect(),
                rejected: rows
                    .iter()
                    .copied()
                    .filter(|s| {
                        matches!(
                            s.status,
                            SubmissionStatus::Rejected | SubmissionStatus::Cancelled
                        )
                    })
                    .map(&entry)
                    .collect(),
            }
        })
        .collect();

    let mut attendance_events: Vec<&Event> = events
        .iter()
        .filter(|e| e.event_type == crate::domain::ATTENDANCE_TYPE)
        .collect();
    attendance_events.sort_by_key(|e| e.date);

    let attendance_reports = attendance_events
        .iter()
        .map(|event| AttendanceReport {
            event_id: event.id.clone(),
            date: event.date,
            location: event.location.clone(),
            attendees: attendance
                .iter()
                .filter(|s| s.event_id == event.id && s.status.is_approved())
                .map(&entry)
                .collect(),
        })
        .collect();

    let member_reports = members
        .iter()
        .map(|member| MemberReport {
            member_id: member.id.clone(),
            member_name: format!("{}, {}", member.last_name, member.first_name),
            role_name: member.role_name.clone(),
            standings: member_standing(submissions, Some(&member.id), config),
        })
        .collect();

    Report {
        totals: status_buckets(submissions.iter()),
        events: event_reports,
        attendance: attendance_reports,
        members: member_reports,
    }
}

/// Start of the semester containing `now`: fall runs August through
/// December, spring January through May, summer June and July.
pub fn semester_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let year = now.year();
    let month = now.month();

    let start_month = if month >= 8 {
        8
    } else if month <= 5 {
        1
    } else {
        6
    };

    Utc.with_ymd_and_hms(year, start_month, 1, 0, 0, 0)
        .single()
        .expect("first of month is always a valid timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PointCategory;
    use uuid::Uuid;

    fn config() -> PointConfig {
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

    fn submission(
        member_id: &str,
        event_id: &str,
        submission_type: &str,
        status: SubmissionStatus,
    ) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            member_id: member_id.to_string(),
            event_id: event_id.to_string(),
            submission_type: submission_type.to_string(),
            status,
            description: None,
            officer_notes: None,
            upload_link: None,
            event_date: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_three_approved_plus_one_boost_is_not_eligible_at_minimum_five() {
        let mut submissions = vec![
            submission("doe.jane", "drive_a", "service", SubmissionStatus::Approved),
            submission("doe.jane", "drive_b", "service", SubmissionStatus::Approved),
            submission("doe.jane", "drive_c", "service", SubmissionStatus::AutoApproved),
            submission("doe.jane", POINT_BOOST_EVENT_ID, "service", SubmissionStatus::AutoApproved),
        ];

        let standings = member_standing(&submissions, Some("doe.jane"), &config());
        let service = &standings[0];
        assert_eq!(service.approved, 3);
        assert_eq!(service.boosts, 1);
        assert_eq!(service.total, 4);
        assert!(!service.eligible);

        // One more approved service submission tips the member over.
        submissions.push(submission("doe.jane", "drive_d", "service", SubmissionStatus::Approved));
        let standings = member_standing(&submissions, Some("doe.jane"), &config());
        assert_eq!(standings[0].total, 5);
        assert!(standings[0].eligible);
    }

    #[test]
    fn test_rejected_pending_and_other_members_do_not_count() {
        let submissions = vec![
            submission("doe.jane", "drive_a", "service", SubmissionStatus::Approved),
            submission("doe.jane", "drive_b", "service", SubmissionStatus::Rejected),
            submission("doe.jane", "drive_c", "service", SubmissionStatus::Cancelled),
            submission("doe.jane", "drive_d", "service", SubmissionStatus::Pending),
            submission("roe.rick", "drive_e", "service", SubmissionStatus::Approved),
        ];

        let standings = member_standing(&submissions, Some("doe.jane"), &config());
        assert_eq!(standings[0].approved, 1);
        assert_eq!(standings[0].pending, 1);
        assert_eq!(standings[0].total, 1);
    }

    #[test]
    fn test_boost_rows_do_not_count_as_event_approvals() {
        let submissions = vec![submission(
            "doe.jane",
            POINT_BOOST_EVENT_ID,
            "social",
            SubmissionStatus::AutoApproved,
        )];

        let standings = member_standing(&submissions, Some("doe.jane"), &config());
        let social = &standings[1];
        assert_eq!(social.approved, 0);
        assert_eq!(social.boosts, 1);
        assert_eq!(social.total, 1);
    }

    #[test]
    fn test_no_member_selected_yields_zeroes() {
        let submissions = vec![submission("doe.jane", "drive_a", "service", SubmissionStatus::Approved)];
        let standings = member_standing(&submissions, None, &config());
        assert!(standings.iter().all(|s| s.total == 0 && s.pending == 0));
    }

    #[test]
    fn test_status_buckets_fold_cancelled_into_rejected() {
        let submissions = vec![
            submission("a.b", "e", "service", SubmissionStatus::Approved),
            submission("a.b", "e", "service", SubmissionStatus::AutoApproved),
            submission("a.b", "e", "service", SubmissionStatus::Pending),
            submission("a.b", "e", "service", SubmissionStatus::Rejected),
            submission("a.b", "e", "service", SubmissionStatus::Cancelled),
        ];

        let buckets = status_buckets(submissions.iter());
        assert_eq!(
            buckets,
            StatusBuckets {
                approved: 2,
                pending: 1,
                rejected: 2,
            }
        );
    }

    #[test]
    fn test_semester_start_windows() {
        let fall = Utc.with_ymd_and_hms(2025, 10, 14, 12, 0, 0).unwrap();
        assert_eq!(semester_start(fall), Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap());

        let spring = Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap();
        assert_eq!(semester_start(spring), Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());

        let summer = Utc.with_ymd_and_hms(2026, 7, 31, 23, 59, 0).unwrap();
        assert_eq!(semester_start(summer), Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap());
    }
}
