// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recent-activity list: dedup by composite key, bounded to 50 entries.

use chrono::Utc;
use mshprep::models::exam::{ExamType, RecentActivity, RecentActivityEntry};

fn entry(score: u32, date: &str) -> RecentActivityEntry {
    RecentActivityEntry {
        exam_type: ExamType::Jamb,
        subjects: vec![
            "english".to_string(),
            "mathematics".to_string(),
            "physics".to_string(),
            "chemistry".to_string(),
        ],
        score,
        total_questions: 40,
        date: date.to_string(),
        recorded_at: Utc::now(),
    }
}

#[test]
fn test_identical_submission_stored_once() {
    let mut recent = RecentActivity::default();

    assert!(recent.record(entry(31, "2026-03-01")));
    assert!(!recent.record(entry(31, "2026-03-01")), "duplicate must be dropped");

    assert_eq!(recent.entries.len(), 1);
}

#[test]
fn test_different_score_is_a_new_entry() {
    let mut recent = RecentActivity::default();

    recent.record(entry(31, "2026-03-01"));
    assert!(recent.record(entry(35, "2026-03-01")));

    assert_eq!(recent.entries.len(), 2);
}

#[test]
fn test_subject_order_does_not_defeat_dedup() {
    let mut recent = RecentActivity::default();

    let mut reordered = entry(31, "2026-03-01");
    reordered.subjects.reverse();

    recent.record(entry(31, "2026-03-01"));
    assert!(!recent.record(reordered));
}

#[test]
fn test_list_is_bounded_to_fifty() {
    let mut recent = RecentActivity::default();

    for day in 0..60 {
        recent.record(entry(20, &format!("2026-01-{:02}", day + 1)));
    }

    assert_eq!(recent.entries.len(), 50);
    // Newest entries are kept at the front
    assert_eq!(recent.entries[0].date, "2026-01-60");
}
