use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mshprep::models::exam::{ExamType, RecentActivity, RecentActivityEntry};
use mshprep::models::trial::{TrialExpiredMarker, TrialTimerState};
use mshprep::models::user::{UserSession, UserStatus};
use mshprep::services::gate::evaluate;

fn entry(score: u32, day: u32) -> RecentActivityEntry {
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
        date: format!("2026-02-{:02}", day % 28 + 1),
        recorded_at: Utc::now(),
    }
}

fn benchmark_gate_evaluate(c: &mut Criterion) {
    let trial = UserSession::new(
        "Bench".to_string(),
        "bench@example.com".to_string(),
        UserStatus::Trial,
        false,
    );
    let timer = TrialTimerState::fresh(Utc::now());
    let marker = TrialExpiredMarker::consumed_at(Utc::now());

    let mut group = c.benchmark_group("gate_evaluate");

    group.bench_function("trial_allowed", |b| {
        b.iter(|| evaluate(black_box(&trial), black_box(&timer), None))
    });

    group.bench_function("marker_denied", |b| {
        b.iter(|| evaluate(black_box(&trial), black_box(&timer), Some(black_box(&marker))))
    });

    group.finish();
}

fn benchmark_recent_activity_record(c: &mut Criterion) {
    // A full list is the worst case: every record scans 50 dedup keys
    let mut full = RecentActivity::default();
    for day in 0..50 {
        full.record(entry(day, day));
    }
    let duplicate = entry(10, 10);
    let fresh = entry(99, 3);

    let mut group = c.benchmark_group("recent_activity_record");

    group.bench_function("duplicate_into_full_list", |b| {
        b.iter(|| {
            let mut list = full.clone();
            list.record(black_box(duplicate.clone()))
        })
    });

    group.bench_function("fresh_into_full_list", |b| {
        b.iter(|| {
            let mut list = full.clone();
            list.record(black_box(fresh.clone()))
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_gate_evaluate,
    benchmark_recent_activity_record
);
criterion_main!(benches);
