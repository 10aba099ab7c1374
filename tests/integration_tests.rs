use adaptrs::daily_state::DailyStateUpdater;
use adaptrs::database::{Database, DAILY_STATE_WINDOW};
use adaptrs::delta::DeltaCalculator;
use adaptrs::models::{
    ActualActivity, GlycogenStatus, MetabolicProfile, PlannedWorkout, RecoveryNeed, TodaysWorkout,
    WorkoutType,
};
use adaptrs::zones::Zone;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

/// End-to-end workflows over a real on-disk store

fn open_db(dir: &tempfile::TempDir) -> Database {
    Database::new(dir.path().join("adaptrs.db")).unwrap()
}

fn seed_plan(db: &Database, athlete_id: &str) {
    db.insert_plan("plan-1", athlete_id, "Build block", true).unwrap();
    db.insert_mesocycle("meso-1", "plan-1", 1).unwrap();
    db.insert_plan_week("week-1", "meso-1", 1).unwrap();

    let workouts = [
        // Monday endurance ride
        ("w-mon", 0, "cycling", WorkoutType::Endurance, 90, 80.0, "z2", 700),
        // Wednesday threshold ride (Italian zone label from the plan import)
        ("w-wed", 2, "cycling", WorkoutType::Threshold, 60, 75.0, "soglia", 650),
        // Saturday long run
        ("w-sat", 5, "running", WorkoutType::Endurance, 120, 95.0, "z2", 1100),
    ];

    for (id, day, sport, workout_type, minutes, tss, zone, kcal) in workouts {
        let workout = PlannedWorkout {
            id: Some(id.to_string()),
            day_of_week: day,
            workout_type,
            sport: sport.to_string(),
            duration_minutes: minutes,
            target_tss: tss,
            target_zone: zone.to_string(),
            estimated_kcal: kcal,
            scheduled_time: None,
        };
        db.insert_planned_workout("week-1", &workout).unwrap();
    }
}

fn activity(
    id: &str,
    date: NaiveDate,
    sport: &str,
    seconds: u32,
    tss: f64,
    kcal: i32,
    dominant: Option<(&str, u32)>,
) -> ActualActivity {
    let zones_distribution = dominant.map(|(zone, secs)| {
        let mut dist = HashMap::new();
        dist.insert(zone.to_string(), secs);
        dist
    });

    ActualActivity {
        id: id.to_string(),
        activity_date: date,
        title: format!("Session {id}"),
        sport: sport.to_string(),
        duration_seconds: seconds,
        tss,
        avg_hr: Some(148),
        avg_power: Some(215),
        calories: kcal,
        zones_distribution,
    }
}

#[test]
fn test_bulk_delta_pass_over_seeded_week() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    seed_plan(&db, "ath-1");

    // 2024-04-01 is a Monday
    let monday = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let wednesday = monday + Duration::days(2);
    let thursday = monday + Duration::days(3);

    db.insert_activity(
        "ath-1",
        &activity("act-mon", monday, "Cycling", 5400, 70.0, 640, Some(("z2", 4800))),
    )
    .unwrap();
    db.insert_activity(
        "ath-1",
        &activity("act-wed", wednesday, "cycling", 3600, 60.0, 500, Some(("z2", 3000))),
    )
    .unwrap();
    // Unplanned Thursday run: no workout on iso day 3
    db.insert_activity(
        "ath-1",
        &activity("act-thu", thursday, "running", 1800, 50.0, 320, None),
    )
    .unwrap();

    let deltas = DeltaCalculator::calculate_deltas_for_date_range(
        &db,
        "ath-1",
        monday,
        monday + Duration::days(6),
    );

    assert_eq!(deltas.len(), 3);

    // Monday matched the endurance ride despite the cased sport label
    assert_eq!(deltas[0].planned_workout_id.as_deref(), Some("w-mon"));
    assert_eq!(deltas[0].delta_duration_min, 0);
    assert_eq!(deltas[0].delta_tss, -10.0);

    // Wednesday: "soglia" resolves to z4, ridden at z2
    assert_eq!(deltas[1].planned_workout_id.as_deref(), Some("w-wed"));
    assert_eq!(deltas[1].planned_zone, Zone::Z4);
    assert_eq!(deltas[1].actual_zone, Zone::Z2);
    assert_eq!(deltas[1].delta_intensity, -0.67);

    // Thursday is unplanned: synthetic zero targets
    assert!(deltas[2].planned_workout_id.is_none());
    assert_eq!(deltas[2].delta_tss, 50.0);
    assert_eq!(deltas[2].planned_zone, Zone::Z2);

    let summary = DeltaCalculator::calculate_weekly_summary(&deltas);
    assert_eq!(summary.activities_count, 3);
    assert_eq!(summary.unplanned_count, 1);
}

#[test]
fn test_unknown_athlete_yields_empty_deltas() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);

    let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let deltas =
        DeltaCalculator::calculate_deltas_for_date_range(&db, "nobody", start, start + Duration::days(7));
    assert!(deltas.is_empty());

    let summary = DeltaCalculator::calculate_weekly_summary(&deltas);
    assert_eq!(summary.activities_count, 0);
    assert_eq!(summary.total_delta_tss, 0.0);
}

#[test]
fn test_daily_state_end_to_end_with_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = open_db(&dir);
    seed_plan(&db, "ath-1");

    let monday = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    for offset in 0..6 {
        let date = monday + Duration::days(offset);
        db.insert_activity(
            "ath-1",
            &activity(
                &format!("act-{offset}"),
                date,
                "cycling",
                7200,
                150.0,
                1200,
                Some(("z5", 5400)),
            ),
        )
        .unwrap();
    }

    let today = monday + Duration::days(6);
    let deltas =
        DeltaCalculator::calculate_deltas_for_date_range(&db, "ath-1", monday, today - Duration::days(1));
    assert_eq!(deltas.len(), 6);

    let profile = MetabolicProfile {
        bmr: 1750.0,
        daily_kcal: 2800.0,
    };
    let planned = TodaysWorkout {
        zone: Zone::Z4,
        tss: 90.0,
    };

    let state = DailyStateUpdater::calculate_daily_state(
        "ath-1",
        today,
        &deltas,
        Some(&profile),
        Some(&planned),
    );

    // A week of heavy overshoots drives the athlete into protection
    assert!(state.fatigue_score >= 70.0);
    assert!(matches!(
        state.recovery_need,
        RecoveryNeed::High | RecoveryNeed::Critical
    ));
    assert!(state.recommended_zone <= state.max_zone_today);
    assert!(state.max_zone_today <= Zone::Z2);
    assert!(state.tss_capacity >= 20);
    assert!((50..=120).contains(&state.tss_adjustment_percent));
    assert!(!state.adaptation_reasons.is_empty());
    assert!(state.ai_notes.starts_with("Adaptations: "));

    assert!(db.save_daily_state(&state));
    let loaded = db.load_daily_state("ath-1", today).unwrap();
    assert_eq!(loaded, state);
}

#[test]
fn test_rolling_window_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

    {
        let mut db = open_db(&dir);
        for offset in 0..18 {
            let date = start + Duration::days(offset);
            let state = DailyStateUpdater::calculate_daily_state("ath-1", date, &[], None, None);
            assert!(db.save_daily_state(&state));
        }
    }

    let db = open_db(&dir);
    let dates = db.daily_state_dates("ath-1", 2024).unwrap();
    assert_eq!(dates.len(), DAILY_STATE_WINDOW);
    assert_eq!(dates[0], start + Duration::days(17));
    assert_eq!(dates[DAILY_STATE_WINDOW - 1], start + Duration::days(4));
    assert!(db.load_daily_state("ath-1", start + Duration::days(3)).is_none());
}

#[test]
fn test_rested_week_keeps_standard_plan() {
    let dir = tempfile::tempdir().unwrap();
    let db = open_db(&dir);
    seed_plan(&db, "ath-1");

    let monday = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    // One easy matched session early in the window, nothing since
    db.insert_activity(
        "ath-1",
        &activity("act-easy", monday, "cycling", 5400, 75.0, 680, Some(("z2", 5000))),
    )
    .unwrap();

    let today = monday + Duration::days(6);
    let deltas =
        DeltaCalculator::calculate_deltas_for_date_range(&db, "ath-1", monday, today - Duration::days(1));

    let planned = TodaysWorkout {
        zone: Zone::Z3,
        tss: 70.0,
    };
    let state =
        DailyStateUpdater::calculate_daily_state("ath-1", today, &deltas, None, Some(&planned));

    assert_eq!(state.recovery_need, RecoveryNeed::Low);
    assert_eq!(state.glycogen_status, GlycogenStatus::Loaded);
    assert_eq!(state.recommended_zone, Zone::Z3);
    assert_eq!(state.max_zone_today, Zone::Z5);
    assert_eq!(state.ai_notes, "Optimal state — follow standard plan");
}
