//! Property tests for the documented bounds of the delta and daily-state
//! engines: whatever the input history looks like, every bounded field
//! stays inside its range and the zone recommendation never exceeds the
//! ceiling.

use adaptrs::daily_state::DailyStateUpdater;
use adaptrs::delta::DeltaCalculator;
use adaptrs::models::{ActualActivity, MetabolicProfile, PlannedWorkout, TodaysWorkout, WorkoutType};
use adaptrs::zones::Zone;
use chrono::NaiveDate;
use proptest::prelude::*;
use std::collections::HashMap;

const ZONE_LABELS: [&str; 9] = [
    "z1", "z2", "z3", "z4", "z5", "z6", "z7", "soglia", "unknown",
];

prop_compose! {
    fn arb_activity()(
        day_offset in 0i64..21,
        seconds in 0u32..30_000,
        tss in 0.0f64..500.0,
        kcal in 0i32..5_000,
        zone_idx in 0usize..ZONE_LABELS.len(),
        zone_seconds in 1u32..20_000,
        with_zones in any::<bool>(),
    ) -> ActualActivity {
        let base = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let zones_distribution = with_zones.then(|| {
            let mut dist = HashMap::new();
            dist.insert(ZONE_LABELS[zone_idx].to_string(), zone_seconds);
            dist
        });
        ActualActivity {
            id: format!("act-{day_offset}-{seconds}"),
            activity_date: base + chrono::Duration::days(day_offset),
            title: "generated".to_string(),
            sport: "cycling".to_string(),
            duration_seconds: seconds,
            tss,
            avg_hr: None,
            avg_power: None,
            calories: kcal,
            zones_distribution,
        }
    }
}

prop_compose! {
    fn arb_planned()(
        minutes in 0u32..400,
        tss in 0.0f64..400.0,
        kcal in 0i32..4_000,
        zone_idx in 0usize..ZONE_LABELS.len(),
        matched in any::<bool>(),
    ) -> Option<PlannedWorkout> {
        matched.then(|| PlannedWorkout {
            id: Some("w-gen".to_string()),
            day_of_week: 0,
            workout_type: WorkoutType::Endurance,
            sport: "cycling".to_string(),
            duration_minutes: minutes,
            target_tss: tss,
            target_zone: ZONE_LABELS[zone_idx].to_string(),
            estimated_kcal: kcal,
            scheduled_time: None,
        })
    }
}

proptest! {
    #[test]
    fn fatigue_contribution_is_bounded(
        activity in arb_activity(),
        planned in arb_planned(),
    ) {
        let delta = DeltaCalculator::calculate_activity_delta("ath-1", &activity, planned.as_ref());
        prop_assert!(delta.fatigue_contribution >= -20.0);
        prop_assert!(delta.fatigue_contribution <= 30.0);
    }

    #[test]
    fn daily_state_bounds_hold(
        pairs in prop::collection::vec((arb_activity(), arb_planned()), 0..12),
        daily_kcal in prop::option::of(1_200.0f64..5_000.0),
        planned_tss in prop::option::of(0.0f64..300.0),
        planned_zone_idx in 0usize..7,
    ) {
        let deltas: Vec<_> = pairs
            .iter()
            .map(|(activity, planned)| {
                DeltaCalculator::calculate_activity_delta("ath-1", activity, planned.as_ref())
            })
            .collect();

        let profile = daily_kcal.map(|daily_kcal| MetabolicProfile {
            bmr: daily_kcal * 0.65,
            daily_kcal,
        });
        let zones = [Zone::Z1, Zone::Z2, Zone::Z3, Zone::Z4, Zone::Z5, Zone::Z6, Zone::Z7];
        let planned_today = planned_tss.map(|tss| TodaysWorkout {
            zone: zones[planned_zone_idx],
            tss,
        });

        let date = NaiveDate::from_ymd_opt(2024, 3, 22).unwrap();
        let state = DailyStateUpdater::calculate_daily_state(
            "ath-1",
            date,
            &deltas,
            profile.as_ref(),
            planned_today.as_ref(),
        );

        prop_assert!(state.fatigue_score >= 0.0 && state.fatigue_score <= 100.0);
        prop_assert!(state.tss_capacity >= 20);
        prop_assert!(state.tss_adjustment_percent >= 50 && state.tss_adjustment_percent <= 120);
        prop_assert!(state.recommended_zone <= state.max_zone_today);
        prop_assert_eq!(
            state.fat_adjustment_percent,
            -(state.cho_adjustment_percent + state.pro_adjustment_percent)
        );

        let glycogen_level = state
            .factors
            .get("glycogen_level")
            .and_then(|v| v.as_f64())
            .unwrap();
        prop_assert!((0.0..=500.0).contains(&glycogen_level));
    }

    #[test]
    fn weekly_summary_counts_are_consistent(
        pairs in prop::collection::vec((arb_activity(), arb_planned()), 0..12),
    ) {
        let deltas: Vec<_> = pairs
            .iter()
            .map(|(activity, planned)| {
                DeltaCalculator::calculate_activity_delta("ath-1", activity, planned.as_ref())
            })
            .collect();

        let summary = DeltaCalculator::calculate_weekly_summary(&deltas);
        prop_assert_eq!(summary.activities_count, deltas.len());
        prop_assert!(summary.unplanned_count <= summary.activities_count);
    }
}
