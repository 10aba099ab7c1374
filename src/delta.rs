//! Plan-vs-actual variance engine.
//!
//! Matches each performed activity to the planned workout occupying the same
//! calendar slot, computes the per-activity deltas (duration, TSS, calories,
//! intensity, bounded fatigue contribution) and reduces a sequence of deltas
//! into a weekly summary. All computation is pure; the only I/O is the bulk
//! date-range pass, which reads from an injected store handle.

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::database::Database;
use crate::models::{ActivityDelta, ActualActivity, PlannedWorkout, WeeklySummary};
use crate::zones::Zone;

/// Per-activity fatigue contribution bounds
const FATIGUE_CONTRIBUTION_MIN: f64 = -20.0;
const FATIGUE_CONTRIBUTION_MAX: f64 = 30.0;

/// Round to 2 decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Delta calculation algorithms
pub struct DeltaCalculator;

impl DeltaCalculator {
    /// Match an activity to a planned workout for the same day of week.
    ///
    /// Candidates are planned workouts scheduled on the activity's
    /// Monday-indexed weekday. Among several candidates the one whose sport
    /// matches case-insensitively wins, otherwise the first candidate.
    /// Returns `None` on a match miss; callers substitute the synthetic
    /// zero-target workout.
    pub fn match_planned_workout<'a>(
        activity: &ActualActivity,
        planned: &'a [PlannedWorkout],
    ) -> Option<&'a PlannedWorkout> {
        let iso_day = activity.activity_date.weekday().num_days_from_monday() as u8;

        let candidates: Vec<&PlannedWorkout> = planned
            .iter()
            .filter(|w| w.day_of_week == iso_day)
            .collect();

        if candidates.is_empty() {
            return None;
        }

        candidates
            .iter()
            .find(|w| w.sport.eq_ignore_ascii_case(&activity.sport))
            .copied()
            .or_else(|| candidates.first().copied())
    }

    /// Compute the delta record for one activity against its matched plan.
    ///
    /// `planned = None` means the activity was unplanned: the synthetic
    /// zero-target workout is substituted and the resulting delta carries no
    /// planned workout id.
    pub fn calculate_activity_delta(
        athlete_id: &str,
        activity: &ActualActivity,
        planned: Option<&PlannedWorkout>,
    ) -> ActivityDelta {
        let synthetic;
        let planned = match planned {
            Some(w) => w,
            None => {
                synthetic = PlannedWorkout::synthetic();
                &synthetic
            }
        };

        let actual_minutes = (f64::from(activity.duration_seconds) / 60.0).round() as i64;
        let delta_duration_min = actual_minutes - i64::from(planned.duration_minutes);
        let delta_tss = activity.tss - planned.target_tss;
        let delta_kcal = activity.calories - planned.estimated_kcal;

        let planned_zone = Zone::from_label(&planned.target_zone);
        let actual_zone = Zone::dominant(activity.zones_distribution.as_ref());
        let delta_intensity = round2(
            (f64::from(actual_zone.rank()) - f64::from(planned_zone.rank())) / 3.0,
        );

        // Overshooting intensity amplifies the fatigue cost; undershooting
        // does not discount it.
        let intensity_multiplier = if delta_intensity > 0.0 {
            1.0 + delta_intensity * 0.5
        } else {
            1.0
        };
        let fatigue_contribution = (delta_tss * 0.1 * intensity_multiplier)
            .round()
            .clamp(FATIGUE_CONTRIBUTION_MIN, FATIGUE_CONTRIBUTION_MAX);

        ActivityDelta {
            athlete_id: athlete_id.to_string(),
            activity_id: activity.id.clone(),
            activity_date: activity.activity_date,
            planned_workout_id: planned.id.clone(),
            planned_duration_minutes: planned.duration_minutes,
            planned_tss: planned.target_tss,
            planned_kcal: planned.estimated_kcal,
            planned_zone,
            actual_duration_seconds: activity.duration_seconds,
            actual_tss: activity.tss,
            actual_kcal: activity.calories,
            actual_zone,
            delta_duration_min,
            delta_tss,
            delta_kcal,
            delta_intensity,
            fatigue_contribution,
        }
    }

    /// Reduce an ordered sequence of deltas into a weekly summary.
    ///
    /// Pure reduction with no side effects; an empty sequence yields
    /// all-zero fields.
    pub fn calculate_weekly_summary(deltas: &[ActivityDelta]) -> WeeklySummary {
        if deltas.is_empty() {
            return WeeklySummary::default();
        }

        let total_delta_tss: f64 = deltas.iter().map(|d| d.delta_tss).sum();
        let total_delta_kcal: i32 = deltas.iter().map(|d| d.delta_kcal).sum();
        let total_delta_duration_min: i64 = deltas.iter().map(|d| d.delta_duration_min).sum();
        let intensity_sum: f64 = deltas.iter().map(|d| d.delta_intensity).sum();
        let fatigue_sum: f64 = deltas.iter().map(|d| d.fatigue_contribution).sum();
        let unplanned_count = deltas
            .iter()
            .filter(|d| d.planned_workout_id.is_none())
            .count();

        WeeklySummary {
            total_delta_tss,
            total_delta_kcal,
            total_delta_duration_min,
            avg_delta_intensity: round2(intensity_sum / deltas.len() as f64),
            cumulative_fatigue: fatigue_sum.round() as i32,
            activities_count: deltas.len(),
            unplanned_count,
        }
    }

    /// Bulk delta pass over `[start, end]` for one athlete.
    ///
    /// Reads the athlete's activities (date ascending) and every planned
    /// workout reachable from the active plan hierarchy, then applies
    /// matching and delta computation per activity. A fetch failure is a
    /// local-recovery case: it is logged and yields an empty result, never
    /// an error.
    pub fn calculate_deltas_for_date_range(
        db: &Database,
        athlete_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<ActivityDelta> {
        let activities = match db.activities_in_range(athlete_id, start, end) {
            Ok(activities) => activities,
            Err(err) => {
                warn!(athlete_id, %err, "failed to fetch activities, returning no deltas");
                return Vec::new();
            }
        };

        let planned = match db.planned_workouts_for_athlete(athlete_id) {
            Ok(planned) => planned,
            Err(err) => {
                warn!(athlete_id, %err, "failed to fetch planned workouts, treating all activities as unplanned");
                Vec::new()
            }
        };

        debug!(
            athlete_id,
            activities = activities.len(),
            planned = planned.len(),
            "computing deltas for date range"
        );

        activities
            .iter()
            .map(|activity| {
                let matched = Self::match_planned_workout(activity, &planned);
                Self::calculate_activity_delta(athlete_id, activity, matched)
            })
            .collect()
    }
}
