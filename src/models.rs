use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::zones::Zone;

/// Workout categories used by the training plan builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    Interval,
    Endurance,
    Recovery,
    Tempo,
    Threshold,
    VO2Max,
    Strength,
    Race,
    Rest,
}

impl WorkoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Interval => "interval",
            WorkoutType::Endurance => "endurance",
            WorkoutType::Recovery => "recovery",
            WorkoutType::Tempo => "tempo",
            WorkoutType::Threshold => "threshold",
            WorkoutType::VO2Max => "vo2max",
            WorkoutType::Strength => "strength",
            WorkoutType::Race => "race",
            WorkoutType::Rest => "rest",
        }
    }

    /// Parse a stored label, defaulting to endurance for anything unknown
    pub fn from_label(label: &str) -> Self {
        match label.to_lowercase().as_str() {
            "interval" => WorkoutType::Interval,
            "recovery" => WorkoutType::Recovery,
            "tempo" => WorkoutType::Tempo,
            "threshold" => WorkoutType::Threshold,
            "vo2max" => WorkoutType::VO2Max,
            "strength" => WorkoutType::Strength,
            "race" => WorkoutType::Race,
            "rest" => WorkoutType::Rest,
            _ => WorkoutType::Endurance,
        }
    }
}

/// A single scheduled session inside a plan week.
///
/// Created by the training-plan builder; read-only to the delta and
/// daily-state engines. A synthetic instance with zero targets stands in
/// when an activity has no planned counterpart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedWorkout {
    /// Plan identifier; `None` only for the synthetic match-miss workout
    pub id: Option<String>,

    /// Day of week, 0 = Monday .. 6 = Sunday
    pub day_of_week: u8,

    pub workout_type: WorkoutType,

    /// Sport label as entered in the plan (matched case-insensitively)
    pub sport: String,

    pub duration_minutes: u32,

    /// Target Training Stress Score for the session
    pub target_tss: f64,

    /// Target intensity zone label; may use recognized aliases
    /// ("threshold", "soglia", ...)
    pub target_zone: String,

    pub estimated_kcal: i32,

    pub scheduled_time: Option<NaiveTime>,
}

impl PlannedWorkout {
    /// Zero-target stand-in used when no planned workout matches an
    /// activity's calendar slot. Downstream this is what "unplanned
    /// activity" means.
    pub fn synthetic() -> Self {
        PlannedWorkout {
            id: None,
            day_of_week: 0,
            workout_type: WorkoutType::Endurance,
            sport: String::new(),
            duration_minutes: 0,
            target_tss: 0.0,
            target_zone: "z2".to_string(),
            estimated_kcal: 0,
            scheduled_time: None,
        }
    }
}

/// A performed activity as recorded by the activity import/logging layer.
/// Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualActivity {
    pub id: String,

    pub activity_date: NaiveDate,

    pub title: String,

    pub sport: String,

    pub duration_seconds: u32,

    /// Training Stress Score computed by the import pipeline
    pub tss: f64,

    pub avg_hr: Option<u16>,

    pub avg_power: Option<u16>,

    pub calories: i32,

    /// Seconds spent per zone label, when the device reported them
    pub zones_distribution: Option<HashMap<String, u32>>,
}

/// Plan-vs-actual variance for one activity.
///
/// Derived and immutable once computed; keyed by `(athlete_id, activity_id)`.
/// Carries snapshots of both sides so downstream consumers never need to
/// re-fetch the matched plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDelta {
    pub athlete_id: String,
    pub activity_id: String,
    pub activity_date: NaiveDate,

    /// `None` when the activity was unplanned (synthetic match)
    pub planned_workout_id: Option<String>,

    pub planned_duration_minutes: u32,
    pub planned_tss: f64,
    pub planned_kcal: i32,
    pub planned_zone: Zone,

    pub actual_duration_seconds: u32,
    pub actual_tss: f64,
    pub actual_kcal: i32,

    /// Dominant zone resolved from the activity's zone distribution
    pub actual_zone: Zone,

    /// Rounded actual minutes minus planned minutes
    pub delta_duration_min: i64,

    pub delta_tss: f64,

    pub delta_kcal: i32,

    /// `(actual_rank - planned_rank) / 3`, rounded to 2 decimals
    pub delta_intensity: f64,

    /// Bounded per-activity fatigue term, always within [-20, 30]
    pub fatigue_contribution: f64,
}

/// Pure aggregate over an ordered sequence of deltas.
///
/// Stateless: recomputed on demand, never persisted independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub total_delta_tss: f64,
    pub total_delta_kcal: i32,
    pub total_delta_duration_min: i64,
    pub avg_delta_intensity: f64,
    /// Integer-rounded sum of fatigue contributions
    pub cumulative_fatigue: i32,
    pub activities_count: usize,
    /// Deltas lacking a matched planned workout id
    pub unplanned_count: usize,
}

/// Athlete metabolic baseline, when a nutrition profile exists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetabolicProfile {
    /// Basal metabolic rate in kcal/day
    pub bmr: f64,
    /// Total daily caloric target in kcal/day
    pub daily_kcal: f64,
}

/// Today's scheduled session, reduced to what adaptation needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TodaysWorkout {
    pub zone: Zone,
    pub tss: f64,
}

/// Recovery need classification derived from effective fatigue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryNeed {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RecoveryNeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryNeed::Low => write!(f, "low"),
            RecoveryNeed::Medium => write!(f, "medium"),
            RecoveryNeed::High => write!(f, "high"),
            RecoveryNeed::Critical => write!(f, "critical"),
        }
    }
}

/// Glycogen reservoir classification over the simulated [0, 500] g level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlycogenStatus {
    Depleted,
    Low,
    Normal,
    Loaded,
}

impl fmt::Display for GlycogenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlycogenStatus::Depleted => write!(f, "depleted"),
            GlycogenStatus::Low => write!(f, "low"),
            GlycogenStatus::Normal => write!(f, "normal"),
            GlycogenStatus::Loaded => write!(f, "loaded"),
        }
    }
}

/// Hydration placeholder pending sensor integration; always `Normal`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HydrationStatus {
    #[default]
    Normal,
}

/// Full adapted state for one athlete on one date.
///
/// Recomputed wholesale for a given date and upserted into the rolling
/// 14-entry window; never incrementally patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthleteDailyState {
    pub athlete_id: String,
    pub state_date: NaiveDate,

    /// Accumulated fatigue, always within [0, 100]
    pub fatigue_score: f64,

    pub recovery_need: RecoveryNeed,

    pub glycogen_status: GlycogenStatus,

    pub hydration_status: HydrationStatus,

    /// Adapted daily caloric target in kcal
    pub kcal_target: i32,

    /// Signed adjustment applied on top of the base target
    pub kcal_adjustment: f64,

    /// Unreplaced expenditure surplus from the trailing week
    pub kcal_debt: i32,

    /// Carbohydrate ratio shift in percentage points
    pub cho_adjustment_percent: i8,

    /// Protein ratio shift in percentage points
    pub pro_adjustment_percent: i8,

    /// Always balances the other two: `-(cho + pro)`
    pub fat_adjustment_percent: i8,

    /// Training load ceiling for today, never below 20
    pub tss_capacity: i32,

    /// Capacity relative to today's planned TSS, clamped to [50, 120]
    pub tss_adjustment_percent: i32,

    pub recommended_zone: Zone,

    pub max_zone_today: Zone,

    /// Placeholder until the periodization collaborator owns this
    pub training_phase: String,

    pub days_to_event: Option<i64>,

    /// Human-readable rationale assembled from `adaptation_reasons`
    pub ai_notes: String,

    pub adaptation_reasons: Vec<String>,

    /// Opaque diagnostic bag (weekly summary, glycogen level, yesterday's
    /// delta); explainability attachment, not load-bearing state
    pub factors: serde_json::Map<String, serde_json::Value>,
}
