//! Daily fatigue/recovery/glycogen/caloric adaptation engine.
//!
//! Consumes the athlete's recent activity deltas and emits the adapted state
//! for one date: fatigue score, recovery-need class, simulated glycogen
//! reservoir, training-load ceiling, zone recommendation and caloric/macro
//! targets, plus a human-readable rationale. The whole computation is pure
//! and deterministic for a given set of inputs; persistence lives in
//! [`crate::database`].

use chrono::{Duration, NaiveDate};
use serde_json::json;
use tracing::debug;

use crate::delta::DeltaCalculator;
use crate::models::{
    ActivityDelta, AthleteDailyState, GlycogenStatus, HydrationStatus, MetabolicProfile,
    RecoveryNeed, TodaysWorkout, WeeklySummary,
};
use crate::zones::Zone;

/// Resting baseline load added before weekly accumulation
const BASELINE_FATIGUE: f64 = 30.0;
/// Weekly cumulative fatigue is capped a second time before adding
const WEEKLY_FATIGUE_CAP: f64 = 50.0;

/// Full glycogen reservoir in grams
const GLYCOGEN_CAPACITY_G: f64 = 500.0;
/// Grams of glycogen spent per unit of TSS
const GLYCOGEN_COST_PER_TSS: f64 = 0.5;
/// Passive restoration rate while recovering
const GLYCOGEN_RESTORE_G_PER_HOUR: f64 = 5.0;
/// Fraction of dietary carbohydrate that restores the reservoir
const DIETARY_ABSORPTION: f64 = 0.8;
/// Assumed carbohydrate intake when no metabolic profile exists
const DEFAULT_CHO_INTAKE_G: f64 = 300.0;
/// Depletion window: only the most recent deltas drain the reservoir
const GLYCOGEN_LOOKBACK_DELTAS: usize = 3;

/// Caloric base when no metabolic profile exists
const DEFAULT_BASE_KCAL: f64 = 2500.0;
/// Floor applied to the planned TSS divisor in the adjustment percent
const MIN_PLANNED_TSS_DIVISOR: f64 = 50.0;
/// Training-load ceiling never drops below this
const MIN_TSS_CAPACITY: f64 = 20.0;

/// Deferred to the external goal/periodization collaborator
const TRAINING_PHASE_PLACEHOLDER: &str = "base";

/// Daily state computation
pub struct DailyStateUpdater;

impl DailyStateUpdater {
    /// Compute the adapted daily state for `date`.
    ///
    /// `recent_deltas` is the caller-supplied trailing history (typically
    /// 2-3 weeks, date ascending). The metabolic profile and today's
    /// planned workout are optional; each absence has a documented default.
    pub fn calculate_daily_state(
        athlete_id: &str,
        date: NaiveDate,
        recent_deltas: &[ActivityDelta],
        profile: Option<&MetabolicProfile>,
        planned_today: Option<&TodaysWorkout>,
    ) -> AthleteDailyState {
        let weekly = DeltaCalculator::calculate_weekly_summary(recent_deltas);
        let yesterday = Self::yesterday_delta(date, recent_deltas);

        let fatigue_score = Self::fatigue_score(&weekly);
        let glycogen_level = Self::glycogen_level(recent_deltas, yesterday.is_some(), profile);
        let glycogen_status = Self::classify_glycogen(glycogen_level);
        let recovery_need = Self::recovery_need(fatigue_score, yesterday);

        let tss_capacity = Self::tss_capacity(fatigue_score);
        let tss_adjustment_percent = Self::tss_adjustment_percent(tss_capacity, planned_today);
        let (recommended_zone, max_zone_today) =
            Self::zone_ceiling(recovery_need, glycogen_status, planned_today);

        let nutrition = Self::nutrition_adjustment(&weekly, glycogen_status, recovery_need, profile);

        let adaptation_reasons = Self::adaptation_reasons(
            fatigue_score,
            glycogen_status,
            recovery_need,
            nutrition.kcal_adjustment,
        );
        let ai_notes = if adaptation_reasons.is_empty() {
            "Optimal state — follow standard plan".to_string()
        } else {
            format!("Adaptations: {}", adaptation_reasons.join(". "))
        };

        let mut factors = serde_json::Map::new();
        factors.insert(
            "weekly_summary".to_string(),
            serde_json::to_value(&weekly).unwrap_or(serde_json::Value::Null),
        );
        factors.insert("glycogen_level".to_string(), json!(glycogen_level));
        factors.insert(
            "yesterday_delta".to_string(),
            yesterday
                .and_then(|d| serde_json::to_value(d).ok())
                .unwrap_or(serde_json::Value::Null),
        );

        debug!(
            athlete_id,
            %date,
            fatigue_score,
            %recovery_need,
            %glycogen_status,
            tss_capacity,
            "computed daily state"
        );

        AthleteDailyState {
            athlete_id: athlete_id.to_string(),
            state_date: date,
            fatigue_score,
            recovery_need,
            glycogen_status,
            hydration_status: HydrationStatus::Normal,
            kcal_target: nutrition.kcal_target,
            kcal_adjustment: nutrition.kcal_adjustment,
            kcal_debt: weekly.total_delta_kcal.max(0),
            cho_adjustment_percent: nutrition.cho_adjustment_percent,
            pro_adjustment_percent: nutrition.pro_adjustment_percent,
            fat_adjustment_percent: -(nutrition.cho_adjustment_percent
                + nutrition.pro_adjustment_percent),
            tss_capacity: tss_capacity as i32,
            tss_adjustment_percent,
            recommended_zone,
            max_zone_today,
            training_phase: TRAINING_PHASE_PLACEHOLDER.to_string(),
            days_to_event: None,
            ai_notes,
            adaptation_reasons,
            factors,
        }
    }

    /// Find yesterday's delta inside the recent history, if any
    fn yesterday_delta(date: NaiveDate, recent_deltas: &[ActivityDelta]) -> Option<&ActivityDelta> {
        let yesterday = date - Duration::days(1);
        recent_deltas.iter().find(|d| d.activity_date == yesterday)
    }

    /// Baseline 30 plus the weekly cumulative fatigue, capped at 50 before
    /// adding, with the final score held inside [0, 100].
    fn fatigue_score(weekly: &WeeklySummary) -> f64 {
        let weekly_term = f64::from(weekly.cumulative_fatigue).min(WEEKLY_FATIGUE_CAP);
        (BASELINE_FATIGUE + weekly_term).clamp(0.0, 100.0)
    }

    /// Simulate the glycogen reservoir.
    ///
    /// Starting from a full 500 g store: the actual TSS of the most recent
    /// three deltas drains it at 0.5 g per unit, passive recovery restores
    /// 5 g/h (12 h if the athlete trained yesterday, 24 h otherwise) and
    /// dietary carbohydrate restores at 80% absorption. The level is held
    /// inside [0, 500].
    fn glycogen_level(
        recent_deltas: &[ActivityDelta],
        trained_yesterday: bool,
        profile: Option<&MetabolicProfile>,
    ) -> f64 {
        let hours_recovery = if trained_yesterday { 12.0 } else { 24.0 };
        let cho_intake_g = match profile {
            Some(p) => p.daily_kcal * 0.5 / 4.0,
            None => DEFAULT_CHO_INTAKE_G,
        };

        let recent_start = recent_deltas.len().saturating_sub(GLYCOGEN_LOOKBACK_DELTAS);
        let recent_tss: f64 = recent_deltas[recent_start..]
            .iter()
            .map(|d| d.actual_tss)
            .sum();

        let level = GLYCOGEN_CAPACITY_G - recent_tss * GLYCOGEN_COST_PER_TSS
            + hours_recovery * GLYCOGEN_RESTORE_G_PER_HOUR
            + cho_intake_g * DIETARY_ABSORPTION;

        level.clamp(0.0, GLYCOGEN_CAPACITY_G)
    }

    fn classify_glycogen(level: f64) -> GlycogenStatus {
        if level < 100.0 {
            GlycogenStatus::Depleted
        } else if level < 200.0 {
            GlycogenStatus::Low
        } else if level < GLYCOGEN_CAPACITY_G * 0.9 {
            GlycogenStatus::Normal
        } else {
            GlycogenStatus::Loaded
        }
    }

    /// Classify recovery need from fatigue plus yesterday's load factor.
    ///
    /// A heavy day yesterday (delta TSS over 30) adds 20 to the effective
    /// fatigue, any overshoot adds 10, and the result is classified against
    /// the fixed 85/70/50 thresholds.
    fn recovery_need(fatigue_score: f64, yesterday: Option<&ActivityDelta>) -> RecoveryNeed {
        let delta_tss_yesterday = yesterday.map_or(0.0, |d| d.delta_tss);
        let load_factor = if delta_tss_yesterday > 30.0 {
            20.0
        } else if delta_tss_yesterday > 0.0 {
            10.0
        } else {
            0.0
        };

        let effective_fatigue = fatigue_score + load_factor;
        if effective_fatigue >= 85.0 {
            RecoveryNeed::Critical
        } else if effective_fatigue >= 70.0 {
            RecoveryNeed::High
        } else if effective_fatigue >= 50.0 {
            RecoveryNeed::Medium
        } else {
            RecoveryNeed::Low
        }
    }

    /// Today's training-load ceiling, floored at 20
    fn tss_capacity(fatigue_score: f64) -> f64 {
        (150.0 - fatigue_score * 1.5).round().max(MIN_TSS_CAPACITY)
    }

    /// Capacity relative to today's planned TSS, clamped to [50, 120].
    ///
    /// With no planned workout the output is exactly 100; the formula is
    /// deliberately not evaluated against the default divisor in that case.
    fn tss_adjustment_percent(tss_capacity: f64, planned_today: Option<&TodaysWorkout>) -> i32 {
        match planned_today {
            Some(planned) => {
                let divisor = planned.tss.max(MIN_PLANNED_TSS_DIVISOR);
                (tss_capacity / divisor * 100.0).round().clamp(50.0, 120.0) as i32
            }
            None => 100,
        }
    }

    /// Zone ceiling lookup, first match wins.
    ///
    /// Ordered by severity: critical recovery pins everything to z1, high
    /// recovery or depleted glycogen cap at z2, medium recovery or low
    /// glycogen cap at z3, and an unconstrained day follows the plan under
    /// a z5 ceiling. The recommendation never exceeds the ceiling.
    fn zone_ceiling(
        recovery_need: RecoveryNeed,
        glycogen_status: GlycogenStatus,
        planned_today: Option<&TodaysWorkout>,
    ) -> (Zone, Zone) {
        match (recovery_need, glycogen_status) {
            (RecoveryNeed::Critical, _) => (Zone::Z1, Zone::Z1),
            (RecoveryNeed::High, _) => (Zone::Z2, Zone::Z2),
            (_, GlycogenStatus::Depleted) => (Zone::Z2, Zone::Z2),
            (RecoveryNeed::Medium, _) => (Zone::Z2, Zone::Z3),
            (_, GlycogenStatus::Low) => (Zone::Z2, Zone::Z3),
            _ => {
                let recommended = planned_today.map_or(Zone::Z2, |p| p.zone).min(Zone::Z5);
                (recommended, Zone::Z5)
            }
        }
    }

    /// Caloric and macro-ratio adjustment.
    ///
    /// Each term is computed from the original weekly/glycogen/recovery
    /// inputs, never chained, so the terms are order-independent.
    fn nutrition_adjustment(
        weekly: &WeeklySummary,
        glycogen_status: GlycogenStatus,
        recovery_need: RecoveryNeed,
        profile: Option<&MetabolicProfile>,
    ) -> NutritionAdjustment {
        let mut adjustment = 0.0;
        let mut cho_adjustment_percent: i8 = 0;
        let mut pro_adjustment_percent: i8 = 0;

        if weekly.total_delta_kcal > 200 {
            adjustment += (f64::from(weekly.total_delta_kcal) * 0.5).min(400.0);
        }

        match glycogen_status {
            GlycogenStatus::Depleted => {
                cho_adjustment_percent = 15;
                adjustment += 200.0;
            }
            GlycogenStatus::Low => {
                cho_adjustment_percent = 10;
                adjustment += 100.0;
            }
            _ => {}
        }

        if matches!(recovery_need, RecoveryNeed::High | RecoveryNeed::Critical) {
            pro_adjustment_percent = 10;
            adjustment += 150.0;
        }

        if weekly.total_delta_tss > 30.0 {
            adjustment += weekly.total_delta_tss * 3.0;
        }

        let base_kcal = profile.map_or(DEFAULT_BASE_KCAL, |p| p.daily_kcal);

        NutritionAdjustment {
            kcal_target: (base_kcal + adjustment).round() as i32,
            kcal_adjustment: adjustment,
            cho_adjustment_percent,
            pro_adjustment_percent,
        }
    }

    /// Ordered rationale entries; the order is fixed and user-visible
    fn adaptation_reasons(
        fatigue_score: f64,
        glycogen_status: GlycogenStatus,
        recovery_need: RecoveryNeed,
        kcal_adjustment: f64,
    ) -> Vec<String> {
        let mut reasons = Vec::new();

        if fatigue_score > 70.0 {
            reasons.push(format!(
                "Elevated fatigue ({fatigue_score:.0}/100): reduce training load"
            ));
        }

        match glycogen_status {
            GlycogenStatus::Depleted => {
                reasons.push("Glycogen depleted: prioritize carbohydrate intake".to_string());
            }
            GlycogenStatus::Low => {
                reasons.push("Glycogen low: increase carbohydrate intake".to_string());
            }
            _ => {}
        }

        match recovery_need {
            RecoveryNeed::Critical => {
                reasons.push("Critical recovery need: rest day recommended".to_string());
            }
            RecoveryNeed::High => {
                reasons.push("High recovery need: keep intensity low".to_string());
            }
            _ => {}
        }

        if kcal_adjustment > 200.0 {
            reasons.push(format!(
                "Caloric target adjusted by {kcal_adjustment:+.0} kcal"
            ));
        }

        reasons
    }
}

struct NutritionAdjustment {
    kcal_target: i32,
    kcal_adjustment: f64,
    cho_adjustment_percent: i8,
    pro_adjustment_percent: i8,
}
