//! SQLite-backed stores for activities, the training-plan hierarchy and the
//! per-athlete daily-state documents.
//!
//! Daily states are not first-class rows: each athlete-year owns one JSON
//! document with a `daily_states` map keyed by ISO date, and every save
//! merges into that document while pruning it to the 14 most recent dates.
//! The read-merge-write runs inside a single SQLite transaction so
//! concurrent saves for the same athlete cannot lose updates.
//!
//! The handle is injected by callers; there is no global client.

use chrono::{Datelike, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::DatabaseError;
use crate::models::{ActualActivity, AthleteDailyState, PlannedWorkout, WorkoutType};

/// Maximum daily states retained per athlete, pruned by descending date
pub const DAILY_STATE_WINDOW: usize = 14;

/// Per-athlete, per-year document wrapping the daily-state map
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct YearlyStateDocument {
    /// ISO date string -> state; BTreeMap keeps keys date-sorted
    daily_states: BTreeMap<String, AthleteDailyState>,
}

/// Store handle over a single SQLite connection
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create or open a database at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, DatabaseError> {
        let conn = Connection::open(db_path)?;
        let mut db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// In-memory database, used by tests
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let mut db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&mut self) -> Result<(), DatabaseError> {
        // WAL for better concurrent readers across athlete handles
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS activities (
                id TEXT PRIMARY KEY,
                athlete_id TEXT NOT NULL,
                activity_date DATE NOT NULL,
                title TEXT NOT NULL,
                sport TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                tss REAL NOT NULL,
                avg_hr INTEGER,
                avg_power INTEGER,
                calories INTEGER NOT NULL,
                zones_distribution TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_activities_athlete_date
                ON activities(athlete_id, activity_date);

            CREATE TABLE IF NOT EXISTS training_plans (
                id TEXT PRIMARY KEY,
                athlete_id TEXT NOT NULL,
                name TEXT NOT NULL,
                active INTEGER NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_plans_athlete
                ON training_plans(athlete_id, active);

            CREATE TABLE IF NOT EXISTS mesocycles (
                id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL REFERENCES training_plans(id),
                sequence INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS plan_weeks (
                id TEXT PRIMARY KEY,
                mesocycle_id TEXT NOT NULL REFERENCES mesocycles(id),
                sequence INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS planned_workouts (
                id TEXT PRIMARY KEY,
                week_id TEXT NOT NULL REFERENCES plan_weeks(id),
                day_of_week INTEGER NOT NULL,
                workout_type TEXT NOT NULL,
                sport TEXT NOT NULL,
                duration_minutes INTEGER NOT NULL,
                target_tss REAL NOT NULL,
                target_zone TEXT NOT NULL,
                estimated_kcal INTEGER NOT NULL,
                scheduled_time TEXT
            );

            CREATE TABLE IF NOT EXISTS daily_state_docs (
                athlete_id TEXT NOT NULL,
                year INTEGER NOT NULL,
                document TEXT NOT NULL,
                PRIMARY KEY (athlete_id, year)
            );
            "#,
        )?;

        Ok(())
    }

    // Activities

    /// Insert or replace one activity record
    pub fn insert_activity(
        &self,
        athlete_id: &str,
        activity: &ActualActivity,
    ) -> Result<(), DatabaseError> {
        let zones_json = match &activity.zones_distribution {
            Some(dist) => Some(serde_json::to_string(dist)?),
            None => None,
        };

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO activities
                (id, athlete_id, activity_date, title, sport, duration_seconds,
                 tss, avg_hr, avg_power, calories, zones_distribution)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                activity.id,
                athlete_id,
                activity.activity_date,
                activity.title,
                activity.sport,
                activity.duration_seconds,
                activity.tss,
                activity.avg_hr,
                activity.avg_power,
                activity.calories,
                zones_json,
            ],
        )?;

        Ok(())
    }

    /// All activities for an athlete within `[start, end]`, date ascending
    pub fn activities_in_range(
        &self,
        athlete_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ActualActivity>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, activity_date, title, sport, duration_seconds,
                   tss, avg_hr, avg_power, calories, zones_distribution
            FROM activities
            WHERE athlete_id = ?1 AND activity_date >= ?2 AND activity_date <= ?3
            ORDER BY activity_date ASC
            "#,
        )?;

        let rows = stmt.query_map(params![athlete_id, start, end], Self::row_to_activity)?;
        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }

    fn row_to_activity(row: &Row<'_>) -> rusqlite::Result<ActualActivity> {
        let zones_json: Option<String> = row.get(9)?;
        let zones_distribution = zones_json.and_then(|json| serde_json::from_str(&json).ok());

        Ok(ActualActivity {
            id: row.get(0)?,
            activity_date: row.get(1)?,
            title: row.get(2)?,
            sport: row.get(3)?,
            duration_seconds: row.get(4)?,
            tss: row.get(5)?,
            avg_hr: row.get(6)?,
            avg_power: row.get(7)?,
            calories: row.get(8)?,
            zones_distribution,
        })
    }

    // Planned workouts

    /// Register a plan; `active` plans are the ones matching reaches
    pub fn insert_plan(
        &self,
        plan_id: &str,
        athlete_id: &str,
        name: &str,
        active: bool,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO training_plans (id, athlete_id, name, active) VALUES (?1, ?2, ?3, ?4)",
            params![plan_id, athlete_id, name, active],
        )?;
        Ok(())
    }

    pub fn insert_mesocycle(
        &self,
        mesocycle_id: &str,
        plan_id: &str,
        sequence: u32,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO mesocycles (id, plan_id, sequence) VALUES (?1, ?2, ?3)",
            params![mesocycle_id, plan_id, sequence],
        )?;
        Ok(())
    }

    pub fn insert_plan_week(
        &self,
        week_id: &str,
        mesocycle_id: &str,
        sequence: u32,
    ) -> Result<(), DatabaseError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO plan_weeks (id, mesocycle_id, sequence) VALUES (?1, ?2, ?3)",
            params![week_id, mesocycle_id, sequence],
        )?;
        Ok(())
    }

    pub fn insert_planned_workout(
        &self,
        week_id: &str,
        workout: &PlannedWorkout,
    ) -> Result<(), DatabaseError> {
        let id = workout.id.as_deref().ok_or_else(|| DatabaseError::NotFound {
            table: "planned_workouts".to_string(),
            id: "<synthetic>".to_string(),
        })?;

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO planned_workouts
                (id, week_id, day_of_week, workout_type, sport, duration_minutes,
                 target_tss, target_zone, estimated_kcal, scheduled_time)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                id,
                week_id,
                workout.day_of_week,
                workout.workout_type.as_str(),
                workout.sport,
                workout.duration_minutes,
                workout.target_tss,
                workout.target_zone,
                workout.estimated_kcal,
                workout.scheduled_time.map(|t| t.to_string()),
            ],
        )?;
        Ok(())
    }

    /// Every planned workout reachable from the athlete's active plan
    /// hierarchy (plan -> mesocycle -> week -> workout)
    pub fn planned_workouts_for_athlete(
        &self,
        athlete_id: &str,
    ) -> Result<Vec<PlannedWorkout>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT pw.id, pw.day_of_week, pw.workout_type, pw.sport,
                   pw.duration_minutes, pw.target_tss, pw.target_zone,
                   pw.estimated_kcal, pw.scheduled_time
            FROM planned_workouts pw
            JOIN plan_weeks w ON pw.week_id = w.id
            JOIN mesocycles m ON w.mesocycle_id = m.id
            JOIN training_plans p ON m.plan_id = p.id
            WHERE p.athlete_id = ?1 AND p.active = 1
            ORDER BY m.sequence, w.sequence, pw.day_of_week
            "#,
        )?;

        let rows = stmt.query_map(params![athlete_id], |row| {
            let workout_type: String = row.get(2)?;
            let scheduled_time: Option<String> = row.get(8)?;
            Ok(PlannedWorkout {
                id: Some(row.get(0)?),
                day_of_week: row.get(1)?,
                workout_type: WorkoutType::from_label(&workout_type),
                sport: row.get(3)?,
                duration_minutes: row.get(4)?,
                target_tss: row.get(5)?,
                target_zone: row.get(6)?,
                estimated_kcal: row.get(7)?,
                scheduled_time: scheduled_time.and_then(|t| t.parse().ok()),
            })
        })?;

        let mut workouts = Vec::new();
        for row in rows {
            workouts.push(row?);
        }
        Ok(workouts)
    }

    // Daily state documents

    /// Merge a daily state into the athlete's yearly document, pruning to
    /// the [`DAILY_STATE_WINDOW`] most recent dates.
    ///
    /// Failures are logged and reported as `false`, never raised; callers
    /// treat a failed save as "state not persisted".
    pub fn save_daily_state(&mut self, state: &AthleteDailyState) -> bool {
        match self.save_daily_state_inner(state) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    athlete_id = %state.athlete_id,
                    date = %state.state_date,
                    %err,
                    "failed to save daily state"
                );
                false
            }
        }
    }

    fn save_daily_state_inner(&mut self, state: &AthleteDailyState) -> Result<(), DatabaseError> {
        let year = state.state_date.year();
        let date_key = state.state_date.to_string();

        // The whole read-merge-write is one transaction: the document merge
        // is atomic at the store, closing the lost-update window between
        // concurrent saves for the same athlete.
        let tx = self.conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT document FROM daily_state_docs WHERE athlete_id = ?1 AND year = ?2",
                params![state.athlete_id, year],
                |row| row.get(0),
            )
            .optional()?;

        let mut document: YearlyStateDocument = match existing {
            Some(json) => serde_json::from_str(&json)?,
            None => YearlyStateDocument::default(),
        };

        document.daily_states.insert(date_key, state.clone());

        // Keep only the window's most recent dates. ISO date strings sort
        // chronologically, so descending string order is descending date.
        if document.daily_states.len() > DAILY_STATE_WINDOW {
            let mut dates: Vec<String> = document.daily_states.keys().cloned().collect();
            dates.sort_by(|a, b| b.cmp(a));
            for stale in dates.iter().skip(DAILY_STATE_WINDOW) {
                document.daily_states.remove(stale);
            }
        }

        let json = serde_json::to_string(&document)?;
        tx.execute(
            r#"
            INSERT INTO daily_state_docs (athlete_id, year, document)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(athlete_id, year) DO UPDATE SET document = excluded.document
            "#,
            params![state.athlete_id, year, json],
        )?;

        tx.commit()?;

        debug!(
            athlete_id = %state.athlete_id,
            date = %state.state_date,
            "saved daily state"
        );
        Ok(())
    }

    /// Load the persisted state for one date.
    ///
    /// A missing document and a missing date both mean "no state", not an
    /// error; store failures are logged and also surface as `None`.
    pub fn load_daily_state(&self, athlete_id: &str, date: NaiveDate) -> Option<AthleteDailyState> {
        match self.load_daily_state_inner(athlete_id, date) {
            Ok(state) => state,
            Err(err) => {
                warn!(athlete_id, %date, %err, "failed to load daily state");
                None
            }
        }
    }

    fn load_daily_state_inner(
        &self,
        athlete_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AthleteDailyState>, DatabaseError> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM daily_state_docs WHERE athlete_id = ?1 AND year = ?2",
                params![athlete_id, date.year()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(json) = existing else {
            return Ok(None);
        };

        let document: YearlyStateDocument = serde_json::from_str(&json)?;
        Ok(document.daily_states.get(&date.to_string()).cloned())
    }

    /// All retained dates for an athlete-year, most recent first
    pub fn daily_state_dates(
        &self,
        athlete_id: &str,
        year: i32,
    ) -> Result<Vec<NaiveDate>, DatabaseError> {
        let existing: Option<String> = self
            .conn
            .query_row(
                "SELECT document FROM daily_state_docs WHERE athlete_id = ?1 AND year = ?2",
                params![athlete_id, year],
                |row| row.get(0),
            )
            .optional()?;

        let Some(json) = existing else {
            return Ok(Vec::new());
        };

        let document: YearlyStateDocument = serde_json::from_str(&json)?;
        let mut dates: Vec<NaiveDate> = document
            .daily_states
            .keys()
            .filter_map(|key| key.parse().ok())
            .collect();
        dates.sort_by(|a, b| b.cmp(a));
        Ok(dates)
    }
}
