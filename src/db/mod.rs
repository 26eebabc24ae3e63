//! Database module - SQLite storage for routines and finished workouts

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use crate::routine::{ExerciseRef, Measure, Routine, RoutineExercise, TrackingMode, format_days, parse_days};
use crate::session::{ExerciseRecord, ExerciseStatus, WorkoutRecord};
use crate::sink::{RoutineSource, WorkoutSink};

/// Database wrapper
pub struct Database {
    conn: Connection,
}

/// Raw routine_exercises row before the target is validated
struct PlannedRow {
    exercise_id: String,
    exercise_name: String,
    tracking_mode: String,
    target_sets: u32,
    target_reps: Option<u32>,
    target_duration_secs: Option<u32>,
    target_distance: Option<f64>,
    rest_secs: u32,
}

impl Database {
    /// Open or create database
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Throwaway database, used by tests
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS routines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                days TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS routine_exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                routine_id INTEGER NOT NULL REFERENCES routines(id),
                position INTEGER NOT NULL,
                exercise_id TEXT NOT NULL,
                exercise_name TEXT NOT NULL,
                tracking_mode TEXT NOT NULL,
                target_sets INTEGER NOT NULL,
                target_reps INTEGER,
                target_duration_secs INTEGER,
                target_distance REAL,
                rest_secs INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS workouts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                routine_id INTEGER,
                routine_name TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS workout_exercises (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workout_id INTEGER NOT NULL REFERENCES workouts(id),
                position INTEGER NOT NULL,
                exercise_id TEXT NOT NULL,
                exercise_name TEXT NOT NULL,
                status TEXT NOT NULL,
                sets_completed INTEGER NOT NULL,
                performed TEXT NOT NULL,
                weight_used TEXT NOT NULL,
                duration_completed INTEGER
            );",
        )?;

        // Migration: add notes column if missing
        let has_notes: bool = self.conn
            .prepare("SELECT notes FROM workout_exercises LIMIT 1")
            .is_ok();
        if !has_notes {
            self.conn.execute(
                "ALTER TABLE workout_exercises ADD COLUMN notes TEXT",
                [],
            )?;
        }

        Ok(())
    }

    /// Add a routine together with its exercises
    pub fn add_routine(&self, routine: &Routine) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO routines (name, days, created_at) VALUES (?1, ?2, ?3)",
            params![routine.name, format_days(&routine.days), Utc::now().to_rfc3339()],
        )?;
        let routine_id = tx.last_insert_rowid();

        for (position, exercise) in routine.exercises.iter().enumerate() {
            insert_routine_exercise(&tx, routine_id, position as i64, exercise)?;
        }

        tx.commit()?;
        Ok(routine_id)
    }

    /// Append an exercise to the end of an existing routine
    pub fn add_routine_exercise(&self, routine_id: i64, exercise: &RoutineExercise) -> Result<i64> {
        let exists: Option<i64> = self.conn
            .query_row("SELECT id FROM routines WHERE id = ?1", [routine_id], |row| row.get(0))
            .optional()?;
        if exists.is_none() {
            return Err(anyhow!("routine {} not found", routine_id));
        }

        let position: i64 = self.conn.query_row(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM routine_exercises WHERE routine_id = ?1",
            [routine_id],
            |row| row.get(0),
        )?;
        insert_routine_exercise(&self.conn, routine_id, position, exercise)?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Get one routine with its exercises in order
    pub fn get_routine(&self, routine_id: i64) -> Result<Option<Routine>> {
        let header: Option<(String, String)> = self.conn
            .query_row(
                "SELECT name, days FROM routines WHERE id = ?1",
                [routine_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((name, days)) = header else {
            return Ok(None);
        };

        Ok(Some(Routine {
            id: Some(routine_id),
            name,
            days: parse_days(&days).map_err(|e| anyhow!(e))?,
            exercises: self.get_routine_exercises(routine_id)?,
        }))
    }

    /// Get all routines
    pub fn get_routines(&self) -> Result<Vec<Routine>> {
        let mut stmt = self.conn.prepare("SELECT id FROM routines ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut routines = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(routine) = self.get_routine(id)? {
                routines.push(routine);
            }
        }
        Ok(routines)
    }

    /// Routines assigned to the weekday of `date`
    pub fn routines_for(&self, date: NaiveDate) -> Result<Vec<Routine>> {
        Ok(self
            .get_routines()?
            .into_iter()
            .filter(|r| r.is_scheduled_on(date))
            .collect())
    }

    fn get_routine_exercises(&self, routine_id: i64) -> Result<Vec<RoutineExercise>> {
        let mut stmt = self.conn.prepare(
            "SELECT exercise_id, exercise_name, tracking_mode, target_sets, target_reps, target_duration_secs, target_distance, rest_secs
             FROM routine_exercises WHERE routine_id = ?1 ORDER BY position"
        )?;

        let rows = stmt.query_map([routine_id], |row| {
            Ok(PlannedRow {
                exercise_id: row.get(0)?,
                exercise_name: row.get(1)?,
                tracking_mode: row.get(2)?,
                target_sets: row.get(3)?,
                target_reps: row.get(4)?,
                target_duration_secs: row.get(5)?,
                target_distance: row.get(6)?,
                rest_secs: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(planned_from_row).collect()
    }

    /// Store a finished workout
    pub fn add_workout(&self, workout: &WorkoutRecord) -> Result<i64> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO workouts (routine_id, routine_name, started_at, completed_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                workout.routine_id,
                workout.routine_name,
                workout.started_at.to_rfc3339(),
                workout.completed_at.to_rfc3339(),
            ],
        )?;
        let workout_id = tx.last_insert_rowid();

        for (position, e) in workout.exercises.iter().enumerate() {
            tx.execute(
                "INSERT INTO workout_exercises (workout_id, position, exercise_id, exercise_name, status, sets_completed, performed, weight_used, duration_completed, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    workout_id,
                    position as i64,
                    e.exercise.id,
                    e.exercise.name,
                    e.status.as_str(),
                    e.sets_completed,
                    serde_json::to_string(&e.performed)?,
                    serde_json::to_string(&e.weight_used)?,
                    e.duration_completed,
                    e.notes,
                ],
            )?;
        }

        tx.commit()?;
        Ok(workout_id)
    }

    /// Get all workouts, newest first
    pub fn get_workouts(&self) -> Result<Vec<WorkoutRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, routine_id, routine_name, started_at, completed_at FROM workouts ORDER BY completed_at DESC, id DESC"
        )?;

        let headers = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

        let mut workouts = Vec::with_capacity(headers.len());
        for (id, routine_id, routine_name, started_at, completed_at) in headers {
            workouts.push(WorkoutRecord {
                id: Some(id),
                routine_id,
                routine_name,
                started_at: parse_timestamp(&started_at)?,
                completed_at: parse_timestamp(&completed_at)?,
                exercises: self.get_workout_exercises(id)?,
            });
        }
        Ok(workouts)
    }

    /// Whether any workout was completed on `date` (local time)
    pub fn has_workout_on(&self, date: NaiveDate) -> Result<bool> {
        Ok(self
            .get_workouts()?
            .iter()
            .any(|w| w.completed_at.with_timezone(&Local).date_naive() == date))
    }

    fn get_workout_exercises(&self, workout_id: i64) -> Result<Vec<ExerciseRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT exercise_id, exercise_name, status, sets_completed, performed, weight_used, duration_completed, notes
             FROM workout_exercises WHERE workout_id = ?1 ORDER BY position"
        )?;

        let rows = stmt.query_map([workout_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, Option<u32>>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name, status, sets_completed, performed, weight_used, duration_completed, notes)| {
                Ok(ExerciseRecord {
                    exercise: ExerciseRef { id, name },
                    sets_completed,
                    performed: serde_json::from_str(&performed).context("bad performed column")?,
                    weight_used: serde_json::from_str(&weight_used).context("bad weight_used column")?,
                    duration_completed,
                    status: ExerciseStatus::parse(&status)
                        .ok_or_else(|| anyhow!("unknown exercise status: {}", status))?,
                    notes,
                })
            })
            .collect()
    }
}

impl RoutineSource for Database {
    fn load_routine(&self, routine_id: i64) -> Result<Routine> {
        self.get_routine(routine_id)?
            .ok_or_else(|| anyhow!("routine {} not found", routine_id))
    }
}

impl WorkoutSink for Database {
    fn store_workout(&self, record: &WorkoutRecord) -> Result<i64> {
        self.add_workout(record)
    }
}

fn insert_routine_exercise(conn: &Connection, routine_id: i64, position: i64, exercise: &RoutineExercise) -> Result<()> {
    let target = &exercise.target;
    conn.execute(
        "INSERT INTO routine_exercises (routine_id, position, exercise_id, exercise_name, tracking_mode, target_sets, target_reps, target_duration_secs, target_distance, rest_secs)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            routine_id,
            position,
            exercise.exercise.id,
            exercise.exercise.name,
            exercise.tracking_mode().as_str(),
            exercise.target_sets,
            target.reps(),
            target.duration_secs(),
            target.distance(),
            exercise.rest_secs,
        ],
    )?;
    Ok(())
}

fn planned_from_row(row: PlannedRow) -> Result<RoutineExercise> {
    let mode = TrackingMode::parse(&row.tracking_mode)
        .ok_or_else(|| anyhow!("unknown tracking mode: {}", row.tracking_mode))?;

    let missing = |field: &str| anyhow!("{} missing for '{}'", field, row.exercise_name);
    let target = match mode {
        TrackingMode::SetsReps => Measure::Reps(row.target_reps.ok_or_else(|| missing("target_reps"))?),
        TrackingMode::Duration => Measure::Duration {
            secs: row.target_duration_secs.ok_or_else(|| missing("target_duration_secs"))?,
        },
        TrackingMode::DistanceDuration => Measure::DistanceDuration {
            distance: row.target_distance.ok_or_else(|| missing("target_distance"))?,
            secs: row.target_duration_secs.ok_or_else(|| missing("target_duration_secs"))?,
        },
    };

    Ok(RoutineExercise {
        exercise: ExerciseRef {
            id: row.exercise_id,
            name: row.exercise_name,
        },
        target_sets: row.target_sets,
        target,
        rest_secs: row.rest_secs,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("bad timestamp: {}", s))?
        .with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;

    fn create_routine() -> Routine {
        Routine::new("upper")
            .with_days(vec![Weekday::Mon, Weekday::Thu])
            .with_exercise(RoutineExercise::reps(ExerciseRef::new("pushup", "Push-up"), 3, 12, 60))
            .with_exercise(RoutineExercise::timed(ExerciseRef::new("plank", "Plank"), 2, 45, 30))
            .with_exercise(RoutineExercise::distance(ExerciseRef::new("run", "Run"), 1, 3.0, 1200, 0))
    }

    fn create_workout(routine_id: Option<i64>, days_ago: i64) -> WorkoutRecord {
        let completed_at = Utc::now() - chrono::Duration::days(days_ago);
        WorkoutRecord {
            id: None,
            routine_id,
            routine_name: "upper".to_string(),
            started_at: completed_at - chrono::Duration::minutes(40),
            completed_at,
            exercises: vec![ExerciseRecord {
                exercise: ExerciseRef::new("pushup", "Push-up"),
                sets_completed: 2,
                performed: vec![Measure::Reps(12), Measure::Reps(12)],
                weight_used: vec![],
                duration_completed: None,
                status: ExerciseStatus::Skipped,
                notes: Some("wrist sore".to_string()),
            }],
        }
    }

    #[test]
    fn test_routine_stored_and_loaded() {
        let db = Database::open_in_memory().unwrap();
        let routine = create_routine();
        let id = db.add_routine(&routine).unwrap();

        let loaded = db.get_routine(id).unwrap().unwrap();
        assert_eq!(loaded.id, Some(id));
        assert_eq!(loaded.name, routine.name);
        assert_eq!(loaded.days, routine.days);
        assert_eq!(loaded.exercises, routine.exercises);
    }

    #[test]
    fn test_missing_routine() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.get_routine(99).unwrap().is_none());
        assert!(db.load_routine(99).is_err());
    }

    #[test]
    fn test_empty_routine_loads() {
        let db = Database::open_in_memory().unwrap();
        let id = db.add_routine(&Routine::new("empty")).unwrap();
        let loaded = db.load_routine(id).unwrap();
        assert!(loaded.exercises.is_empty());
    }

    #[test]
    fn test_add_routine_exercise_appends() {
        let db = Database::open_in_memory().unwrap();
        let id = db.add_routine(&create_routine()).unwrap();
        let extra = RoutineExercise::reps(ExerciseRef::new("dip", "Dip"), 3, 8, 90);
        db.add_routine_exercise(id, &extra).unwrap();

        let loaded = db.load_routine(id).unwrap();
        assert_eq!(loaded.exercises.len(), 4);
        assert_eq!(loaded.exercises[3], extra);
        assert!(db.add_routine_exercise(1234, &extra).is_err());
    }

    #[test]
    fn test_routines_for_day() {
        let db = Database::open_in_memory().unwrap();
        db.add_routine(&create_routine()).unwrap();
        db.add_routine(&Routine::new("legs").with_days(vec![Weekday::Tue])).unwrap();

        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let names: Vec<_> = db.routines_for(monday).unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["upper".to_string()]);

        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert!(db.routines_for(sunday).unwrap().is_empty());
    }

    #[test]
    fn test_workout_round_trip_newest_first() {
        let db = Database::open_in_memory().unwrap();
        let older = create_workout(Some(1), 3);
        let newer = create_workout(None, 0);
        db.add_workout(&older).unwrap();
        let newer_id = db.store_workout(&newer).unwrap();

        let workouts = db.get_workouts().unwrap();
        assert_eq!(workouts.len(), 2);
        assert_eq!(workouts[0].id, Some(newer_id));
        assert_eq!(workouts[0].routine_id, None);
        assert_eq!(workouts[1].routine_id, Some(1));
        assert_eq!(workouts[0].exercises, newer.exercises);
        assert_eq!(workouts[0].duration_secs(), 40 * 60);
    }

    #[test]
    fn test_has_workout_on() {
        let db = Database::open_in_memory().unwrap();
        let today = Local::now().date_naive();
        assert!(!db.has_workout_on(today).unwrap());
        db.add_workout(&create_workout(None, 0)).unwrap();
        assert!(db.has_workout_on(today).unwrap());
    }
}
