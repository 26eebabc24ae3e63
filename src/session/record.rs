//! Workout completion record handed to the workout sink

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ExerciseStatus;
use crate::routine::{ExerciseRef, Measure};

/// Outcome of one exercise within a finished session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExerciseRecord {
    pub exercise: ExerciseRef,
    pub sets_completed: u32,
    pub performed: Vec<Measure>,
    /// Per-set weights. Not captured during a live session, always empty there.
    pub weight_used: Vec<f64>,
    pub duration_completed: Option<u32>,
    pub status: ExerciseStatus,
    pub notes: Option<String>,
}

impl ExerciseRecord {
    /// Reps across all performed sets (0 for timed work)
    pub fn total_reps(&self) -> u32 {
        self.performed.iter().filter_map(|m| m.reps()).sum()
    }

    /// Σ reps × weight; sets without a recorded weight count as 1.0
    pub fn volume(&self) -> f64 {
        self.performed
            .iter()
            .enumerate()
            .filter_map(|(i, m)| {
                let reps = m.reps()? as f64;
                Some(reps * self.weight_used.get(i).copied().unwrap_or(1.0))
            })
            .sum()
    }
}

/// Everything persisted when a session reaches `Finished`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    pub id: Option<i64>,
    pub routine_id: Option<i64>,
    pub routine_name: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub exercises: Vec<ExerciseRecord>,
}

impl WorkoutRecord {
    pub fn duration_secs(&self) -> i64 {
        (self.completed_at - self.started_at).num_seconds().max(0)
    }

    pub fn total_volume(&self) -> f64 {
        self.exercises.iter().map(|e| e.volume()).sum()
    }

    pub fn completed_count(&self) -> usize {
        self.exercises
            .iter()
            .filter(|e| e.status == ExerciseStatus::Completed)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.exercises
            .iter()
            .filter(|e| e.status == ExerciseStatus::Skipped)
            .count()
    }
}
