//! Stats module - Workout volume, frequency and progress predictions
//!
//! Features:
//! - Volume aggregation (reps × weight)
//! - Per-day volume series for progress charts
//! - Progress prediction using linear regression (linfa)

pub mod predictor;

pub use predictor::ProgressPredictor;

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};

use crate::session::{ExerciseRecord, ExerciseStatus, WorkoutRecord};

/// Workout analytics
pub struct Analytics {
    workouts: Vec<WorkoutRecord>,
}

impl Analytics {
    pub fn new(workouts: Vec<WorkoutRecord>) -> Self {
        Self { workouts }
    }

    /// Exercise entries whose name matches `exercise` (case-insensitive substring)
    fn entries<'a>(&'a self, exercise: &'a str) -> impl Iterator<Item = (&'a WorkoutRecord, &'a ExerciseRecord)> + 'a {
        let needle = exercise.to_lowercase();
        self.workouts.iter().flat_map(move |w| {
            let needle = needle.clone();
            w.exercises
                .iter()
                .filter(move |e| e.exercise.name.to_lowercase().contains(&needle))
                .map(move |e| (w, e))
        })
    }

    /// Calculate total volume (reps × weight) for an exercise
    pub fn total_volume(&self, exercise: &str) -> f64 {
        self.entries(exercise).map(|(_, e)| e.volume()).sum()
    }

    /// Volume per calendar day, oldest first
    pub fn volume_by_day(&self, exercise: &str) -> Vec<(NaiveDate, f64)> {
        let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for (workout, entry) in self.entries(exercise) {
            let day = workout.completed_at.with_timezone(&Local).date_naive();
            *days.entry(day).or_insert(0.0) += entry.volume();
        }
        days.into_iter().collect()
    }

    /// Share of exercise entries that were completed rather than skipped
    pub fn completion_rate(&self) -> f64 {
        let entries: Vec<_> = self.workouts.iter().flat_map(|w| w.exercises.iter()).collect();
        if entries.is_empty() {
            return 0.0;
        }
        let completed = entries.iter().filter(|e| e.status == ExerciseStatus::Completed).count();
        completed as f64 / entries.len() as f64
    }

    /// Get workout frequency (sessions per week)
    pub fn weekly_frequency(&self) -> f64 {
        if self.workouts.len() < 2 {
            return 0.0;
        }

        let dates: Vec<_> = self.workouts.iter().map(|w| w.completed_at.date_naive()).collect();
        let (Some(first), Some(last)) = (dates.iter().min(), dates.iter().max()) else {
            return 0.0;
        };
        let days = (*last - *first).num_days() as f64;

        if days == 0.0 {
            return self.workouts.len() as f64;
        }

        (self.workouts.len() as f64 / days) * 7.0
    }

    /// Suggest next (sets, reps) from the last five sessions of an exercise
    pub fn predict_next_load(&self, exercise: &str) -> Option<(u32, u32)> {
        let recent: Vec<_> = self
            .entries(exercise)
            .map(|(_, e)| e)
            .filter(|e| e.sets_completed > 0 && e.total_reps() > 0)
            .take(5)
            .collect();

        if recent.is_empty() {
            return None;
        }

        let n = recent.len() as u32;
        let avg_sets = recent.iter().map(|e| e.sets_completed).sum::<u32>() / n;
        let avg_reps = recent.iter().map(|e| e.total_reps() / e.sets_completed).sum::<u32>() / n;

        // Slight progression suggestion
        Some((avg_sets, avg_reps + 1))
    }
}
