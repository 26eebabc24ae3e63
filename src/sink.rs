//! Boundaries to storage: where routines come from and where finished
//! workouts go

use thiserror::Error;
use tracing::{info, warn};

use crate::routine::Routine;
use crate::session::WorkoutRecord;

/// Supplies routines by id. An empty routine is a valid answer.
pub trait RoutineSource {
    fn load_routine(&self, routine_id: i64) -> anyhow::Result<Routine>;
}

/// Persists finished workouts, returning the stored id
pub trait WorkoutSink {
    fn store_workout(&self, record: &WorkoutRecord) -> anyhow::Result<i64>;
}

#[derive(Debug, Error)]
#[error("workout not saved after {attempts} attempt(s): {last_error}")]
pub struct SinkError {
    pub attempts: u32,
    pub last_error: anyhow::Error,
}

/// Best-effort save with up to `attempts` tries (at least one).
///
/// The session is already finished when this runs; a failure here is only
/// reported back to the caller.
pub fn save_workout<S: WorkoutSink + ?Sized>(
    sink: &S,
    record: &WorkoutRecord,
    attempts: u32,
) -> Result<i64, SinkError> {
    let attempts = attempts.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        match sink.store_workout(record) {
            Ok(id) => {
                info!(workout_id = id, routine = %record.routine_name, attempt, "workout saved");
                return Ok(id);
            }
            Err(e) => {
                warn!(routine = %record.routine_name, attempt, error = %e, "failed to save workout");
                last_err = Some(e);
            }
        }
    }

    Err(SinkError {
        attempts,
        last_error: last_err.unwrap_or_else(|| anyhow::anyhow!("no attempt made")),
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use chrono::Utc;

    use super::*;

    struct FlakySink {
        failures: Cell<u32>,
        calls: Cell<u32>,
    }

    impl FlakySink {
        fn failing(times: u32) -> Self {
            Self {
                failures: Cell::new(times),
                calls: Cell::new(0),
            }
        }
    }

    impl WorkoutSink for FlakySink {
        fn store_workout(&self, _record: &WorkoutRecord) -> anyhow::Result<i64> {
            self.calls.set(self.calls.get() + 1);
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                anyhow::bail!("backend unavailable");
            }
            Ok(42)
        }
    }

    fn create_record() -> WorkoutRecord {
        let now = Utc::now();
        WorkoutRecord {
            id: None,
            routine_id: None,
            routine_name: "push".to_string(),
            started_at: now,
            completed_at: now,
            exercises: vec![],
        }
    }

    #[test]
    fn test_save_first_try() {
        let sink = FlakySink::failing(0);
        assert_eq!(save_workout(&sink, &create_record(), 3).unwrap(), 42);
        assert_eq!(sink.calls.get(), 1);
    }

    #[test]
    fn test_save_retries_until_success() {
        let sink = FlakySink::failing(2);
        assert_eq!(save_workout(&sink, &create_record(), 3).unwrap(), 42);
        assert_eq!(sink.calls.get(), 3);
    }

    #[test]
    fn test_save_gives_up() {
        let sink = FlakySink::failing(5);
        let err = save_workout(&sink, &create_record(), 2).unwrap_err();
        assert_eq!(err.attempts, 2);
        assert_eq!(sink.calls.get(), 2);
        assert!(err.to_string().contains("backend unavailable"), "Error: {}", err);
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let sink = FlakySink::failing(0);
        assert!(save_workout(&sink, &create_record(), 0).is_ok());
        assert_eq!(sink.calls.get(), 1);
    }
}
