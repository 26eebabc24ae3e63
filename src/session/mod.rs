//! Workout session - sequencing exercises, sets and rest periods
//!
//! A [`SessionController`] walks an ordered routine exercise by exercise and
//! set by set. Between sets of the same exercise it runs a [`RestTimer`],
//! driven by an injected [`Ticker`]. When the last exercise closes, it
//! assembles a [`WorkoutRecord`] for the workout sink.
//!
//! The controller takes `&mut self` for every transition, so callers that
//! share it across tasks must put it behind a single lock or owner.

mod error;
mod record;

pub use error::{Result, SessionError};
pub use record::{ExerciseRecord, WorkoutRecord};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::routine::{Measure, Routine, RoutineExercise};
use crate::ticker::Ticker;
use crate::timer::{RestTimer, TimerSignal};

/// Default extension applied by [`SessionController::add_rest_time`]
pub const DEFAULT_REST_INCREMENT_SECS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    NotStarted,
    Exercising,
    Resting,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExerciseStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl ExerciseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseStatus::Pending => "pending",
            ExerciseStatus::InProgress => "in_progress",
            ExerciseStatus::Completed => "completed",
            ExerciseStatus::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ExerciseStatus::Pending),
            "in_progress" => Some(ExerciseStatus::InProgress),
            "completed" => Some(ExerciseStatus::Completed),
            "skipped" => Some(ExerciseStatus::Skipped),
            _ => None,
        }
    }

    /// Completed or skipped
    pub fn is_closed(&self) -> bool {
        matches!(self, ExerciseStatus::Completed | ExerciseStatus::Skipped)
    }
}

/// Mutable progress for one routine exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionExerciseState {
    pub sets_completed: u32,
    pub performed: Vec<Measure>,
    pub status: ExerciseStatus,
    pub notes: Option<String>,
}

impl Default for SessionExerciseState {
    fn default() -> Self {
        Self {
            sets_completed: 0,
            performed: Vec::new(),
            status: ExerciseStatus::Pending,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionExercise {
    pub plan: RoutineExercise,
    pub state: SessionExerciseState,
}

/// The whole run. Exercise order is fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub routine_id: Option<i64>,
    pub routine_name: String,
    pub exercises: Vec<SessionExercise>,
    pub current_exercise: usize,
    /// 1-based set number within the current exercise
    pub current_set: u32,
    pub phase: Phase,
    /// Present only while resting
    pub rest: Option<RestTimer>,
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionState {
    fn from_routine(routine: Routine) -> Self {
        let exercises = routine
            .exercises
            .into_iter()
            .map(|plan| SessionExercise {
                plan,
                state: SessionExerciseState::default(),
            })
            .collect();

        Self {
            routine_id: routine.id,
            routine_name: routine.name,
            exercises,
            current_exercise: 0,
            current_set: 1,
            phase: Phase::NotStarted,
            rest: None,
            started_at: None,
        }
    }
}

/// What a user action or tick did to the session
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Rest period started after a completed set
    Resting { rest_secs: u32 },
    /// Next set of the same exercise, no rest in between
    NextSet,
    /// Moved on to the exercise at `index`
    NextExercise { index: usize },
    /// Rest ended, either by countdown or by skip
    RestOver { skipped: bool },
    /// Last exercise closed; the record is ready for the sink
    Finished(WorkoutRecord),
}

pub struct SessionController<T: Ticker> {
    state: SessionState,
    ticker: T,
    rest_increment_secs: u32,
}

impl<T: Ticker> SessionController<T> {
    pub fn new(routine: Routine, ticker: T) -> Self {
        Self {
            state: SessionState::from_routine(routine),
            ticker,
            rest_increment_secs: DEFAULT_REST_INCREMENT_SECS,
        }
    }

    pub fn with_rest_increment(mut self, secs: u32) -> Self {
        self.rest_increment_secs = secs;
        self
    }

    /// Enter the first exercise. Refuses empty routines and zero-set
    /// exercises; the phase then stays `NotStarted`.
    pub fn start(&mut self) -> Result<()> {
        if self.state.phase != Phase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        if self.state.exercises.is_empty() {
            warn!(routine = %self.state.routine_name, "refusing to start empty routine");
            return Err(SessionError::EmptyRoutine);
        }
        if let Some(ex) = self.state.exercises.iter().find(|e| e.plan.target_sets == 0) {
            warn!(routine = %self.state.routine_name, exercise = %ex.plan.exercise.name, "refusing to start: zero target sets");
            return Err(SessionError::ZeroTargetSets(ex.plan.exercise.name.clone()));
        }

        self.state.phase = Phase::Exercising;
        self.state.current_exercise = 0;
        self.state.current_set = 1;
        self.state.exercises[0].state.status = ExerciseStatus::InProgress;
        self.state.started_at = Some(Utc::now());

        info!(
            routine = %self.state.routine_name,
            exercises = self.state.exercises.len(),
            "session started"
        );
        Ok(())
    }

    /// Record the current set as done (at its target value). Rests before
    /// the next set; closes the exercise on its last set.
    pub fn complete_set(&mut self) -> Result<Transition> {
        self.ensure_exercising()?;

        let current = &mut self.state.exercises[self.state.current_exercise];
        let target_sets = current.plan.target_sets;
        let rest_secs = current.plan.rest_secs;
        current.state.performed.push(current.plan.target);
        current.state.sets_completed += 1;
        let sets_completed = current.state.sets_completed;

        debug!(
            exercise = %current.plan.exercise.name,
            set = self.state.current_set,
            of = target_sets,
            "set completed"
        );

        if self.state.current_set < target_sets {
            self.state.current_set += 1;
            return Ok(self.begin_rest(rest_secs));
        }

        let status = if sets_completed == target_sets {
            ExerciseStatus::Completed
        } else {
            // An earlier set was skipped
            ExerciseStatus::Skipped
        };
        Ok(self.close_exercise(status))
    }

    /// Skip the current set. Never rests; skipping the last set marks the
    /// exercise skipped.
    pub fn skip_set(&mut self) -> Result<Transition> {
        self.ensure_exercising()?;

        let current = &self.state.exercises[self.state.current_exercise];
        debug!(
            exercise = %current.plan.exercise.name,
            set = self.state.current_set,
            "set skipped"
        );

        if self.state.current_set < current.plan.target_sets {
            self.state.current_set += 1;
            return Ok(Transition::NextSet);
        }
        Ok(self.close_exercise(ExerciseStatus::Skipped))
    }

    /// One second elapsed. Returns `RestOver` when the countdown completes.
    pub fn tick(&mut self) -> Option<Transition> {
        if self.state.phase != Phase::Resting {
            return None;
        }
        let signal = self.state.rest.as_mut()?.tick()?;
        Some(self.end_rest(signal))
    }

    pub fn skip_rest(&mut self) -> Result<Transition> {
        let signal = self.rest_timer_mut()?.skip().unwrap_or(TimerSignal::Skipped);
        Ok(self.end_rest(signal))
    }

    /// Extend the running rest by the configured increment
    pub fn add_rest_time(&mut self) -> Result<()> {
        let secs = self.rest_increment_secs;
        self.rest_timer_mut()?.add_time(secs);
        Ok(())
    }

    pub fn toggle_rest(&mut self) -> Result<()> {
        self.rest_timer_mut()?.toggle();
        Ok(())
    }

    pub fn reset_rest(&mut self) -> Result<()> {
        self.rest_timer_mut()?.reset();
        Ok(())
    }

    /// Attach a note to the current exercise
    pub fn set_note(&mut self, note: &str) -> Result<()> {
        match self.state.phase {
            Phase::Exercising | Phase::Resting => {
                let note = note.trim();
                self.state.exercises[self.state.current_exercise].state.notes =
                    (!note.is_empty()).then(|| note.to_string());
                Ok(())
            }
            phase => Err(SessionError::NotExercising(phase)),
        }
    }

    /// Closed exercises over total exercises
    pub fn progress(&self) -> f64 {
        let total = self.state.exercises.len();
        if total == 0 {
            return 0.0;
        }
        let closed = self
            .state
            .exercises
            .iter()
            .filter(|e| e.state.status.is_closed())
            .count();
        closed as f64 / total as f64
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The exercise being performed, while the session is active
    pub fn current_exercise(&self) -> Option<&SessionExercise> {
        match self.state.phase {
            Phase::Exercising | Phase::Resting => self.state.exercises.get(self.state.current_exercise),
            _ => None,
        }
    }

    pub fn rest_timer(&self) -> Option<&RestTimer> {
        self.state.rest.as_ref()
    }

    pub fn ticker(&self) -> &T {
        &self.ticker
    }

    fn ensure_exercising(&self) -> Result<()> {
        match self.state.phase {
            Phase::Exercising => Ok(()),
            phase => Err(SessionError::NotExercising(phase)),
        }
    }

    fn rest_timer_mut(&mut self) -> Result<&mut RestTimer> {
        let phase = self.state.phase;
        match (phase, self.state.rest.as_mut()) {
            (Phase::Resting, Some(timer)) => Ok(timer),
            _ => Err(SessionError::NotResting(phase)),
        }
    }

    fn begin_rest(&mut self, rest_secs: u32) -> Transition {
        let mut timer = RestTimer::new();
        if timer.start(rest_secs).is_some() {
            // Zero-second rest completes on the spot
            return Transition::NextSet;
        }

        self.state.rest = Some(timer);
        self.state.phase = Phase::Resting;
        self.ticker.start();
        debug!(rest_secs, "rest started");
        Transition::Resting { rest_secs }
    }

    fn end_rest(&mut self, signal: TimerSignal) -> Transition {
        self.ticker.cancel();
        self.state.rest = None;
        self.state.phase = Phase::Exercising;
        let skipped = signal == TimerSignal::Skipped;
        debug!(skipped, "rest over");
        Transition::RestOver { skipped }
    }

    fn close_exercise(&mut self, status: ExerciseStatus) -> Transition {
        let idx = self.state.current_exercise;
        self.state.exercises[idx].state.status = status;
        info!(
            exercise = %self.state.exercises[idx].plan.exercise.name,
            status = status.as_str(),
            "exercise closed"
        );

        let next = idx + 1;
        if next < self.state.exercises.len() {
            self.state.current_exercise = next;
            self.state.current_set = 1;
            self.state.exercises[next].state.status = ExerciseStatus::InProgress;
            return Transition::NextExercise { index: next };
        }

        self.state.phase = Phase::Finished;
        self.ticker.cancel();
        let record = self.build_record();
        info!(
            routine = %record.routine_name,
            completed = record.completed_count(),
            skipped = record.skipped_count(),
            "session finished"
        );
        Transition::Finished(record)
    }

    fn build_record(&self) -> WorkoutRecord {
        let completed_at = Utc::now();
        let exercises = self
            .state
            .exercises
            .iter()
            .map(|e| ExerciseRecord {
                exercise: e.plan.exercise.clone(),
                sets_completed: e.state.sets_completed,
                performed: e.state.performed.clone(),
                weight_used: Vec::new(),
                duration_completed: None,
                status: e.state.status,
                notes: e.state.notes.clone(),
            })
            .collect();

        WorkoutRecord {
            id: None,
            routine_id: self.state.routine_id,
            routine_name: self.state.routine_name.clone(),
            started_at: self.state.started_at.unwrap_or(completed_at),
            completed_at,
            exercises,
        }
    }
}

impl<T: Ticker> Drop for SessionController<T> {
    fn drop(&mut self) {
        self.ticker.cancel();
    }
}
