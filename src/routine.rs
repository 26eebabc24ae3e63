//! Routines - ordered exercise templates with per-exercise targets

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Which quantities are meaningful for an exercise occurrence
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TrackingMode {
    SetsReps,
    Duration,
    DistanceDuration,
}

impl TrackingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackingMode::SetsReps => "sets_reps",
            TrackingMode::Duration => "duration",
            TrackingMode::DistanceDuration => "distance_duration",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sets_reps" => Some(TrackingMode::SetsReps),
            "duration" => Some(TrackingMode::Duration),
            "distance_duration" => Some(TrackingMode::DistanceDuration),
            _ => None,
        }
    }
}

/// A target or performed value for one set.
///
/// The variant fixes the tracking mode, so a rep target can never travel
/// together with a duration-only exercise.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Measure {
    Reps(u32),
    Duration { secs: u32 },
    DistanceDuration { distance: f64, secs: u32 },
}

impl Measure {
    pub fn mode(&self) -> TrackingMode {
        match self {
            Measure::Reps(_) => TrackingMode::SetsReps,
            Measure::Duration { .. } => TrackingMode::Duration,
            Measure::DistanceDuration { .. } => TrackingMode::DistanceDuration,
        }
    }

    pub fn reps(&self) -> Option<u32> {
        match self {
            Measure::Reps(r) => Some(*r),
            _ => None,
        }
    }

    pub fn duration_secs(&self) -> Option<u32> {
        match self {
            Measure::Reps(_) => None,
            Measure::Duration { secs } | Measure::DistanceDuration { secs, .. } => Some(*secs),
        }
    }

    pub fn distance(&self) -> Option<f64> {
        match self {
            Measure::DistanceDuration { distance, .. } => Some(*distance),
            _ => None,
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Reps(r) => write!(f, "{} reps", r),
            Measure::Duration { secs } => write!(f, "{}s", secs),
            Measure::DistanceDuration { distance, secs } => write!(f, "{:.1} in {}s", distance, secs),
        }
    }
}

/// Opaque exercise identifier plus display name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ExerciseRef {
    pub id: String,
    pub name: String,
}

impl ExerciseRef {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// One planned exercise occurrence inside a routine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoutineExercise {
    pub exercise: ExerciseRef,
    pub target_sets: u32,
    pub target: Measure,
    pub rest_secs: u32,
}

impl RoutineExercise {
    pub fn reps(exercise: ExerciseRef, sets: u32, reps: u32, rest_secs: u32) -> Self {
        Self {
            exercise,
            target_sets: sets,
            target: Measure::Reps(reps),
            rest_secs,
        }
    }

    pub fn timed(exercise: ExerciseRef, sets: u32, secs: u32, rest_secs: u32) -> Self {
        Self {
            exercise,
            target_sets: sets,
            target: Measure::Duration { secs },
            rest_secs,
        }
    }

    pub fn distance(exercise: ExerciseRef, sets: u32, distance: f64, secs: u32, rest_secs: u32) -> Self {
        Self {
            exercise,
            target_sets: sets,
            target: Measure::DistanceDuration { distance, secs },
            rest_secs,
        }
    }

    pub fn tracking_mode(&self) -> TrackingMode {
        self.target.mode()
    }
}

/// Named, ordered template of exercises, optionally assigned to weekdays
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Routine {
    pub id: Option<i64>,
    pub name: String,
    pub days: Vec<Weekday>,
    pub exercises: Vec<RoutineExercise>,
}

impl Routine {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            days: Vec::new(),
            exercises: Vec::new(),
        }
    }

    pub fn with_days(mut self, days: Vec<Weekday>) -> Self {
        self.days = days;
        self
    }

    pub fn with_exercise(mut self, exercise: RoutineExercise) -> Self {
        self.exercises.push(exercise);
        self
    }

    /// Whether the routine is assigned to the weekday of `date`
    pub fn is_scheduled_on(&self, date: NaiveDate) -> bool {
        self.days.contains(&date.weekday())
    }
}

/// Build a target from optional CLI-style parts. Distance implies
/// distance+duration, seconds alone imply duration, otherwise reps; with no
/// parts at all the exercise's usual mode picks a default.
pub fn target_from_parts(
    usual: TrackingMode,
    reps: Option<u32>,
    secs: Option<u32>,
    distance: Option<f64>,
) -> Result<Measure, String> {
    match (reps, secs, distance) {
        (_, Some(secs), Some(distance)) => Ok(Measure::DistanceDuration { distance, secs }),
        (_, None, Some(_)) => Err("distance needs a duration (--secs)".to_string()),
        (_, Some(secs), None) => Ok(Measure::Duration { secs }),
        (Some(reps), None, None) => Ok(Measure::Reps(reps)),
        (None, None, None) => match usual {
            TrackingMode::SetsReps => Ok(Measure::Reps(10)),
            TrackingMode::Duration => Ok(Measure::Duration { secs: 60 }),
            TrackingMode::DistanceDuration => Err("distance exercises need --distance and --secs".to_string()),
        },
    }
}

/// Parse "mon,wed,fri" into weekdays, ignoring blanks
pub fn parse_days(s: &str) -> Result<Vec<Weekday>, String> {
    let mut days = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let day: Weekday = part
            .parse()
            .map_err(|_| format!("unknown weekday: {}", part))?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(days)
}

/// Inverse of [`parse_days`]
pub fn format_days(days: &[Weekday]) -> String {
    days.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_mode() {
        assert_eq!(Measure::Reps(10).mode(), TrackingMode::SetsReps);
        assert_eq!(Measure::Duration { secs: 30 }.mode(), TrackingMode::Duration);
        assert_eq!(
            Measure::DistanceDuration { distance: 5.0, secs: 1500 }.mode(),
            TrackingMode::DistanceDuration
        );
    }

    #[test]
    fn test_measure_fields() {
        let run = Measure::DistanceDuration { distance: 5.0, secs: 1500 };
        assert_eq!(run.reps(), None);
        assert_eq!(run.duration_secs(), Some(1500));
        assert_eq!(run.distance(), Some(5.0));
        assert_eq!(Measure::Reps(8).reps(), Some(8));
        assert_eq!(Measure::Reps(8).duration_secs(), None);
    }

    #[test]
    fn test_tracking_mode_parse() {
        for mode in [TrackingMode::SetsReps, TrackingMode::Duration, TrackingMode::DistanceDuration] {
            assert_eq!(TrackingMode::parse(mode.as_str()), Some(mode));
        }
        assert_eq!(TrackingMode::parse("weight"), None);
    }

    #[test]
    fn test_scheduled_on() {
        let routine = Routine::new("push").with_days(vec![Weekday::Mon, Weekday::Thu]);
        // 2026-10-19 is a Monday
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert!(routine.is_scheduled_on(monday));
        assert!(!routine.is_scheduled_on(monday.succ_opt().unwrap()));
        assert!(routine.is_scheduled_on(monday + chrono::Duration::days(3)));
    }

    #[test]
    fn test_unscheduled_routine() {
        let routine = Routine::new("any day");
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert!(!routine.is_scheduled_on(date));
    }

    #[test]
    fn test_target_from_parts() {
        use TrackingMode::*;
        assert_eq!(target_from_parts(SetsReps, Some(8), None, None), Ok(Measure::Reps(8)));
        assert_eq!(target_from_parts(SetsReps, None, Some(40), None), Ok(Measure::Duration { secs: 40 }));
        assert_eq!(
            target_from_parts(SetsReps, None, Some(600), Some(2.0)),
            Ok(Measure::DistanceDuration { distance: 2.0, secs: 600 })
        );
        assert!(target_from_parts(SetsReps, None, None, Some(2.0)).is_err());
        assert_eq!(target_from_parts(SetsReps, None, None, None), Ok(Measure::Reps(10)));
        assert_eq!(target_from_parts(Duration, None, None, None), Ok(Measure::Duration { secs: 60 }));
        assert!(target_from_parts(DistanceDuration, None, None, None).is_err());
    }

    #[test]
    fn test_parse_days() {
        let days = parse_days("mon, wed,,fri,mon").unwrap();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        assert_eq!(format_days(&days), "Mon,Wed,Fri");
        assert!(parse_days("someday").is_err());
        assert!(parse_days("").unwrap().is_empty());
    }
}
