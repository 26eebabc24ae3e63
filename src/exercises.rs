//! Exercise catalog - built-in exercises for routine building

use serde::{Deserialize, Serialize};

use crate::routine::{ExerciseRef, TrackingMode};

#[derive(Debug, Clone)]
pub struct Exercise {
    pub id: &'static str,
    pub name: &'static str,
    pub category: Category,
    pub mode: TrackingMode, // how the exercise is usually tracked
    pub description: Option<&'static str>,
}

impl Exercise {
    pub fn to_ref(&self) -> ExerciseRef {
        ExerciseRef::new(self.id, self.name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Category {
    Push,
    Pull,
    Core,
    Legs,
    Cardio,
}

impl Category {
    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Push => "💪",
            Category::Pull => "🏋️",
            Category::Core => "🎯",
            Category::Legs => "🦵",
            Category::Cardio => "🏃",
        }
    }
}

pub const CATALOG: &[Exercise] = &[
    Exercise {
        id: "bench_press",
        name: "Bench press",
        category: Category::Push,
        mode: TrackingMode::SetsReps,
        description: None,
    },
    Exercise {
        id: "pushup",
        name: "Push-up",
        category: Category::Push,
        mode: TrackingMode::SetsReps,
        description: None,
    },
    Exercise {
        id: "overhead_press",
        name: "Overhead press",
        category: Category::Push,
        mode: TrackingMode::SetsReps,
        description: None,
    },
    Exercise {
        id: "pullup",
        name: "Pull-up",
        category: Category::Pull,
        mode: TrackingMode::SetsReps,
        description: None,
    },
    Exercise {
        id: "barbell_row",
        name: "Barbell row",
        category: Category::Pull,
        mode: TrackingMode::SetsReps,
        description: Some("Hinge to ~45°, pull the bar to the lower ribs"),
    },
    Exercise {
        id: "deadlift",
        name: "Deadlift",
        category: Category::Pull,
        mode: TrackingMode::SetsReps,
        description: None,
    },
    Exercise {
        id: "squat",
        name: "Back squat",
        category: Category::Legs,
        mode: TrackingMode::SetsReps,
        description: None,
    },
    Exercise {
        id: "lunge",
        name: "Walking lunge",
        category: Category::Legs,
        mode: TrackingMode::SetsReps,
        description: None,
    },
    Exercise {
        id: "plank",
        name: "Plank",
        category: Category::Core,
        mode: TrackingMode::Duration,
        description: Some("Forearms under shoulders, body in one line"),
    },
    Exercise {
        id: "hanging_knee_raise",
        name: "Hanging knee raise",
        category: Category::Core,
        mode: TrackingMode::SetsReps,
        description: None,
    },
    Exercise {
        id: "jump_rope",
        name: "Jump rope",
        category: Category::Cardio,
        mode: TrackingMode::Duration,
        description: None,
    },
    Exercise {
        id: "run",
        name: "Run",
        category: Category::Cardio,
        mode: TrackingMode::DistanceDuration,
        description: None,
    },
    Exercise {
        id: "row_erg",
        name: "Rowing machine",
        category: Category::Cardio,
        mode: TrackingMode::DistanceDuration,
        description: None,
    },
];

pub fn get_all_exercises() -> &'static [Exercise] {
    CATALOG
}

pub fn find_exercise(id: &str) -> Option<&'static Exercise> {
    CATALOG.iter().find(|e| e.id == id)
}

/// Catalog entry for `id`, or an ad-hoc reference named after it
pub fn resolve(id_or_name: &str) -> ExerciseRef {
    match find_exercise(id_or_name) {
        Some(ex) => ex.to_ref(),
        None => {
            let id = id_or_name.trim().to_lowercase().replace(' ', "_");
            ExerciseRef::new(&id, id_or_name.trim())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_unique() {
        let mut ids: Vec<_> = CATALOG.iter().map(|e| e.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), CATALOG.len());
    }

    #[test]
    fn test_find_exercise() {
        let plank = find_exercise("plank").unwrap();
        assert_eq!(plank.mode, TrackingMode::Duration);
        assert!(find_exercise("unknown").is_none());
    }

    #[test]
    fn test_resolve_catalog_and_custom() {
        assert_eq!(resolve("squat"), ExerciseRef::new("squat", "Back squat"));
        assert_eq!(resolve(" Farmer Carry "), ExerciseRef::new("farmer_carry", "Farmer Carry"));
    }
}
