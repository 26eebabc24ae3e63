//! End-to-end: routine from storage -> session -> stored workout

use setwise::db::Database;
use setwise::routine::{ExerciseRef, Measure, Routine, RoutineExercise};
use setwise::session::{ExerciseStatus, Phase, SessionController, SessionError, Transition};
use setwise::sink::{RoutineSource, save_workout};
use setwise::stats::Analytics;
use setwise::ticker::{IntervalTicker, ManualTicker};

fn seed(db: &Database) -> i64 {
    let routine = Routine::new("full body")
        .with_exercise(RoutineExercise::reps(ExerciseRef::new("squat", "Back squat"), 3, 5, 60))
        .with_exercise(RoutineExercise::reps(ExerciseRef::new("pullup", "Pull-up"), 2, 8, 90))
        .with_exercise(RoutineExercise::timed(ExerciseRef::new("plank", "Plank"), 1, 45, 0));
    db.add_routine(&routine).unwrap()
}

#[test]
fn test_workout_is_stored_after_session() {
    let db = Database::open_in_memory().unwrap();
    let routine_id = seed(&db);
    let routine = db.load_routine(routine_id).unwrap();

    let mut session = SessionController::new(routine, ManualTicker::new());
    session.start().unwrap();

    let mut rests = 0;
    let record = loop {
        let transition = if session.phase() == Phase::Resting {
            // Count the rest down to the end
            rests += 1;
            loop {
                if let Some(t) = session.tick() {
                    break t;
                }
            }
        } else if session.state().current_exercise == 1 && session.state().current_set == 2 {
            session.skip_set().unwrap()
        } else {
            session.complete_set().unwrap()
        };

        if let Transition::Finished(record) = transition {
            break record;
        }
    };

    // Squat: 2 rests; pull-up: 1 rest before the skipped last set
    assert_eq!(rests, 3);
    assert_eq!(session.phase(), Phase::Finished);

    let id = save_workout(&db, &record, 3).unwrap();
    let stored = db.get_workouts().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, Some(id));
    assert_eq!(stored[0].routine_id, Some(routine_id));

    let statuses: Vec<_> = stored[0].exercises.iter().map(|e| e.status).collect();
    assert_eq!(statuses, vec![ExerciseStatus::Completed, ExerciseStatus::Skipped, ExerciseStatus::Completed]);
    assert_eq!(stored[0].exercises[1].sets_completed, 1);
    assert_eq!(stored[0].exercises[2].performed, vec![Measure::Duration { secs: 45 }]);

    // 3x5 squats + 1x8 pull-ups, no weights recorded
    let analytics = Analytics::new(stored);
    assert_eq!(analytics.total_volume("squat"), 15.0);
    assert_eq!(analytics.total_volume("pull"), 8.0);
}

#[test]
fn test_empty_routine_from_storage_is_refused() {
    let db = Database::open_in_memory().unwrap();
    let id = db.add_routine(&Routine::new("nothing yet")).unwrap();
    let mut session = SessionController::new(db.load_routine(id).unwrap(), ManualTicker::new());
    assert_eq!(session.start(), Err(SessionError::EmptyRoutine));
    assert_eq!(session.phase(), Phase::NotStarted);
}

#[tokio::test(start_paused = true)]
async fn test_real_ticker_drives_rest_to_completion() {
    let routine = Routine::new("quick")
        .with_exercise(RoutineExercise::reps(ExerciseRef::new("pushup", "Push-up"), 2, 10, 3));
    let (ticker, mut ticks) = IntervalTicker::every_second();
    let mut session = SessionController::new(routine, ticker);
    session.start().unwrap();

    assert_eq!(session.complete_set().unwrap(), Transition::Resting { rest_secs: 3 });

    let mut over = None;
    while over.is_none() {
        ticks.recv().await.unwrap();
        over = session.tick();
    }
    assert_eq!(over, Some(Transition::RestOver { skipped: false }));
    assert_eq!(session.phase(), Phase::Exercising);
    assert_eq!(session.state().current_set, 2);
}
