//! setwise - Workout routine runner

use anyhow::{Result, anyhow};
use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::Level;

use setwise::config::{Config, DEFAULT_DB_PATH};
use setwise::db::Database;
use setwise::exercises::{find_exercise, get_all_exercises, resolve};
use setwise::routine::{Routine, RoutineExercise, TrackingMode, format_days, parse_days, target_from_parts};
use setwise::sink::RoutineSource;
use setwise::stats::{Analytics, ProgressPredictor};
use setwise::timer::format_clock;
use setwise::tui::{App, TrainingOutcome, TrainingScreen};

#[derive(Parser)]
#[command(name = "setwise")]
#[command(author, version, about = "Workout routines with rest timer and progress tracking")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "SETWISE_DB", default_value = DEFAULT_DB_PATH)]
    db: String,

    /// Seconds added when extending a rest
    #[arg(long, global = true, env = "SETWISE_REST_INCREMENT", default_value = "30")]
    rest_increment: u32,

    /// Attempts to save a finished workout
    #[arg(long, global = true, env = "SETWISE_SAVE_ATTEMPTS", default_value = "3")]
    save_attempts: u32,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open workout history dashboard
    Tui,

    /// Run a routine with the live training screen
    Train {
        /// Routine id (see `routine list`)
        routine_id: i64,
    },

    /// Manage routines
    #[command(subcommand)]
    Routine(RoutineCommand),

    /// List built-in exercises
    Exercises,

    /// Show routines scheduled for today
    Today,

    /// List finished workouts
    History {
        /// Number of records to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show workout statistics
    Stats {
        /// Filter by exercise name
        exercise: Option<String>,
    },

    /// Start Telegram bot
    Bot {
        /// Telegram bot token (or set TELOXIDE_TOKEN env var)
        #[arg(short, long, env = "TELOXIDE_TOKEN")]
        token: String,
    },
}

#[derive(Subcommand)]
enum RoutineCommand {
    /// Create an empty routine
    Create {
        name: String,

        /// Weekdays, e.g. "mon,thu"
        #[arg(short, long, default_value = "")]
        days: String,
    },

    /// Append an exercise to a routine
    Add {
        routine_id: i64,

        /// Catalog id (see `exercises`) or a custom name
        exercise: String,

        #[arg(short, long, default_value = "3")]
        sets: u32,

        #[arg(short, long)]
        reps: Option<u32>,

        /// Duration per set in seconds
        #[arg(long)]
        secs: Option<u32>,

        /// Distance per set
        #[arg(long)]
        distance: Option<f64>,

        /// Rest after each set in seconds
        #[arg(long, default_value = "60")]
        rest: u32,
    },

    /// List routines
    List,

    /// Show one routine
    Show { routine_id: i64 },
}

fn print_routine(routine: &Routine) {
    let days = if routine.days.is_empty() { "-".to_string() } else { format_days(&routine.days) };
    println!("#{} {} [{}]", routine.id.unwrap_or_default(), routine.name, days);
    for (i, ex) in routine.exercises.iter().enumerate() {
        println!(
            "  {}. {:24} {}x {:14} rest {}",
            i + 1,
            ex.exercise.name,
            ex.target_sets,
            ex.target.to_string(),
            format_clock(ex.rest_secs)
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Keep the terminal screens clean
    let level = match cli.command {
        None | Some(Commands::Tui) | Some(Commands::Train { .. }) => Level::WARN,
        _ => Level::INFO,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::new()
        .with_db_path(cli.db)
        .with_rest_increment(cli.rest_increment)
        .with_save_attempts(cli.save_attempts);
    let db = Database::open(&config.db_path)?;

    match cli.command {
        Some(Commands::Tui) | None => {
            let mut app = App::new(db)?;
            app.run()?;
        }

        Some(Commands::Train { routine_id }) => {
            let routine = db.load_routine(routine_id)?;
            let name = routine.name.clone();

            let screen = match TrainingScreen::new(routine, &db, &config) {
                Ok(screen) => screen,
                Err(e) => {
                    println!("Can't start '{}': {}", name, e);
                    println!("Add exercises with: setwise routine add {} <exercise>", routine_id);
                    return Ok(());
                }
            };

            match screen.run()? {
                TrainingOutcome::Saved(id) => println!("Workout saved (id: {})", id),
                TrainingOutcome::SaveFailed(e) => println!("Workout finished but not saved: {}", e),
                TrainingOutcome::Abandoned => println!("Workout abandoned"),
            }
        }

        Some(Commands::Routine(cmd)) => match cmd {
            RoutineCommand::Create { name, days } => {
                let days = parse_days(&days).map_err(|e| anyhow!(e))?;
                let id = db.add_routine(&Routine::new(&name).with_days(days))?;
                println!("Created routine '{}' (id: {})", name, id);
            }

            RoutineCommand::Add { routine_id, exercise, sets, reps, secs, distance, rest } => {
                let usual = find_exercise(&exercise).map(|e| e.mode).unwrap_or(TrackingMode::SetsReps);
                let target = target_from_parts(usual, reps, secs, distance).map_err(|e| anyhow!(e))?;
                let planned = RoutineExercise {
                    exercise: resolve(&exercise),
                    target_sets: sets,
                    target,
                    rest_secs: rest,
                };
                db.add_routine_exercise(routine_id, &planned)?;
                println!("Added: {} - {}x {}", planned.exercise.name, sets, planned.target);
            }

            RoutineCommand::List => {
                for routine in db.get_routines()? {
                    print_routine(&routine);
                }
            }

            RoutineCommand::Show { routine_id } => {
                print_routine(&db.load_routine(routine_id)?);
            }
        },

        Some(Commands::Exercises) => {
            for ex in get_all_exercises() {
                println!("{} {:20} {:26} {}", ex.category.emoji(), ex.id, ex.name, ex.mode.as_str());
            }
        }

        Some(Commands::Today) => {
            let today = Local::now().date_naive();
            let routines = db.routines_for(today)?;
            if routines.is_empty() {
                println!("Nothing scheduled for {}", today.format("%A"));
            }
            for routine in &routines {
                print_routine(routine);
            }
        }

        Some(Commands::History { limit }) => {
            let workouts = db.get_workouts()?;
            println!("Recent workouts:");
            println!("{:-<60}", "");
            for w in workouts.iter().take(limit) {
                println!(
                    "{} | {:20} | {}/{} done | {} | vol {:.0}",
                    w.completed_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    w.routine_name,
                    w.completed_count(),
                    w.exercises.len(),
                    format_clock(w.duration_secs().clamp(0, u32::MAX as i64) as u32),
                    w.total_volume()
                );
            }
        }

        Some(Commands::Stats { exercise }) => {
            let workouts = db.get_workouts()?;
            let predictor = exercise.as_deref().and_then(|ex| ProgressPredictor::train(&workouts, ex));
            let analytics = Analytics::new(workouts);

            println!("Workout Statistics");
            println!("{:-<40}", "");

            if let Some(ex) = exercise {
                println!("Exercise: {}", ex);
                println!("Total volume: {:.0}", analytics.total_volume(&ex));

                if let Some((sets, reps)) = analytics.predict_next_load(&ex) {
                    println!("Suggested next: {}x{}", sets, reps);
                }
                if let Some(predictor) = predictor {
                    println!("{}", predictor.format_prediction());
                }
            } else {
                println!("Weekly frequency: {:.1} sessions/week", analytics.weekly_frequency());
                println!("Exercises completed: {:.0}%", analytics.completion_rate() * 100.0);
            }
        }

        Some(Commands::Bot { token }) => {
            println!("Starting Telegram bot...");
            println!("Database: {}", config.db_path);
            setwise::bot::run_bot(token, config).await?;
        }
    }

    Ok(())
}
