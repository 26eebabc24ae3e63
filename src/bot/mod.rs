//! Telegram bot module - Run routines from chat, with reminders for scheduled days

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use chrono::Local;
use teloxide::{
    prelude::*,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup},
    utils::command::BotCommands,
    dispatching::dialogue::{InMemStorage, Dialogue},
};
use tokio::sync::{Mutex, mpsc::UnboundedReceiver};
use tracing::{info, error, warn};

use crate::config::Config;
use crate::db::Database;
use crate::routine::Routine;
use crate::session::{Phase, SessionController, Transition};
use crate::sink::{RoutineSource, save_workout};
use crate::stats::Analytics;
use crate::ticker::{IntervalTicker, Tick};
use crate::timer::format_clock;

type MyDialogue = Dialogue<State, InMemStorage<State>>;
type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;
type Db = Arc<Mutex<Database>>;
type Subscribers = Arc<Mutex<HashSet<ChatId>>>;
type Sessions = Arc<Mutex<HashMap<ChatId, SessionController<IntervalTicker>>>>;

/// Reminder interval (1 hour = 3600 seconds)
const REMINDER_INTERVAL_SECS: u64 = 3600;

#[derive(Clone, Default)]
pub enum State {
    #[default]
    Start,
    /// Next text message becomes a note on the current exercise
    WaitingForNote,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Commands:")]
pub enum Command {
    #[command(description = "Start")]
    Start,
    #[command(description = "Show help")]
    Help,
    #[command(description = "Pick a routine and train")]
    Train,
    #[command(description = "Routines scheduled for today")]
    Today,
    #[command(description = "Statistics")]
    Stats,
    #[command(description = "Abandon the running workout")]
    Quit,
    #[command(description = "Hourly reminders on scheduled days")]
    Remind,
    #[command(description = "Turn reminders off")]
    Stop,
}

/// Inline keyboard with one button per routine
fn make_routines_keyboard(routines: &[Routine]) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = routines
        .chunks(2)
        .map(|chunk| {
            chunk.iter().filter_map(|r| {
                let id = r.id?;
                Some(InlineKeyboardButton::callback(r.name.clone(), format!("rt:{}", id)))
            }).collect()
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// Buttons valid in the given phase
fn make_actions_keyboard(phase: Phase) -> InlineKeyboardMarkup {
    let rows = match phase {
        Phase::Exercising => vec![
            vec![
                InlineKeyboardButton::callback("✅ Set done", "a:done"),
                InlineKeyboardButton::callback("⏭ Skip set", "a:skip"),
            ],
            vec![InlineKeyboardButton::callback("📝 Note", "a:note")],
        ],
        Phase::Resting => vec![
            vec![
                InlineKeyboardButton::callback("⏩ Skip rest", "a:rest_skip"),
                InlineKeyboardButton::callback("➕ 30s", "a:rest_add"),
            ],
            vec![
                InlineKeyboardButton::callback("⏯ Pause", "a:rest_toggle"),
                InlineKeyboardButton::callback("📝 Note", "a:note"),
            ],
        ],
        Phase::NotStarted | Phase::Finished => vec![],
    };
    InlineKeyboardMarkup::new(rows)
}

/// Current position in the session as a chat message
pub fn describe_session<T: crate::ticker::Ticker>(session: &SessionController<T>) -> String {
    let state = session.state();
    let done = (session.progress() * state.exercises.len() as f64).round() as usize;
    let header = format!("🏋️ {} ({}/{})", state.routine_name, done, state.exercises.len());

    let Some(ex) = session.current_exercise() else {
        return header;
    };

    let mut text = format!(
        "{}\n\n{}\nSet {} of {} - {}",
        header, ex.plan.exercise.name, state.current_set, ex.plan.target_sets, ex.plan.target
    );
    if let Some(timer) = session.rest_timer() {
        let paused = if timer.is_running() { "" } else { " ⏸" };
        text.push_str(&format!("\n\n⏱ Rest {}{}", format_clock(timer.remaining_secs()), paused));
    }
    text
}

/// Background task that reminds subscribers about today's routines
async fn reminder_task(bot: Bot, db: Db, subscribers: Subscribers) {
    info!("Reminder task started (interval: {} seconds)", REMINDER_INTERVAL_SECS);

    loop {
        tokio::time::sleep(Duration::from_secs(REMINDER_INTERVAL_SECS)).await;

        let subs = subscribers.lock().await;
        if subs.is_empty() {
            continue;
        }

        let today = Local::now().date_naive();
        let (routines, trained) = {
            let db = db.lock().await;
            match (db.routines_for(today), db.has_workout_on(today)) {
                (Ok(r), Ok(t)) => (r, t),
                (Err(e), _) | (_, Err(e)) => {
                    error!("Failed to load today's routines: {}", e);
                    continue;
                }
            }
        };
        if routines.is_empty() || trained {
            continue;
        }

        info!("Sending reminders to {} subscribers", subs.len());
        let keyboard = make_routines_keyboard(&routines);

        for chat_id in subs.iter() {
            let result = bot
                .send_message(*chat_id, "⏰ Training day! Pick a routine:")
                .reply_markup(keyboard.clone())
                .await;

            if let Err(e) = result {
                error!("Failed to send reminder to {}: {}", chat_id, e);
            }
        }
    }
}

/// Feeds ticker ticks into the chat's session; exits when the session is gone
async fn rest_pump(bot: Bot, chat_id: ChatId, sessions: Sessions, mut ticks: UnboundedReceiver<Tick>) {
    while ticks.recv().await.is_some() {
        let update = {
            let mut sessions = sessions.lock().await;
            let Some(session) = sessions.get_mut(&chat_id) else {
                break;
            };
            match session.tick() {
                Some(t) => Some((t, describe_session(session), session.phase())),
                None => None,
            }
        };

        if let Some((Transition::RestOver { .. }, text, phase)) = update {
            let result = bot
                .send_message(chat_id, format!("🔔 Rest over!\n\n{}", text))
                .reply_markup(make_actions_keyboard(phase))
                .await;
            if let Err(e) = result {
                error!("Failed to send rest notification to {}: {}", chat_id, e);
            }
        }
    }
}

/// Start the Telegram bot with reminders
pub async fn run_bot(token: String, config: Config) -> anyhow::Result<()> {
    let bot = Bot::new(token);
    let db: Db = Arc::new(Mutex::new(Database::open(&config.db_path)?));
    let subscribers: Subscribers = Arc::new(Mutex::new(HashSet::new()));
    let sessions: Sessions = Arc::new(Mutex::new(HashMap::new()));
    let config = Arc::new(config);

    // Start reminder background task
    let reminder_bot = bot.clone();
    let reminder_db = db.clone();
    let reminder_subs = subscribers.clone();
    tokio::spawn(async move {
        reminder_task(reminder_bot, reminder_db, reminder_subs).await;
    });

    let handler = dptree::entry()
        .enter_dialogue::<Update, InMemStorage<State>, State>()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            Update::filter_message()
                .endpoint(handle_message),
        )
        .branch(
            Update::filter_callback_query()
                .endpoint(handle_callback),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![InMemStorage::<State>::new(), db, subscribers, sessions, config])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: MyDialogue,
    db: Db,
    subscribers: Subscribers,
    sessions: Sessions,
) -> HandlerResult {
    match cmd {
        Command::Start => {
            let text = "🏋️ setwise\n\n\
                Workout routines with rest timer\n\n\
                /train - pick a routine\n\
                /today - today's routines\n\
                /stats - statistics\n\
                /quit - abandon the running workout\n\
                /remind - reminders on scheduled days\n\
                /stop - turn reminders off";
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }

        Command::Train => {
            let routines = db.lock().await.get_routines()?;
            if routines.is_empty() {
                bot.send_message(msg.chat.id, "No routines yet. Create one with `setwise routine create`.")
                    .await?;
            } else {
                bot.send_message(msg.chat.id, "Pick a routine:")
                    .reply_markup(make_routines_keyboard(&routines))
                    .await?;
            }
        }

        Command::Today => {
            let today = Local::now().date_naive();
            let routines = db.lock().await.routines_for(today)?;

            if routines.is_empty() {
                bot.send_message(msg.chat.id, "Nothing scheduled today. /train to pick any routine.")
                    .await?;
            } else {
                bot.send_message(msg.chat.id, "📅 Today:")
                    .reply_markup(make_routines_keyboard(&routines))
                    .await?;
            }
        }

        Command::Stats => {
            let workouts = db.lock().await.get_workouts()?;
            let total = workouts.len();
            let analytics = Analytics::new(workouts);

            let text = format!(
                "📈 Statistics\n\n\
                Workouts: {}\n\
                Per week: {:.1}\n\
                Exercises completed: {:.0}%",
                total,
                analytics.weekly_frequency(),
                analytics.completion_rate() * 100.0
            );
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Quit => {
            let removed = sessions.lock().await.remove(&msg.chat.id);
            dialogue.reset().await?;
            let text = match removed {
                Some(_) => "Workout abandoned, nothing saved.",
                None => "No workout running.",
            };
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Remind => {
            let mut subs = subscribers.lock().await;
            subs.insert(msg.chat.id);
            let count = subs.len();

            bot.send_message(
                msg.chat.id,
                format!(
                    "✅ Reminders on!\n\n\
                    I'll ping hourly on days with a scheduled routine.\n\
                    /stop - turn off\n\n\
                    Active subscribers: {}",
                    count
                )
            ).await?;

            info!("User {} subscribed to reminders", msg.chat.id);
        }

        Command::Stop => {
            let mut subs = subscribers.lock().await;
            let was_subscribed = subs.remove(&msg.chat.id);

            if was_subscribed {
                bot.send_message(msg.chat.id, "🔕 Reminders off.\n\n/remind - turn on again")
                    .await?;
                info!("User {} unsubscribed from reminders", msg.chat.id);
            } else {
                bot.send_message(msg.chat.id, "Reminders are already off.\n\n/remind - turn on")
                    .await?;
            }
        }
    }

    Ok(())
}

async fn handle_callback(
    bot: Bot,
    q: CallbackQuery,
    dialogue: MyDialogue,
    db: Db,
    sessions: Sessions,
    config: Arc<Config>,
) -> HandlerResult {
    let chat_id = q.message.as_ref().map(|m| m.chat().id);

    if let (Some(data), Some(chat_id)) = (q.data.as_deref(), chat_id) {
        if let Some(routine_id) = data.strip_prefix("rt:").and_then(|s| s.parse::<i64>().ok()) {
            start_training(&bot, chat_id, routine_id, &db, &sessions, &config).await?;
        } else if data == "a:note" {
            dialogue.update(State::WaitingForNote).await?;
            bot.send_message(chat_id, "Send the note for this exercise:").await?;
        } else if let Some(action) = data.strip_prefix("a:") {
            apply_action(&bot, chat_id, action, &db, &sessions, &config).await?;
        }
    }

    bot.answer_callback_query(q.id).await?;
    Ok(())
}

async fn start_training(
    bot: &Bot,
    chat_id: ChatId,
    routine_id: i64,
    db: &Db,
    sessions: &Sessions,
    config: &Config,
) -> HandlerResult {
    let routine = db.lock().await.load_routine(routine_id)?;

    let (ticker, ticks) = IntervalTicker::new(config.tick_interval);
    let mut session = SessionController::new(routine, ticker).with_rest_increment(config.rest_increment_secs);
    if let Err(e) = session.start() {
        bot.send_message(chat_id, format!("Can't start: {}.\n\n/train - pick another routine", e))
            .await?;
        return Ok(());
    }

    let text = describe_session(&session);
    let phase = session.phase();
    // Replacing an unfinished session drops it, which cancels its ticker
    if sessions.lock().await.insert(chat_id, session).is_some() {
        warn!("Chat {} replaced an unfinished workout", chat_id);
    }
    tokio::spawn(rest_pump(bot.clone(), chat_id, sessions.clone(), ticks));

    bot.send_message(chat_id, text)
        .reply_markup(make_actions_keyboard(phase))
        .await?;
    Ok(())
}

async fn apply_action(
    bot: &Bot,
    chat_id: ChatId,
    action: &str,
    db: &Db,
    sessions: &Sessions,
    config: &Config,
) -> HandlerResult {
    let mut guard = sessions.lock().await;
    if !guard.contains_key(&chat_id) {
        drop(guard);
        bot.send_message(chat_id, "No workout running. /train to start one.").await?;
        return Ok(());
    }
    let Some(session) = guard.get_mut(&chat_id) else {
        return Ok(());
    };

    let result = match action {
        "done" => session.complete_set().map(Some),
        "skip" => session.skip_set().map(Some),
        "rest_skip" => session.skip_rest().map(Some),
        "rest_add" => session.add_rest_time().map(|_| None),
        "rest_toggle" => session.toggle_rest().map(|_| None),
        _ => Ok(None),
    };

    let transition = match result {
        Ok(t) => t,
        Err(e) => {
            drop(guard);
            bot.send_message(chat_id, format!("⚠️ {}", e)).await?;
            return Ok(());
        }
    };

    if let Some(Transition::Finished(record)) = transition {
        guard.remove(&chat_id);
        drop(guard);

        let saved = {
            let db = db.lock().await;
            save_workout(&*db, &record, config.save_attempts)
        };
        let text = match saved {
            Ok(_) => format!(
                "🏁 Done! {} completed, {} skipped, {}",
                record.completed_count(),
                record.skipped_count(),
                format_clock(record.duration_secs().clamp(0, u32::MAX as i64) as u32)
            ),
            Err(e) => {
                error!("Workout for {} not saved: {}", chat_id, e);
                "🏁 Done! But the workout could not be saved.".to_string()
            }
        };
        bot.send_message(chat_id, text).await?;
        return Ok(());
    }

    let text = describe_session(session);
    let phase = session.phase();
    drop(guard);

    bot.send_message(chat_id, text)
        .reply_markup(make_actions_keyboard(phase))
        .await?;
    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    dialogue: MyDialogue,
    sessions: Sessions,
) -> HandlerResult {
    let state = dialogue.get().await?.unwrap_or_default();

    match state {
        State::WaitingForNote => {
            if let Some(text) = msg.text() {
                let saved = match sessions.lock().await.get_mut(&msg.chat.id) {
                    Some(session) => session.set_note(text).is_ok(),
                    None => false,
                };
                dialogue.reset().await?;

                let reply = if saved { "📝 Noted." } else { "No workout running." };
                bot.send_message(msg.chat.id, reply).await?;
            }
        }

        State::Start => {
            bot.send_message(msg.chat.id, "Press /train to start a workout")
                .await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routine::{ExerciseRef, RoutineExercise};
    use crate::ticker::ManualTicker;

    fn create_session() -> SessionController<ManualTicker> {
        let routine = Routine::new("legs")
            .with_exercise(RoutineExercise::reps(ExerciseRef::new("squat", "Back squat"), 2, 5, 90))
            .with_exercise(RoutineExercise::timed(ExerciseRef::new("plank", "Plank"), 1, 60, 0));
        let mut session = SessionController::new(routine, ManualTicker::new());
        session.start().unwrap();
        session
    }

    #[test]
    fn test_describe_exercising() {
        let session = create_session();
        let text = describe_session(&session);
        assert!(text.contains("legs (0/2)"), "Text: {}", text);
        assert!(text.contains("Back squat"), "Text: {}", text);
        assert!(text.contains("Set 1 of 2 - 5 reps"), "Text: {}", text);
        assert!(!text.contains("Rest"), "Text: {}", text);
    }

    #[test]
    fn test_describe_resting() {
        let mut session = create_session();
        session.complete_set().unwrap();
        assert!(describe_session(&session).contains("Rest 1:30"));
        session.toggle_rest().unwrap();
        assert!(describe_session(&session).contains("⏸"));
    }

    #[test]
    fn test_describe_finished() {
        let mut session = create_session();
        session.skip_set().unwrap();
        session.skip_set().unwrap();
        session.complete_set().unwrap();
        assert_eq!(describe_session(&session), "🏋️ legs (2/2)");
    }

    #[test]
    fn test_actions_keyboard_per_phase() {
        assert_eq!(make_actions_keyboard(Phase::Exercising).inline_keyboard.len(), 2);
        assert_eq!(make_actions_keyboard(Phase::Resting).inline_keyboard[0].len(), 2);
        assert!(make_actions_keyboard(Phase::Finished).inline_keyboard.is_empty());
    }

    #[test]
    fn test_routines_keyboard_skips_unsaved() {
        let mut saved = Routine::new("push");
        saved.id = Some(3);
        let keyboard = make_routines_keyboard(&[saved, Routine::new("draft")]);
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0].len(), 1);
    }
}
