//! Live training screen: runs one session against the workout sink

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::warn;

use super::{init_terminal, restore_terminal};
use crate::config::Config;
use crate::routine::Routine;
use crate::session::{ExerciseStatus, Phase, SessionController, SessionError, Transition};
use crate::sink::{WorkoutSink, save_workout};
use crate::ticker::{IntervalTicker, Tick, Ticker};
use crate::timer::format_clock;

/// User actions available on the training screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CompleteSet,
    SkipSet,
    ToggleRest,
    ResetRest,
    AddRest,
    SkipRest,
    Quit,
}

impl Action {
    pub fn from_key(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::Enter | KeyCode::Char('c') => Some(Action::CompleteSet),
            KeyCode::Char('s') => Some(Action::SkipSet),
            KeyCode::Char(' ') | KeyCode::Char('p') => Some(Action::ToggleRest),
            KeyCode::Char('r') => Some(Action::ResetRest),
            KeyCode::Char('+') => Some(Action::AddRest),
            KeyCode::Char('n') => Some(Action::SkipRest),
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            _ => None,
        }
    }
}

/// How the screen was left
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingOutcome {
    Saved(i64),
    SaveFailed(String),
    Abandoned,
}

pub struct TrainingScreen<'a, T: Ticker> {
    session: SessionController<T>,
    ticks: Option<UnboundedReceiver<Tick>>,
    sink: &'a dyn WorkoutSink,
    save_attempts: u32,
    status: String,
    outcome: Option<TrainingOutcome>,
    should_quit: bool,
}

impl<'a> TrainingScreen<'a, IntervalTicker> {
    /// Start a session on a real one-second ticker. Fails (without touching
    /// the terminal) when the routine cannot be started.
    pub fn new(routine: Routine, sink: &'a dyn WorkoutSink, config: &Config) -> Result<Self, SessionError> {
        let (ticker, ticks) = IntervalTicker::new(config.tick_interval);
        let session = SessionController::new(routine, ticker).with_rest_increment(config.rest_increment_secs);
        Self::with_session(session, Some(ticks), sink, config.save_attempts)
    }
}

impl<'a, T: Ticker> TrainingScreen<'a, T> {
    pub fn with_session(
        mut session: SessionController<T>,
        ticks: Option<UnboundedReceiver<Tick>>,
        sink: &'a dyn WorkoutSink,
        save_attempts: u32,
    ) -> Result<Self, SessionError> {
        session.start()?;
        Ok(Self {
            session,
            ticks,
            sink,
            save_attempts,
            status: "Go! Enter completes a set.".to_string(),
            outcome: None,
            should_quit: false,
        })
    }

    /// Run until the user quits. Quitting tears the session down, which
    /// cancels any running rest ticker.
    pub fn run(mut self) -> Result<TrainingOutcome> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            self.drain_ticks();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(self.outcome.unwrap_or(TrainingOutcome::Abandoned))
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn outcome(&self) -> Option<&TrainingOutcome> {
        self.outcome.as_ref()
    }

    pub fn session(&self) -> &SessionController<T> {
        &self.session
    }

    fn drain_ticks(&mut self) {
        let mut transitions = Vec::new();
        if let Some(rx) = self.ticks.as_mut() {
            while rx.try_recv().is_ok() {
                if let Some(t) = self.session.tick() {
                    transitions.push(t);
                }
            }
        }
        for t in transitions {
            self.on_transition(t);
        }
    }

    /// Apply one user action
    pub fn apply(&mut self, action: Action) {
        if action == Action::Quit {
            self.should_quit = true;
            return;
        }
        if self.session.phase() == Phase::Finished {
            self.should_quit = true;
            return;
        }

        let result = match action {
            Action::CompleteSet => self.session.complete_set().map(Some),
            Action::SkipSet => self.session.skip_set().map(Some),
            Action::SkipRest => self.session.skip_rest().map(Some),
            Action::ToggleRest => self.session.toggle_rest().map(|_| None),
            Action::ResetRest => self.session.reset_rest().map(|_| None),
            Action::AddRest => self.session.add_rest_time().map(|_| None),
            Action::Quit => Ok(None),
        };

        match result {
            Ok(Some(t)) => self.on_transition(t),
            Ok(None) => {}
            Err(e) => self.status = e.to_string(),
        }
    }

    fn on_transition(&mut self, transition: Transition) {
        self.status = match transition {
            Transition::Resting { rest_secs } => format!("Rest {}", format_clock(rest_secs)),
            Transition::NextSet => format!("Set {}", self.session.state().current_set),
            Transition::NextExercise { index } => {
                let name = &self.session.state().exercises[index].plan.exercise.name;
                format!("Next: {}", name)
            }
            Transition::RestOver { skipped: true } => "Rest skipped".to_string(),
            Transition::RestOver { skipped: false } => "Rest over - next set!".to_string(),
            Transition::Finished(record) => {
                match save_workout(self.sink, &record, self.save_attempts) {
                    Ok(id) => {
                        self.outcome = Some(TrainingOutcome::Saved(id));
                        format!("Workout saved (#{}). Any key to exit.", id)
                    }
                    Err(e) => {
                        warn!(error = %e, "workout finished but not saved");
                        self.outcome = Some(TrainingOutcome::SaveFailed(e.to_string()));
                        "Workout finished, but saving failed. Any key to exit.".to_string()
                    }
                }
            }
        };
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    if self.session.phase() == Phase::Finished {
                        self.should_quit = true;
                    } else if let Some(action) = Action::from_key(key.code) {
                        self.apply(action);
                    }
                }
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(7),
                Constraint::Min(6),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let state = self.session.state();

        // Overall progress
        let progress = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(state.routine_name.clone()))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(self.session.progress().clamp(0.0, 1.0));
        frame.render_widget(progress, chunks[0]);

        // Current exercise / rest
        let current = match self.session.current_exercise() {
            Some(ex) => {
                let mut lines = vec![
                    Line::from(ex.plan.exercise.name.clone()).bold(),
                    Line::from(format!(
                        "Set {} of {}  -  target {}",
                        state.current_set, ex.plan.target_sets, ex.plan.target
                    )),
                ];
                if let Some(timer) = self.session.rest_timer() {
                    let paused = if timer.is_running() { "" } else { " (paused)" };
                    lines.push(Line::from(format!(
                        "Resting {} / {}{}",
                        format_clock(timer.remaining_secs()),
                        format_clock(timer.total_secs()),
                        paused
                    )).fg(Color::Yellow));
                }
                lines.push(Line::from(self.status.clone()).fg(Color::Green));
                Paragraph::new(lines)
            }
            None => Paragraph::new(self.status.clone()),
        };
        let current_area = chunks[1];
        frame.render_widget(current.block(Block::default().borders(Borders::ALL).title("Now")), current_area);

        if let Some(timer) = self.session.rest_timer() {
            let gauge_area = Rect {
                x: current_area.x + 1,
                y: current_area.y + current_area.height.saturating_sub(2),
                width: current_area.width.saturating_sub(2),
                height: 1,
            };
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(Color::Yellow))
                .ratio(timer.progress().clamp(0.0, 1.0))
                .label(format_clock(timer.remaining_secs()));
            frame.render_widget(gauge, gauge_area);
        }

        // Exercise list
        let rows: Vec<Row> = state.exercises.iter().map(|e| {
            let (mark, color) = match e.state.status {
                ExerciseStatus::Pending => ("·", Color::DarkGray),
                ExerciseStatus::InProgress => ("▶", Color::Cyan),
                ExerciseStatus::Completed => ("✔", Color::Green),
                ExerciseStatus::Skipped => ("↷", Color::Yellow),
            };
            Row::new(vec![
                Cell::from(mark),
                Cell::from(e.plan.exercise.name.clone()),
                Cell::from(format!("{}/{}", e.state.sets_completed, e.plan.target_sets)),
                Cell::from(e.plan.target.to_string()),
            ]).style(Style::default().fg(color))
        }).collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(2),
                Constraint::Min(20),
                Constraint::Length(8),
                Constraint::Length(16),
            ],
        )
        .header(Row::new(vec!["", "Exercise", "Sets", "Target"]).style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Routine"));
        frame.render_widget(table, chunks[2]);

        let footer = Paragraph::new("enter: set done | s: skip set | n: skip rest | +: more rest | space: pause | r: reset | q: quit")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[3]);
    }
}
