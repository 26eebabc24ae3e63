//! TUI module - Terminal dashboard and live training screen with ratatui

mod training;

pub use training::{TrainingOutcome, TrainingScreen};

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Table, Row, Cell},
};
use std::io::{stdout, Stdout};

use crate::db::Database;
use crate::session::WorkoutRecord;
use crate::timer::format_clock;

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// App state for the history dashboard
pub struct App {
    db: Database,
    workouts: Vec<WorkoutRecord>,
    should_quit: bool,
}

impl App {
    pub fn new(db: Database) -> Result<Self> {
        let workouts = db.get_workouts()?;
        Ok(Self {
            db,
            workouts,
            should_quit: false,
        })
    }

    /// Run the TUI application
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = init_terminal()?;

        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }

        restore_terminal()?;
        Ok(())
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(3),
            ])
            .split(area);

        // Header
        let header = Paragraph::new("setwise - Workout History")
            .style(Style::default().fg(Color::Cyan).bold())
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, chunks[0]);

        // Workout table
        let rows: Vec<Row> = self.workouts.iter().map(|w| {
            Row::new(vec![
                Cell::from(w.completed_at.format("%Y-%m-%d").to_string()),
                Cell::from(w.routine_name.clone()),
                Cell::from(format!("{}/{}", w.completed_count(), w.exercises.len())),
                Cell::from(format_clock(w.duration_secs().clamp(0, u32::MAX as i64) as u32)),
                Cell::from(format!("{:.0}", w.total_volume())),
            ])
        }).collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Min(20),
                Constraint::Length(10),
                Constraint::Length(10),
                Constraint::Length(10),
            ],
        )
        .header(Row::new(vec!["Date", "Routine", "Done", "Time", "Volume"])
            .style(Style::default().bold()))
        .block(Block::default().borders(Borders::ALL).title("Workouts"));

        frame.render_widget(table, chunks[1]);

        // Footer
        let footer = Paragraph::new("q: quit | r: refresh")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(footer, chunks[2]);
    }

    fn handle_events(&mut self) -> Result<()> {
        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') => self.should_quit = true,
                        KeyCode::Char('r') => {
                            self.workouts = self.db.get_workouts()?;
                        }
                        _ => {}
                    }
                }
        Ok(())
    }
}

fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    Ok(terminal)
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}
