//! setwise - Workout routine runner
//!
//! Walks a routine set by set with rest timers between sets, stores the
//! finished workouts and shows progress.

pub mod bot;
pub mod config;
pub mod db;
pub mod exercises;
pub mod routine;
pub mod session;
pub mod sink;
pub mod stats;
pub mod ticker;
pub mod timer;
pub mod tui;

pub use config::Config;
pub use db::Database;
pub use session::{SessionController, SessionError, Transition};
