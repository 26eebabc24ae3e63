//! Rest timer - countdown between sets
//!
//! Pure state: the timer never looks at a clock. Whoever owns it calls
//! [`RestTimer::tick`] once per elapsed second (see [`crate::ticker`]).

use serde::{Deserialize, Serialize};

/// How a rest period ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerSignal {
    /// Countdown reached zero
    Completed,
    /// User cut the rest short
    Skipped,
}

/// Countdown with pause, reset, extension and skip
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestTimer {
    total_secs: u32,
    remaining_secs: u32,
    running: bool,
    finished: bool,
}

impl RestTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start the countdown. A zero duration completes immediately.
    pub fn start(&mut self, duration_secs: u32) -> Option<TimerSignal> {
        self.total_secs = duration_secs;
        self.remaining_secs = duration_secs;
        self.running = true;
        self.finished = false;

        if duration_secs == 0 {
            self.running = false;
            self.finished = true;
            return Some(TimerSignal::Completed);
        }
        None
    }

    /// One second elapsed. Returns `Completed` exactly once, on the tick
    /// that reaches zero.
    pub fn tick(&mut self) -> Option<TimerSignal> {
        if !self.running || self.finished {
            return None;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.running = false;
            self.finished = true;
            return Some(TimerSignal::Completed);
        }
        None
    }

    /// Pause or resume. No-op once finished.
    pub fn toggle(&mut self) {
        if !self.finished {
            self.running = !self.running;
        }
    }

    /// Back to the full duration, paused. Re-arms a finished timer.
    pub fn reset(&mut self) {
        self.remaining_secs = self.total_secs;
        self.running = false;
        self.finished = self.total_secs == 0;
    }

    /// Extend the remaining time without touching the progress baseline.
    /// No-op once finished.
    pub fn add_time(&mut self, secs: u32) {
        if !self.finished {
            self.remaining_secs = self.remaining_secs.saturating_add(secs);
        }
    }

    /// Stop counting and report `Skipped`. Returns `None` if the timer had
    /// already finished.
    pub fn skip(&mut self) -> Option<TimerSignal> {
        if self.finished {
            return None;
        }
        self.running = false;
        self.finished = true;
        Some(TimerSignal::Skipped)
    }

    /// Elapsed fraction of the original duration. Goes negative after
    /// `add_time` pushes remaining above total.
    pub fn progress(&self) -> f64 {
        if self.total_secs == 0 {
            return 1.0;
        }
        (self.total_secs as f64 - self.remaining_secs as f64) / self.total_secs as f64
    }

    pub fn total_secs(&self) -> u32 {
        self.total_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

/// Format seconds as m:ss
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(secs: u32) -> RestTimer {
        let mut timer = RestTimer::new();
        assert_eq!(timer.start(secs), None);
        timer
    }

    #[test]
    fn test_start() {
        let timer = started(60);
        assert_eq!(timer.total_secs(), 60);
        assert_eq!(timer.remaining_secs(), 60);
        assert!(timer.is_running());
        assert!(!timer.is_finished());
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let mut timer = RestTimer::new();
        assert_eq!(timer.start(0), Some(TimerSignal::Completed));
        assert!(!timer.is_running());
        assert_eq!(timer.tick(), None);
    }

    #[test]
    fn test_ticks_to_completion_fire_once() {
        let mut timer = started(5);
        let mut signals = Vec::new();
        for _ in 0..5 {
            if let Some(s) = timer.tick() {
                signals.push(s);
            }
        }
        assert_eq!(signals, vec![TimerSignal::Completed]);
        assert_eq!(timer.remaining_secs(), 0);
        assert!(!timer.is_running());

        // Further ticks are no-ops
        for _ in 0..3 {
            assert_eq!(timer.tick(), None);
        }
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn test_paused_timer_ignores_ticks() {
        let mut timer = started(10);
        timer.tick();
        timer.toggle();
        assert!(!timer.is_running());
        timer.tick();
        timer.tick();
        assert_eq!(timer.remaining_secs(), 9);
        timer.toggle();
        timer.tick();
        assert_eq!(timer.remaining_secs(), 8);
    }

    #[test]
    fn test_toggle_after_completion_is_noop() {
        let mut timer = started(1);
        assert_eq!(timer.tick(), Some(TimerSignal::Completed));
        timer.toggle();
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn test_reset_idempotent() {
        let mut timer = started(45);
        timer.tick();
        timer.tick();
        timer.reset();
        let once = timer.clone();
        timer.reset();
        assert_eq!(timer, once);
        assert_eq!(timer.remaining_secs(), 45);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_reset_rearms_finished_timer() {
        let mut timer = started(2);
        timer.tick();
        timer.tick();
        assert!(timer.is_finished());
        timer.reset();
        assert!(!timer.is_finished());
        timer.toggle();
        assert!(timer.is_running());
        assert_eq!(timer.remaining_secs(), 2);
    }

    #[test]
    fn test_add_time_keeps_running_state() {
        let mut timer = started(60);
        for _ in 0..20 {
            timer.tick();
        }
        timer.add_time(30);
        assert_eq!(timer.remaining_secs(), 70);
        assert!(timer.is_running());
        assert_eq!(timer.total_secs(), 60);

        timer.toggle();
        timer.add_time(30);
        assert_eq!(timer.remaining_secs(), 100);
        assert!(!timer.is_running());
    }

    #[test]
    fn test_add_time_after_completion_is_noop() {
        let mut timer = started(1);
        timer.tick();
        timer.add_time(30);
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn test_progress_can_go_negative() {
        let mut timer = started(60);
        assert_eq!(timer.progress(), 0.0);
        for _ in 0..30 {
            timer.tick();
        }
        assert!((timer.progress() - 0.5).abs() < f64::EPSILON);
        timer.add_time(60);
        assert!(timer.progress() < 0.0, "Progress: {}", timer.progress());
    }

    #[test]
    fn test_skip_signals_skipped() {
        let mut timer = started(60);
        assert_eq!(timer.skip(), Some(TimerSignal::Skipped));
        assert!(!timer.is_running());
        assert_eq!(timer.skip(), None);
        assert_eq!(timer.tick(), None);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "0:00");
        assert_eq!(format_clock(59), "0:59");
        assert_eq!(format_clock(90), "1:30");
    }
}
