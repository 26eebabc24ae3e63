//! Ticker - cancelable once-per-second callback that drives the rest timer

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// A scheduled tick source. The session controller starts it when a rest
/// period begins and cancels it when the rest ends or the session is torn
/// down.
pub trait Ticker {
    fn start(&mut self);
    fn cancel(&mut self);
    fn is_active(&self) -> bool;
}

/// Deterministic ticker: never fires on its own, the caller invokes
/// `SessionController::tick` by hand.
#[derive(Debug, Default)]
pub struct ManualTicker {
    active: bool,
    starts: usize,
    cancels: usize,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the ticker was started
    pub fn starts(&self) -> usize {
        self.starts
    }

    /// Number of times an active ticker was canceled
    pub fn cancels(&self) -> usize {
        self.cancels
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self) {
        self.active = true;
        self.starts += 1;
    }

    fn cancel(&mut self) {
        if self.active {
            self.active = false;
            self.cancels += 1;
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Marker sent on every elapsed period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

/// Tokio-backed ticker. Each period a [`Tick`] is pushed into the channel
/// returned by [`IntervalTicker::new`]; the receiver side feeds them into the
/// controller. Must be started from within a tokio runtime.
pub struct IntervalTicker {
    period: Duration,
    tx: mpsc::UnboundedSender<Tick>,
    handle: Option<JoinHandle<()>>,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let ticker = Self {
            period,
            tx,
            handle: None,
        };
        (ticker, rx)
    }

    pub fn every_second() -> (Self, mpsc::UnboundedReceiver<Tick>) {
        Self::new(Duration::from_secs(1))
    }
}

impl Ticker for IntervalTicker {
    fn start(&mut self) {
        self.cancel();

        let period = self.period;
        let tx = self.tx.clone();
        debug!(period_ms = period.as_millis(), "ticker started");

        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.send(Tick).is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("ticker canceled");
        }
    }

    fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for IntervalTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_ticker_counts() {
        let mut ticker = ManualTicker::new();
        assert!(!ticker.is_active());
        ticker.start();
        assert!(ticker.is_active());
        ticker.cancel();
        ticker.cancel();
        assert!(!ticker.is_active());
        assert_eq!(ticker.starts(), 1);
        assert_eq!(ticker.cancels(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticker_fires_each_period() {
        let (mut ticker, mut rx) = IntervalTicker::every_second();
        ticker.start();
        assert!(ticker.is_active());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        let mut count = 0;
        while rx.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticker_cancel_stops_ticks() {
        let (mut ticker, mut rx) = IntervalTicker::every_second();
        ticker.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        ticker.cancel();
        assert!(!ticker.is_active());
        while rx.try_recv().is_ok() {}

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_ticker_closes_channel() {
        let (mut ticker, mut rx) = IntervalTicker::every_second();
        ticker.start();
        drop(ticker);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.recv().await.is_none());
    }
}
