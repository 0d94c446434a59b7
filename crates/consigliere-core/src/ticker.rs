use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, trace};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// One elapsed second for the ticker armed as `generation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub generation: u64,
}

/// Arms recurring one-second ticks. Dropping the returned handle cancels
/// the ticker, so whoever owns the handle owns the ticking.
pub trait TickScheduler {
    type Handle;

    fn arm(&self, generation: u64) -> Self::Handle;
}

/// Ticks from a tokio interval task, delivered over an unbounded channel.
/// Must be armed from inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioTicker {
    period: Duration,
    tx: mpsc::UnboundedSender<Tick>,
}

impl TokioTicker {
    pub fn new(period: Duration) -> (Self, mpsc::UnboundedReceiver<Tick>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { period, tx }, rx)
    }
}

#[derive(Debug)]
pub struct TickerGuard {
    generation: u64,
    task: JoinHandle<()>,
}

impl Drop for TickerGuard {
    fn drop(&mut self) {
        debug!(generation = self.generation, "disarming ticker");
        self.task.abort();
    }
}

impl TickScheduler for TokioTicker {
    type Handle = TickerGuard;

    fn arm(&self, generation: u64) -> TickerGuard {
        let tx = self.tx.clone();
        let period = self.period;
        debug!(generation, period_ms = period.as_millis() as u64, "arming ticker");

        let task = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                interval.tick().await;
                trace!(generation, "tick");
                if tx.send(Tick { generation }).is_err() {
                    break;
                }
            }
        });

        TickerGuard { generation, task }
    }
}

/// Scheduler that never ticks on its own; the caller feeds ticks by hand.
/// Counts live handles so callers can check that at most one is armed.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    live: Arc<AtomicUsize>,
    armed: Arc<AtomicUsize>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn times_armed(&self) -> usize {
        self.armed.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ManualHandle {
    live: Arc<AtomicUsize>,
}

impl Drop for ManualHandle {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl TickScheduler for ManualTicker {
    type Handle = ManualHandle;

    fn arm(&self, _generation: u64) -> ManualHandle {
        self.live.fetch_add(1, Ordering::SeqCst);
        self.armed.fetch_add(1, Ordering::SeqCst);
        ManualHandle {
            live: Arc::clone(&self.live),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tokio_ticker_ticks_every_period_until_dropped() {
        let (ticker, mut rx) = TokioTicker::new(TICK_PERIOD);
        let started = Instant::now();
        let guard = ticker.arm(7);

        for _ in 0..3 {
            let tick = rx.recv().await.expect("tick");
            assert_eq!(tick.generation, 7);
        }
        assert!(started.elapsed() >= Duration::from_secs(3));

        drop(guard);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn manual_ticker_tracks_live_handles() {
        let ticker = ManualTicker::new();
        let first = ticker.arm(1);
        assert_eq!(ticker.live_handles(), 1);
        drop(first);
        let _second = ticker.arm(2);
        assert_eq!(ticker.live_handles(), 1);
        assert_eq!(ticker.times_armed(), 2);
    }
}
