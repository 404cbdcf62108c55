//! Keep-alive timer for an open connection

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Default keep-alive period (milliseconds)
const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 20_000;

/// Owns at most one keep-alive interval
///
/// `tick` resolves once per period while started and never resolves while
/// stopped, so it can sit in a `select!` unconditionally.
#[derive(Debug)]
pub struct HeartbeatScheduler {
    period: Duration,
    interval: Option<Interval>,
}

impl HeartbeatScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    /// Start ticking; the first tick is one full period from now
    ///
    /// Any running interval is replaced.
    pub fn start(&mut self) {
        let mut interval = interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.interval = Some(interval);
    }

    pub fn stop(&mut self) {
        self.interval = None;
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl Default for HeartbeatScheduler {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_HEARTBEAT_INTERVAL_MS))
    }
}
