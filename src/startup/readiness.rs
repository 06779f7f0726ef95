//! Waiting for Lavalink to answer its health check.

use std::time::Duration;

use tokio::time::Instant;
use tracing::info;
use tracing::instrument;

use crate::probe::ServiceProbe;
use crate::setup::Config;

/// How a readiness wait ended. Both variants are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready { attempts: u32, elapsed: Duration },
    TimedOut { attempts: u32, elapsed: Duration },
}

/// Timing of the readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub max_wait: Duration,
    pub poll_interval: Duration,
    /// Period of the "still waiting" lines. Zero disables them.
    pub progress_every: Duration,
}

impl WaitPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_wait: config.max_wait(),
            poll_interval: config.poll_interval(),
            progress_every: config.progress_every(),
        }
    }
}

/// Polls `probe` until it is healthy or `max_wait` has elapsed.
///
/// Health is checked before the deadline on every round, so a service that
/// turns healthy exactly at `max_wait` still counts as ready. Elapsed time is
/// measured on the clock and includes the checks themselves: a check still
/// running at the deadline is cut off and counts as unhealthy, and the last
/// sleep is shortened to end at the deadline.
#[instrument(level = "debug", skip(probe))]
pub async fn wait_for_ready(probe: &dyn ServiceProbe, policy: &WaitPolicy) -> Readiness {
    info!("Waiting for Lavalink to be ready...");

    let start = Instant::now();
    let deadline = start + policy.max_wait;
    let mut attempts = 0;
    let mut progress = Progress::new(policy.progress_every);

    loop {
        attempts += 1;
        let healthy = tokio::time::timeout_at(deadline, probe.healthy())
            .await
            .unwrap_or(false);
        let elapsed = start.elapsed().min(policy.max_wait);

        if healthy {
            info!("Lavalink is ready!");
            return Readiness::Ready { attempts, elapsed };
        }

        if elapsed >= policy.max_wait {
            return Readiness::TimedOut { attempts, elapsed };
        }

        let step = policy.poll_interval.min(policy.max_wait.saturating_sub(elapsed));
        tokio::time::sleep(step).await;
        let elapsed = start.elapsed().min(policy.max_wait);

        if progress.due(elapsed) {
            info!(
                "Still waiting... ({}s / {}s)",
                elapsed.as_secs(),
                policy.max_wait.as_secs()
            );
        }
    }
}

/// Decides when a progress line is due.
#[derive(Debug)]
struct Progress {
    every: Duration,
    next: Duration,
}

impl Progress {
    fn new(every: Duration) -> Self {
        Self { every, next: every }
    }

    /// `true` once per crossed multiple of `every`.
    fn due(&mut self, elapsed: Duration) -> bool {
        if self.every.is_zero() || elapsed < self.next {
            return false;
        }
        while self.next <= elapsed {
            self.next += self.every;
        }
        true
    }
}
