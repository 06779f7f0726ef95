//! The startup sequence: environment check, Lavalink bring-up, bot handoff.

mod bot;
mod environment;
mod lavalink;
mod readiness;

#[cfg(test)]
mod fakes;

use std::time::Duration;

use tracing::info;
use tracing::warn;

use crate::command::CommandRunner;
use crate::command::RunStatus;
use crate::error::LauncherError;
use crate::error::EXIT_FAILURE;
use crate::probe::ServiceProbe;
use crate::prompt::Confirm;
use crate::setup::Config;

use readiness::wait_for_ready;
use readiness::Readiness;
use readiness::WaitPolicy;

/// What was found (or done) about Lavalink before the bot started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LavalinkState {
    /// The port was already open. `healthy` is the single health check's result.
    AlreadyRunning { healthy: bool },
    /// Launched by us and ready after `attempts` health checks.
    Started { attempts: u32, elapsed: Duration },
}

/// Result of a complete startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupReport {
    pub lavalink: LavalinkState,
    pub bot: RunStatus,
}

impl StartupReport {
    /// The bot's own exit code, or a failure if it didn't exit normally.
    pub fn exit_code(&self) -> u8 {
        match self.bot.code() {
            Some(code) => u8::try_from(code).unwrap_or(EXIT_FAILURE),
            None => EXIT_FAILURE,
        }
    }
}

/// Sequences the startup. Every capability is injected so the sequence can be
/// driven without real processes, sockets or a terminal.
#[derive(bon::Builder)]
pub struct Orchestrator<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
    probe: &'a dyn ServiceProbe,
    confirm: &'a dyn Confirm,
}

impl Orchestrator<'_> {
    /// Runs every step in order. Any error is fatal to the launcher.
    pub async fn run(&self) -> Result<StartupReport, LauncherError> {
        environment::check(self.config, self.runner, self.confirm).await?;

        let lavalink = self.ensure_lavalink().await?;

        let bot = bot::launch(self.config, self.runner).await?;
        Ok(StartupReport { lavalink, bot })
    }

    /// Makes sure Lavalink is reachable, starting it if its port is closed.
    async fn ensure_lavalink(&self) -> Result<LavalinkState, LauncherError> {
        let port = self.config.port();

        if self.probe.port_open().await {
            info!("Lavalink is already running on port {port}");

            // Something listens, check it is actually a healthy Lavalink.
            let healthy = self.probe.healthy().await;
            if healthy {
                info!("Lavalink health check passed");
            } else {
                warn!("Port is in use but Lavalink health check failed");
                warn!("Continuing anyway...");
            }
            return Ok(LavalinkState::AlreadyRunning { healthy });
        }

        warn!("Lavalink not detected on port {port}");
        lavalink::start(self.config, self.runner).await?;

        let policy = WaitPolicy::from_config(self.config);
        match wait_for_ready(self.probe, &policy).await {
            Readiness::Ready { attempts, elapsed } => {
                Ok(LavalinkState::Started { attempts, elapsed })
            }
            Readiness::TimedOut { .. } => {
                warn!("Please check Lavalink logs for errors");
                lavalink::show_logs(self.config, self.runner).await;
                Err(LauncherError::ReadinessTimeout {
                    max_wait: policy.max_wait,
                })
            }
        }
    }
}
