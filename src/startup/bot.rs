//! Handing over to the bot process.

use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::command::CommandRunner;
use crate::command::Invocation;
use crate::command::RunStatus;
use crate::error::LauncherError;
use crate::setup::Config;

/// Runs the bot in the foreground and returns how it exited.
#[instrument(level = "debug", skip_all)]
pub(super) async fn launch(config: &Config, runner: &dyn CommandRunner) -> Result<RunStatus, LauncherError> {
    info!("Starting Vocard Discord Bot...");

    let bot = Invocation::new(config.python())
        .arg(config.entry_point())
        .current_dir(config.bot_dir());

    let status = runner
        .run(&bot)
        .await
        .map_err(|source| LauncherError::BotSpawn {
            command: bot.to_string(),
            source,
        })?;

    if status.success() {
        info!("Bot exited");
    } else {
        warn!("Bot exited with {status}");
    }
    Ok(status)
}
