//! Checks that the bot's Python environment can run the bot.

use itertools::Itertools;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::command::CommandRunner;
use crate::command::Invocation;
use crate::error::LauncherError;
use crate::prompt::Confirm;
use crate::setup::Config;

/// Verifies the requirements manifest exists and the required modules import.
/// Offers to `pip install` the manifest when they don't.
#[instrument(level = "debug", skip_all)]
pub(super) async fn check(
    config: &Config,
    runner: &dyn CommandRunner,
    confirm: &dyn Confirm,
) -> Result<(), LauncherError> {
    info!("Checking requirements...");

    let manifest = config.requirements();
    if !manifest.is_file() {
        return Err(LauncherError::MissingManifest { path: manifest });
    }

    let modules = config.required_modules();
    if modules.is_empty() {
        info!("No required modules configured, skipping import check");
        return Ok(());
    }

    let imports = modules.iter().map(|m| format!("import {m}")).join("; ");
    let import_check = python(config).arg("-c").arg(imports).quiet();
    if run_python(config, runner, &import_check).await?.success() {
        info!("Core dependencies found");
        return Ok(());
    }

    let install = python(config)
        .args(["-m", "pip", "install", "-r"])
        .arg(config.requirements_arg());
    warn!("Some dependencies might be missing");
    warn!("  Run: {install}");

    if !confirm
        .confirm("Would you like to install dependencies now?")
        .await
    {
        return Err(LauncherError::InstallDeclined);
    }

    let status = run_python(config, runner, &install).await?;
    if status.success() {
        info!("Dependencies installed");
        Ok(())
    } else {
        Err(LauncherError::InstallFailed {
            status: status.to_string(),
        })
    }
}

/// The configured interpreter, run from the bot directory.
fn python(config: &Config) -> Invocation {
    Invocation::new(config.python()).current_dir(config.bot_dir())
}

async fn run_python(
    config: &Config,
    runner: &dyn CommandRunner,
    invocation: &Invocation,
) -> Result<crate::command::RunStatus, LauncherError> {
    runner
        .run(invocation)
        .await
        .map_err(|source| LauncherError::InterpreterNotFound {
            python: config.python().to_string(),
            source,
        })
}
