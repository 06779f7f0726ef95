//! Brings Lavalink up if needed, then starts the Vocard bot.

mod command;
mod error;
mod log;
mod probe;
mod prompt;
mod setup;
mod startup;

use std::process::ExitCode;

use tracing::info;

use crate::command::SystemRunner;
use crate::error::LauncherError;
use crate::error::EXIT_CONFIG;
use crate::probe::LavalinkProbe;
use crate::prompt::AutoConfirm;
use crate::prompt::Confirm;
use crate::prompt::StdinConfirm;
use crate::setup::Config;
use crate::startup::Orchestrator;
use crate::startup::StartupReport;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Config decides how to log, so its errors can only go to stderr.
    let (config, source) = match setup::load() {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(EXIT_CONFIG);
        }
    };

    // Held until exit so the log file is flushed.
    let _guard = log::install_tracing(&config);
    log::report_config(&source);

    info!("Vocard startup");
    info!("Using Python: {}", config.python());

    match launch(&config).await {
        Ok(report) => ExitCode::from(report.exit_code()),
        Err(e) => {
            log::report_failure(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

/// Wires the real capabilities into the [Orchestrator] and runs it.
async fn launch(config: &Config) -> Result<StartupReport, LauncherError> {
    let probe = LavalinkProbe::new(config)?;
    let runner = SystemRunner;
    let confirm: Box<dyn Confirm> = if config.assume_yes() {
        Box::new(AutoConfirm(true))
    } else {
        Box::new(StdinConfirm)
    };

    Orchestrator::builder()
        .config(config)
        .runner(&runner)
        .probe(&probe)
        .confirm(confirm.as_ref())
        .build()
        .run()
        .await
}
