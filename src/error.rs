//! Errors that stop the launcher.
//!
//! Expected outcomes (a closed port, a failing health check while waiting) are
//! plain booleans and never show up here.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Exit status for fatal orchestration failures.
pub const EXIT_FAILURE: u8 = 1;

/// Exit status for a config file that can't be used.
pub const EXIT_CONFIG: u8 = 2;

/// Any error that aborts the startup sequence.
#[derive(Error, Debug)]
pub enum LauncherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Could not build the HTTP client.")]
    HttpClient(#[from] reqwest::Error),

    #[error("{} not found!", path.display())]
    MissingManifest { path: PathBuf },

    #[error("Python interpreter '{python}' could not be started.")]
    InterpreterNotFound {
        python: String,
        source: std::io::Error,
    },

    #[error("Dependency installation declined.")]
    InstallDeclined,

    #[error("Failed to install dependencies ({status}).")]
    InstallFailed { status: String },

    #[error("'{program} compose' is not available on this system.")]
    ContainerToolMissing { program: String },

    #[error("'{command}' failed: {reason}")]
    LaunchFailed { command: String, reason: String },

    #[error("Lavalink did not become ready within {} seconds.", max_wait.as_secs())]
    ReadinessTimeout { max_wait: Duration },

    #[error("Could not start the bot with '{command}'.")]
    BotSpawn {
        command: String,
        source: std::io::Error,
    },
}

impl LauncherError {
    /// The process exit status this error maps to.
    pub fn exit_code(&self) -> u8 {
        match self {
            LauncherError::Config(_) => EXIT_CONFIG,
            _ => EXIT_FAILURE,
        }
    }
}

/// Errors relating to `startup.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config: {reason}")]
    InvalidConfig { reason: String },

    #[error("Could not access config file: {0}")]
    IoError(#[from] std::io::Error),
}
