//! Configuration for the startup sequence.

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use url::Url;

use crate::error::ConfigError;

/// The default path to the config file
const CONFIG_PATH: &str = "startup.toml";

/// Environment variable that overrides [CONFIG_PATH].
const CONFIG_PATH_VAR: &str = "VOCARD_STARTUP_CONFIG";

/// Settings read from [CONFIG_PATH]. Immutable once read.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// See [LavalinkConfig]
    lavalink: LavalinkConfig,

    /// See [ComposeConfig]
    compose: ComposeConfig,

    /// See [BotConfig]
    bot: BotConfig,

    /// See [LoggingConfig]
    logging: LoggingConfig,
}

/// How the config was obtained, reported once logging is up.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// Read from an existing file.
    File(PathBuf),
    /// No file existed, defaults were written to this path.
    Created(PathBuf),
    /// The file was empty, defaults were written back to it.
    Rewritten(PathBuf),
    /// The defaults could not be written to this path and are used unsaved.
    Unsaved { path: PathBuf, reason: String },
}

impl Config {
    /// Path of the config file, honoring [CONFIG_PATH_VAR].
    pub fn path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(CONFIG_PATH))
    }

    /// Tries to read the config file at `path`.
    /// If the file doesn't exist, writes the defaults there and uses them.
    /// If the file exists but is empty, re-writes the defaults and uses them.
    /// If the defaults can't be written, they are still used.
    /// If the file exists but is malformed or invalid, returns an error naming the problem.
    /// If file existence is indeterminate (e.g. missing permissions), returns an error.
    pub fn read(path: &Path) -> Result<(Config, ConfigSource), ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                if content.trim().is_empty() {
                    Ok(defaults(path, ConfigSource::Rewritten(path.to_path_buf())))
                } else {
                    let config = Config::parse(&content)?;
                    Ok((config, ConfigSource::File(path.to_path_buf())))
                }
            }
            Err(file_error) => match file_error.kind() {
                std::io::ErrorKind::NotFound => {
                    Ok(defaults(path, ConfigSource::Created(path.to_path_buf())))
                }
                _ => Err(ConfigError::IoError(file_error)),
            },
        }
    }

    /// Deserializes and validates a config from toml text.
    /// Missing keys take their default values.
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        let to_toml = toml::Deserializer::new(content);
        let config: Config = serde_path_to_error::deserialize(to_toml).map_err(|error| {
            ConfigError::InvalidConfig {
                reason: error.to_string(),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Sanity checks on values that would make the startup sequence meaningless.
    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| {
            Err(ConfigError::InvalidConfig {
                reason: reason.to_string(),
            })
        };

        let lavalink = &self.lavalink;
        if lavalink.host.trim().is_empty() {
            return invalid("lavalink.host can't be empty");
        }
        if lavalink.port == 0 {
            return invalid("lavalink.port can't be 0");
        }
        if lavalink.poll_interval_secs == 0 {
            return invalid("lavalink.poll_interval_secs can't be 0");
        }
        if lavalink.poll_interval_secs > lavalink.max_wait_secs {
            return invalid("lavalink.poll_interval_secs can't exceed lavalink.max_wait_secs");
        }
        if self.bot.python.trim().is_empty() {
            return invalid("bot.python can't be empty");
        }
        if self.compose.program.trim().is_empty() {
            return invalid("compose.program can't be empty");
        }

        self.version_url().map(|_| ())
    }

    /// The url of Lavalink's `/version` endpoint.
    pub fn version_url(&self) -> Result<Url, ConfigError> {
        let LavalinkConfig { host, port, .. } = &self.lavalink;
        Url::parse(&format!("http://{host}:{port}/version")).map_err(|error| {
            ConfigError::InvalidConfig {
                reason: format!("lavalink.host '{host}' is not a valid host: {error}"),
            }
        })
    }

    pub fn host(&self) -> &str {
        &self.lavalink.host
    }

    pub fn port(&self) -> u16 {
        self.lavalink.port
    }

    /// Sent as the `Authorization` header.
    pub fn password(&self) -> &str {
        &self.lavalink.password
    }

    /// Upper bound on the readiness wait.
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.lavalink.max_wait_secs)
    }

    /// Delay between health checks.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.lavalink.poll_interval_secs)
    }

    /// Timeout of a single health check request.
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.lavalink.probe_timeout_secs)
    }

    /// Timeout of the port probe.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.lavalink.connect_timeout_ms)
    }

    /// How often the readiness wait reports progress.
    pub fn progress_every(&self) -> Duration {
        Duration::from_secs(self.lavalink.progress_every_secs)
    }

    pub fn compose_program(&self) -> &str {
        &self.compose.program
    }

    pub fn compose_service(&self) -> &str {
        &self.compose.service
    }

    pub fn compose_dir(&self) -> &Path {
        &self.compose.project_dir
    }

    /// Number of service log lines shown after a timeout.
    pub fn log_tail(&self) -> u32 {
        self.compose.log_tail
    }

    pub fn python(&self) -> &str {
        &self.bot.python
    }

    pub fn entry_point(&self) -> &str {
        &self.bot.entry_point
    }

    pub fn bot_dir(&self) -> &Path {
        &self.bot.directory
    }

    /// The requirements manifest, relative to the bot directory.
    pub fn requirements(&self) -> PathBuf {
        self.bot.directory.join(&self.bot.requirements)
    }

    /// The requirements manifest as passed to pip from inside the bot directory.
    pub fn requirements_arg(&self) -> &str {
        &self.bot.requirements
    }

    /// Python modules that must be importable before the bot can start.
    pub fn required_modules(&self) -> &[String] {
        &self.bot.required_modules
    }

    /// Skip the install prompt and answer yes.
    pub fn assume_yes(&self) -> bool {
        self.bot.assume_yes
    }

    /// Getter for log_dir.
    pub fn log_dir(&self) -> &str {
        &self.logging.log_dir
    }

    /// Is debug mode enabled for console logs
    pub fn console_debug(&self) -> bool {
        self.logging.console_debug
    }

    /// Is file logging enabled.
    pub fn logs_enabled(&self) -> bool {
        self.logging.logs_enabled
    }
}

/// Where Lavalink lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct LavalinkConfig {
    host: String,
    port: u16,
    password: String,
    max_wait_secs: u64,
    poll_interval_secs: u64,
    probe_timeout_secs: u64,
    connect_timeout_ms: u64,
    progress_every_secs: u64,
}

impl Default for LavalinkConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 2333,
            password: "youshallnotpass".to_string(),
            max_wait_secs: 120,
            poll_interval_secs: 2,
            probe_timeout_secs: 5,
            connect_timeout_ms: 1000,
            progress_every_secs: 10,
        }
    }
}

/// The container tool used to bring Lavalink up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct ComposeConfig {
    /// Program providing the `compose` subcommand.
    program: String,
    /// Name of the Lavalink service in the compose file.
    service: String,
    /// Directory holding the compose file.
    project_dir: PathBuf,
    log_tail: u32,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            program: "docker".to_string(),
            service: "lavalink".to_string(),
            project_dir: PathBuf::from("."),
            log_tail: 50,
        }
    }
}

/// The bot process and its Python environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct BotConfig {
    python: String,
    entry_point: String,
    directory: PathBuf,
    requirements: String,
    required_modules: Vec<String>,
    assume_yes: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            entry_point: "main.py".to_string(),
            directory: PathBuf::from("."),
            requirements: "requirements.txt".to_string(),
            required_modules: vec!["discord".to_string(), "voicelink".to_string()],
            assume_yes: false,
        }
    }
}

/// Configs for log output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct LoggingConfig {
    /// Print debug traces to console?
    console_debug: bool,
    /// Enable writing to log file?
    logs_enabled: bool,
    /// Directory to store log files
    log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_debug: false,
            logs_enabled: true,
            log_dir: "logs".to_string(),
        }
    }
}

/// The default config, written to `path` if possible.
/// `written` is reported when the write succeeds.
fn defaults(path: &Path, written: ConfigSource) -> (Config, ConfigSource) {
    let config = Config::default();
    let source = match write_file(path, &config) {
        Ok(()) => written,
        Err(error) => ConfigSource::Unsaved {
            path: path.to_path_buf(),
            reason: error.to_string(),
        },
    };
    (config, source)
}

/// Write the given config to `path`.
fn write_file(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config).map_err(|error| ConfigError::InvalidConfig {
        reason: error.to_string(),
    })?;
    std::fs::write(path, content).map_err(ConfigError::IoError)
}
