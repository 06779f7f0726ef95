//! Bringing Lavalink up through the container tool.

use tracing::debug;
use tracing::info;
use tracing::instrument;
use tracing::warn;

use crate::command::CommandRunner;
use crate::command::Invocation;
use crate::error::LauncherError;
use crate::setup::Config;

/// `<program> compose` run from the compose project directory.
fn compose(config: &Config) -> Invocation {
    Invocation::new(config.compose_program())
        .arg("compose")
        .current_dir(config.compose_dir())
}

/// Starts the Lavalink service detached. Fails without launching anything if
/// the container tool isn't available.
#[instrument(level = "debug", skip_all)]
pub(super) async fn start(config: &Config, runner: &dyn CommandRunner) -> Result<(), LauncherError> {
    let program = config.compose_program();
    info!("Starting Lavalink with {program} compose...");

    let version = compose(config).arg("version").quiet();
    let available = match runner.run(&version).await {
        Ok(status) => status.success(),
        Err(e) => {
            debug!("Could not run '{version}': {e}");
            false
        }
    };
    if !available {
        manual_start_hint(config);
        return Err(LauncherError::ContainerToolMissing {
            program: program.to_string(),
        });
    }

    let up = compose(config).args(["up", "-d", config.compose_service()]);
    let launch_failed = |reason: String| LauncherError::LaunchFailed {
        command: up.to_string(),
        reason,
    };
    match runner.run(&up).await {
        Ok(status) if status.success() => {
            info!("{program} compose command executed");
            Ok(())
        }
        Ok(status) => {
            manual_start_hint(config);
            Err(launch_failed(status.to_string()))
        }
        Err(e) => Err(launch_failed(e.to_string())),
    }
}

/// Prints the tail of the service's logs. Failure here only warns.
#[instrument(level = "debug", skip_all)]
pub(super) async fn show_logs(config: &Config, runner: &dyn CommandRunner) {
    let logs = compose(config)
        .args(["logs", "--tail"])
        .arg(config.log_tail().to_string())
        .arg(config.compose_service());

    info!("Last Lavalink log lines ({logs}):");
    match runner.run(&logs).await {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("'{logs}' finished with {status}"),
        Err(e) => warn!("Could not run '{logs}': {e}"),
    }
}

fn manual_start_hint(config: &Config) {
    warn!("Please start Lavalink manually with one of these methods:");
    warn!(
        "  1. Docker: {} compose up {}",
        config.compose_program(),
        config.compose_service()
    );
    warn!("  2. Java: java -jar Lavalink.jar");
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::command::RunStatus;
    use crate::startup::fakes::FakeRunner;

    #[tokio::test]
    async fn starts_service_detached() {
        let runner = FakeRunner::succeeding();

        start(&Config::default(), &runner).await.unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                "docker compose version".to_string(),
                "docker compose up -d lavalink".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn missing_tool_never_launches() {
        let runner = FakeRunner::scripted(|_| Err(std::io::ErrorKind::NotFound.into()));

        let err = start(&Config::default(), &runner).await.unwrap_err();

        assert!(matches!(err, LauncherError::ContainerToolMissing { .. }), "{err}");
        assert!(!runner.ran("docker compose up"));
    }

    #[tokio::test]
    async fn tool_without_compose_counts_as_missing() {
        let runner = FakeRunner::scripted(|_| Ok(RunStatus::from_code(1)));

        let err = start(&Config::default(), &runner).await.unwrap_err();

        assert!(matches!(err, LauncherError::ContainerToolMissing { .. }), "{err}");
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn failing_launch_is_fatal() {
        let runner = FakeRunner::scripted(|line| {
            let code = if line.contains(" up ") { 17 } else { 0 };
            Ok(RunStatus::from_code(code))
        });

        let err = start(&Config::default(), &runner).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "'docker compose up -d lavalink' failed: exit code 17"
        );
    }

    #[tokio::test]
    async fn logs_use_configured_tail_and_tolerate_failure() {
        let config = Config::parse("[compose]\nprogram = \"podman\"\nlog_tail = 20\n").unwrap();
        let runner = FakeRunner::scripted(|_| Ok(RunStatus::from_code(1)));

        show_logs(&config, &runner).await;

        assert_eq!(
            runner.calls(),
            vec!["podman compose logs --tail 20 lavalink".to_string()]
        );
    }
}
