//! Running external programs (pip, the container tool, the bot itself).

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use itertools::Itertools;
use tracing::debug;
use tracing::instrument;

/// A program and its arguments, ready to be run by a [CommandRunner].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    dir: Option<PathBuf>,
    /// Discard the program's output instead of passing it through.
    quiet: bool,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dir: None,
            quiet: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run the program from `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Capture and drop the program's output.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.iter().join(" "))
        }
    }
}

/// How a program finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStatus {
    /// `None` when the program was killed by a signal.
    code: Option<i32>,
}

impl RunStatus {
    #[cfg(test)]
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    #[cfg(test)]
    pub fn signalled() -> Self {
        Self { code: None }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }
}

impl From<std::process::ExitStatus> for RunStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Executes an [Invocation] and reports its status.
///
/// Spawn failures are returned as [std::io::Error]; a program that ran and
/// failed is an `Ok` with an unsuccessful [RunStatus].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<RunStatus>;
}

/// Runs programs as child processes of the launcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    #[instrument(level = "debug", skip_all, fields(command = %invocation))]
    async fn run(&self, invocation: &Invocation) -> std::io::Result<RunStatus> {
        let mut command = tokio::process::Command::new(&invocation.program);
        command.args(&invocation.args);
        if let Some(dir) = &invocation.dir {
            command.current_dir(dir);
        }

        if invocation.quiet {
            let output = command.stdin(Stdio::null()).output().await?;
            let status = RunStatus::from(output.status);
            if !status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                debug!("{invocation} finished with {status}: {}", stderr.trim());
            }
            Ok(status)
        } else {
            let status = command.status().await?;
            Ok(status.into())
        }
    }
}
