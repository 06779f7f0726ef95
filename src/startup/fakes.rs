//! Stand-ins for the launcher's capabilities, used by the tests.

use std::path::PathBuf;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::command::CommandRunner;
use crate::command::Invocation;
use crate::command::RunStatus;
use crate::probe::ServiceProbe;
use crate::setup::Config;

/// A probe whose service turns healthy at a fixed point in (tokio) time.
#[derive(Debug)]
pub struct FakeProbe {
    port_open: bool,
    ready_at: Option<Instant>,
    /// How long each health check takes.
    check_time: Duration,
    port_checks: AtomicU32,
    health_checks: AtomicU32,
    failed_checks: AtomicU32,
}

impl FakeProbe {
    fn new(port_open: bool, ready_at: Option<Instant>) -> Self {
        Self {
            port_open,
            ready_at,
            check_time: Duration::ZERO,
            port_checks: AtomicU32::new(0),
            health_checks: AtomicU32::new(0),
            failed_checks: AtomicU32::new(0),
        }
    }

    /// Port closed, healthy right away.
    pub fn healthy() -> Self {
        Self::new(false, Some(Instant::now()))
    }

    /// Port closed, healthy once `delay` has passed.
    pub fn healthy_after(delay: Duration) -> Self {
        Self::new(false, Some(Instant::now() + delay))
    }

    /// Port closed, never healthy.
    pub fn never_healthy() -> Self {
        Self::new(false, None)
    }

    /// Port closed, never healthy, and every check takes `check_time`.
    pub fn slow(check_time: Duration) -> Self {
        Self {
            check_time,
            ..Self::new(false, None)
        }
    }

    /// Something already listens on the port.
    pub fn already_running(healthy: bool) -> Self {
        let ready_at = healthy.then(Instant::now);
        Self::new(true, ready_at)
    }

    pub fn port_checks(&self) -> u32 {
        self.port_checks.load(Ordering::SeqCst)
    }

    pub fn health_checks(&self) -> u32 {
        self.health_checks.load(Ordering::SeqCst)
    }

    pub fn failed_checks(&self) -> u32 {
        self.failed_checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ServiceProbe for FakeProbe {
    async fn port_open(&self) -> bool {
        self.port_checks.fetch_add(1, Ordering::SeqCst);
        self.port_open
    }

    async fn healthy(&self) -> bool {
        self.health_checks.fetch_add(1, Ordering::SeqCst);
        if !self.check_time.is_zero() {
            tokio::time::sleep(self.check_time).await;
        }
        let healthy = self.ready_at.is_some_and(|at| Instant::now() >= at);
        if !healthy {
            self.failed_checks.fetch_add(1, Ordering::SeqCst);
        }
        healthy
    }
}

type Script = Box<dyn Fn(&str) -> std::io::Result<RunStatus> + Send + Sync>;

/// Records every invocation and answers from a script keyed on the command line.
pub struct FakeRunner {
    script: Script,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    /// Every command succeeds.
    pub fn succeeding() -> Self {
        Self::scripted(|_| Ok(RunStatus::from_code(0)))
    }

    pub fn scripted(script: impl Fn(&str) -> std::io::Result<RunStatus> + Send + Sync + 'static) -> Self {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Command lines run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn ran(&self, prefix: &str) -> bool {
        self.calls().iter().any(|call| call.starts_with(prefix))
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> std::io::Result<RunStatus> {
        let line = invocation.to_string();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(line.clone());
        }
        (self.script)(&line)
    }
}

/// A bot directory holding a `requirements.txt`, removed on drop.
pub struct BotDir {
    path: PathBuf,
}

impl BotDir {
    pub fn new(name: &str) -> Self {
        let dir = format!("vocard-startup-{}-{name}", std::process::id());
        let path = std::env::temp_dir().join(dir);
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("requirements.txt"), "discord.py\n").unwrap();
        Self { path }
    }

    /// Same directory without the manifest.
    pub fn without_manifest(self) -> Self {
        std::fs::remove_file(self.path.join("requirements.txt")).unwrap();
        self
    }

    /// A default config pointed at this directory, plus `extra` toml.
    pub fn config(&self, extra: &str) -> Config {
        let content = format!("{extra}\n[bot]\ndirectory = '{}'\n", self.path.display());
        Config::parse(&content).unwrap()
    }
}

impl Drop for BotDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
