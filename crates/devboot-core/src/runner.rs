//! The single seam through which every external tool is launched.

use crate::launcher::Interrupt;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

/// Variable name → value, as handed to a child process.
pub type EnvMap = BTreeMap<String, String>;

/// A program plus its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Build from `[program, args...]`; `name` identifies the config entry in errors.
    pub fn parse(name: &str, parts: &[String]) -> Result<Self> {
        match parts.split_first() {
            Some((program, args)) if !program.trim().is_empty() => Ok(Self {
                program: program.clone(),
                args: args.to_vec(),
            }),
            _ => anyhow::bail!("Command '{}' is empty in devboot configuration", name),
        }
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// One external invocation: what to run, where, and with which environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: CommandLine,
    pub cwd: PathBuf,
    /// Variables set for the child on top of our own environment. `None`
    /// leaves the inherited environment untouched.
    pub env: Option<EnvMap>,
}

impl Invocation {
    pub fn new(command: CommandLine, cwd: &Path) -> Self {
        Self {
            command,
            cwd: cwd.to_path_buf(),
            env: None,
        }
    }

    pub fn with_env(mut self, env: EnvMap) -> Self {
        self.env = Some(env);
        self
    }
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    /// Non-zero exit; `code` is `None` when the child was killed by a signal.
    Failed { code: Option<i32> },
}

impl CommandOutcome {
    pub fn success(&self) -> bool {
        matches!(self, CommandOutcome::Success)
    }
}

impl From<ExitStatus> for CommandOutcome {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            CommandOutcome::Success
        } else {
            CommandOutcome::Failed {
                code: status.code(),
            }
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Success => write!(f, "exit status 0"),
            CommandOutcome::Failed { code: Some(code) } => write!(f, "exit status {}", code),
            CommandOutcome::Failed { code: None } => write!(f, "terminated by signal"),
        }
    }
}

/// Runs an external command to completion and reports its exit status.
///
/// `Err` means the command could not be started at all; a command that ran and
/// failed is `Ok(CommandOutcome::Failed { .. })`.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutcome>;

    /// Like `run`, but stop the child once `interrupt` trips.
    fn run_until_interrupted(
        &self,
        invocation: &Invocation,
        _interrupt: &Interrupt,
    ) -> Result<CommandOutcome> {
        self.run(invocation)
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Spawns real processes, inheriting stdio so tool output reaches the terminal.
#[derive(Debug, Clone, Copy)]
pub struct SystemRunner {
    /// How long an interrupted child gets to exit on its own before it is killed.
    pub shutdown_grace: Duration,
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self {
            shutdown_grace: Duration::from_secs(3),
        }
    }
}

impl SystemRunner {
    fn command(invocation: &Invocation) -> Command {
        let mut cmd = Command::new(&invocation.command.program);
        cmd.args(&invocation.command.args)
            .current_dir(&invocation.cwd);
        if let Some(env) = &invocation.env {
            cmd.envs(env);
        }
        cmd
    }

    fn start_error(invocation: &Invocation) -> String {
        format!(
            "Failed to start `{}` in {}",
            invocation.command,
            invocation.cwd.display()
        )
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutcome> {
        let status = Self::command(invocation)
            .status()
            .with_context(|| Self::start_error(invocation))?;
        Ok(status.into())
    }

    /// A terminal Ctrl-C reaches the child as well, so it usually exits within
    /// the grace period. A signal sent to us alone does not, and the child is
    /// killed once the grace period runs out.
    fn run_until_interrupted(
        &self,
        invocation: &Invocation,
        interrupt: &Interrupt,
    ) -> Result<CommandOutcome> {
        let mut child = Self::command(invocation)
            .spawn()
            .with_context(|| Self::start_error(invocation))?;
        let mut kill_at: Option<Instant> = None;

        loop {
            if let Some(status) = child
                .try_wait()
                .with_context(|| format!("Failed to wait for `{}`", invocation.command))?
            {
                return Ok(status.into());
            }

            if interrupt.is_tripped() {
                let deadline = *kill_at.get_or_insert_with(|| Instant::now() + self.shutdown_grace);
                if Instant::now() >= deadline {
                    // Already exited between try_wait and here is fine.
                    let _ = child.kill();
                    let status = child
                        .wait()
                        .with_context(|| format!("Failed to wait for `{}`", invocation.command))?;
                    return Ok(status.into());
                }
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}
