use crate::config::DevbootConfig;
use crate::runner::{CommandOutcome, CommandRunner, Invocation};
use crate::utils::ui;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Records a Ctrl-C during the blocking dev-server run.
///
/// The handler is only installed by `arm`, so an interrupt before launch keeps
/// its default effect and terminates the process. After that, the runner
/// watches the flag and stops the dev servers itself.
#[derive(Debug, Clone)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
    install_handler: bool,
}

impl Interrupt {
    /// Backed by a real `ctrlc` handler once armed.
    pub fn system() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            install_handler: true,
        }
    }

    /// Never installs a signal handler; trip it by hand.
    pub fn detached() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            install_handler: false,
        }
    }

    pub fn arm(&self) -> Result<()> {
        if !self.install_handler {
            return Ok(());
        }
        let flag = Arc::clone(&self.flag);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("Failed to install Ctrl-C handler")
    }

    pub fn trip(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_tripped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// How the dev session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Interrupted by the user, or the runner exited cleanly.
    Stopped { interrupted: bool },
    /// The runner exited with a failure on its own.
    Failed(CommandOutcome),
}

/// Start the frontend and backend through the concurrent dev runner and block
/// until it exits.
///
/// The runner gets the project root as its working directory and our
/// environment unchanged; each app loads its own env file.
pub fn launch_services(
    config: &DevbootConfig,
    runner: &dyn CommandRunner,
    interrupt: &Interrupt,
) -> Result<LaunchOutcome> {
    let invocation = Invocation::new(config.commands.dev()?, &config.project_root);

    interrupt.arm()?;
    ui::running(
        &invocation.command.to_string(),
        &config.project_root.display().to_string(),
    );
    ui::info("Press Ctrl-C to stop both services.");

    let outcome = runner.run_until_interrupted(&invocation, interrupt)?;

    if interrupt.is_tripped() {
        ui::success("Shutting down services...");
        return Ok(LaunchOutcome::Stopped { interrupted: true });
    }

    match outcome {
        CommandOutcome::Success => {
            ui::success("Dev servers exited.");
            Ok(LaunchOutcome::Stopped { interrupted: false })
        }
        failed => {
            ui::error(&format!("`{}` ended with {}", invocation.command, failed));
            Ok(LaunchOutcome::Failed(failed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns a fixed outcome, optionally tripping the interrupt mid-run the
    /// way a Ctrl-C during the dev session would.
    struct DevRunner {
        outcome: CommandOutcome,
        trip: Option<Interrupt>,
    }

    impl CommandRunner for DevRunner {
        fn run(&self, invocation: &Invocation) -> Result<CommandOutcome> {
            assert_eq!(invocation.command.to_string(), "npm run dev");
            assert!(invocation.env.is_none());
            if let Some(interrupt) = &self.trip {
                interrupt.trip();
            }
            Ok(self.outcome)
        }
    }

    #[test]
    fn interrupt_is_graceful_even_with_failed_status() {
        let dir = tempfile::tempdir().unwrap();
        let config = DevbootConfig::defaults(dir.path());
        let interrupt = Interrupt::detached();
        let runner = DevRunner {
            outcome: CommandOutcome::Failed { code: Some(130) },
            trip: Some(interrupt.clone()),
        };

        let outcome = launch_services(&config, &runner, &interrupt).unwrap();
        assert_eq!(outcome, LaunchOutcome::Stopped { interrupted: true });
    }

    #[test]
    fn failed_runner_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = DevbootConfig::defaults(dir.path());
        let runner = DevRunner {
            outcome: CommandOutcome::Failed { code: Some(1) },
            trip: None,
        };

        let outcome = launch_services(&config, &runner, &Interrupt::detached()).unwrap();
        assert_eq!(
            outcome,
            LaunchOutcome::Failed(CommandOutcome::Failed { code: Some(1) })
        );
    }

    #[test]
    fn clean_exit_is_stopped() {
        let dir = tempfile::tempdir().unwrap();
        let config = DevbootConfig::defaults(dir.path());
        let runner = DevRunner {
            outcome: CommandOutcome::Success,
            trip: None,
        };

        let outcome = launch_services(&config, &runner, &Interrupt::detached()).unwrap();
        assert_eq!(outcome, LaunchOutcome::Stopped { interrupted: false });
    }

    #[cfg(unix)]
    #[test]
    fn interrupt_sent_only_to_us_still_stops_services() {
        use crate::runner::SystemRunner;
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let mut config = DevbootConfig::defaults(dir.path());
        config.commands.dev = vec!["sleep".to_string(), "30".to_string()];
        let runner = SystemRunner {
            shutdown_grace: Duration::from_millis(200),
        };
        let interrupt = Interrupt::detached();

        let tripper = interrupt.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(300));
            tripper.trip();
        });

        let started = Instant::now();
        let outcome = launch_services(&config, &runner, &interrupt).unwrap();
        handle.join().unwrap();

        assert_eq!(outcome, LaunchOutcome::Stopped { interrupted: true });
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn detached_interrupt_arms_without_handler() {
        let interrupt = Interrupt::detached();
        interrupt.arm().unwrap();
        assert!(!interrupt.is_tripped());
        interrupt.trip();
        assert!(interrupt.is_tripped());
    }
}
