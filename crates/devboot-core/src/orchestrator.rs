//! Top-level bootstrap: dependencies, env files, optional database reset and
//! seed, then the dev servers.

use crate::config::DevbootConfig;
use crate::database::{self, DatabaseReset};
use crate::envfile::{self, EnvFileAction};
use crate::launcher::{self, Interrupt, LaunchOutcome};
use crate::runner::CommandRunner;
use crate::setup::{self, DependencyStatus};
use crate::utils::{self, ui};
use anyhow::Result;
use dialoguer::Input;
use std::io::IsTerminal;
use std::path::Path;

const TOTAL_STEPS: usize = 4;

/// Whether the database is rebuilt before launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDecision {
    ResetAndSetup,
    SkipSetup,
}

/// Progress through a bootstrap run, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    NotStarted,
    DependenciesChecked(DependencyStatus),
    EnvMaterialized(Vec<EnvFileAction>),
    ResetDecided(ResetDecision),
    DatabaseReset(DatabaseReset),
    SchemaApplied,
    ServicesRunning,
    Stopped,
    Failed,
}

/// Asks whether an existing database should be wiped.
pub trait ResetPrompt {
    fn confirm_reset(&self, database: &Path) -> Result<bool>;
}

/// `y` or `yes`, any case. Everything else declines.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Prompts on the terminal. A non-interactive stdin declines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl ResetPrompt for TerminalPrompt {
    fn confirm_reset(&self, database: &Path) -> Result<bool> {
        if !std::io::stdin().is_terminal() {
            ui::warn("stdin is not a terminal; keeping the existing database");
            return Ok(false);
        }

        let answer: String = Input::new()
            .with_prompt(format!(
                "{} exists. Delete it and re-run schema push + seed? [y/N]",
                database.display()
            ))
            .allow_empty(true)
            .interact_text()?;
        Ok(is_affirmative(&answer))
    }
}

/// Pick the reset path. A missing database always means first-time setup.
pub fn decide_reset(
    config: &DevbootConfig,
    database_exists: bool,
    prompt: &dyn ResetPrompt,
) -> Result<ResetDecision> {
    if !database_exists || config.bootstrap.auto_reset {
        return Ok(ResetDecision::ResetAndSetup);
    }
    if config.bootstrap.interactive && prompt.confirm_reset(&config.database_path())? {
        return Ok(ResetDecision::ResetAndSetup);
    }
    Ok(ResetDecision::SkipSetup)
}

/// One bootstrap run over an immutable config.
pub struct Bootstrap<'a> {
    config: &'a DevbootConfig,
    runner: &'a dyn CommandRunner,
    prompt: &'a dyn ResetPrompt,
    interrupt: &'a Interrupt,
    stages: Vec<Stage>,
}

impl<'a> Bootstrap<'a> {
    pub fn new(
        config: &'a DevbootConfig,
        runner: &'a dyn CommandRunner,
        prompt: &'a dyn ResetPrompt,
        interrupt: &'a Interrupt,
    ) -> Self {
        Self {
            config,
            runner,
            prompt,
            interrupt,
            stages: vec![Stage::NotStarted],
        }
    }

    /// Stages reached so far.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Run every step. Setup failures are returned as errors before the dev
    /// servers are started; once they are running the outcome is reported.
    pub fn run(&mut self) -> Result<LaunchOutcome> {
        match self.run_steps() {
            Ok(outcome) => {
                self.stages.push(match outcome {
                    LaunchOutcome::Stopped { .. } => Stage::Stopped,
                    LaunchOutcome::Failed(_) => Stage::Failed,
                });
                Ok(outcome)
            }
            Err(e) => {
                self.stages.push(Stage::Failed);
                Err(e)
            }
        }
    }

    fn run_steps(&mut self) -> Result<LaunchOutcome> {
        let config = self.config;
        println!("Project root: {}", config.project_root.display());

        ui::step(1, TOTAL_STEPS, "Checking dependencies");
        let deps = setup::ensure_dependencies(config, self.runner)?;
        self.stages.push(Stage::DependenciesChecked(deps));

        ui::step(2, TOTAL_STEPS, "Preparing environment files");
        let actions = envfile::materialize(config)?;
        self.stages.push(Stage::EnvMaterialized(actions));

        ui::step(3, TOTAL_STEPS, "Preparing database");
        let db_path = config.database_path();
        let shown = utils::display_path(&config.project_root, &db_path);
        let db_exists = db_path.exists();
        let decision = decide_reset(config, db_exists, self.prompt)?;
        self.stages.push(Stage::ResetDecided(decision));

        match decision {
            ResetDecision::ResetAndSetup => {
                if db_exists {
                    ui::info(&format!("Resetting {}", shown));
                } else {
                    ui::info(&format!("No database at {}; running first-time setup", shown));
                }
                let reset = database::reset_database(&db_path);
                self.stages.push(Stage::DatabaseReset(reset));

                setup::apply_schema_and_seed(config, self.runner)?;
                self.stages.push(Stage::SchemaApplied);
            }
            ResetDecision::SkipSetup => {
                ui::skipped(&shown, "keeping existing database");
                if !config.bootstrap.interactive {
                    // Existence is the only check; schema drift goes unnoticed here.
                    ui::info("Schema is not re-checked; run `devboot db setup` after model changes.");
                }
            }
        }

        ui::step(4, TOTAL_STEPS, "Starting services");
        self.stages.push(Stage::ServicesRunning);
        launcher::launch_services(config, self.runner, self.interrupt)
    }
}
