use crate::config::DevbootConfig;
use crate::envfile;
use crate::runner::{CommandRunner, Invocation};
use crate::utils::{self, ui};
use anyhow::{Context, Result};

/// Whether `ensure_dependencies` had to run the installer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStatus {
    AlreadyInstalled,
    Installed,
}

/// Run one invocation and turn a non-zero exit into a fatal error.
fn run_required(runner: &dyn CommandRunner, invocation: &Invocation, what: &str) -> Result<()> {
    ui::running(
        &invocation.command.to_string(),
        &invocation.cwd.display().to_string(),
    );
    let outcome = runner.run(invocation)?;
    if !outcome.success() {
        anyhow::bail!(
            "{} failed (`{}`, {})",
            what,
            invocation.command,
            outcome
        );
    }
    Ok(())
}

/// Run the package installer when the dependency marker directory is missing.
pub fn ensure_dependencies(
    config: &DevbootConfig,
    runner: &dyn CommandRunner,
) -> Result<DependencyStatus> {
    let marker = config.deps_marker_path();
    if marker.exists() {
        ui::skipped(
            &utils::display_path(&config.project_root, &marker),
            "dependencies already installed",
        );
        return Ok(DependencyStatus::AlreadyInstalled);
    }

    let invocation = Invocation::new(config.commands.install()?, &config.project_root);
    run_required(runner, &invocation, "Dependency install")?;
    Ok(DependencyStatus::Installed)
}

/// Push the schema, then seed, both from the backend root with the backend
/// env file overlaid on our environment.
///
/// The seed step never runs after a failed schema push.
pub fn apply_schema_and_seed(config: &DevbootConfig, runner: &dyn CommandRunner) -> Result<()> {
    let schema_push = config.commands.schema_push()?;
    let seed = config.commands.seed()?;

    // The schema tool creates the database file but not its directory.
    if let Some(parent) = config.database_path().parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let env = envfile::load_env(&config.backend_env_path())?;
    let backend_root = config.backend_root();

    let push = Invocation::new(schema_push, &backend_root).with_env(env.clone());
    run_required(runner, &push, "Schema push")?;

    let seed = Invocation::new(seed, &backend_root).with_env(env);
    run_required(runner, &seed, "Seed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::CommandOutcome;
    use std::cell::RefCell;

    /// Answers every invocation with the next scripted outcome (success once
    /// the script runs out) and records what it was asked to run.
    #[derive(Default)]
    struct ScriptedRunner {
        outcomes: RefCell<Vec<CommandOutcome>>,
        calls: RefCell<Vec<Invocation>>,
    }

    impl ScriptedRunner {
        fn failing_first(code: i32) -> Self {
            Self {
                outcomes: RefCell::new(vec![CommandOutcome::Failed { code: Some(code) }]),
                ..Self::default()
            }
        }

        fn programs(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .map(|i| i.command.to_string())
                .collect()
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, invocation: &Invocation) -> Result<CommandOutcome> {
            self.calls.borrow_mut().push(invocation.clone());
            let mut outcomes = self.outcomes.borrow_mut();
            if outcomes.is_empty() {
                Ok(CommandOutcome::Success)
            } else {
                Ok(outcomes.remove(0))
            }
        }
    }

    #[test]
    fn installer_skipped_when_marker_present() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("node_modules")).unwrap();
        let config = DevbootConfig::defaults(dir.path());
        let runner = ScriptedRunner::default();

        let status = ensure_dependencies(&config, &runner).unwrap();
        assert_eq!(status, DependencyStatus::AlreadyInstalled);
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn installer_runs_at_project_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = DevbootConfig::defaults(dir.path());
        let runner = ScriptedRunner::default();

        let status = ensure_dependencies(&config, &runner).unwrap();
        assert_eq!(status, DependencyStatus::Installed);

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].command.to_string(), "npm install");
        assert_eq!(calls[0].cwd, dir.path());
        assert!(calls[0].env.is_none());
    }

    #[test]
    fn installer_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = DevbootConfig::defaults(dir.path());
        let runner = ScriptedRunner::failing_first(1);

        let err = ensure_dependencies(&config, &runner).unwrap_err();
        assert!(err.to_string().contains("Dependency install failed"));
    }

    #[test]
    fn schema_then_seed_with_backend_env() {
        let dir = tempfile::tempdir().unwrap();
        let config = DevbootConfig::defaults(dir.path());
        utils::write_file(&config.backend_env_path(), "DATABASE_URL=\"file:./t.db\"\n").unwrap();
        let runner = ScriptedRunner::default();

        apply_schema_and_seed(&config, &runner).unwrap();

        assert_eq!(
            runner.programs(),
            vec!["npx prisma db push", "npx tsx src/seed.ts"]
        );
        for call in runner.calls.borrow().iter() {
            assert_eq!(call.cwd, dir.path().join("apps/api"));
            let env = call.env.as_ref().unwrap();
            assert_eq!(env["DATABASE_URL"], "file:./t.db");
        }
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn seed_not_run_after_schema_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = DevbootConfig::defaults(dir.path());
        let runner = ScriptedRunner::failing_first(1);

        let err = apply_schema_and_seed(&config, &runner).unwrap_err();
        assert!(err.to_string().contains("Schema push failed"));
        assert_eq!(runner.programs(), vec!["npx prisma db push"]);
    }

    #[test]
    fn seed_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = DevbootConfig::defaults(dir.path());
        let runner = ScriptedRunner {
            outcomes: RefCell::new(vec![
                CommandOutcome::Success,
                CommandOutcome::Failed { code: None },
            ]),
            ..ScriptedRunner::default()
        };

        let err = apply_schema_and_seed(&config, &runner).unwrap_err();
        assert!(err.to_string().contains("Seed failed"));
        assert!(err.to_string().contains("terminated by signal"));
    }
}
