use super::UpArgs;
use anyhow::Result;
use devboot_core::config::DevbootConfig;
use devboot_core::launcher::{Interrupt, LaunchOutcome};
use devboot_core::orchestrator::{Bootstrap, TerminalPrompt};
use devboot_core::runner::SystemRunner;

pub fn run(mut config: DevbootConfig, args: &UpArgs) -> Result<()> {
    if args.yes {
        config.bootstrap.auto_reset = true;
    }
    if args.no_prompt {
        config.bootstrap.interactive = false;
        config.bootstrap.auto_reset = false;
    }

    let runner = SystemRunner::default();
    let prompt = TerminalPrompt;
    let interrupt = Interrupt::system();
    let mut bootstrap = Bootstrap::new(&config, &runner, &prompt, &interrupt);

    match bootstrap.run()? {
        LaunchOutcome::Stopped { .. } => Ok(()),
        LaunchOutcome::Failed(outcome) => anyhow::bail!("Dev servers failed ({})", outcome),
    }
}
