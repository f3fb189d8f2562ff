use anyhow::Result;
use devboot_core::config::DevbootConfig;
use devboot_core::envfile::{self, EnvFileAction};
use devboot_core::utils::ui;

pub fn run(config: &DevbootConfig) -> Result<()> {
    ui::section("Environment files");
    let actions = envfile::materialize(config)?;

    let created = actions
        .iter()
        .filter(|a| matches!(a, EnvFileAction::Copied(_) | EnvFileAction::WroteDefault(_)))
        .count();
    if created == 0 {
        ui::success("Nothing to do.");
    } else {
        ui::success(&format!("Created {} env file(s).", created));
    }
    Ok(())
}
