use anyhow::Result;
use devboot_core::config::DevbootConfig;
use devboot_core::database;
use devboot_core::orchestrator::{ResetPrompt, TerminalPrompt};
use devboot_core::runner::SystemRunner;
use devboot_core::setup::apply_schema_and_seed;
use devboot_core::utils::ui;

pub fn reset(config: &DevbootConfig, yes: bool) -> Result<()> {
    let db_path = config.database_path();
    if !yes && db_path.exists() && !TerminalPrompt.confirm_reset(&db_path)? {
        ui::info("Aborted; database left untouched.");
        return Ok(());
    }

    ui::section("Resetting database");
    database::reset_database(&db_path);
    apply_schema_and_seed(config, &SystemRunner::default())?;
    ui::success("Database rebuilt and seeded!");
    Ok(())
}

pub fn setup(config: &DevbootConfig) -> Result<()> {
    ui::section("Applying schema and seed data");
    apply_schema_and_seed(config, &SystemRunner::default())?;
    ui::success("Schema pushed and seed data applied!");
    Ok(())
}
