use crate::utils::ui;
use std::path::Path;

/// Result of a database reset. Never an error: a file that cannot be removed
/// is reported and left for the schema tool to complain about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseReset {
    Removed,
    Absent,
    Failed(String),
}

/// Delete the local database file if it exists.
pub fn reset_database(path: &Path) -> DatabaseReset {
    if !path.exists() {
        ui::info(&format!("No database at {}; nothing to remove", path.display()));
        return DatabaseReset::Absent;
    }

    match std::fs::remove_file(path) {
        Ok(()) => {
            ui::removed(&path.display().to_string());
            DatabaseReset::Removed
        }
        Err(e) => {
            ui::error(&format!("Could not remove {}: {}", path.display(), e));
            DatabaseReset::Failed(e.to_string())
        }
    }
}
