//! `.env` files: creating them from templates and reading them back.

use crate::config::DevbootConfig;
use crate::runner::EnvMap;
use crate::utils::{self, ui};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// What `materialize` did for one env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFileAction {
    /// The file was already there and was left alone.
    Existing(PathBuf),
    /// Copied from its template.
    Copied(PathBuf),
    /// No template; a minimal default was written.
    WroteDefault(PathBuf),
    /// No template and no known default; nothing was created.
    Skipped(PathBuf),
}

/// One env file to ensure: destination, template, and the fallback content
/// when the template is missing.
struct EnvTarget {
    path: PathBuf,
    template: PathBuf,
    fallback: Option<String>,
}

fn ensure_env_file(root: &Path, target: &EnvTarget) -> Result<EnvFileAction> {
    let shown = utils::display_path(root, &target.path);

    if target.path.exists() {
        ui::skipped(&shown, "already exists");
        return Ok(EnvFileAction::Existing(target.path.clone()));
    }

    if target.template.exists() {
        utils::copy_file(&target.template, &target.path)?;
        ui::created(&format!(
            "{} (from {})",
            shown,
            utils::display_path(root, &target.template)
        ));
        return Ok(EnvFileAction::Copied(target.path.clone()));
    }

    match &target.fallback {
        Some(content) => {
            utils::write_file(&target.path, content)?;
            ui::created(&format!("{} (default)", shown));
            Ok(EnvFileAction::WroteDefault(target.path.clone()))
        }
        None => {
            ui::warn(&format!(
                "{} not found; {} was not created",
                utils::display_path(root, &target.template),
                shown
            ));
            Ok(EnvFileAction::Skipped(target.path.clone()))
        }
    }
}

/// Make sure the backend and frontend env files exist.
///
/// Existing files are never touched, so running this repeatedly is a no-op
/// after the first time. The backend file falls back to a one-key default when
/// its template is missing; the frontend file has no generic default and is
/// skipped with a warning.
pub fn materialize(config: &DevbootConfig) -> Result<Vec<EnvFileAction>> {
    let root = &config.project_root;
    let layout = &config.layout;

    let targets = [
        EnvTarget {
            path: root.join(&layout.backend_env),
            template: root.join(&layout.backend_env_template),
            fallback: Some(config.default_backend_env()),
        },
        EnvTarget {
            path: root.join(&layout.frontend_env),
            template: root.join(&layout.frontend_env_template),
            fallback: None,
        },
    ];

    targets
        .iter()
        .map(|target| ensure_env_file(root, target))
        .collect()
}

/// Parse one `KEY=VALUE` line. Comments, blank lines, lines without `=` and
/// lines with an empty key yield `None`.
pub fn parse_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    Some((key.to_string(), unquote(value.trim()).trim().to_string()))
}

/// Strip one pair of matching surrounding quotes. Anything else is kept as is.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

/// Read `path` on top of `inherited`. File values win on key collision.
/// A missing file returns `inherited` unchanged.
pub fn read_env_file<I>(path: &Path, inherited: I) -> Result<EnvMap>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env: EnvMap = inherited.into_iter().collect();

    if !path.exists() {
        return Ok(env);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    env.extend(content.lines().filter_map(parse_line));
    Ok(env)
}

/// This process's environment as strings. Variables whose name or value is
/// not valid UTF-8 are left out with a warning; children still inherit them
/// because the runner only overlays the map.
pub fn inherited_env() -> EnvMap {
    std::env::vars_os()
        .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
            (Ok(name), Ok(value)) => Some((name, value)),
            (name, _) => {
                let name = match name {
                    Ok(name) => name,
                    Err(raw) => raw.to_string_lossy().into_owned(),
                };
                ui::warn(&format!(
                    "{} is not valid UTF-8; passed through unchanged",
                    name
                ));
                None
            }
        })
        .collect()
}

/// `read_env_file` seeded from this process's environment.
pub fn load_env(path: &Path) -> Result<EnvMap> {
    read_env_file(path, inherited_env())
}
