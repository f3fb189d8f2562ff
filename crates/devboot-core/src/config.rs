use crate::runner::CommandLine;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "devboot.toml";
pub const LOCAL_CONFIG_FILE: &str = "devboot.local.toml";

/// Bootstrap configuration. Every field has a default, so a project without a
/// `devboot.toml` gets the stock AgroCoop layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevbootConfig {
    /// Absolute project root; not part of the file format.
    #[serde(skip)]
    pub project_root: PathBuf,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

/// Paths relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub backend_dir: PathBuf,
    pub backend_env: PathBuf,
    pub backend_env_template: PathBuf,
    pub frontend_env: PathBuf,
    pub frontend_env_template: PathBuf,
    pub database: PathBuf,
    /// Directory whose presence means dependencies are installed.
    pub deps_marker: PathBuf,
    /// Key written to a synthesized backend env file.
    pub database_url_key: String,
    /// Value written for `database_url_key`, relative to the Prisma schema directory.
    pub database_url: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            backend_dir: PathBuf::from("apps/api"),
            backend_env: PathBuf::from("apps/api/.env"),
            backend_env_template: PathBuf::from("apps/api/.env.example"),
            frontend_env: PathBuf::from("apps/web/.env.local"),
            frontend_env_template: PathBuf::from("apps/web/.env.local.example"),
            database: PathBuf::from("data/agrocoop.db"),
            deps_marker: PathBuf::from("node_modules"),
            database_url_key: "DATABASE_URL".to_string(),
            database_url: "file:../../../data/agrocoop.db".to_string(),
        }
    }
}

/// External tool command lines, each `[program, args...]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    pub install: Vec<String>,
    pub schema_push: Vec<String>,
    pub seed: Vec<String>,
    pub dev: Vec<String>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            install: words(&["npm", "install"]),
            schema_push: words(&["npx", "prisma", "db", "push"]),
            seed: words(&["npx", "tsx", "src/seed.ts"]),
            dev: words(&["npm", "run", "dev"]),
        }
    }
}

fn words(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl CommandsConfig {
    pub fn install(&self) -> Result<CommandLine> {
        CommandLine::parse("install", &self.install)
    }

    pub fn schema_push(&self) -> Result<CommandLine> {
        CommandLine::parse("schema_push", &self.schema_push)
    }

    pub fn seed(&self) -> Result<CommandLine> {
        CommandLine::parse("seed", &self.seed)
    }

    pub fn dev(&self) -> Result<CommandLine> {
        CommandLine::parse("dev", &self.dev)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Ask before resetting an existing database.
    #[serde(default = "default_true")]
    pub interactive: bool,
    /// Reset an existing database without asking.
    #[serde(default)]
    pub auto_reset: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            interactive: true,
            auto_reset: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Layer `local` onto `base`: tables merge key by key, any other value
/// (arrays included) replaces what `base` had.
fn merge_into(base: &mut toml::Value, local: toml::Value) {
    match (base, local) {
        (toml::Value::Table(base), toml::Value::Table(local)) => {
            for (key, value) in local {
                match base.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn read_toml(path: &Path) -> Result<Option<toml::Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: toml::Value = toml::from_str(&content)
        .with_context(|| format!("Invalid TOML in {}", path.display()))?;
    Ok(Some(value))
}

impl DevbootConfig {
    /// Default configuration rooted at `root`.
    pub fn defaults(root: &Path) -> Self {
        Self {
            project_root: root.to_path_buf(),
            layout: LayoutConfig::default(),
            commands: CommandsConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }

    /// Load `devboot.toml` from `root`, then deep-merge `devboot.local.toml`
    /// on top. Either file may be absent.
    pub fn load(root: &Path) -> Result<Self> {
        let base = read_toml(&root.join(CONFIG_FILE))?;
        let local = read_toml(&root.join(LOCAL_CONFIG_FILE))?;

        let merged = match (base, local) {
            (None, None) => return Ok(Self::defaults(root)),
            (Some(base), None) => base,
            (None, Some(local)) => local,
            (Some(mut base), Some(local)) => {
                merge_into(&mut base, local);
                base
            }
        };

        let mut config: DevbootConfig = merged
            .try_into()
            .context("Invalid devboot configuration")?;
        config.project_root = root.to_path_buf();
        Ok(config)
    }

    pub fn backend_root(&self) -> PathBuf {
        self.project_root.join(&self.layout.backend_dir)
    }

    pub fn database_path(&self) -> PathBuf {
        self.project_root.join(&self.layout.database)
    }

    pub fn backend_env_path(&self) -> PathBuf {
        self.project_root.join(&self.layout.backend_env)
    }

    pub fn deps_marker_path(&self) -> PathBuf {
        self.project_root.join(&self.layout.deps_marker)
    }

    /// Contents of a synthesized backend env file.
    pub fn default_backend_env(&self) -> String {
        format!(
            "{}=\"{}\"\n",
            self.layout.database_url_key, self.layout.database_url
        )
    }
}
