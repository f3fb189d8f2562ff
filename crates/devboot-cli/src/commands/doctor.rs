use anyhow::Result;
use colored::Colorize;
use devboot_core::config::{DevbootConfig, CONFIG_FILE, LOCAL_CONFIG_FILE};
use devboot_core::envfile;
use devboot_core::runner::EnvMap;
use devboot_core::utils::{display_path, ui};
use std::path::Path;
use std::process::Command;

struct CheckResult {
    passed: bool,
    message: String,
}

impl CheckResult {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

fn check_config_files(config: &DevbootConfig) -> CheckResult {
    let present: Vec<&str> = [CONFIG_FILE, LOCAL_CONFIG_FILE]
        .into_iter()
        .filter(|name| config.project_root.join(name).exists())
        .collect();

    if present.is_empty() {
        CheckResult::pass("No devboot.toml (using default layout)")
    } else {
        CheckResult::pass(format!("Config loaded from {}", present.join(" + ")))
    }
}

fn check_backend_dir(config: &DevbootConfig) -> CheckResult {
    let dir = config.backend_root();
    let shown = display_path(&config.project_root, &dir);
    if dir.is_dir() {
        CheckResult::pass(format!("Backend at {}", shown))
    } else {
        CheckResult::fail(format!("Backend directory {} not found", shown))
    }
}

fn check_deps(config: &DevbootConfig) -> CheckResult {
    if config.deps_marker_path().exists() {
        CheckResult::pass("Dependencies installed")
    } else {
        CheckResult::fail(format!(
            "{} not found (run: {})",
            config.layout.deps_marker.display(),
            config.commands.install.join(" ")
        ))
    }
}

fn check_env_file(root: &Path, path: &Path, template: &Path) -> CheckResult {
    let shown = display_path(root, path);
    if path.exists() {
        return CheckResult::pass(format!("{} present", shown));
    }
    if template.exists() {
        CheckResult::fail(format!(
            "{} missing (run: devboot env, copies {})",
            shown,
            display_path(root, template)
        ))
    } else {
        CheckResult::fail(format!("{} missing and no template found", shown))
    }
}

fn check_database_url(config: &DevbootConfig) -> CheckResult {
    let path = config.backend_env_path();
    if !path.exists() {
        return CheckResult::fail(format!(
            "{} not set (backend env file missing)",
            config.layout.database_url_key
        ));
    }

    match envfile::read_env_file(&path, EnvMap::new()) {
        Ok(env) => match env.get(&config.layout.database_url_key) {
            Some(value) if !value.is_empty() => CheckResult::pass(format!(
                "{} configured",
                config.layout.database_url_key
            )),
            _ => CheckResult::fail(format!(
                "{} not set in {}",
                config.layout.database_url_key,
                display_path(&config.project_root, &path)
            )),
        },
        Err(e) => CheckResult::fail(format!("Cannot read backend env file: {}", e)),
    }
}

fn check_database(config: &DevbootConfig) -> CheckResult {
    let path = config.database_path();
    let shown = display_path(&config.project_root, &path);
    if path.exists() {
        CheckResult::pass(format!("{} present", shown))
    } else {
        CheckResult::pass(format!(
            "{} absent (created and seeded on next devboot run)",
            shown
        ))
    }
}

fn check_tool(name: &str, args: &[&str], label: &str, install_hint: &str) -> CheckResult {
    match Command::new(name).args(args).output() {
        Ok(output) => {
            if output.status.success() {
                let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
                CheckResult::pass(format!("{} ({})", label, version))
            } else {
                CheckResult::fail(format!("{} found but returned error", label))
            }
        }
        Err(_) => CheckResult::fail(format!("{} not found (install: {})", label, install_hint)),
    }
}

pub fn run(config: &DevbootConfig) -> Result<()> {
    let root = &config.project_root;
    let layout = &config.layout;

    println!("{}", "devboot doctor".bold());
    println!("Project root: {}", root.display());

    ui::section("Project");
    let project_checks = vec![
        check_config_files(config),
        check_backend_dir(config),
        check_deps(config),
    ];
    print_checks(&project_checks);

    ui::section("Tools");
    let tool_checks = vec![
        check_tool("node", &["--version"], "Node.js", "https://nodejs.org"),
        check_tool("npm", &["--version"], "npm", "https://nodejs.org"),
        check_tool("npx", &["--version"], "npx", "https://nodejs.org"),
    ];
    print_checks(&tool_checks);

    ui::section("Environment");
    let env_checks = vec![
        check_env_file(
            root,
            &root.join(&layout.backend_env),
            &root.join(&layout.backend_env_template),
        ),
        check_env_file(
            root,
            &root.join(&layout.frontend_env),
            &root.join(&layout.frontend_env_template),
        ),
        check_database_url(config),
    ];
    print_checks(&env_checks);

    ui::section("Database");
    let db_checks = vec![check_database(config)];
    print_checks(&db_checks);

    let all: Vec<&CheckResult> = project_checks
        .iter()
        .chain(tool_checks.iter())
        .chain(env_checks.iter())
        .chain(db_checks.iter())
        .collect();
    let total = all.len();
    let passed = all.iter().filter(|c| c.passed).count();

    println!();
    let summary = format!("{}/{} checks passed", passed, total);
    if passed == total {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.yellow().bold());
        println!(
            "{}",
            format!("{} issue(s) found; see above for details", total - passed).yellow()
        );
    }

    Ok(())
}

fn print_checks(checks: &[CheckResult]) {
    for check in checks {
        ui::check(check.passed, &check.message);
    }
}
