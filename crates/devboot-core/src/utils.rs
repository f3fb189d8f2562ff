use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Write content to a file, creating parent directories as needed.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Copy `from` to `to`, creating the destination's parent directories as needed.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::copy(from, to)
        .with_context(|| format!("Failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

/// Render `path` relative to `root` when possible, for console output.
pub fn display_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Console output. Actions print as a right-aligned tag followed by detail,
/// so paths and commands line up across a run.
pub mod ui {
    use colored::{Color, Colorize};

    const TAG_WIDTH: usize = 6;

    pub(crate) fn tag(label: &str) -> String {
        format!("{:>width$}", label, width = TAG_WIDTH)
    }

    fn action(label: &str, color: Color, detail: &str) {
        println!("  {} {}", tag(label).as_str().color(color), detail);
    }

    /// `[2/4] Preparing env files`
    pub fn step(current: usize, total: usize, title: &str) {
        println!(
            "\n{} {}",
            format!("[{}/{}]", current, total).cyan().bold(),
            title.bold()
        );
    }

    pub fn created(path: &str) {
        action("create", Color::Green, path);
    }

    pub fn skipped(path: &str, reason: &str) {
        action("skip", Color::Yellow, &format!("{} ({})", path, reason));
    }

    pub fn removed(path: &str) {
        action("remove", Color::Red, path);
    }

    /// An external tool about to start, with its working directory.
    pub fn running(command: &str, dir: &str) {
        action("run", Color::Magenta, &format!("{} (in {})", command, dir));
    }

    pub fn warn(msg: &str) {
        action("warn", Color::Yellow, msg);
    }

    /// Same layout as the other actions, on stderr.
    pub fn error(msg: &str) {
        eprintln!("  {} {}", tag("error").as_str().red(), msg);
    }

    /// Plain line indented to the detail column.
    pub fn info(msg: &str) {
        println!("  {} {}", tag(""), msg);
    }

    pub fn section(title: &str) {
        println!("\n{}", title.bold());
    }

    pub fn success(msg: &str) {
        println!("\n{}", msg.green().bold());
    }

    /// One doctor line: a green tick or a red cross.
    pub fn check(passed: bool, msg: &str) {
        let mark = if passed { "✓".green() } else { "✗".red() };
        println!("  {} {}", mark, msg);
    }
}
