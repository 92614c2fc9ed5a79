//! Terminal output

use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};
use retarget_projects::{MigrationState, ProjectModel};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Success,
    Error,
    Warning,
    Info,
}

impl Level {
    fn glyph(self) -> StyledObject<&'static str> {
        match self {
            Self::Success => style("✓").green().bold(),
            Self::Error => style("✗").red().bold(),
            Self::Warning => style("⚠").yellow().bold(),
            Self::Info => style("ℹ").blue().bold(),
        }
    }

    /// Problems go to stderr so `--json` stdout stays parseable
    fn to_stderr(self) -> bool {
        matches!(self, Self::Error | Self::Warning)
    }
}

fn line(level: Level, msg: &str) {
    if level.to_stderr() {
        eprintln!("{} {}", level.glyph(), msg);
    } else {
        println!("{} {}", level.glyph(), msg);
    }
}

pub fn success(msg: &str) {
    line(Level::Success, msg);
}

pub fn error(msg: &str) {
    line(Level::Error, msg);
}

pub fn warning(msg: &str) {
    line(Level::Warning, msg);
}

pub fn info(msg: &str) {
    line(Level::Info, msg);
}

pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

fn state_level(state: MigrationState) -> Option<Level> {
    match state {
        MigrationState::Succeeded => Some(Level::Success),
        MigrationState::Failed => Some(Level::Error),
        MigrationState::NotAttempted => None,
    }
}

/// One project with a glyph for its migration state
pub fn project(project: &ProjectModel) {
    let label = format!("{} ({})", project.name, project.path);
    match state_level(project.state) {
        Some(level) => line(level, &label),
        None => println!("{} {}", style("·").dim(), label),
    }
}

/// Spinner for a discovery pass
pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Bar counting the projects of a migration batch
pub fn batch_bar(projects: usize) -> ProgressBar {
    let pb = ProgressBar::new(projects as u64);
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} {pos}/{len} projects [{bar:30.cyan/blue}] {elapsed} {msg}",
    ) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}
