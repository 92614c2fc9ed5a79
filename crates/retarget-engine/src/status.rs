//! Status lines published through `StateChanged`
//!
//! The wording is what operators and log scrapers match on; keep it stable.

use std::fmt::Display;

pub const LOADING_CANCELLED: &str = "Loading Projects Cancelled";
pub const GATHERING: &str = "Gathering Framework Version for Projects  ..... !!!! ";
pub const GATHERING_CANCELLED: &str = "Gathering Projects Cancelled";
pub const MIGRATION_CANCELLED: &str = "Migration Cancelled";
pub const MIGRATION_FINISHED: &str = "Migration Finished";
pub const NO_PROJECTS: &str = "No .Net projects";
pub const NO_SOLUTION: &str = "No solution";

pub fn loading(source: impl Display) -> String {
    format!("Loading Projects from : {} ..... !!!! ", source)
}

pub fn gathering(name: &str) -> String {
    format!("Gathering : {}", name)
}

pub fn loaded(count: usize) -> String {
    format!("Loaded {} Projects", count)
}

pub fn updating(number: usize, name: &str) -> String {
    format!("Project : {} - Updating... {}", number, name)
}

pub fn updated(number: usize, name: &str) -> String {
    format!("{} done", updating(number, name))
}

pub fn update_failed(number: usize, name: &str) -> String {
    format!("{} Failed", updating(number, name))
}

pub fn attempt_failed(attempt: u32, error: impl Display, name: &str) -> String {
    format!("Attempt : {} {} on {}", attempt, error, name)
}
