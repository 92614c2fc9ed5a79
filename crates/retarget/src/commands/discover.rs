//! Discover command

use anyhow::Result;
use retarget_engine::DiscoveryOutcome;
use retarget_projects::{sort_projects, MigrationState, ProjectModel, SortDirection};
use serde::Serialize;
use tabled::{settings::Style, Table};

use super::{build_engine, discover, resolve_config, resolve_target, ProjectRow};
use crate::cli::{DiscoverArgs, GlobalArgs};
use crate::output;

#[derive(Serialize)]
struct DiscoverReport<'a> {
    #[serde(flatten)]
    outcome: &'a DiscoveryOutcome,
    target: Option<String>,
    projects: &'a [ProjectModel],
}

pub async fn run(args: DiscoverArgs, global: &GlobalArgs) -> Result<()> {
    let config = resolve_config(global)?;
    let engine = build_engine(&config)?;

    if let Some(key) = &args.target {
        engine.set_target(resolve_target(engine.catalog(), key)?);
    }

    let Some(outcome) = discover(&engine, &args.solution, args.json).await? else {
        output::warning("Discovery cancelled");
        return Ok(());
    };

    let mut projects = engine.registry().snapshot();
    if let Some(field) = args.sort {
        let direction = if args.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        sort_projects(&mut projects, field, direction);
    }

    let target = engine.target();
    if args.json {
        let report = DiscoverReport {
            outcome: &outcome,
            target: target.map(|t| t.name),
            projects: &projects,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if projects.is_empty() {
        output::warning("No .NET projects found");
        return Ok(());
    }

    let rows = projects
        .iter()
        .enumerate()
        .map(|(i, project)| ProjectRow::from_model(i + 1, project));
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);

    let unknown = outcome.discovered - outcome.with_framework;
    output::success(&format!(
        "Found {} projects ({} with a known framework)",
        outcome.discovered, outcome.with_framework
    ));
    if let Some(target) = target {
        let current = projects
            .iter()
            .filter(|p| p.state == MigrationState::Succeeded)
            .count();
        output::kv("Target", &target.name);
        output::kv("Already on target", &current.to_string());
    }
    if unknown > 0 {
        output::warning(&format!(
            "{} projects have no readable TargetFrameworkVersion and cannot be migrated",
            unknown
        ));
    }

    Ok(())
}
