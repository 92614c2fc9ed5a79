//! Migrate command

use anyhow::{bail, Context, Result};
use console::Term;
use dialoguer::MultiSelect;
use retarget_engine::{BatchReport, MigrationEngine, WorkerOutcome};
use retarget_projects::{FrameworkDescriptor, MigrationState, ProjectModel};
use std::sync::Arc;
use tabled::{settings::Style, Table};

use super::{
    build_engine, discover, framework_label, resolve_config, resolve_target, wait_interruptible,
    ProgressObserver, ProjectRow,
};
use crate::cli::{GlobalArgs, MigrateArgs};
use crate::output;

pub async fn run(args: MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let config = resolve_config(global)?;
    let engine = build_engine(&config)?;

    // Validate the target before touching the solution
    let target = resolve_target(engine.catalog(), &args.target)?;
    engine.set_target(target.clone());

    if discover(&engine, &args.solution, args.json).await?.is_none() {
        output::warning("Discovery cancelled; nothing was migrated");
        return Ok(());
    }

    select_projects(&engine, &args, &target)?;
    let batch = engine.registry().eligible();
    if batch.is_empty() {
        output::warning("No selected project has a known framework; nothing to migrate");
        return Ok(());
    }

    if !args.json {
        output::info(&format!(
            "Migrating {} projects to {}",
            batch.len(),
            target.name
        ));
    }

    let bar = output::batch_bar(batch.len());
    let subscription = engine
        .notifier()
        .subscribe(Arc::new(ProgressObserver::new(bar.clone(), args.json)));

    engine.start_migration(target)?;
    let outcome = wait_interruptible(&engine).await;

    engine.notifier().unsubscribe(subscription);
    bar.finish_and_clear();

    let report = match outcome? {
        WorkerOutcome::Migration(result) => result.context("Migration could not start")?,
        WorkerOutcome::Discovery(_) => bail!("The engine returned a discovery result"),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&engine, &report);
    }

    if !report.failed.is_empty() {
        bail!("{} of {} projects failed to migrate", report.failed.len(), report.total());
    }
    Ok(())
}

/// Apply `--all` / `--project`, or ask the operator
fn select_projects(
    engine: &MigrationEngine,
    args: &MigrateArgs,
    target: &FrameworkDescriptor,
) -> Result<()> {
    let registry = engine.registry();

    if args.all {
        registry.select_all();
        return Ok(());
    }

    if !args.projects.is_empty() {
        let snapshot = registry.snapshot();
        let missing: Vec<&str> = args
            .projects
            .iter()
            .map(String::as_str)
            .filter(|key| {
                !snapshot
                    .iter()
                    .any(|p| p.name.eq_ignore_ascii_case(key) || p.path.as_str() == *key)
            })
            .collect();
        if !missing.is_empty() {
            bail!("No project named {} in the solution", missing.join(", "));
        }
        registry.select_matching(args.projects.as_slice());
        return Ok(());
    }

    if !Term::stdout().is_term() {
        bail!("Choose projects with --project <NAME> or --all");
    }

    let candidates: Vec<ProjectModel> = registry
        .snapshot()
        .into_iter()
        .filter(|p| p.framework.is_some())
        .collect();
    if candidates.is_empty() {
        return Ok(());
    }

    let labels: Vec<String> = candidates
        .iter()
        .map(|p| format!("{} ({})", p.name, framework_label(p.framework.as_ref())))
        .collect();
    let defaults: Vec<bool> = candidates
        .iter()
        .map(|p| p.state != MigrationState::Succeeded)
        .collect();

    let chosen = MultiSelect::new()
        .with_prompt(format!("Select projects to move to {}", target.value))
        .items(&labels)
        .defaults(&defaults)
        .interact()?;

    registry.select_none();
    for index in chosen {
        registry.set_selected(&candidates[index].path, true);
    }
    Ok(())
}

fn print_report(engine: &MigrationEngine, report: &BatchReport) {
    let touched: Vec<_> = report
        .succeeded
        .iter()
        .chain(&report.failed)
        .chain(&report.pending)
        .filter_map(|path| engine.registry().get(path))
        .collect();

    let rows = touched
        .iter()
        .enumerate()
        .map(|(i, project)| ProjectRow::from_model(i + 1, project));
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);

    if report.cancelled {
        output::warning(&format!(
            "Migration cancelled: {} done, {} not attempted",
            report.succeeded.len() + report.failed.len(),
            report.pending.len()
        ));
    } else if report.failed.is_empty() {
        output::success(&format!(
            "Moved {} projects to {}",
            report.succeeded.len(),
            report.target.name
        ));
    }

    if !report.failed.is_empty() {
        output::header("Failed");
        for project in touched.iter().filter(|p| p.state == MigrationState::Failed) {
            output::project(project);
        }
    }
}
