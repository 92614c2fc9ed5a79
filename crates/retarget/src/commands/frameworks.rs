//! Frameworks command

use anyhow::Result;
use retarget_projects::FrameworkCatalog;
use tabled::{settings::Style, Table, Tabled};

use super::resolve_config;
use crate::cli::{FrameworksArgs, GlobalArgs};
use crate::output;

#[derive(Tabled)]
struct FrameworkRow {
    #[tabled(rename = "")]
    default: &'static str,
    id: u32,
    value: String,
    name: String,
}

pub fn run(args: FrameworksArgs, global: &GlobalArgs) -> Result<()> {
    let config = resolve_config(global)?;
    let catalog = FrameworkCatalog::load(config.catalog.as_deref());

    if args.json {
        println!("{}", serde_json::to_string_pretty(catalog.descriptors())?);
        return Ok(());
    }

    if catalog.is_empty() {
        output::warning("No frameworks available; check the catalog file");
        return Ok(());
    }

    let rows = catalog.iter().enumerate().map(|(i, descriptor)| FrameworkRow {
        default: if i == 0 { "*" } else { "" },
        id: descriptor.id,
        value: descriptor.value.clone(),
        name: descriptor.name.clone(),
    });

    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{}", table);
    output::info("* is the default target");

    Ok(())
}
