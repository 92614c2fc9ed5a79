//! Config command

use anyhow::Result;
use retarget_core::ConfigLoader;

use super::resolve_config;
use crate::cli::{ConfigCommands, ConfigShowArgs, GlobalArgs};
use crate::output;

pub fn run(cmd: ConfigCommands, global: &GlobalArgs) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => show(args, global),
    }
}

fn show(args: ConfigShowArgs, global: &GlobalArgs) -> Result<()> {
    let config = resolve_config(global)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    match global.config.clone().or_else(|| ConfigLoader::new().user_config_path()) {
        Some(path) if path.exists() => output::kv("Source", path.as_str()),
        _ => output::kv("Source", "built-in defaults"),
    }
    println!("{}", serde_yaml_ng::to_string(&config)?);

    Ok(())
}
