//! Version command

use crate::cli::VersionArgs;
use crate::output;
use crate::version::VersionInfo;
use anyhow::Result;

pub fn run(args: VersionArgs) -> Result<()> {
    let info = VersionInfo::current();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", info);
    if let Some(date) = &info.build_date {
        output::kv("Built", date);
    }
    output::kv("Backend", info.default_backend.display_name());
    output::kv("Catalog", &info.catalog_summary());
    Ok(())
}
