//! CLI command implementations

pub mod config;
pub mod discover;
pub mod frameworks;
pub mod migrate;
pub mod version;

use anyhow::{anyhow, bail, Context, Result};
use camino::Utf8Path;
use indicatif::ProgressBar;
use retarget_core::{ConfigLoader, MigratorConfig};
use retarget_engine::{
    DiscoveryOutcome, DiscoverySource, EngineObserver, MigrationEngine, WorkerOutcome,
};
use retarget_mutators::create_mutator;
use retarget_projects::{FrameworkCatalog, FrameworkDescriptor, ProjectModel};
use std::sync::Arc;
use tabled::Tabled;

use crate::cli::GlobalArgs;
use crate::output;

/// Configuration from files and environment, with command-line flags on top
pub fn resolve_config(global: &GlobalArgs) -> Result<MigratorConfig> {
    let mut config = ConfigLoader::new()
        .load(global.config.as_deref())
        .context("Failed to load configuration")?;

    if let Some(backend) = global.backend {
        config.backend = backend;
    }
    if let Some(catalog) = &global.catalog {
        config.catalog = Some(catalog.clone());
    }
    Ok(config)
}

/// Build an engine for the configured backend
pub fn build_engine(config: &MigratorConfig) -> Result<Arc<MigrationEngine>> {
    let mutator = create_mutator(config.backend, None)?;
    tracing::debug!(backend = mutator.name(), "mutation backend selected");
    Ok(Arc::new(MigrationEngine::from_config(config, mutator)))
}

/// Look a framework up by id, value or name
pub fn resolve_target(catalog: &FrameworkCatalog, key: &str) -> Result<FrameworkDescriptor> {
    if catalog.is_empty() {
        bail!("The framework catalog is empty");
    }
    catalog.find(key).cloned().ok_or_else(|| {
        anyhow!(
            "Unknown framework: {}. Run `retarget frameworks` to list the available ones",
            key
        )
    })
}

/// Run a discovery pass on the engine worker behind a spinner
///
/// Returns `None` when the operator cancelled it.
pub async fn discover(
    engine: &Arc<MigrationEngine>,
    solution: &Utf8Path,
    quiet: bool,
) -> Result<Option<DiscoveryOutcome>> {
    let spinner = output::spinner(&format!("Reading {}", solution));
    let subscription = engine
        .notifier()
        .subscribe(Arc::new(ProgressObserver::new(spinner.clone(), quiet)));

    engine.start_discovery(DiscoverySource::Manifest(solution.to_path_buf()))?;
    let outcome = wait_interruptible(engine).await;

    engine.notifier().unsubscribe(subscription);
    spinner.finish_and_clear();

    match outcome? {
        WorkerOutcome::Discovery(result) => {
            let outcome = result.with_context(|| format!("Failed to read {}", solution))?;
            Ok((!outcome.cancelled).then_some(outcome))
        }
        WorkerOutcome::Migration(_) => bail!("The engine returned a migration result"),
    }
}

/// Wait for the engine worker, turning Ctrl-C into a cancellation request
///
/// The worker stops at its next checkpoint; a write in progress completes.
pub async fn wait_interruptible(engine: &Arc<MigrationEngine>) -> Result<WorkerOutcome> {
    let watcher = {
        let engine = Arc::clone(engine);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                output::warning("Cancelling after the current project...");
                engine.request_cancel();
            }
        })
    };

    let outcome = engine.wait().await;
    watcher.abort();
    outcome.ok_or_else(|| anyhow!("The engine worker stopped without a result"))
}

/// Feeds engine events into a spinner or progress bar
pub struct ProgressObserver {
    bar: ProgressBar,
    quiet: bool,
}

impl ProgressObserver {
    pub fn new(bar: ProgressBar, quiet: bool) -> Self {
        Self { bar, quiet }
    }
}

impl EngineObserver for ProgressObserver {
    fn on_project_updated(&self, _project: &ProjectModel) {
        self.bar.inc(1);
    }

    fn on_state_changed(&self, status: &str) {
        self.bar.set_message(status.trim_end().to_string());
    }

    fn on_log_line(&self, line: &str) {
        if !self.quiet && line.starts_with("Attempt : ") {
            self.bar.println(format!("  {}", line));
        }
    }
}

/// One row of a project table
#[derive(Tabled)]
pub struct ProjectRow {
    #[tabled(rename = "#")]
    pub index: usize,
    pub name: String,
    pub framework: String,
    pub state: String,
    pub path: String,
}

impl ProjectRow {
    pub fn from_model(index: usize, project: &ProjectModel) -> Self {
        Self {
            index,
            name: project.name.clone(),
            framework: framework_label(project.framework.as_ref()),
            state: project.state.to_string(),
            path: project.path.to_string(),
        }
    }
}

/// Short label for a project's framework
pub fn framework_label(framework: Option<&FrameworkDescriptor>) -> String {
    framework
        .map(|f| f.value.clone())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retarget_core::Backend;

    fn catalog() -> FrameworkCatalog {
        FrameworkCatalog::new(vec![
            FrameworkDescriptor::from_name(262152, ".NETFramework,Version=v4.8"),
            FrameworkDescriptor::from_name(262149, ".NETFramework,Version=v4.5"),
        ])
    }

    #[test]
    fn test_resolve_target_by_id_value_or_name() {
        let catalog = catalog();
        assert_eq!(resolve_target(&catalog, "262149").unwrap().value, "v4.5");
        assert_eq!(resolve_target(&catalog, "v4.8").unwrap().id, 262152);
        assert_eq!(
            resolve_target(&catalog, ".netframework,version=v4.5").unwrap().id,
            262149
        );
    }

    #[test]
    fn test_resolve_target_unknown() {
        let err = resolve_target(&catalog(), "net8.0").unwrap_err();
        assert!(err.to_string().contains("Unknown framework: net8.0"));

        let empty = FrameworkCatalog::new(Vec::new());
        assert!(resolve_target(&empty, "v4.8").is_err());
    }

    #[test]
    fn test_host_session_backend_needs_a_session() {
        let config = MigratorConfig {
            backend: Backend::HostSession,
            ..MigratorConfig::default()
        };
        let err = build_engine(&config).err().unwrap();
        assert!(err.to_string().contains("Host Session"));
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "backend: host-session\ncatalog: /etc/frameworks.yaml\n").unwrap();

        let global = GlobalArgs {
            config: camino::Utf8PathBuf::from_path_buf(path).ok(),
            backend: Some(Backend::BuildEngine),
            catalog: None,
        };
        let config = resolve_config(&global).unwrap();
        assert_eq!(config.backend, Backend::BuildEngine);
        assert_eq!(
            config.catalog.as_deref(),
            Some(Utf8Path::new("/etc/frameworks.yaml"))
        );
    }

    #[test]
    fn test_project_row() {
        let project = ProjectModel::new("/src/Web/Web.csproj").with_framework(Some(
            FrameworkDescriptor::from_name(262149, ".NETFramework,Version=v4.5"),
        ));
        let row = ProjectRow::from_model(1, &project);
        assert_eq!(row.name, "Web");
        assert_eq!(row.framework, "v4.5");
        assert_eq!(row.state, "not-attempted");
        assert_eq!(framework_label(None), "-");
    }
}
