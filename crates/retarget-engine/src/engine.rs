//! Migration engine
//!
//! The engine owns the project registry and drives a single background
//! worker. The worker runs one discovery pass or one migration batch at a
//! time; a second command while it is active fails with
//! [`EngineError::Busy`]. Cancellation is cooperative: the worker checks the
//! token before every project and every retry, never in the middle of a
//! write, and leaves the registry as it stands.

use crate::error::{EngineError, Result};
use crate::notifier::Notifier;
use crate::status;
use camino::{Utf8Path, Utf8PathBuf};
use parking_lot::Mutex;
use retarget_core::retry::{RetryError, SimpleRetryExecutor, TracingObserver};
use retarget_core::types::RetryPolicy;
use retarget_core::{CancellationToken, MigratorConfig};
use retarget_mutators::{
    HostSession, MutationError, ProjectMutator, SessionItem, SessionItemKind, TransientOnly,
};
use retarget_projects::{
    resolve_project_path, FrameworkCatalog, FrameworkDescriptor, MigrationState, MutationHandle,
    ProjectModel, ProjectRegistry, SolutionParser,
};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Solution folders nested deeper than this are not descended into
const MAX_FOLDER_DEPTH: usize = 32;

/// Where a discovery pass finds its projects
#[derive(Clone)]
pub enum DiscoverySource {
    /// A solution manifest on disk
    Manifest(Utf8PathBuf),
    /// The solution open in a running host session
    Session(Arc<dyn HostSession>),
}

impl std::fmt::Debug for DiscoverySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manifest(path) => f.debug_tuple("Manifest").field(path).finish(),
            Self::Session(_) => f.write_str("Session"),
        }
    }
}

/// Result of one discovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryOutcome {
    /// Solution the projects came from; `None` when a session had nothing open
    pub solution: Option<Utf8PathBuf>,
    /// Projects now in the registry
    pub discovered: usize,
    /// Of those, how many have a known framework
    pub with_framework: usize,
    /// The pass was cancelled and the registry left as it was
    pub cancelled: bool,
}

/// Result of one migration batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub target: FrameworkDescriptor,
    pub succeeded: Vec<Utf8PathBuf>,
    pub failed: Vec<Utf8PathBuf>,
    /// Selected projects the batch never reached
    pub pending: Vec<Utf8PathBuf>,
    pub cancelled: bool,
}

impl BatchReport {
    fn new(target: FrameworkDescriptor) -> Self {
        Self {
            target,
            succeeded: Vec::new(),
            failed: Vec::new(),
            pending: Vec::new(),
            cancelled: false,
        }
    }

    /// Number of projects the batch was started with
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len() + self.pending.len()
    }

    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.failed.is_empty()
    }
}

/// What a background worker produced
#[derive(Debug)]
pub enum WorkerOutcome {
    Discovery(Result<DiscoveryOutcome>),
    Migration(Result<BatchReport>),
}

struct Worker {
    token: CancellationToken,
    handle: JoinHandle<WorkerOutcome>,
}

/// State shared between the engine handle and its worker
struct EngineCore {
    registry: ProjectRegistry,
    notifier: Notifier,
    mutator: Arc<dyn ProjectMutator>,
    catalog: FrameworkCatalog,
    retry: RetryPolicy,
    parser: SolutionParser,
    target: Mutex<Option<FrameworkDescriptor>>,
}

/// Discovers projects and migrates their target framework
pub struct MigrationEngine {
    core: Arc<EngineCore>,
    worker: Mutex<Option<Worker>>,
}

impl MigrationEngine {
    pub fn new(
        mutator: Arc<dyn ProjectMutator>,
        catalog: FrameworkCatalog,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            core: Arc::new(EngineCore {
                registry: ProjectRegistry::new(),
                notifier: Notifier::new(),
                mutator,
                catalog,
                retry,
                parser: SolutionParser::new(),
                target: Mutex::new(None),
            }),
            worker: Mutex::new(None),
        }
    }

    /// Build an engine from resolved configuration
    pub fn from_config(config: &MigratorConfig, mutator: Arc<dyn ProjectMutator>) -> Self {
        let catalog = FrameworkCatalog::load(config.catalog.as_deref());
        Self::new(mutator, catalog, config.retry.clone())
    }

    pub fn registry(&self) -> &ProjectRegistry {
        &self.core.registry
    }

    pub fn notifier(&self) -> &Notifier {
        &self.core.notifier
    }

    pub fn catalog(&self) -> &FrameworkCatalog {
        &self.core.catalog
    }

    pub fn mutator(&self) -> &Arc<dyn ProjectMutator> {
        &self.core.mutator
    }

    /// Framework that discovered projects are compared against
    ///
    /// The last target chosen, or the first catalog entry before that.
    pub fn target(&self) -> Option<FrameworkDescriptor> {
        self.core.current_target()
    }

    /// Choose a new comparison target and re-seed project states against it
    ///
    /// Returns how many projects already match.
    pub fn set_target(&self, target: FrameworkDescriptor) -> usize {
        let matching = self
            .core
            .registry
            .reconcile(&target, self.core.mutator.comparison());
        tracing::debug!(framework = %target, matching, "target changed");
        *self.core.target.lock() = Some(target);
        matching
    }

    // ── Worker commands ──────────────────────────────────────────────────

    /// Run a discovery pass on the background worker
    pub fn start_discovery(&self, source: DiscoverySource) -> Result<()> {
        self.spawn(move |core, token| async move {
            WorkerOutcome::Discovery(core.discover(source, &token).await)
        })
    }

    /// Migrate every eligible project to `target` on the background worker
    pub fn start_migration(&self, target: FrameworkDescriptor) -> Result<()> {
        if self.core.catalog.is_empty() {
            return Err(EngineError::NoFrameworks);
        }
        self.spawn(move |core, token| async move {
            WorkerOutcome::Migration(core.migrate(target, &token).await)
        })
    }

    /// Ask the worker to stop at its next checkpoint
    pub fn request_cancel(&self) {
        if let Some(worker) = self.worker.lock().as_ref() {
            tracing::debug!("cancellation requested");
            worker.token.cancel();
        }
    }

    pub fn is_busy(&self) -> bool {
        self.worker
            .lock()
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Wait for the worker to finish and take its outcome
    ///
    /// Returns `None` when no worker was started since the last wait.
    pub async fn wait(&self) -> Option<WorkerOutcome> {
        let worker = self.worker.lock().take()?;
        match worker.handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                tracing::error!(error = %e, "engine worker did not complete");
                None
            }
        }
    }

    /// Cancel the worker and wait for it to reach a checkpoint
    pub async fn stop(&self) -> Option<WorkerOutcome> {
        self.request_cancel();
        self.wait().await
    }

    fn spawn<F, Fut>(&self, job: F) -> Result<()>
    where
        F: FnOnce(Arc<EngineCore>, CancellationToken) -> Fut,
        Fut: std::future::Future<Output = WorkerOutcome> + Send + 'static,
    {
        let mut slot = self.worker.lock();
        if slot.as_ref().is_some_and(|w| !w.handle.is_finished()) {
            return Err(EngineError::Busy);
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(job(self.core.clone(), token.clone()));
        *slot = Some(Worker { token, handle });
        Ok(())
    }

    // ── Direct operations ────────────────────────────────────────────────

    /// Run a discovery pass on the calling task
    ///
    /// Callers that use this alongside the worker commands are responsible
    /// for not overlapping the two.
    pub async fn discover(
        &self,
        source: DiscoverySource,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryOutcome> {
        self.core.discover(source, cancel).await
    }

    /// Run a migration batch on the calling task
    pub async fn migrate(
        &self,
        target: FrameworkDescriptor,
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        if self.core.catalog.is_empty() {
            return Err(EngineError::NoFrameworks);
        }
        self.core.migrate(target, cancel).await
    }
}

impl Drop for MigrationEngine {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().as_ref() {
            worker.token.cancel();
        }
    }
}

impl EngineCore {
    fn current_target(&self) -> Option<FrameworkDescriptor> {
        self.target
            .lock()
            .clone()
            .or_else(|| self.catalog.default_descriptor().cloned())
    }

    // ── Discovery ────────────────────────────────────────────────────────

    async fn discover(
        &self,
        source: DiscoverySource,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryOutcome> {
        let (solution, candidates) = match source {
            DiscoverySource::Manifest(path) => {
                self.notifier.state_changed(&status::loading(&path));
                let parsed = self.parser.parse(&path, cancel).await;
                match parsed {
                    Ok(refs) => (
                        path,
                        refs.into_iter().map(ProjectModel::from_reference).collect(),
                    ),
                    Err(e) if e.is_cancelled() => return Ok(self.loading_cancelled(Some(path))),
                    Err(e) => {
                        tracing::error!(solution = %path, error = %e, "discovery failed");
                        self.notifier.state_changed(&e.to_string());
                        return Err(e.into());
                    }
                }
            }
            DiscoverySource::Session(session) => {
                let path = match session.solution_path().await {
                    Ok(Some(path)) => path,
                    Ok(None) => {
                        self.notifier.state_changed(status::NO_SOLUTION);
                        return Ok(DiscoveryOutcome::default());
                    }
                    Err(e) => return Err(self.session_failed(None, e)),
                };
                self.notifier.state_changed(&status::loading(&path));
                let items = match session.items().await {
                    Ok(items) => items,
                    Err(e) => return Err(self.session_failed(Some(path.as_path()), e)),
                };
                match session_projects(&path, items, cancel) {
                    Some(models) => (path, models),
                    None => return Ok(self.loading_cancelled(Some(path))),
                }
            }
        };

        self.notifier.state_changed(status::GATHERING);
        let target = self.current_target();
        let comparison = self.mutator.comparison();
        let mut models: Vec<ProjectModel> = Vec::with_capacity(candidates.len());

        for mut model in candidates {
            if cancel.is_cancelled() {
                self.notifier.state_changed(status::GATHERING_CANCELLED);
                return Ok(DiscoveryOutcome {
                    solution: Some(solution),
                    cancelled: true,
                    ..DiscoveryOutcome::default()
                });
            }

            self.notifier.state_changed(&status::gathering(&model.name));
            model.framework = match self.mutator.read(&model.handle).await {
                Ok(framework) => framework,
                Err(e) => {
                    tracing::warn!(project = %model.path, error = %e, "cannot read framework");
                    self.notifier.log_line(&format!("{} : {}", model.name, e));
                    None
                }
            };
            if let (Some(current), Some(target)) = (&model.framework, &target) {
                model.state = MigrationState::seeded(comparison.matches(current, target));
            }
            models.push(model);
        }

        self.registry.replace_all(models);
        let snapshot = self.registry.snapshot();
        let outcome = DiscoveryOutcome {
            solution: Some(solution),
            discovered: snapshot.len(),
            with_framework: snapshot.iter().filter(|p| p.framework.is_some()).count(),
            cancelled: false,
        };

        tracing::info!(
            discovered = outcome.discovered,
            with_framework = outcome.with_framework,
            "discovery finished"
        );
        self.notifier.projects_discovered(&snapshot);
        if snapshot.is_empty() {
            self.notifier.state_changed(status::NO_PROJECTS);
        } else {
            self.notifier.state_changed(&status::loaded(snapshot.len()));
        }
        Ok(outcome)
    }

    fn loading_cancelled(&self, solution: Option<Utf8PathBuf>) -> DiscoveryOutcome {
        self.notifier.state_changed(status::LOADING_CANCELLED);
        DiscoveryOutcome {
            solution,
            cancelled: true,
            ..DiscoveryOutcome::default()
        }
    }

    fn session_failed(&self, solution: Option<&Utf8Path>, err: MutationError) -> EngineError {
        match solution {
            Some(path) => tracing::error!(solution = %path, error = %err, "session discovery failed"),
            None => tracing::error!(error = %err, "session discovery failed"),
        }
        self.notifier.state_changed(&err.to_string());
        err.into()
    }

    // ── Migration ────────────────────────────────────────────────────────

    async fn migrate(
        &self,
        target: FrameworkDescriptor,
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        *self.target.lock() = Some(target.clone());
        let batch = self.registry.eligible();
        let mut report = BatchReport::new(target.clone());

        tracing::info!(framework = %target, projects = batch.len(), "migration started");

        for (index, project) in batch.iter().enumerate() {
            let number = index + 1;

            if cancel.is_cancelled() {
                return Ok(self.batch_cancelled(report, &batch[index..]));
            }

            self.notifier
                .state_changed(&status::updating(number, &project.name));

            let attempts = AtomicU32::new(0);
            let result = SimpleRetryExecutor::new(self.retry.clone())
                .with_predicate(TransientOnly)
                .with_observer(TracingObserver::new(project.name.as_str()))
                .with_cancellation(cancel.clone())
                .execute(|| {
                    let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    let target = &target;
                    async move {
                        let result = self.apply(&project.handle, target).await;
                        if let Err(e) = &result {
                            self.notifier.state_changed(&status::attempt_failed(
                                attempt,
                                e,
                                &project.name,
                            ));
                        }
                        result
                    }
                })
                .await;

            let succeeded = match result {
                Ok(()) => true,
                Err(RetryError::Cancelled { .. }) => {
                    return Ok(self.batch_cancelled(report, &batch[index..]));
                }
                Err(e) => {
                    tracing::warn!(
                        project = %project.path,
                        attempts = e.attempts(),
                        error = %e,
                        "migration failed"
                    );
                    false
                }
            };

            let updated = self.registry.update(&project.path, |p| {
                if succeeded {
                    p.framework = Some(target.clone());
                    p.state = MigrationState::Succeeded;
                } else {
                    p.state = MigrationState::Failed;
                }
            });
            if let Some(updated) = updated {
                self.notifier.project_updated(&updated);
            }

            if succeeded {
                report.succeeded.push(project.path.clone());
                self.notifier
                    .state_changed(&status::updated(number, &project.name));
            } else {
                report.failed.push(project.path.clone());
                self.notifier
                    .state_changed(&status::update_failed(number, &project.name));
            }
        }

        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "migration finished"
        );
        self.notifier.state_changed(status::MIGRATION_FINISHED);
        Ok(report)
    }

    /// One attempt: write, then make it durable
    async fn apply(
        &self,
        handle: &MutationHandle,
        target: &FrameworkDescriptor,
    ) -> std::result::Result<(), MutationError> {
        self.mutator.write(handle, target).await?;
        self.mutator.persist(handle).await
    }

    fn batch_cancelled(&self, mut report: BatchReport, rest: &[ProjectModel]) -> BatchReport {
        report.pending = rest.iter().map(|p| p.path.clone()).collect();
        report.cancelled = true;
        tracing::info!(
            completed = report.succeeded.len() + report.failed.len(),
            pending = report.pending.len(),
            "migration cancelled"
        );
        self.notifier.state_changed(status::MIGRATION_CANCELLED);
        report
    }
}

/// Flatten a session's solution tree into project models, in tree order
///
/// Folders are expanded depth-first. Items already visited and folders deeper
/// than [`MAX_FOLDER_DEPTH`] are skipped. Project paths the session reports
/// relative are resolved against the solution directory. Returns `None` when
/// cancelled.
fn session_projects(
    solution: &Utf8Path,
    items: Vec<SessionItem>,
    cancel: &CancellationToken,
) -> Option<Vec<ProjectModel>> {
    let mut models = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack = vec![(items.into_iter(), 0usize)];

    while let Some((iter, depth)) = stack.last_mut() {
        let depth = *depth;
        let Some(item) = iter.next() else {
            stack.pop();
            continue;
        };

        if cancel.is_cancelled() {
            return None;
        }
        if !visited.insert(item.unique_name.clone()) {
            tracing::warn!(item = %item.unique_name, "session item listed twice");
            continue;
        }

        match item.kind {
            SessionItemKind::Project => match item.path {
                Some(path) => models.push(
                    ProjectModel::new(resolve_project_path(solution, path.as_str()))
                        .with_name(item.name)
                        .with_handle(MutationHandle::SessionItem(item.unique_name)),
                ),
                None => tracing::debug!(item = %item.unique_name, "project without a file"),
            },
            SessionItemKind::SolutionFolder if depth + 1 >= MAX_FOLDER_DEPTH => {
                tracing::warn!(folder = %item.name, depth, "solution folder nested too deep");
            }
            SessionItemKind::SolutionFolder => {
                stack.push((item.children.into_iter(), depth + 1));
            }
            SessionItemKind::Other => {}
        }
    }

    Some(models)
}
