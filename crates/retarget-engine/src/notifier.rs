//! Event fan-out
//!
//! The engine publishes four kinds of events: a discovery result, a project
//! state change, a status line and a free-text log line. Any number of
//! observers may subscribe. Delivery is synchronous on the publishing task;
//! observers that need to hand events to another task use [`ChannelObserver`].
//!
//! Ordering: within one discovery pass `ProjectsDiscovered` is published
//! once, before any `ProjectUpdated` for the same projects. An observer
//! removed with [`Notifier::unsubscribe`] receives nothing published after
//! `unsubscribe` returns.

use parking_lot::RwLock;
use retarget_projects::ProjectModel;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Receives engine events; every method defaults to ignoring the event
///
/// Callbacks must not subscribe or unsubscribe on the notifier that is
/// calling them.
pub trait EngineObserver: Send + Sync {
    fn on_projects_discovered(&self, projects: &[ProjectModel]) {
        let _ = projects;
    }

    fn on_project_updated(&self, project: &ProjectModel) {
        let _ = project;
    }

    fn on_state_changed(&self, status: &str) {
        let _ = status;
    }

    fn on_log_line(&self, line: &str) {
        let _ = line;
    }
}

impl<T: EngineObserver + ?Sized> EngineObserver for Arc<T> {
    fn on_projects_discovered(&self, projects: &[ProjectModel]) {
        (**self).on_projects_discovered(projects)
    }

    fn on_project_updated(&self, project: &ProjectModel) {
        (**self).on_project_updated(project)
    }

    fn on_state_changed(&self, status: &str) {
        (**self).on_state_changed(status)
    }

    fn on_log_line(&self, line: &str) {
        (**self).on_log_line(line)
    }
}

/// An engine event as an owned value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum EngineEvent {
    ProjectsDiscovered { projects: Vec<ProjectModel> },
    ProjectUpdated { project: ProjectModel },
    StateChanged { status: String },
    LogLine { line: String },
}

impl EngineEvent {
    /// Hand this event to an observer
    pub fn deliver(&self, observer: &dyn EngineObserver) {
        match self {
            Self::ProjectsDiscovered { projects } => observer.on_projects_discovered(projects),
            Self::ProjectUpdated { project } => observer.on_project_updated(project),
            Self::StateChanged { status } => observer.on_state_changed(status),
            Self::LogLine { line } => observer.on_log_line(line),
        }
    }
}

/// Handle returned by [`Notifier::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observer registry
#[derive(Default)]
pub struct Notifier {
    next_id: AtomicU64,
    subscribers: RwLock<Vec<(SubscriptionId, Arc<dyn EngineObserver>)>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, observer: Arc<dyn EngineObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, observer));
        id
    }

    /// Remove an observer; returns false when `id` was not subscribed
    ///
    /// Waits for any delivery in progress, so no event reaches the observer
    /// once this returns.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn publish(&self, event: &EngineEvent) {
        for (_, observer) in self.subscribers.read_recursive().iter() {
            event.deliver(observer.as_ref());
        }
    }

    pub fn projects_discovered(&self, projects: &[ProjectModel]) {
        for (_, observer) in self.subscribers.read_recursive().iter() {
            observer.on_projects_discovered(projects);
        }
    }

    pub fn project_updated(&self, project: &ProjectModel) {
        for (_, observer) in self.subscribers.read_recursive().iter() {
            observer.on_project_updated(project);
        }
    }

    /// Publish a status line, mirrored as a log line
    pub fn state_changed(&self, status: &str) {
        let subscribers = self.subscribers.read_recursive();
        for (_, observer) in subscribers.iter() {
            observer.on_state_changed(status);
        }
        for (_, observer) in subscribers.iter() {
            observer.on_log_line(status);
        }
    }

    pub fn log_line(&self, line: &str) {
        for (_, observer) in self.subscribers.read_recursive().iter() {
            observer.on_log_line(line);
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

/// Forwards events into an unbounded channel
///
/// Sends after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

impl EngineObserver for ChannelObserver {
    fn on_projects_discovered(&self, projects: &[ProjectModel]) {
        self.send(EngineEvent::ProjectsDiscovered {
            projects: projects.to_vec(),
        });
    }

    fn on_project_updated(&self, project: &ProjectModel) {
        self.send(EngineEvent::ProjectUpdated {
            project: project.clone(),
        });
    }

    fn on_state_changed(&self, status: &str) {
        self.send(EngineEvent::StateChanged {
            status: status.to_string(),
        });
    }

    fn on_log_line(&self, line: &str) {
        self.send(EngineEvent::LogLine {
            line: line.to_string(),
        });
    }
}

/// Mirrors engine events into `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventObserver;

impl EngineObserver for TracingEventObserver {
    fn on_projects_discovered(&self, projects: &[ProjectModel]) {
        tracing::info!(count = projects.len(), "projects discovered");
    }

    fn on_project_updated(&self, project: &ProjectModel) {
        tracing::info!(
            project = %project.path,
            state = %project.state,
            framework = project.framework.as_ref().map(|f| f.value.as_str()).unwrap_or("-"),
            "project updated"
        );
    }

    fn on_state_changed(&self, status: &str) {
        tracing::debug!(status = status.trim_end(), "state changed");
    }
}
