//! # retarget-engine
//!
//! Orchestrates a retarget session:
//! - discovery: manifest or live session -> [`ProjectRegistry`](retarget_projects::ProjectRegistry)
//! - migration: selected projects -> [`ProjectMutator`](retarget_mutators::ProjectMutator) writes,
//!   one at a time, with retry and cooperative cancellation
//! - a [`Notifier`] that fans engine events out to observers
//!
//! ```no_run
//! use retarget_engine::{DiscoverySource, MigrationEngine, TracingEventObserver};
//! use retarget_mutators::BuildEngineMutator;
//! use retarget_projects::FrameworkCatalog;
//! use retarget_core::types::RetryPolicy;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), retarget_engine::EngineError> {
//! let engine = MigrationEngine::new(
//!     Arc::new(BuildEngineMutator::new()),
//!     FrameworkCatalog::load(None),
//!     RetryPolicy::default(),
//! );
//! engine.notifier().subscribe(Arc::new(TracingEventObserver));
//!
//! engine.start_discovery(DiscoverySource::Manifest("/src/App.sln".into()))?;
//! engine.wait().await;
//!
//! engine.registry().select_all();
//! let target = engine.catalog().default_descriptor().cloned().unwrap();
//! engine.start_migration(target)?;
//! engine.wait().await;
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod error;
pub mod notifier;
pub mod status;

pub use engine::{BatchReport, DiscoveryOutcome, DiscoverySource, MigrationEngine, WorkerOutcome};
pub use error::EngineError;
pub use notifier::{
    ChannelObserver, EngineEvent, EngineObserver, Notifier, SubscriptionId, TracingEventObserver,
};
