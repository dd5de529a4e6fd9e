pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{GitHubClient, InMemoryRemote};
pub use config::{load_credentials, Settings};
pub use core::collector::{CollectionFailureMode, CollectorOptions, PaginatedCollector, PAGE_SIZE};
pub use core::engine::{SyncEngine, SyncOptions, SyncRun};
pub use core::{applier::MutationApplier, reconciler::reconcile};
pub use domain::model::{
    CollectedRelationships, CollectionKind, Credentials, MutationKind, MutationOutcome,
    MutationReport, ReconciliationPlan, RelationshipRecord, RelationshipSet,
};
pub use utils::error::{Result, SyncError};
