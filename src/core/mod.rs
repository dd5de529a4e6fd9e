pub mod applier;
pub mod collector;
pub mod engine;
pub mod reconciler;

pub use crate::domain::model::{
    CollectedRelationships, CollectionKind, Credentials, MutationOutcome, MutationReport,
    ReconciliationPlan, RelationshipSet,
};
pub use crate::domain::ports::{ConfigProvider, RelationshipMutator, RelationshipSource, RemoteApi};
pub use crate::utils::error::Result;
