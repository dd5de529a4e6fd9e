use crate::domain::model::{CollectionKind, Credentials, RelationshipRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Read side of the remote API: one page of one collection.
///
/// An empty page marks the end of the collection.
#[async_trait]
pub trait RelationshipSource: Send + Sync {
    async fn fetch_page(
        &self,
        credentials: &Credentials,
        kind: CollectionKind,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RelationshipRecord>>;
}

/// Status returned by a relationship mutation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationStatus(pub u16);

impl MutationStatus {
    /// "No content" is the only success signal for follow/unfollow.
    pub const NO_CONTENT: MutationStatus = MutationStatus(204);

    pub fn is_success(&self) -> bool {
        *self == Self::NO_CONTENT
    }
}

/// Write side of the remote API. Transport failures are `Err`,
/// any HTTP answer (success or not) is `Ok(status)`.
#[async_trait]
pub trait RelationshipMutator: Send + Sync {
    async fn follow(&self, credentials: &Credentials, login: &str) -> Result<MutationStatus>;
    async fn unfollow(&self, credentials: &Credentials, login: &str) -> Result<MutationStatus>;
}

/// Both halves of the remote API.
pub trait RemoteApi: RelationshipSource + RelationshipMutator {}

impl<T: RelationshipSource + RelationshipMutator> RemoteApi for T {}

pub trait ConfigProvider: Send + Sync {
    fn api_base_url(&self) -> &str;
    fn concurrent_requests(&self) -> usize;
    fn request_timeout(&self) -> Duration;
    fn max_retries(&self) -> u32;
    fn retry_base_delay(&self) -> Duration;
    fn degrade_on_error(&self) -> bool;
}
