use crate::domain::model::{CollectedRelationships, CollectionKind, Credentials, RelationshipRecord, RelationshipSet};
use crate::domain::ports::{ConfigProvider, RelationshipSource};
use crate::utils::error::{Result, SyncError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fixed page size requested from the remote collection endpoints.
pub const PAGE_SIZE: u32 = 100;

/// What to do when a collection cannot be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionFailureMode {
    /// Surface the failure to the caller.
    #[default]
    Abort,
    /// Replace the collection with an empty, zero-count result flagged as degraded.
    TreatAsEmpty,
}

#[derive(Debug, Clone)]
pub struct CollectorOptions {
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub failure_mode: CollectionFailureMode,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
            failure_mode: CollectionFailureMode::Abort,
        }
    }
}

impl CollectorOptions {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            max_retries: config.max_retries(),
            retry_base_delay: config.retry_base_delay(),
            failure_mode: if config.degrade_on_error() {
                CollectionFailureMode::TreatAsEmpty
            } else {
                CollectionFailureMode::Abort
            },
        }
    }
}

/// Enumerates one remote collection page by page until an empty page.
pub struct PaginatedCollector<'a, S: RelationshipSource + ?Sized> {
    source: &'a S,
    options: CollectorOptions,
}

impl<'a, S: RelationshipSource + ?Sized> PaginatedCollector<'a, S> {
    pub fn new(source: &'a S, options: CollectorOptions) -> Self {
        Self { source, options }
    }

    pub async fn collect(
        &self,
        credentials: &Credentials,
        kind: CollectionKind,
        cancel: &CancellationToken,
    ) -> Result<CollectedRelationships> {
        match self.collect_all(credentials, kind, cancel).await {
            Ok(collected) => {
                tracing::info!(
                    "✅ Collected {} {} ({} unique) in {} pages",
                    collected.total_count,
                    kind,
                    collected.logins.len(),
                    collected.pages_fetched
                );
                Ok(collected)
            }
            Err(SyncError::Cancelled) => Err(SyncError::Cancelled),
            Err(e) => match self.options.failure_mode {
                CollectionFailureMode::Abort => {
                    tracing::error!("❌ Collecting {} failed: {}", kind, e);
                    Err(SyncError::collection(kind, e))
                }
                CollectionFailureMode::TreatAsEmpty => {
                    tracing::warn!(
                        "⚠️ Collecting {} failed, continuing with an empty set: {}",
                        kind,
                        e
                    );
                    Ok(CollectedRelationships::degraded(kind))
                }
            },
        }
    }

    async fn collect_all(
        &self,
        credentials: &Credentials,
        kind: CollectionKind,
        cancel: &CancellationToken,
    ) -> Result<CollectedRelationships> {
        let mut logins = RelationshipSet::new();
        let mut total_count = 0usize;
        let mut page = 1u32;

        loop {
            if cancel.is_cancelled() {
                tracing::info!("🛑 Collection of {} cancelled before page {}", kind, page);
                return Err(SyncError::Cancelled);
            }

            let records = self.fetch_with_retry(credentials, kind, page, cancel).await?;
            if records.is_empty() {
                break;
            }

            total_count += records.len();
            for record in records {
                logins.insert(record.login);
            }
            page += 1;
        }

        Ok(CollectedRelationships {
            kind,
            logins,
            total_count,
            pages_fetched: page,
            degraded: false,
        })
    }

    async fn fetch_with_retry(
        &self,
        credentials: &Credentials,
        kind: CollectionKind,
        page: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<RelationshipRecord>> {
        let mut attempt = 0u32;

        loop {
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                fetched = self.source.fetch_page(credentials, kind, page, PAGE_SIZE) => fetched,
            };

            match fetched {
                Ok(records) => return Ok(records),
                Err(e) if e.is_transient() && attempt < self.options.max_retries => {
                    let delay = self
                        .options
                        .retry_base_delay
                        .saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    tracing::warn!(
                        "⚠️ {} page {} failed ({}), retry {}/{} in {:?}",
                        kind,
                        page,
                        e,
                        attempt,
                        self.options.max_retries,
                        delay
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(SyncError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryRemote, InjectedFailure};

    fn credentials() -> Credentials {
        Credentials::new("me", "token")
    }

    fn logins(prefix: &str, count: usize) -> Vec<String> {
        (0..count).map(|i| format!("{}{}", prefix, i)).collect()
    }

    fn fast_options() -> CollectorOptions {
        CollectorOptions {
            max_retries: 2,
            retry_base_delay: Duration::from_millis(1),
            failure_mode: CollectionFailureMode::Abort,
        }
    }

    #[tokio::test]
    async fn test_empty_collection_needs_one_fetch() {
        let remote = InMemoryRemote::new(Vec::<String>::new(), Vec::<String>::new());
        let collector = PaginatedCollector::new(&remote, fast_options());

        let collected = collector
            .collect(&credentials(), CollectionKind::Followers, &CancellationToken::new())
            .await
            .unwrap();

        assert!(collected.logins.is_empty());
        assert_eq!(collected.total_count, 0);
        assert_eq!(collected.pages_fetched, 1);
        assert_eq!(remote.page_requests(CollectionKind::Followers), vec![1]);
    }

    #[tokio::test]
    async fn test_exact_multiple_of_page_size_needs_extra_fetch() {
        for k in 1..=3usize {
            let remote = InMemoryRemote::new(logins("user", k * 100), Vec::<String>::new());
            let collector = PaginatedCollector::new(&remote, fast_options());

            let collected = collector
                .collect(&credentials(), CollectionKind::Followers, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(collected.total_count, k * 100);
            assert_eq!(collected.logins.len(), k * 100);
            assert_eq!(remote.page_requests(CollectionKind::Followers).len(), k + 1);
        }
    }

    #[tokio::test]
    async fn test_partial_last_page() {
        let remote = InMemoryRemote::new(Vec::<String>::new(), logins("f", 250));
        let collector = PaginatedCollector::new(&remote, fast_options());

        let collected = collector
            .collect(&credentials(), CollectionKind::Following, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(collected.total_count, 250);
        assert_eq!(remote.page_requests(CollectionKind::Following), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_total_count_is_pre_deduplication() {
        let remote = InMemoryRemote::new(["a", "b", "a", "c"], Vec::<String>::new());
        let collector = PaginatedCollector::new(&remote, fast_options());

        let collected = collector
            .collect(&credentials(), CollectionKind::Followers, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(collected.total_count, 4);
        assert_eq!(collected.logins.len(), 3);
    }

    #[tokio::test]
    async fn test_non_transient_failure_aborts_without_partial_results() {
        let remote = InMemoryRemote::new(logins("user", 150), Vec::<String>::new());
        remote.fail_page(CollectionKind::Followers, 2, InjectedFailure::Status(404));
        let collector = PaginatedCollector::new(&remote, fast_options());

        let result = collector
            .collect(&credentials(), CollectionKind::Followers, &CancellationToken::new())
            .await;

        match result {
            Err(SyncError::Collection { kind, source }) => {
                assert_eq!(kind, CollectionKind::Followers);
                assert!(matches!(
                    *source,
                    SyncError::UnexpectedStatus { page: 2, status: 404, .. }
                ));
            }
            other => panic!("expected collection error, got {:?}", other),
        }
        assert_eq!(remote.page_requests(CollectionKind::Followers), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let remote = InMemoryRemote::new(["a", "b"], Vec::<String>::new());
        remote.fail_page(CollectionKind::Followers, 1, InjectedFailure::Status(502));
        remote.fail_page(CollectionKind::Followers, 1, InjectedFailure::ConnectionReset);
        let collector = PaginatedCollector::new(&remote, fast_options());

        let collected = collector
            .collect(&credentials(), CollectionKind::Followers, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(collected.total_count, 2);
        assert_eq!(remote.page_requests(CollectionKind::Followers), vec![1, 1, 1, 2]);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let remote = InMemoryRemote::new(["a"], Vec::<String>::new());
        for _ in 0..5 {
            remote.fail_page(CollectionKind::Followers, 1, InjectedFailure::Status(503));
        }
        let collector = PaginatedCollector::new(&remote, fast_options());

        let result = collector
            .collect(&credentials(), CollectionKind::Followers, &CancellationToken::new())
            .await;

        assert!(result.is_err());
        assert_eq!(remote.page_requests(CollectionKind::Followers).len(), 3);
    }

    #[tokio::test]
    async fn test_treat_as_empty_mode_degrades() {
        let remote = InMemoryRemote::new(["a", "b"], Vec::<String>::new());
        remote.fail_page(CollectionKind::Followers, 1, InjectedFailure::Status(500));
        let options = CollectorOptions {
            max_retries: 0,
            failure_mode: CollectionFailureMode::TreatAsEmpty,
            ..fast_options()
        };
        let collector = PaginatedCollector::new(&remote, options);

        let collected = collector
            .collect(&credentials(), CollectionKind::Followers, &CancellationToken::new())
            .await
            .unwrap();

        assert!(collected.degraded);
        assert!(collected.logins.is_empty());
        assert_eq!(collected.total_count, 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_page() {
        let remote = InMemoryRemote::new(["a"], Vec::<String>::new());
        let options = CollectorOptions {
            failure_mode: CollectionFailureMode::TreatAsEmpty,
            ..fast_options()
        };
        let collector = PaginatedCollector::new(&remote, options);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = collector
            .collect(&credentials(), CollectionKind::Followers, &cancel)
            .await;

        assert!(matches!(result, Err(SyncError::Cancelled)));
        assert!(remote.page_requests(CollectionKind::Followers).is_empty());
    }
}
