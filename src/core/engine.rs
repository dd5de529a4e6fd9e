use crate::core::applier::{MutationApplier, DEFAULT_CONCURRENT_REQUESTS};
use crate::core::collector::{CollectorOptions, PaginatedCollector};
use crate::core::reconciler::reconcile;
use crate::domain::model::{
    CollectedRelationships, CollectionKind, Credentials, MutationReport, ReconciliationPlan,
};
use crate::domain::ports::{ConfigProvider, RemoteApi};
use crate::utils::error::{Result, SyncError};
use crate::utils::monitor::SystemMonitor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub collector: CollectorOptions,
    pub concurrent_requests: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            collector: CollectorOptions::default(),
            concurrent_requests: DEFAULT_CONCURRENT_REQUESTS,
        }
    }
}

impl SyncOptions {
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C) -> Self {
        Self {
            collector: CollectorOptions::from_config(config),
            concurrent_requests: config.concurrent_requests(),
        }
    }
}

/// Outcome of one pass of the pipeline.
#[derive(Debug, Clone)]
pub struct SyncRun {
    pub followers: CollectedRelationships,
    pub following: CollectedRelationships,
    pub plan: ReconciliationPlan,
    /// Present only when mutations were applied.
    pub report: Option<MutationReport>,
    /// Apply was requested but withheld because a collection was degraded.
    pub apply_withheld: bool,
}

impl SyncRun {
    pub fn is_degraded(&self) -> bool {
        self.followers.degraded || self.following.degraded
    }
}

/// Collect, collect, reconcile, then optionally apply.
pub struct SyncEngine<A: RemoteApi + ?Sized + 'static> {
    remote: Arc<A>,
    options: SyncOptions,
    monitor: SystemMonitor,
}

impl<A: RemoteApi + ?Sized + 'static> SyncEngine<A> {
    pub fn new(remote: Arc<A>, options: SyncOptions) -> Self {
        Self::new_with_monitoring(remote, options, false)
    }

    pub fn new_with_monitoring(remote: Arc<A>, options: SyncOptions, monitor: bool) -> Self {
        Self {
            remote,
            options,
            monitor: SystemMonitor::new(monitor),
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub async fn collect(
        &self,
        credentials: &Credentials,
        kind: CollectionKind,
        cancel: &CancellationToken,
    ) -> Result<CollectedRelationships> {
        PaginatedCollector::new(self.remote.as_ref(), self.options.collector.clone())
            .collect(credentials, kind, cancel)
            .await
    }

    pub async fn apply(
        &self,
        plan: &ReconciliationPlan,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> MutationReport {
        MutationApplier::new(Arc::clone(&self.remote), self.options.concurrent_requests)
            .apply(plan, credentials, cancel)
            .await
    }

    pub async fn run_once(
        &self,
        credentials: &Credentials,
        apply: bool,
        cancel: &CancellationToken,
    ) -> Result<SyncRun> {
        check_credentials(credentials)?;
        tracing::info!("🚀 Starting sync for {}", credentials.identity);

        // Both collections run to completion so every failure gets reported.
        let (followers, following) = match tokio::join!(
            self.collect(credentials, CollectionKind::Followers, cancel),
            self.collect(credentials, CollectionKind::Following, cancel),
        ) {
            (Ok(followers), Ok(following)) => (followers, following),
            (Err(SyncError::Cancelled), _) | (_, Err(SyncError::Cancelled)) => {
                return Err(SyncError::Cancelled)
            }
            (followers, following) => {
                let failures = [followers.err(), following.err()]
                    .into_iter()
                    .flatten()
                    .collect();
                return Err(SyncError::collections(failures));
            }
        };
        self.monitor.log_phase("collect");

        let plan = reconcile(&followers.logins, &following.logins);
        tracing::info!(
            "📋 Plan: {} to unfollow, {} to follow back",
            plan.to_unfollow.len(),
            plan.to_follow_back.len()
        );

        let degraded = followers.degraded || following.degraded;
        let (report, apply_withheld) = match (apply, degraded) {
            (false, _) => (None, false),
            (true, true) => {
                tracing::warn!("⚠️ A collection was degraded to empty, not applying the plan");
                (None, true)
            }
            (true, false) => {
                let report = self.apply(&plan, credentials, cancel).await;
                self.monitor.log_phase("apply");
                (Some(report), false)
            }
        };

        Ok(SyncRun {
            followers,
            following,
            plan,
            report,
            apply_withheld,
        })
    }
}

fn check_credentials(credentials: &Credentials) -> Result<()> {
    if credentials.identity.trim().is_empty() {
        return Err(SyncError::MissingConfig {
            field: "username".to_string(),
        });
    }
    if credentials.token.trim().is_empty() {
        return Err(SyncError::MissingConfig {
            field: "GITHUB_TOKEN".to_string(),
        });
    }
    Ok(())
}
