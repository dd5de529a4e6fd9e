use crate::domain::model::{
    Credentials, MutationEntry, MutationKind, MutationOutcome, MutationReport, ReconciliationPlan,
};
use crate::domain::ports::RelationshipMutator;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CONCURRENT_REQUESTS: usize = 4;

/// Issues the follow/unfollow calls of a plan, at most `concurrency` at a time.
///
/// Every login is attempted once. A rejected or failed call is recorded and
/// the batch continues.
pub struct MutationApplier<M: RelationshipMutator + ?Sized + 'static> {
    mutator: Arc<M>,
    concurrency: usize,
}

impl<M: RelationshipMutator + ?Sized + 'static> MutationApplier<M> {
    pub fn new(mutator: Arc<M>, concurrency: usize) -> Self {
        Self {
            mutator,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn apply(
        &self,
        plan: &ReconciliationPlan,
        credentials: &Credentials,
        cancel: &CancellationToken,
    ) -> MutationReport {
        if plan.is_empty() {
            tracing::debug!("Nothing to apply");
            return MutationReport::from_entries(Vec::new());
        }

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let credentials = Arc::new(credentials.clone());
        let mut tasks = JoinSet::new();
        let mut entries = Vec::with_capacity(plan.len());
        let mut in_flight: BTreeSet<(MutationKind, String)> = BTreeSet::new();

        let jobs = plan
            .to_unfollow
            .iter()
            .map(|login| (MutationKind::Unfollow, login))
            .chain(
                plan.to_follow_back
                    .iter()
                    .map(|login| (MutationKind::FollowBack, login)),
            );

        for (kind, login) in jobs {
            let login = login.to_string();
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
            };

            let Some(permit) = permit else {
                entries.push(MutationEntry {
                    kind,
                    login,
                    outcome: MutationOutcome::Skipped,
                });
                continue;
            };

            in_flight.insert((kind, login.clone()));
            let mutator = Arc::clone(&self.mutator);
            let credentials = Arc::clone(&credentials);
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = attempt(mutator.as_ref(), &credentials, kind, &login).await;
                MutationEntry {
                    kind,
                    login,
                    outcome,
                }
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => {
                    in_flight.remove(&(entry.kind, entry.login.clone()));
                    entries.push(entry);
                }
                Err(e) => tracing::error!("❌ Mutation task aborted: {}", e),
            }
        }

        // Whatever is left started but never reported back.
        for (kind, login) in in_flight {
            entries.push(MutationEntry {
                kind,
                login,
                outcome: MutationOutcome::TransportFailed {
                    error: "mutation task aborted before completing".to_string(),
                },
            });
        }

        let report = MutationReport::from_entries(entries);
        let skipped = report.skipped();
        if skipped > 0 {
            tracing::warn!("🛑 Run cancelled, {} mutations were not attempted", skipped);
        }
        report
    }
}

async fn attempt<M: RelationshipMutator + ?Sized>(
    mutator: &M,
    credentials: &Credentials,
    kind: MutationKind,
    login: &str,
) -> MutationOutcome {
    let result = match kind {
        MutationKind::Unfollow => mutator.unfollow(credentials, login).await,
        MutationKind::FollowBack => mutator.follow(credentials, login).await,
    };

    match result {
        Ok(status) if status.is_success() => {
            tracing::info!("✅ {} {}", kind, login);
            MutationOutcome::Applied
        }
        Ok(status) => {
            tracing::warn!("⚠️ {} {} rejected with status {}", kind, login, status.0);
            MutationOutcome::Rejected { status: status.0 }
        }
        Err(e) => {
            tracing::error!("❌ {} {} failed: {}", kind, login, e);
            MutationOutcome::TransportFailed {
                error: e.to_string(),
            }
        }
    }
}
