use follow_sync::adapters::memory::{InMemoryRemote, InjectedFailure};
use follow_sync::{
    reconcile, CollectionKind, Credentials, MutationKind, MutationOutcome, SyncEngine,
    SyncOptions,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn credentials() -> Credentials {
    Credentials::new("me", "token")
}

fn engine(remote: &Arc<InMemoryRemote>) -> SyncEngine<InMemoryRemote> {
    SyncEngine::new(Arc::clone(remote), SyncOptions::default())
}

#[tokio::test]
async fn test_round_trip_plan() -> anyhow::Result<()> {
    let remote = Arc::new(InMemoryRemote::new(["a", "b", "c"], ["b", "c", "d"]));
    let engine = engine(&remote);
    let cancel = CancellationToken::new();

    let followers = engine
        .collect(&credentials(), CollectionKind::Followers, &cancel)
        .await?;
    let following = engine
        .collect(&credentials(), CollectionKind::Following, &cancel)
        .await?;
    let plan = reconcile(&followers.logins, &following.logins);

    assert_eq!(plan.to_unfollow.iter().collect::<Vec<_>>(), vec!["d"]);
    assert_eq!(plan.to_follow_back.iter().collect::<Vec<_>>(), vec!["a"]);
    assert!(plan.to_unfollow.is_disjoint(&plan.to_follow_back));
    Ok(())
}

#[tokio::test]
async fn test_partial_mutation_failure_is_reported() {
    let remote = Arc::new(InMemoryRemote::new(["a", "b", "c"], ["b", "c", "d"]));
    remote.fail_mutation("d", InjectedFailure::Status(404));
    let engine = engine(&remote);

    let run = engine
        .run_once(&credentials(), true, &CancellationToken::new())
        .await
        .unwrap();
    let report = run.report.unwrap();

    assert_eq!(
        report.outcome_of(MutationKind::Unfollow, "d"),
        Some(&MutationOutcome::Rejected { status: 404 })
    );
    assert_eq!(
        report.outcome_of(MutationKind::FollowBack, "a"),
        Some(&MutationOutcome::Applied)
    );
    assert_eq!(report.entries.len(), 2);
    assert!(remote.following().contains(&"a".to_string()));
    assert!(remote.following().contains(&"d".to_string()));
}

#[tokio::test]
async fn test_applying_plan_twice_changes_nothing_more() {
    let remote = Arc::new(InMemoryRemote::new(["a", "b"], ["b", "x", "y"]));
    let engine = engine(&remote);
    let cancel = CancellationToken::new();

    let run = engine.run_once(&credentials(), false, &cancel).await.unwrap();
    let first = engine.apply(&run.plan, &credentials(), &cancel).await;
    let mut after_first = remote.following();
    after_first.sort();

    let second = engine.apply(&run.plan, &credentials(), &cancel).await;
    let mut after_second = remote.following();
    after_second.sort();

    assert!(!first.has_failures());
    assert!(!second.has_failures());
    assert_eq!(after_first, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(after_first, after_second);
}

#[tokio::test]
async fn test_identical_sets_apply_nothing() {
    let remote = Arc::new(InMemoryRemote::new(["a", "b"], ["b", "a"]));
    let engine = engine(&remote);

    let run = engine
        .run_once(&credentials(), true, &CancellationToken::new())
        .await
        .unwrap();

    assert!(run.plan.is_empty());
    assert!(run.report.unwrap().is_empty());
    assert!(remote.mutation_calls().is_empty());
}

#[tokio::test]
async fn test_large_collections_are_fully_enumerated() {
    let followers: Vec<String> = (0..300).map(|i| format!("fan{}", i)).collect();
    let mut following: Vec<String> = (0..150).map(|i| format!("fan{}", i)).collect();
    following.push("stranger".to_string());
    let remote = Arc::new(InMemoryRemote::new(followers, following));
    let engine = engine(&remote);

    let run = engine
        .run_once(&credentials(), false, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(run.followers.total_count, 300);
    assert_eq!(run.followers.pages_fetched, 4);
    assert_eq!(run.following.total_count, 151);
    assert_eq!(run.plan.to_unfollow.iter().collect::<Vec<_>>(), vec!["stranger"]);
    assert_eq!(run.plan.to_follow_back.len(), 150);
}
