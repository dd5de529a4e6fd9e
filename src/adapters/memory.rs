//! In-memory remote used to exercise the engine without a network.
//!
//! Holds a single account's followers and following lists, serves them in
//! pages exactly like the HTTP API, and applies follow/unfollow calls to its
//! own state. Failures can be injected per page or per login.

use crate::domain::model::{CollectionKind, Credentials, MutationKind, RelationshipRecord};
use crate::domain::ports::{MutationStatus, RelationshipMutator, RelationshipSource};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectedFailure {
    Status(u16),
    ConnectionReset,
}

#[derive(Debug, Default)]
struct RemoteState {
    followers: Vec<String>,
    following: Vec<String>,
    page_requests: Vec<(CollectionKind, u32)>,
    mutation_calls: Vec<(MutationKind, String)>,
    page_failures: HashMap<(CollectionKind, u32), VecDeque<InjectedFailure>>,
    mutation_failures: HashMap<String, InjectedFailure>,
}

#[derive(Debug, Default)]
pub struct InMemoryRemote {
    state: Mutex<RemoteState>,
}

impl InMemoryRemote {
    pub fn new<F, G>(followers: F, following: G) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        Self {
            state: Mutex::new(RemoteState {
                followers: followers.into_iter().map(Into::into).collect(),
                following: following.into_iter().map(Into::into).collect(),
                ..RemoteState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a failure for one page; queued failures are served before the page succeeds.
    pub fn fail_page(&self, kind: CollectionKind, page: u32, failure: InjectedFailure) {
        self.lock()
            .page_failures
            .entry((kind, page))
            .or_default()
            .push_back(failure);
    }

    /// Every mutation for `login` fails with `failure`.
    pub fn fail_mutation(&self, login: &str, failure: InjectedFailure) {
        self.lock()
            .mutation_failures
            .insert(login.to_string(), failure);
    }

    pub fn followers(&self) -> Vec<String> {
        self.lock().followers.clone()
    }

    pub fn following(&self) -> Vec<String> {
        self.lock().following.clone()
    }

    pub fn page_requests(&self, kind: CollectionKind) -> Vec<u32> {
        self.lock()
            .page_requests
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, page)| *page)
            .collect()
    }

    pub fn mutation_calls(&self) -> Vec<(MutationKind, String)> {
        self.lock().mutation_calls.clone()
    }

    fn mutate(&self, kind: MutationKind, login: &str) -> Result<MutationStatus> {
        let mut state = self.lock();
        state.mutation_calls.push((kind, login.to_string()));

        match state.mutation_failures.get(login) {
            Some(InjectedFailure::Status(status)) => return Ok(MutationStatus(*status)),
            Some(InjectedFailure::ConnectionReset) => return Err(connection_reset()),
            None => {}
        }

        let following = &mut state.following;
        match kind {
            MutationKind::FollowBack => {
                if !following.iter().any(|l| l == login) {
                    following.push(login.to_string());
                }
            }
            MutationKind::Unfollow => following.retain(|l| l != login),
        }
        Ok(MutationStatus::NO_CONTENT)
    }
}

fn connection_reset() -> SyncError {
    SyncError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "connection reset by peer",
    ))
}

#[async_trait]
impl RelationshipSource for InMemoryRemote {
    async fn fetch_page(
        &self,
        _credentials: &Credentials,
        kind: CollectionKind,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<RelationshipRecord>> {
        let mut state = self.lock();
        state.page_requests.push((kind, page));

        if let Some(failure) = state
            .page_failures
            .get_mut(&(kind, page))
            .and_then(VecDeque::pop_front)
        {
            return match failure {
                InjectedFailure::Status(status) => {
                    Err(SyncError::UnexpectedStatus { kind, page, status })
                }
                InjectedFailure::ConnectionReset => Err(connection_reset()),
            };
        }

        let source = match kind {
            CollectionKind::Followers => &state.followers,
            CollectionKind::Following => &state.following,
        };
        let per_page = per_page as usize;
        let skip = (page.saturating_sub(1) as usize).saturating_mul(per_page);

        Ok(source
            .iter()
            .skip(skip)
            .take(per_page)
            .map(RelationshipRecord::new)
            .collect())
    }
}

#[async_trait]
impl RelationshipMutator for InMemoryRemote {
    async fn follow(&self, _credentials: &Credentials, login: &str) -> Result<MutationStatus> {
        self.mutate(MutationKind::FollowBack, login)
    }

    async fn unfollow(&self, _credentials: &Credentials, login: &str) -> Result<MutationStatus> {
        self.mutate(MutationKind::Unfollow, login)
    }
}
