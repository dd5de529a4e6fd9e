use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Which direction of the social graph a fetch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Followers,
    Following,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Followers => "followers",
            CollectionKind::Following => "following",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remote account entry. Only `login` matters to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub login: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl RelationshipRecord {
    pub fn new(login: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            id: None,
            avatar_url: None,
            html_url: None,
        }
    }
}

/// Deduplicated set of login identifiers. Iteration is sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipSet {
    logins: BTreeSet<String>,
}

impl RelationshipSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, login: impl Into<String>) -> bool {
        self.logins.insert(login.into())
    }

    pub fn contains(&self, login: &str) -> bool {
        self.logins.contains(login)
    }

    pub fn len(&self) -> usize {
        self.logins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logins.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.logins.iter().map(String::as_str)
    }

    /// Logins present in `self` but not in `other`.
    pub fn difference(&self, other: &RelationshipSet) -> RelationshipSet {
        RelationshipSet {
            logins: self.logins.difference(&other.logins).cloned().collect(),
        }
    }

    pub fn is_disjoint(&self, other: &RelationshipSet) -> bool {
        self.logins.is_disjoint(&other.logins)
    }
}

impl<S: Into<String>> FromIterator<S> for RelationshipSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            logins: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a RelationshipSet {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.logins.iter()
    }
}

/// Result of one completed collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedRelationships {
    pub kind: CollectionKind,
    pub logins: RelationshipSet,
    /// Raw record count before deduplication.
    pub total_count: usize,
    pub pages_fetched: u32,
    /// Set when a failed collection was replaced by an empty result.
    pub degraded: bool,
}

impl CollectedRelationships {
    pub fn degraded(kind: CollectionKind) -> Self {
        Self {
            kind,
            logins: RelationshipSet::new(),
            total_count: 0,
            pages_fetched: 0,
            degraded: true,
        }
    }
}

/// Identity plus API token. Opaque to the engine.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub identity: String,
    pub token: String,
}

impl Credentials {
    pub fn new(identity: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            token: token.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("identity", &self.identity)
            .field("token", &"***")
            .finish()
    }
}

/// Corrective actions needed to satisfy the mutual-follow policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationPlan {
    pub to_unfollow: RelationshipSet,
    pub to_follow_back: RelationshipSet,
}

impl ReconciliationPlan {
    pub fn is_empty(&self) -> bool {
        self.to_unfollow.is_empty() && self.to_follow_back.is_empty()
    }

    pub fn len(&self) -> usize {
        self.to_unfollow.len() + self.to_follow_back.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Unfollow,
    FollowBack,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKind::Unfollow => f.write_str("unfollow"),
            MutationKind::FollowBack => f.write_str("follow-back"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    Applied,
    Rejected { status: u16 },
    TransportFailed { error: String },
    /// Not attempted because the run was cancelled first.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationEntry {
    pub kind: MutationKind,
    pub login: String,
    pub outcome: MutationOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationReport {
    pub entries: Vec<MutationEntry>,
    pub finished_at: DateTime<Utc>,
}

impl MutationReport {
    /// Builds a report with entries ordered by kind then login.
    pub fn from_entries(mut entries: Vec<MutationEntry>) -> Self {
        entries.sort_by(|a, b| (a.kind, &a.login).cmp(&(b.kind, &b.login)));
        Self {
            entries,
            finished_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn outcome_of(&self, kind: MutationKind, login: &str) -> Option<&MutationOutcome> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && e.login == login)
            .map(|e| &e.outcome)
    }

    pub fn applied(&self, kind: MutationKind) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.kind == kind && e.outcome == MutationOutcome::Applied)
            .map(|e| e.login.as_str())
            .collect()
    }

    pub fn rejected(&self) -> Vec<(&MutationEntry, u16)> {
        self.entries
            .iter()
            .filter_map(|e| match e.outcome {
                MutationOutcome::Rejected { status } => Some((e, status)),
                _ => None,
            })
            .collect()
    }

    pub fn failed(&self) -> Vec<(&MutationEntry, &str)> {
        self.entries
            .iter()
            .filter_map(|e| match &e.outcome {
                MutationOutcome::TransportFailed { error } => Some((e, error.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.outcome == MutationOutcome::Skipped)
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.entries.iter().any(|e| {
            matches!(
                e.outcome,
                MutationOutcome::Rejected { .. } | MutationOutcome::TransportFailed { .. }
            )
        })
    }
}
