use crate::domain::model::{ReconciliationPlan, RelationshipSet};

/// Computes the mutual-follow plan.
///
/// `to_unfollow` is everyone followed who does not follow back, and
/// `to_follow_back` is every follower not yet followed. The two sets are
/// disjoint because each is a difference over the same pair of inputs.
pub fn reconcile(followers: &RelationshipSet, following: &RelationshipSet) -> ReconciliationPlan {
    ReconciliationPlan {
        to_unfollow: following.difference(followers),
        to_follow_back: followers.difference(following),
    }
}
