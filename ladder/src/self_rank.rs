//! Single-user standing.
//!
//! This is a different metric from the page rank. The page assigns distinct
//! positional ranks to tied users (earlier registration first); here every
//! user in a tied group gets the rank of the top of the group. A user who is
//! 2nd on the page can therefore have a self rank of 1. Both are exposed
//! as-is.

use crate::types::{SelfRank, UserScore};

/// Score and count-rank of `user_id` within `scores`.
///
/// `scores` is the aggregated population for the same window as the page.
/// Returns `None` when the user is not registered.
pub fn resolve_self_rank(scores: &[UserScore], user_id: &str) -> Option<SelfRank> {
    let target = scores.iter().find(|s| s.user.user_id == user_id)?;
    let higher = scores.iter().filter(|s| s.score > target.score).count();

    Some(SelfRank {
        user_id: target.user.user_id.clone(),
        username: target.user.username.clone(),
        score: target.score,
        rank: higher as u64 + 1,
    })
}
