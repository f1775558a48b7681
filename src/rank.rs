//! Ordering of challenge lists by the opponent's ladder rank.

use crate::{ChallengeRecord, RowRecord};
use std::cmp::Ordering;

/// Ranks below zero mean "not on the ladder" and sort after every ranked player.
#[inline]
fn effective_rank(rank: i32) -> i64 {
    if rank < 0 {
        i64::MAX
    } else {
        rank as i64
    }
}

/// Compare two challenges by the referenced player's rank, unranked last.
pub fn by_ladder_rank(a: &ChallengeRecord, b: &ChallengeRecord) -> Ordering {
    effective_rank(a.player.ladder_rank).cmp(&effective_rank(b.player.ladder_rank))
}

/// Stable sort, so equal ranks keep the order the server sent them in.
pub fn sort_challenges(challenges: &mut [ChallengeRecord]) {
    challenges.sort_by(by_ladder_rank);
}

/// Normalize both challenge lists of a freshly fetched row.
pub fn normalize(row: &mut RowRecord) {
    sort_challenges(&mut row.incoming_challenges);
    sort_challenges(&mut row.outgoing_challenges);
}
