//! Reward curve for oracle voters.
//!
//! A pure function from a voter's submission rank (among voters agreeing on
//! the winning hash) to a reward amount. Earlier correct voters earn more;
//! each rank pays 90% of the previous one. Per-game aggregate caps are
//! applied by the oracle, keeping this curve stateless.

use crate::types::Amount;

/// Reward for the voter at `rank` (0 = first agreeing submission),
/// starting at `max_per_validator` and decaying 10% per rank.
pub fn reward_at_rank(rank: u32, max_per_validator: Amount) -> Amount {
    let mut reward = max_per_validator;
    for _ in 0..rank {
        if reward == 0 {
            break;
        }
        reward = reward * 9 / 10;
    }
    reward
}

/// Sum of rewards for the first `count` ranks, without any aggregate cap
pub fn uncapped_total(count: u32, max_per_validator: Amount) -> Amount {
    (0..count)
        .map(|rank| reward_at_rank(rank, max_per_validator))
        .sum()
}
