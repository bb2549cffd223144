//! Vote tallying.
//!
//! The store never pre-aggregates votes; whoever reads the state computes
//! the outcome with this function, so every client derives the same result
//! from the same snapshot.

use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::models::RosterEntry;

/// Result of tallying one vote round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub option: String,
    pub count: usize,
    pub total_votes: usize,
    /// True when the winning option needed the order-index tie-break.
    pub tie_broken: bool,
}

/// Tallies a vote round: majority wins, ties broken by the lowest
/// `order_index` among the participants who voted for the tied options.
/// Votes from ids no longer in the roster are ignored.
///
/// Returns `None` when no countable votes exist.
pub fn tally(votes: &BTreeMap<Uuid, String>, roster: &[RosterEntry]) -> Option<VoteOutcome> {
    let order_of: HashMap<Uuid, i32> = roster.iter().map(|e| (e.id, e.order_index)).collect();

    // option -> (count, lowest order_index among its voters)
    let mut buckets: BTreeMap<&str, (usize, i32)> = BTreeMap::new();
    let mut total = 0usize;

    for (voter, option) in votes {
        let Some(&order) = order_of.get(voter) else {
            continue; // voter left the room
        };
        total += 1;
        let entry = buckets.entry(option.as_str()).or_insert((0, order));
        entry.0 += 1;
        entry.1 = entry.1.min(order);
    }

    let top_count = buckets.values().map(|(count, _)| *count).max()?;
    let tied: Vec<_> = buckets
        .iter()
        .filter(|(_, (count, _))| *count == top_count)
        .collect();

    let tie_broken = tied.len() > 1;
    let (option, _) = tied
        .into_iter()
        .min_by_key(|(_, (_, lowest_order))| *lowest_order)?;

    Some(VoteOutcome {
        option: option.to_string(),
        count: top_count,
        total_votes: total,
        tie_broken,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster(orders: &[i32]) -> Vec<RosterEntry> {
        orders
            .iter()
            .map(|&order_index| RosterEntry {
                id: Uuid::new_v4(),
                order_index,
                is_spectator: false,
            })
            .collect()
    }

    #[test]
    fn test_tally_empty() {
        let votes = BTreeMap::new();
        assert_eq!(tally(&votes, &roster(&[0, 1])), None);
    }

    #[test]
    fn test_tally_simple_majority() {
        let members = roster(&[0, 1, 2]);
        let mut votes = BTreeMap::new();
        votes.insert(members[0].id, "A".to_string());
        votes.insert(members[1].id, "A".to_string());
        votes.insert(members[2].id, "B".to_string());

        let outcome = tally(&votes, &members).unwrap();
        assert_eq!(outcome.option, "A");
        assert_eq!(outcome.count, 2);
        assert_eq!(outcome.total_votes, 3);
        assert!(!outcome.tie_broken);
    }

    #[test]
    fn test_tally_tie_broken_by_lowest_order_index() {
        // A:2 votes (orders 1, 3), B:2 votes (orders 0, 2) -> B wins since
        // its lowest voter order (0) beats A's (1).
        let members = roster(&[0, 1, 2, 3]);
        let mut votes = BTreeMap::new();
        votes.insert(members[1].id, "A".to_string());
        votes.insert(members[3].id, "A".to_string());
        votes.insert(members[0].id, "B".to_string());
        votes.insert(members[2].id, "B".to_string());

        let outcome = tally(&votes, &members).unwrap();
        assert_eq!(outcome.option, "B");
        assert_eq!(outcome.count, 2);
        assert!(outcome.tie_broken);
    }

    #[test]
    fn test_tally_tie_break_is_deterministic() {
        let members = roster(&[0, 1, 2, 3]);
        let mut votes = BTreeMap::new();
        votes.insert(members[0].id, "A".to_string());
        votes.insert(members[2].id, "A".to_string());
        votes.insert(members[1].id, "B".to_string());
        votes.insert(members[3].id, "B".to_string());

        let first = tally(&votes, &members).unwrap();
        for _ in 0..10 {
            assert_eq!(tally(&votes, &members).unwrap(), first);
        }
        assert_eq!(first.option, "A");
    }

    #[test]
    fn test_tally_ignores_departed_voters() {
        let members = roster(&[0, 1]);
        let departed = Uuid::new_v4();
        let mut votes = BTreeMap::new();
        votes.insert(members[0].id, "A".to_string());
        votes.insert(departed, "B".to_string());
        votes.insert(members[1].id, "B".to_string());

        // Departed voter's B vote does not count: A 1, B 1, tie broken by
        // order 0 -> A.
        let outcome = tally(&votes, &members).unwrap();
        assert_eq!(outcome.option, "A");
        assert_eq!(outcome.total_votes, 2);
    }

    #[test]
    fn test_tally_all_voters_departed() {
        let members = roster(&[0]);
        let mut votes = BTreeMap::new();
        votes.insert(Uuid::new_v4(), "A".to_string());
        assert_eq!(tally(&votes, &members), None);
    }
}
