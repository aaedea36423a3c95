//! Placement and replica selection policies
//!
//! The same strategy picks the chunkserver a client pushes a chunk to and the
//! replica the coordinator hands out for a read. Neither decision looks at
//! locality or load.

use crate::common::PlacementPolicy;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Picks one address out of a candidate list.
pub trait SelectionStrategy: Send + Sync {
    /// Returns `None` only when `candidates` is empty.
    fn select<'a>(&self, candidates: &'a [String]) -> Option<&'a str>;

    fn name(&self) -> &'static str;
}

/// Every candidate equally likely
#[derive(Debug, Default, Clone, Copy)]
pub struct UniformRandom;

impl SelectionStrategy for UniformRandom {
    fn select<'a>(&self, candidates: &'a [String]) -> Option<&'a str> {
        candidates
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }

    fn name(&self) -> &'static str {
        "uniform-random"
    }
}

/// Cycles through candidate positions with a shared cursor
#[derive(Debug, Default)]
pub struct RoundRobin {
    next: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionStrategy for RoundRobin {
    fn select<'a>(&self, candidates: &'a [String]) -> Option<&'a str> {
        if candidates.is_empty() {
            return None;
        }
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        candidates.get(n % candidates.len()).map(String::as_str)
    }

    fn name(&self) -> &'static str {
        "round-robin"
    }
}

impl PlacementPolicy {
    /// Build the strategy this policy names
    pub fn strategy(self) -> Arc<dyn SelectionStrategy> {
        match self {
            PlacementPolicy::UniformRandom => Arc::new(UniformRandom),
            PlacementPolicy::RoundRobin => Arc::new(RoundRobin::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn nodes(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("10.0.0.{}:8001", i)).collect()
    }

    #[test]
    fn test_empty_candidates() {
        assert!(UniformRandom.select(&[]).is_none());
        assert!(RoundRobin::new().select(&[]).is_none());
    }

    #[test]
    fn test_uniform_random_picks_members() {
        let candidates = nodes(4);
        let mut seen = HashSet::new();
        for _ in 0..400 {
            let pick = UniformRandom.select(&candidates).unwrap();
            assert!(candidates.iter().any(|c| c == pick));
            seen.insert(pick.to_string());
        }
        // 400 draws over 4 nodes miss one with probability ~4 * 0.75^400
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_round_robin_cycles() {
        let candidates = nodes(3);
        let strategy = RoundRobin::new();
        let picks: Vec<_> = (0..6)
            .map(|_| strategy.select(&candidates).unwrap().to_string())
            .collect();
        assert_eq!(picks[0..3], candidates[..]);
        assert_eq!(picks[3..6], candidates[..]);
    }

    #[test]
    fn test_policy_builds_named_strategy() {
        assert_eq!(PlacementPolicy::UniformRandom.strategy().name(), "uniform-random");
        assert_eq!(PlacementPolicy::RoundRobin.strategy().name(), "round-robin");
    }
}
