use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::competitor::CompetitorId;

/// Two competitors facing each other. Orientation is kept for display and scoring
/// but ignored when checking for repeats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pair {
    pub left: CompetitorId,
    pub right: CompetitorId,
}

impl Pair {
    pub fn new(left: CompetitorId, right: CompetitorId) -> Self {
        Self { left, right }
    }

    /// Orientation-free form, lower id first.
    pub fn key(&self) -> (CompetitorId, CompetitorId) {
        if self.left <= self.right {
            (self.left, self.right)
        } else {
            (self.right, self.left)
        }
    }

    pub fn contains(&self, id: CompetitorId) -> bool {
        self.left == id || self.right == id
    }

    pub fn is_self_pairing(&self) -> bool {
        self.left == self.right
    }
}

/// Set of pairs already used, orientation-insensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairHistory {
    used: HashSet<(CompetitorId, CompetitorId)>,
}

impl PairHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the pair (in either orientation) was already present.
    pub fn insert(&mut self, pair: Pair) -> bool {
        self.used.insert(pair.key())
    }

    pub fn remove(&mut self, pair: Pair) -> bool {
        self.used.remove(&pair.key())
    }

    pub fn contains(&self, pair: Pair) -> bool {
        self.used.contains(&pair.key())
    }

    pub fn extend<I: IntoIterator<Item = Pair>>(&mut self, pairs: I) {
        for pair in pairs {
            self.insert(pair);
        }
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}

impl FromIterator<Pair> for PairHistory {
    fn from_iter<I: IntoIterator<Item = Pair>>(iter: I) -> Self {
        let mut history = PairHistory::new();
        history.extend(iter);
        history
    }
}

/// Check whether `candidate` may be scheduled given every pair already used.
///
/// A competitor is never paired with itself, and a pair is rejected if it was used
/// before in either orientation.
pub fn is_admissible(candidate: Pair, used: &PairHistory) -> bool {
    if candidate.is_self_pairing() {
        return false;
    }
    !used.contains(candidate)
}

/// Every competitor in `pool` that `competitor` could still face, in pool order.
pub fn admissible_partners(
    competitor: CompetitorId,
    pool: &[CompetitorId],
    used: &PairHistory,
) -> Vec<CompetitorId> {
    pool.iter()
        .copied()
        .filter(|&other| is_admissible(Pair::new(competitor, other), used))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: usize) -> CompetitorId {
        CompetitorId(n)
    }

    #[test]
    fn rejects_self_pairing() {
        let history = PairHistory::new();
        assert!(!is_admissible(Pair::new(id(1), id(1)), &history));
    }

    #[test]
    fn rejects_either_orientation() {
        let history: PairHistory = [Pair::new(id(0), id(1))].into_iter().collect();
        assert!(!is_admissible(Pair::new(id(0), id(1)), &history));
        assert!(!is_admissible(Pair::new(id(1), id(0)), &history));
        assert!(is_admissible(Pair::new(id(0), id(2)), &history));
    }

    #[test]
    fn history_ignores_orientation() {
        let mut history = PairHistory::new();
        assert!(history.insert(Pair::new(id(4), id(2))));
        assert!(!history.insert(Pair::new(id(2), id(4))));
        assert_eq!(history.len(), 1);
        assert!(history.remove(Pair::new(id(2), id(4))));
        assert!(history.is_empty());
    }

    #[test]
    fn partners_keep_pool_order() {
        let history: PairHistory = [Pair::new(id(0), id(2))].into_iter().collect();
        let pool = [id(3), id(2), id(1), id(0)];
        assert_eq!(admissible_partners(id(0), &pool, &history), vec![id(3), id(1)]);
    }
}
