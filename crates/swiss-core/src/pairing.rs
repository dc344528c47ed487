use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::competitor::CompetitorId;
use crate::error::PairingError;
use crate::validation::{admissible_partners, Pair, PairHistory};

/// One round of play: a perfect matching over the pool.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    pub pairs: Vec<Pair>,
}

impl Round {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pair> {
        self.pairs.iter()
    }

    /// True if every competitor in `pool` appears in exactly one pair and nobody else does.
    pub fn is_perfect_matching(&self, pool: &[CompetitorId]) -> bool {
        if self.pairs.len() * 2 != pool.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(pool.len());
        for pair in &self.pairs {
            if pair.is_self_pairing() || !seen.insert(pair.left) || !seen.insert(pair.right) {
                return false;
            }
        }
        pool.iter().all(|id| seen.contains(id))
    }
}

/// Depth-first search state. The pool, the used-pair set and the partial round are
/// mutated in place and restored when a branch fails.
struct RoundSearch {
    pool: Vec<CompetitorId>,
    used: PairHistory,
    partial: Vec<Pair>,
    target: usize,
    nodes: u64,
    backtracks: u64,
}

impl RoundSearch {
    fn solve(&mut self) -> bool {
        self.nodes += 1;
        if self.partial.len() == self.target {
            return true;
        }
        if self.pool.is_empty() {
            return false;
        }

        let ci = self.pool.remove(0);
        let candidates = admissible_partners(ci, &self.pool, &self.used);
        if candidates.is_empty() {
            self.pool.insert(0, ci);
            return false;
        }

        for cj in candidates {
            let Some(idx) = self.pool.iter().position(|&c| c == cj) else {
                continue;
            };
            let pair = Pair::new(ci, cj);
            debug_assert!(!pair.is_self_pairing(), "self-pairing reached the search");

            self.pool.remove(idx);
            self.used.insert(pair);
            self.partial.push(pair);

            if self.solve() {
                return true;
            }

            self.partial.pop();
            self.used.remove(pair);
            self.pool.insert(idx, cj);
            self.backtracks += 1;
        }

        self.pool.insert(0, ci);
        false
    }
}

fn check_pool(competitors: &[CompetitorId]) -> Result<(), PairingError> {
    if competitors.len() % 2 != 0 {
        return Err(PairingError::OddRoster(competitors.len()));
    }
    let mut seen = HashSet::with_capacity(competitors.len());
    for &id in competitors {
        if !seen.insert(id) {
            return Err(PairingError::DuplicateCompetitor(id));
        }
    }
    Ok(())
}

/// Build one round in which every pair is new with respect to `history`.
///
/// Competitors are taken in the order given: the first unpaired one is matched with
/// its earliest admissible partner, and later partners are tried only when the rest of
/// the round cannot be completed. Returns [`PairingError::Infeasible`] once every
/// branch is exhausted. The reported round number is 1.
pub fn build_round(
    competitors: &[CompetitorId],
    history: &PairHistory,
    target_matches: usize,
) -> Result<Round, PairingError> {
    check_pool(competitors)?;
    if target_matches * 2 != competitors.len() {
        return Err(PairingError::TargetMismatch {
            target: target_matches,
            pool: competitors.len(),
        });
    }

    let mut search = RoundSearch {
        pool: competitors.to_vec(),
        used: history.clone(),
        partial: Vec::with_capacity(target_matches),
        target: target_matches,
        nodes: 0,
        backtracks: 0,
    };

    let found = search.solve();
    debug!(
        pool = competitors.len(),
        nodes = search.nodes,
        backtracks = search.backtracks,
        found,
        "round search finished"
    );

    if found {
        Ok(Round {
            pairs: search.partial,
        })
    } else {
        Err(PairingError::Infeasible { round: 1 })
    }
}
