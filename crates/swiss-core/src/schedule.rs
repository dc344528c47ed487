use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::competitor::CompetitorId;
use crate::error::PairingError;
use crate::pairing::{build_round, Round};
use crate::validation::PairHistory;

/// Number of rounds played by `competitor_count` competitors: `ceil(log2(n))`.
pub fn rounds_for(competitor_count: usize) -> usize {
    if competitor_count < 2 {
        return 0;
    }
    competitor_count.next_power_of_two().trailing_zeros() as usize
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub rounds: Vec<Round>,
}

impl Schedule {
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// All pairs of every round, in play order.
    pub fn history(&self) -> PairHistory {
        self.rounds.iter().flat_map(|r| r.pairs.iter().copied()).collect()
    }
}

/// Builds a whole schedule round by round.
///
/// Each round is solved on its own against the pairs of every earlier round. A round
/// that cannot be completed fails the whole build; choices in earlier rounds are never
/// revisited, so some rosters are reported infeasible even though a schedule exists.
#[derive(Clone, Debug, Default)]
pub struct ScheduleBuilder {
    history: PairHistory,
}

impl ScheduleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the exclusion set with pairs played before this schedule.
    pub fn with_history(history: PairHistory) -> Self {
        Self { history }
    }

    pub fn build(mut self, competitors: &[CompetitorId]) -> Result<Schedule, PairingError> {
        let n = competitors.len();
        if n < 2 {
            return Err(PairingError::TooFewCompetitors(n));
        }
        if n % 2 != 0 {
            return Err(PairingError::OddRoster(n));
        }

        let total = rounds_for(n);
        let mut rounds = Vec::with_capacity(total);

        for number in 1..=total {
            let round = build_round(competitors, &self.history, n / 2).map_err(|e| match e {
                PairingError::Infeasible { .. } => PairingError::Infeasible { round: number },
                other => other,
            })?;
            debug!(round = number, pairs = round.len(), "round scheduled");
            self.history.extend(round.pairs.iter().copied());
            rounds.push(round);
        }

        info!(competitors = n, rounds = total, "schedule built");
        Ok(Schedule { rounds })
    }
}

/// Build a fresh schedule for an even roster.
pub fn build_schedule(competitors: &[CompetitorId]) -> Result<Schedule, PairingError> {
    ScheduleBuilder::new().build(competitors)
}
