use serde::{Deserialize, Serialize};

use crate::competitor::{Competitor, CompetitorId};
use crate::elo::{update_ratings, Outcome};
use crate::validation::Pair;

/// Stored result of an adjudicated matchup.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub outcome: Outcome,
    /// Rating deltas (left, right). Zero for bye matchups.
    pub left_change: f64,
    pub right_change: f64,
}

/// A scheduled pair that can carry a result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub left: CompetitorId,
    pub right: CompetitorId,
    pub bye: bool,
    pub result: Option<MatchResult>,
}

/// Why a result could not be recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordError {
    AlreadyRecorded,
    UnknownCompetitor(CompetitorId),
}

impl Matchup {
    pub fn new(pair: Pair, competitors: &[Competitor]) -> Self {
        let is_bye = |id: CompetitorId| competitors.get(id.0).is_some_and(Competitor::is_bye);
        Self {
            left: pair.left,
            right: pair.right,
            bye: is_bye(pair.left) || is_bye(pair.right),
            result: None,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.bye
    }

    pub fn is_decided(&self) -> bool {
        self.result.is_some()
    }

    pub fn pair(&self) -> Pair {
        Pair::new(self.left, self.right)
    }

    /// The non-bye side of a bye matchup.
    pub fn advancing(&self, competitors: &[Competitor]) -> Option<CompetitorId> {
        if !self.bye {
            return None;
        }
        [self.left, self.right]
            .into_iter()
            .find(|id| competitors.get(id.0).is_some_and(|c| !c.is_bye()))
    }

    /// Store `outcome` and apply it to both competitors.
    ///
    /// Rated matchups update both ratings with the Elo model and tally the result.
    /// Bye matchups keep every rating untouched and only count a bye for the real side.
    /// A matchup accepts exactly one result.
    pub fn record_outcome(
        &mut self,
        competitors: &mut [Competitor],
        outcome: Outcome,
        k: f64,
    ) -> Result<MatchResult, RecordError> {
        if self.result.is_some() {
            return Err(RecordError::AlreadyRecorded);
        }
        for id in [self.left, self.right] {
            if id.0 >= competitors.len() {
                return Err(RecordError::UnknownCompetitor(id));
            }
        }

        let result = if self.bye {
            if let Some(id) = self.advancing(competitors) {
                competitors[id.0].tally.byes += 1;
            }
            MatchResult {
                outcome,
                left_change: 0.0,
                right_change: 0.0,
            }
        } else {
            let (score_left, score_right) = outcome.scores();
            let old_left = competitors[self.left.0].rating;
            let old_right = competitors[self.right.0].rating;
            let (new_left, new_right) =
                update_ratings(old_left, old_right, score_left, score_right, k);

            competitors[self.left.0].rating = new_left;
            competitors[self.right.0].rating = new_right;

            let (left, right) = (self.left.0, self.right.0);
            match outcome {
                Outcome::LeftWin => {
                    competitors[left].tally.wins += 1;
                    competitors[right].tally.losses += 1;
                }
                Outcome::RightWin => {
                    competitors[left].tally.losses += 1;
                    competitors[right].tally.wins += 1;
                }
                Outcome::Draw => {
                    competitors[left].tally.draws += 1;
                    competitors[right].tally.draws += 1;
                }
            }

            MatchResult {
                outcome,
                left_change: new_left - old_left,
                right_change: new_right - old_right,
            }
        };

        self.result = Some(result);
        Ok(result)
    }
}
