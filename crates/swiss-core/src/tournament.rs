use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::adjudicator::Adjudicator;
use crate::competitor::{Competitor, CompetitorId, Tally};
use crate::config::TournamentConfig;
use crate::elo::Outcome;
use crate::error::{Result, SwissError};
use crate::matchup::{MatchResult, Matchup, RecordError};
use crate::schedule::{build_schedule, Schedule};
use crate::validation::PairHistory;

/// One row of the standings table.
#[derive(Clone, Debug, PartialEq)]
pub struct Standing {
    pub rank: u32,
    pub id: CompetitorId,
    pub name: String,
    pub rating: f64,
    pub tally: Tally,
}

/// A Swiss tournament: roster, schedule and results.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SwissTournament {
    name: String,
    config: TournamentConfig,
    competitors: Vec<Competitor>,
    rounds: Vec<Vec<Matchup>>,
}

impl SwissTournament {
    /// Register competitors by name at the configured initial rating. An odd roster is
    /// padded with a single bye.
    pub fn new<I, S>(name: impl Into<String>, names: I, config: TournamentConfig) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut competitors: Vec<Competitor> = Vec::new();
        let mut seen = HashSet::new();
        for (seed, raw) in names.into_iter().enumerate() {
            let name: String = raw.into().trim().to_string();
            if name.is_empty() {
                return Err(SwissError::EmptyName(seed));
            }
            if !seen.insert(name.clone()) {
                return Err(SwissError::DuplicateName(name));
            }
            competitors.push(Competitor::with_rating(
                CompetitorId(seed),
                name,
                config.initial_rating,
            ));
        }

        if competitors.is_empty() {
            return Err(SwissError::EmptyRoster);
        }
        if competitors.len() % 2 != 0 {
            let bye_name = config.bye_name.trim();
            if seen.contains(bye_name) {
                return Err(SwissError::DuplicateName(bye_name.to_string()));
            }
            let id = CompetitorId(competitors.len());
            competitors.push(Competitor::bye(id, bye_name));
        }

        Ok(Self {
            name: name.into(),
            config,
            competitors,
            rounds: Vec::new(),
        })
    }

    /// Default configuration, unnamed event.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("Swiss", names, TournamentConfig::default())
    }

    /// Reassemble a tournament from stored parts without replaying any results.
    pub fn restore(
        name: impl Into<String>,
        config: TournamentConfig,
        competitors: Vec<Competitor>,
        rounds: Vec<Vec<Matchup>>,
    ) -> Self {
        Self {
            name: name.into(),
            config,
            competitors,
            rounds,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &TournamentConfig {
        &self.config
    }

    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    pub fn competitor(&self, id: CompetitorId) -> Option<&Competitor> {
        self.competitors.get(id.0)
    }

    pub fn has_bye(&self) -> bool {
        self.competitors.iter().any(Competitor::is_bye)
    }

    pub fn rounds(&self) -> &[Vec<Matchup>] {
        &self.rounds
    }

    pub fn round(&self, round: usize) -> Option<&[Matchup]> {
        self.rounds.get(round).map(Vec::as_slice)
    }

    pub fn is_scheduled(&self) -> bool {
        !self.rounds.is_empty()
    }

    /// Every pair scheduled so far.
    pub fn history(&self) -> PairHistory {
        self.rounds
            .iter()
            .flat_map(|r| r.iter().map(Matchup::pair))
            .collect()
    }

    fn any_result(&self) -> bool {
        self.rounds.iter().flatten().any(Matchup::is_decided)
    }

    /// Generate the full schedule with the thread-local RNG (only used when the
    /// roster is shuffled).
    pub fn generate_schedule(&mut self) -> Result<&[Vec<Matchup>]> {
        self.generate_schedule_with(&mut rand::rng())
    }

    pub fn generate_schedule_with<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<&[Vec<Matchup>]> {
        if self.any_result() {
            return Err(SwissError::ScheduleInProgress);
        }

        let mut order: Vec<CompetitorId> = self.competitors.iter().map(|c| c.id).collect();
        if self.config.shuffle_roster {
            order.shuffle(rng);
        }

        let schedule: Schedule = build_schedule(&order).inspect_err(|e| {
            warn!(tournament = %self.name, error = %e, "schedule generation failed");
        })?;

        self.rounds = schedule
            .rounds
            .iter()
            .map(|round| {
                round
                    .iter()
                    .map(|&pair| Matchup::new(pair, &self.competitors))
                    .collect()
            })
            .collect();

        info!(
            tournament = %self.name,
            competitors = self.competitors.len(),
            rounds = self.rounds.len(),
            "schedule generated"
        );
        self.advance_byes(0);
        Ok(&self.rounds)
    }

    /// First round that still has an undecided matchup.
    pub fn current_round(&self) -> Option<usize> {
        self.rounds
            .iter()
            .position(|r| r.iter().any(|m| !m.is_decided()))
    }

    pub fn is_round_complete(&self, round: usize) -> bool {
        self.rounds
            .get(round)
            .is_some_and(|r| r.iter().all(Matchup::is_decided))
    }

    pub fn is_complete(&self) -> bool {
        self.is_scheduled() && self.current_round().is_none()
    }

    /// Record the result of one matchup. Rounds are played in order, and each matchup
    /// takes exactly one result.
    pub fn record_result(
        &mut self,
        round: usize,
        slot: usize,
        outcome: Outcome,
    ) -> Result<MatchResult> {
        if !self.is_scheduled() {
            return Err(SwissError::NoSchedule);
        }
        if round >= self.rounds.len() {
            return Err(SwissError::UnknownRound(round));
        }
        if slot >= self.rounds[round].len() {
            return Err(SwissError::UnknownMatch { round, slot });
        }
        if round > 0 && !self.is_round_complete(round - 1) {
            return Err(SwissError::RoundNotReady(round));
        }

        let k = self.config.k_factor;
        let matchup = &mut self.rounds[round][slot];
        let result = matchup
            .record_outcome(&mut self.competitors, outcome, k)
            .map_err(|e| match e {
                RecordError::AlreadyRecorded => SwissError::AlreadyAdjudicated { round, slot },
                RecordError::UnknownCompetitor(id) => SwissError::UnknownCompetitor(id),
            })?;

        if self.is_round_complete(round) {
            info!(tournament = %self.name, round, "round complete");
            self.advance_byes(round + 1);
        }
        Ok(result)
    }

    /// Resolve every bye matchup of `round` as a win for the real side.
    fn advance_byes(&mut self, round: usize) {
        let Some(matchups) = self.rounds.get_mut(round) else {
            return;
        };
        let k = self.config.k_factor;
        for matchup in matchups.iter_mut().filter(|m| m.is_bye() && !m.is_decided()) {
            let outcome = match matchup.advancing(&self.competitors) {
                Some(id) if id == matchup.right => Outcome::RightWin,
                _ => Outcome::LeftWin,
            };
            if let Err(e) = matchup.record_outcome(&mut self.competitors, outcome, k) {
                warn!(
                    tournament = %self.name,
                    round,
                    left = %matchup.left,
                    right = %matchup.right,
                    error = ?e,
                    "bye matchup left open"
                );
            }
        }
        if self.is_round_complete(round) && round + 1 < self.rounds.len() {
            self.advance_byes(round + 1);
        }
    }

    /// Ask `adjudicator` for every open matchup of `round`.
    pub fn hold_round<A: Adjudicator + ?Sized>(
        &mut self,
        round: usize,
        adjudicator: &mut A,
    ) -> Result<()> {
        let len = self
            .rounds
            .get(round)
            .map(Vec::len)
            .ok_or(SwissError::UnknownRound(round))?;
        for slot in 0..len {
            let matchup = &self.rounds[round][slot];
            if matchup.is_decided() {
                continue;
            }
            let left = self
                .competitors
                .get(matchup.left.0)
                .ok_or(SwissError::UnknownCompetitor(matchup.left))?;
            let right = self
                .competitors
                .get(matchup.right.0)
                .ok_or(SwissError::UnknownCompetitor(matchup.right))?;
            let outcome = adjudicator.adjudicate(left, right);
            self.record_result(round, slot, outcome)?;
        }
        Ok(())
    }

    /// Schedule (if needed) and play every round through `adjudicator`.
    pub fn hold_all_rounds<A: Adjudicator + ?Sized>(&mut self, adjudicator: &mut A) -> Result<()> {
        if !self.is_scheduled() {
            self.generate_schedule()?;
        }
        for round in 0..self.rounds.len() {
            self.hold_round(round, adjudicator)?;
        }
        Ok(())
    }

    /// Regular competitors by rating, highest first. Equal ratings keep seed order.
    pub fn standings(&self) -> Vec<Standing> {
        let mut entries: Vec<&Competitor> =
            self.competitors.iter().filter(|c| !c.is_bye()).collect();
        entries.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        entries
            .into_iter()
            .enumerate()
            .map(|(i, c)| Standing {
                rank: (i + 1) as u32,
                id: c.id,
                name: c.name.clone(),
                rating: c.rating,
                tally: c.tally,
            })
            .collect()
    }
}
