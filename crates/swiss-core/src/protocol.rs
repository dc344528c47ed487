use serde::{Deserialize, Serialize};

use crate::elo::Outcome;
use crate::matchup::Matchup;
use crate::tournament::{Standing, SwissTournament};

/// Request body for creating a tournament
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTournament {
    pub name: String,
    pub competitors: Vec<String>,
    #[serde(default)]
    pub k_factor: Option<f64>,
    #[serde(default)]
    pub initial_rating: Option<f64>,
    #[serde(default)]
    pub shuffle: Option<bool>,
}

/// Request body for reporting a result over REST
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResult {
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorView {
    pub id: usize,
    pub name: String,
    pub rating: f64,
    pub bye: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    pub outcome: Outcome,
    pub left_change: f64,
    pub right_change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupView {
    pub round: usize,
    pub slot: usize,
    pub left: String,
    pub right: String,
    pub bye: bool,
    pub result: Option<ResultView>,
}

impl MatchupView {
    pub fn new(tournament: &SwissTournament, round: usize, slot: usize, m: &Matchup) -> Self {
        let name = |id: crate::CompetitorId| {
            tournament
                .competitor(id)
                .map(|c| c.name.clone())
                .unwrap_or_default()
        };
        Self {
            round,
            slot,
            left: name(m.left),
            right: name(m.right),
            bye: m.is_bye(),
            result: m.result.map(|r| ResultView {
                outcome: r.outcome,
                left_change: r.left_change,
                right_change: r.right_change,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundView {
    pub index: usize,
    pub matchups: Vec<MatchupView>,
}

/// Full tournament state returned by REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentView {
    pub code: String,
    pub name: String,
    pub k_factor: f64,
    pub competitors: Vec<CompetitorView>,
    pub rounds: Vec<RoundView>,
    pub current_round: Option<usize>,
    pub complete: bool,
}

impl TournamentView {
    pub fn new(code: &str, tournament: &SwissTournament) -> Self {
        Self {
            code: code.to_string(),
            name: tournament.name().to_string(),
            k_factor: tournament.config().k_factor,
            competitors: tournament
                .competitors()
                .iter()
                .map(|c| CompetitorView {
                    id: c.id.0,
                    name: c.name.clone(),
                    rating: c.rating,
                    bye: c.is_bye(),
                })
                .collect(),
            rounds: tournament
                .rounds()
                .iter()
                .enumerate()
                .map(|(index, matchups)| RoundView {
                    index,
                    matchups: matchups
                        .iter()
                        .enumerate()
                        .map(|(slot, m)| MatchupView::new(tournament, index, slot, m))
                        .collect(),
                })
                .collect(),
            current_round: tournament.current_round(),
            complete: tournament.is_complete(),
        }
    }
}

/// Row of the tournament list returned by REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSummary {
    pub code: String,
    pub name: String,
    pub competitors: u32,
    pub created_at: String,
}

/// Standings entry returned by REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingEntry {
    pub rank: u32,
    pub name: String,
    pub rating: f64,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub byes: u32,
}

impl From<&Standing> for StandingEntry {
    fn from(s: &Standing) -> Self {
        Self {
            rank: s.rank,
            name: s.name.clone(),
            rating: s.rating,
            wins: s.tally.wins,
            draws: s.tally.draws,
            losses: s.tally.losses,
            byes: s.tally.byes,
        }
    }
}

pub fn standings_view(tournament: &SwissTournament) -> Vec<StandingEntry> {
    tournament.standings().iter().map(StandingEntry::from).collect()
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    ReportResult {
        round: usize,
        slot: usize,
        outcome: Outcome,
    },
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    Snapshot {
        tournament: TournamentView,
    },
    ResultRecorded {
        matchup: MatchupView,
    },
    Standings {
        entries: Vec<StandingEntry>,
    },
    RoundComplete {
        round: usize,
    },
    TournamentComplete,
    Error {
        message: String,
    },
    Pong,
}
