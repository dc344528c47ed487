use std::fmt;

use serde::{Deserialize, Serialize};

use crate::elo::DEFAULT_RATING;

/// Rating carried by the bye sentinel. Never updated.
pub const BYE_RATING: f64 = 0.0;

/// Seed index of a competitor in its tournament roster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompetitorId(pub usize);

impl fmt::Display for CompetitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompetitorKind {
    Regular,
    Bye,
}

/// Win/draw/loss counts shown next to the rating in standings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub byes: u32,
}

impl Tally {
    pub fn played(&self) -> u32 {
        self.wins + self.draws + self.losses
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Competitor {
    pub id: CompetitorId,
    pub name: String,
    pub rating: f64,
    pub kind: CompetitorKind,
    #[serde(default)]
    pub tally: Tally,
}

impl Competitor {
    pub fn new(id: CompetitorId, name: impl Into<String>) -> Self {
        Self::with_rating(id, name, DEFAULT_RATING)
    }

    pub fn with_rating(id: CompetitorId, name: impl Into<String>, rating: f64) -> Self {
        Self {
            id,
            name: name.into(),
            rating,
            kind: CompetitorKind::Regular,
            tally: Tally::default(),
        }
    }

    pub fn bye(id: CompetitorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rating: BYE_RATING,
            kind: CompetitorKind::Bye,
            tally: Tally::default(),
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self.kind, CompetitorKind::Bye)
    }
}
