use thiserror::Error;

use crate::competitor::CompetitorId;

/// Failures of the round and schedule search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingError {
    /// Every branch of the search was exhausted without completing a round.
    #[error("no valid pairing exists for round {round}")]
    Infeasible { round: usize },

    #[error("roster has {0} competitors; pairing requires an even count")]
    OddRoster(usize),

    #[error("need at least two competitors to pair, got {0}")]
    TooFewCompetitors(usize),

    #[error("{target} matches cannot cover a pool of {pool} competitors")]
    TargetMismatch { target: usize, pool: usize },

    #[error("competitor {0} appears more than once in the pool")]
    DuplicateCompetitor(CompetitorId),
}

/// Errors raised while running a tournament.
#[derive(Debug, Error)]
pub enum SwissError {
    #[error(transparent)]
    Pairing(#[from] PairingError),

    #[error("the roster is empty")]
    EmptyRoster,

    #[error("competitor {0} has an empty name")]
    EmptyName(usize),

    #[error("competitor name {0:?} is used more than once")]
    DuplicateName(String),

    #[error("competitor {0} is not on the roster")]
    UnknownCompetitor(CompetitorId),

    #[error("no schedule has been generated yet")]
    NoSchedule,

    #[error("results have been recorded; the schedule can no longer be regenerated")]
    ScheduleInProgress,

    #[error("round {0} does not exist")]
    UnknownRound(usize),

    #[error("round {round} has no match in slot {slot}")]
    UnknownMatch { round: usize, slot: usize },

    #[error("round {round} slot {slot} already has a result")]
    AlreadyAdjudicated { round: usize, slot: usize },

    #[error("round {0} cannot start before the previous round is finished")]
    RoundNotReady(usize),
}

pub type Result<T> = std::result::Result<T, SwissError>;
