//! Swiss-style pairing with Elo ratings.
//!
//! Rounds are built by a backtracking search that never repeats a pair across the
//! tournament; results feed an Elo model. Pairing never looks at ratings.

pub mod adjudicator;
pub mod competitor;
pub mod config;
pub mod elo;
pub mod error;
pub mod matchup;
pub mod pairing;
pub mod protocol;
pub mod schedule;
pub mod tournament;
pub mod validation;

pub use adjudicator::{Adjudicator, SimulatedAdjudicator};
pub use competitor::{Competitor, CompetitorId, CompetitorKind, Tally};
pub use config::TournamentConfig;
pub use elo::{expected_score, update_ratings, Outcome};
pub use error::{PairingError, SwissError};
pub use matchup::{MatchResult, Matchup};
pub use pairing::{build_round, Round};
pub use protocol::{ClientMessage, ServerMessage};
pub use schedule::{build_schedule, rounds_for, Schedule, ScheduleBuilder};
pub use tournament::{Standing, SwissTournament};
pub use validation::{is_admissible, Pair, PairHistory};
