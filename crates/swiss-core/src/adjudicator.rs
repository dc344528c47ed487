use rand::{Rng, RngExt};

use crate::competitor::Competitor;
use crate::elo::{expected_score, Outcome};

/// Decides the outcome of a rated matchup. Bye matchups never reach an adjudicator.
pub trait Adjudicator {
    fn adjudicate(&mut self, left: &Competitor, right: &Competitor) -> Outcome;
}

impl<F> Adjudicator for F
where
    F: FnMut(&Competitor, &Competitor) -> Outcome,
{
    fn adjudicate(&mut self, left: &Competitor, right: &Competitor) -> Outcome {
        self(left, right)
    }
}

/// Plays matches out by sampling the Elo expectation.
pub struct SimulatedAdjudicator<R> {
    rng: R,
    draw_rate: f64,
}

impl<R: Rng> SimulatedAdjudicator<R> {
    /// `draw_rate` is clamped to `[0, 1]`.
    pub fn new(rng: R, draw_rate: f64) -> Self {
        let draw_rate = if draw_rate.is_nan() {
            0.0
        } else {
            draw_rate.clamp(0.0, 1.0)
        };
        Self { rng, draw_rate }
    }
}

impl<R: Rng> Adjudicator for SimulatedAdjudicator<R> {
    fn adjudicate(&mut self, left: &Competitor, right: &Competitor) -> Outcome {
        if self.rng.random_bool(self.draw_rate) {
            return Outcome::Draw;
        }
        let p_left = expected_score(left.rating, right.rating);
        if self.rng.random::<f64>() < p_left {
            Outcome::LeftWin
        } else {
            Outcome::RightWin
        }
    }
}
