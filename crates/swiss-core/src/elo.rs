use serde::{Deserialize, Serialize};

/// Starting Elo rating for new competitors
pub const DEFAULT_RATING: f64 = 1500.0;

/// K-factor for Elo calculation
pub const K_FACTOR: f64 = 32.0;

/// Result of a single matchup, seen from the left side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    LeftWin,
    RightWin,
    Draw,
}

impl Outcome {
    /// Score pair (left, right): 1/0, 0/1 or 0.5/0.5.
    pub fn scores(&self) -> (f64, f64) {
        match self {
            Outcome::LeftWin => (1.0, 0.0),
            Outcome::RightWin => (0.0, 1.0),
            Outcome::Draw => (0.5, 0.5),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Outcome::LeftWin => "Left wins",
            Outcome::RightWin => "Right wins",
            Outcome::Draw => "Draw",
        }
    }
}

/// Probability that a player rated `rating_a` beats one rated `rating_b`.
pub fn expected_score(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / 400.0))
}

/// New ratings for both sides after a match.
///
/// Scores are expected in `[0, 1]`, normally one of `0`, `0.5` or `1`; they are not
/// checked. Each side moves by `k * (actual - expected)` independently.
pub fn update_ratings(
    rating_left: f64,
    rating_right: f64,
    score_left: f64,
    score_right: f64,
    k: f64,
) -> (f64, f64) {
    let expected_left = expected_score(rating_left, rating_right);
    let expected_right = expected_score(rating_right, rating_left);
    (
        rating_left + k * (score_left - expected_left),
        rating_right + k * (score_right - expected_right),
    )
}

/// Rating deltas (left, right) for an outcome.
pub fn rating_change(rating_left: f64, rating_right: f64, outcome: Outcome, k: f64) -> (f64, f64) {
    let (score_left, score_right) = outcome.scores();
    let (new_left, new_right) = update_ratings(rating_left, rating_right, score_left, score_right, k);
    (new_left - rating_left, new_right - rating_right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_ratings_win() {
        let (a, b) = update_ratings(1500.0, 1500.0, 1.0, 0.0, K_FACTOR);
        assert!((a - 1516.0).abs() < 1e-9);
        assert!((b - 1484.0).abs() < 1e-9);
    }

    #[test]
    fn equal_ratings_draw_is_neutral() {
        let (a, b) = update_ratings(1500.0, 1500.0, 0.5, 0.5, K_FACTOR);
        assert!((a - 1500.0).abs() < 1e-9);
        assert!((b - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn expected_score_is_symmetric() {
        let pairs = [
            (1500.0, 1500.0),
            (1200.0, 1800.0),
            (0.0, 2400.0),
            (-300.0, 150.5),
            (2831.25, 2830.0),
        ];
        for (x, y) in pairs {
            let sum = expected_score(x, y) + expected_score(y, x);
            assert!((sum - 1.0).abs() < 1e-9, "{x} vs {y}: {sum}");
        }
    }

    #[test]
    fn expected_score_is_a_probability() {
        let p = expected_score(1400.0, 1000.0);
        assert!(p > 0.5 && p < 1.0);
        let q = expected_score(1000.0, 1400.0);
        assert!(q > 0.0 && q < 0.5);
    }

    #[test]
    fn update_is_deterministic() {
        let first = update_ratings(1612.0, 1433.0, 0.0, 1.0, K_FACTOR);
        let second = update_ratings(1612.0, 1433.0, 0.0, 1.0, K_FACTOR);
        assert_eq!(first, second);
    }

    #[test]
    fn winner_never_loses_rating() {
        for (w, l) in [(1500.0, 1500.0), (2000.0, 1000.0), (1000.0, 2000.0), (1720.0, 1690.0)] {
            let (new_w, new_l) = update_ratings(w, l, 1.0, 0.0, K_FACTOR);
            assert!(new_w >= w);
            assert!(new_l <= l);
        }
    }

    #[test]
    fn underdog_gains_more() {
        let (underdog, _) = rating_change(1000.0, 1400.0, Outcome::LeftWin, K_FACTOR);
        let (favorite, _) = rating_change(1400.0, 1000.0, Outcome::LeftWin, K_FACTOR);
        assert!(underdog > 16.0);
        assert!(favorite < 16.0);
    }

    #[test]
    fn change_symmetric_for_equal_ratings() {
        let (gain, loss) = rating_change(1500.0, 1500.0, Outcome::RightWin, K_FACTOR);
        assert!((gain + loss).abs() < 1e-9);
        assert!(loss > 0.0);
    }

    #[test]
    fn outcome_scores() {
        assert_eq!(Outcome::LeftWin.scores(), (1.0, 0.0));
        assert_eq!(Outcome::RightWin.scores(), (0.0, 1.0));
        assert_eq!(Outcome::Draw.scores(), (0.5, 0.5));
    }
}
