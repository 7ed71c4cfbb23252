//! Elo rating updates for completed games.

use crate::persistence::GameResult;

/// Fixed reference rating for the engine opponent.
pub const STOCKFISH_RATING: f64 = 3200.0;

/// K-factor for rating updates (higher = more volatile)
pub const K_FACTOR: f64 = 32.0;

/// Expected score of a player against an opponent.
pub fn expected_score(player_rating: f64, opponent_rating: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent_rating - player_rating) / 400.0))
}

/// Actual score of a game result, from the model's perspective.
pub fn result_score(result: GameResult) -> f64 {
    match result {
        GameResult::Win => 1.0,
        GameResult::Draw => 0.5,
        GameResult::Loss => 0.0,
    }
}

/// Compute the new rating after one game against `opponent_rating`.
pub fn adjust_rating(current_rating: f64, result: GameResult, opponent_rating: f64) -> f64 {
    let expected = expected_score(current_rating, opponent_rating);
    current_rating + K_FACTOR * (result_score(result) - expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_score_equal_ratings() {
        assert!((expected_score(1500.0, 1500.0) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_draw_against_equal_opponent_is_fixpoint() {
        let rating = 1500.0;
        assert_eq!(adjust_rating(rating, GameResult::Draw, rating), rating);
    }

    #[test]
    fn test_monotonic_in_result() {
        for (r1, r2) in [(1200.0, 3200.0), (1500.0, 1500.0), (2000.0, 1100.0)] {
            let win = adjust_rating(r1, GameResult::Win, r2);
            let draw = adjust_rating(r1, GameResult::Draw, r2);
            let loss = adjust_rating(r1, GameResult::Loss, r2);
            assert!(win > draw);
            assert!(draw > loss);
        }
    }

    #[test]
    fn test_win_against_stockfish_from_default_rating() {
        // Expected score against a 2000-point stronger opponent is ~0, so a
        // win yields almost the full K-factor.
        let new = adjust_rating(1200.0, GameResult::Win, STOCKFISH_RATING);
        assert!(new > 1200.0);
        assert!((new - 1232.0).abs() < 0.01);
    }

    #[test]
    fn test_loss_against_stockfish_barely_moves_rating() {
        let new = adjust_rating(1200.0, GameResult::Loss, STOCKFISH_RATING);
        assert!(new <= 1200.0);
        assert!(1200.0 - new < 0.01);
    }
}
