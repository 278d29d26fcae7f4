//! Pure win/lose evaluation of a bet definition against a recorded result.
//!
//! Stateless by design so every comparison mode can be exercised in
//! isolation; timing, pending and cancellation checks belong to the caller.

use crate::types::{BetDef, BetMode, ConditionKind, Game, GameResult, Outcome, RankSlot, ScoreSide};

/// Decide whether a bet won against a non-pending, non-cancelled result.
///
/// A bet with missing required metadata (e.g. a team-equality bet without a
/// team reference) simply loses; the catalog is immutable, so there is no
/// caller that could repair it.
pub fn won(bet: &BetDef, game: &Game, result: &GameResult) -> bool {
    match bet.mode {
        BetMode::ExactScore { window, home, away } => result.scores_for(window) == (home, away),

        BetMode::Condition { window, kind } => {
            let (home, away) = result.scores_for(window);
            let code = result.code_for(window);
            let derived = match kind {
                ConditionKind::HomeWins => code == Outcome::Home,
                ConditionKind::AwayWins => code == Outcome::Away,
                ConditionKind::Draw => code == Outcome::Draw,
                ConditionKind::BothTeamsScored => home > 0 && away > 0,
            };
            derived == bet.flag
        }

        BetMode::TeamResult { window } => {
            let winner = match result.code_for(window) {
                Outcome::Home => Some(game.home_team),
                Outcome::Away => Some(game.away_team),
                _ => None,
            };
            winner.is_some() && winner == bet.team
        }

        BetMode::Threshold { window, side, line } => {
            let (home, away) = result.scores_for(window);
            let value = match side {
                ScoreSide::Home => home,
                ScoreSide::Away => away,
                ScoreSide::Total => home + away,
            };
            // Landing exactly on the line settles as a loss for both sides.
            if bet.flag {
                value > line
            } else {
                value < line
            }
        }

        BetMode::Ranking { slot } => {
            let holder = match slot {
                RankSlot::Gold => result.sheet.gold,
                RankSlot::Silver => result.sheet.silver,
                RankSlot::Bronze => result.sheet.bronze,
            };
            bet.team == Some(holder)
        }
    }
}
