//! Game registry: game records and their single, write-once result sheet.
//!
//! The registry is the only point of coupling between the settlement engine
//! (which reads timing and outcome codes) and the result oracle (which holds
//! the sole write capability for finalized results).

use crate::clock::Clock;
use crate::errors::{InputError, SettlementError, StakebookResult, TimingError};
use crate::roles::{Role, Roles};
use crate::types::{Address, Game, GameId, GameResult, ResultSheet};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared registry of games and finalized results
#[derive(Clone)]
pub struct GameRegistry {
    clock: Arc<dyn Clock>,
    roles: Roles,
    games: Arc<RwLock<HashMap<GameId, Game>>>,
    results: Arc<RwLock<HashMap<GameId, GameResult>>>,
}

impl GameRegistry {
    pub fn new(clock: Arc<dyn Clock>, roles: Roles) -> Self {
        Self {
            clock,
            roles,
            games: Arc::new(RwLock::new(HashMap::new())),
            results: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a game record; games are immutable once created
    pub fn create_game(&self, caller: Address, game: Game) -> StakebookResult<()> {
        self.roles.require(Role::Admin, caller)?;

        if game.start_time >= game.end_time {
            return Err(InputError::InvalidInput(format!(
                "game {} start time is not before end time",
                game.id
            ))
            .into());
        }

        let mut games = self.games.write().unwrap();
        if games.contains_key(&game.id) {
            return Err(
                InputError::InvalidInput(format!("game {} already exists", game.id)).into(),
            );
        }

        tracing::info!(
            game_id = game.id,
            start_time = game.start_time,
            end_time = game.end_time,
            bookie = %crate::types::bytes_to_hex(&game.bookie[..4]),
            "game created"
        );
        games.insert(game.id, game);
        Ok(())
    }

    pub fn game(&self, id: GameId) -> Option<Game> {
        self.games.read().unwrap().get(&id).cloned()
    }

    pub fn result(&self, id: GameId) -> Option<GameResult> {
        self.results.read().unwrap().get(&id).cloned()
    }

    /// Record the result sheet for a game and derive its outcome codes.
    ///
    /// Callable by the admin (trusted direct mode) or by the oracle on
    /// consensus. A cancellation is accepted at any time; scored sheets only
    /// after the game's end time. Results are write-once: a recorded sheet
    /// is never overwritten, and a recorded cancellation is terminal.
    pub fn set_scores(&self, caller: Address, sheet: ResultSheet) -> StakebookResult<()> {
        self.roles.require_any(&[Role::Admin, Role::Oracle], caller)?;

        let game = self
            .game(sheet.game_id)
            .ok_or_else(|| InputError::InvalidInput(format!("unknown game {}", sheet.game_id)))?;

        let mut results = self.results.write().unwrap();
        if let Some(existing) = results.get(&sheet.game_id) {
            if existing.is_cancelled() {
                return Err(SettlementError::GameWasCancelled { game_id: game.id }.into());
            }
            return Err(InputError::InvalidInput(format!(
                "result for game {} already recorded",
                game.id
            ))
            .into());
        }

        if !sheet.cancel && self.clock.now() < game.end_time {
            return Err(TimingError::GameNotEnded { game_id: game.id }.into());
        }

        let result = GameResult::from_sheet(sheet);
        tracing::info!(
            game_id = game.id,
            cancelled = result.is_cancelled(),
            result = ?result.result,
            halftime = ?result.halftime_result,
            second_half = ?result.second_half_result,
            "result recorded"
        );
        results.insert(game.id, result);
        Ok(())
    }

    /// True once the game's end time has been reached
    pub fn has_ended(&self, id: GameId) -> StakebookResult<bool> {
        let game = self
            .game(id)
            .ok_or_else(|| InputError::InvalidInput(format!("unknown game {}", id)))?;
        Ok(self.clock.now() >= game.end_time)
    }

    /// True when a cancellation has been recorded for the game
    pub fn is_cancelled(&self, id: GameId) -> bool {
        self.results
            .read()
            .unwrap()
            .get(&id)
            .map(GameResult::is_cancelled)
            .unwrap_or(false)
    }

    /// Gate for downstream reward systems: every listed game must have ended
    pub fn verify_all_games_have_ended(&self, ids: &[GameId]) -> StakebookResult<()> {
        for id in ids {
            if !self.has_ended(*id)? {
                return Err(TimingError::GameNotEnded { game_id: *id }.into());
            }
        }
        Ok(())
    }
}
