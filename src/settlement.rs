//! Pool settlement engine.
//!
//! Wagers are grouped into pools keyed by (bet, market, game, currency).
//! A pool pays only if it is *backed*: some stake exists on the other bets
//! of the same market. Winners split their share of the losing aggregate
//! pro-rata; the remainder is distributed through a fixed fee waterfall to
//! five stakeholder classes, each collectible independently and lazily.

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::config::{SettlementSettings, FEE_DENOMINATOR};
use crate::errors::{
    AuthError, InputError, SettlementError, StakebookResult, TimingError,
};
use crate::outcomes;
use crate::ownership::OwnerBook;
use crate::registry::GameRegistry;
use crate::roles::{Role, Roles};
use crate::types::{
    Address, Amount, BetDef, Game, GameResult, Outcome, PoolKey, Slip, SlipDraft, SlipId,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Stakeholder classes of the fee waterfall
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FeeRole {
    Platform,
    Bookie,
    Team,
    Market,
    Bet,
}

/// Shared state of the pool settlement engine
#[derive(Clone)]
pub struct SlipBook {
    clock: Arc<dyn Clock>,
    roles: Roles,
    catalog: Catalog,
    registry: GameRegistry,
    owners: OwnerBook,
    settings: Arc<RwLock<SettlementSettings>>,
    slips: Arc<RwLock<HashMap<SlipId, Slip>>>,
    pools: Arc<RwLock<HashMap<PoolKey, Amount>>>,
    withdrawn: Arc<RwLock<HashMap<(PoolKey, FeeRole), Amount>>>,
}

impl SlipBook {
    pub fn new(
        clock: Arc<dyn Clock>,
        roles: Roles,
        catalog: Catalog,
        registry: GameRegistry,
        owners: OwnerBook,
        settings: SettlementSettings,
    ) -> Self {
        Self {
            clock,
            roles,
            catalog,
            registry,
            owners,
            settings: Arc::new(RwLock::new(settings)),
            slips: Arc::new(RwLock::new(HashMap::new())),
            pools: Arc::new(RwLock::new(HashMap::new())),
            withdrawn: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn settings(&self) -> SettlementSettings {
        self.settings.read().unwrap().clone()
    }

    /// Replace the fee settings; shares must still sum to the total fee
    pub fn update_settings(
        &self,
        caller: Address,
        settings: SettlementSettings,
    ) -> StakebookResult<()> {
        self.roles.require(Role::Admin, caller)?;

        let share_sum = settings.platform_fee_bips
            + settings.bookie_fee_bips
            + settings.team_fee_bips
            + settings.market_fee_bips
            + settings.bet_fee_bips;
        if share_sum != settings.total_fee_bips || settings.total_fee_bips >= FEE_DENOMINATOR {
            return Err(InputError::InvalidInput(format!(
                "fee shares sum to {} bips against a total of {}",
                share_sum, settings.total_fee_bips
            ))
            .into());
        }

        *self.settings.write().unwrap() = settings;
        Ok(())
    }

    /// Accept a wager: mints a slip token bound to `bettor`, records the
    /// slip and credits its pool. `value` is the payment accompanying the
    /// call and must match the drafted amount exactly.
    pub fn place_bet(
        &self,
        bettor: Address,
        draft: SlipDraft,
        value: Amount,
    ) -> StakebookResult<SlipId> {
        if draft.amount == 0 || value != draft.amount {
            return Err(InputError::InvalidInput(format!(
                "payment {} does not match wager amount {}",
                value, draft.amount
            ))
            .into());
        }
        if !self.catalog.valid_market(&draft.market_id, &draft.bet_id) {
            return Err(InputError::InvalidInput(
                "bet is not a member of the market".to_string(),
            )
            .into());
        }

        let game = self.game(draft.game_id)?;
        if self.registry.is_cancelled(game.id) {
            return Err(SettlementError::GameWasCancelled { game_id: game.id }.into());
        }
        if self.clock.now() >= game.start_time {
            return Err(TimingError::GameAlreadyStarted { game_id: game.id }.into());
        }

        let id = self.owners.mint_slip(bettor);
        let slip = Slip {
            id,
            amount: draft.amount,
            paid: 0,
            bet_id: draft.bet_id,
            market_id: draft.market_id,
            game_id: draft.game_id,
            currency: draft.currency,
            referrer: draft.referrer,
        };
        let key = slip.pool_key();

        *self.pools.write().unwrap().entry(key).or_insert(0) += slip.amount;
        self.slips.write().unwrap().insert(id, slip);

        tracing::info!(slip_id = id, game_id = draft.game_id, amount = draft.amount, "bet placed");
        Ok(id)
    }

    pub fn get_slip(&self, id: SlipId) -> Option<Slip> {
        self.slips.read().unwrap().get(&id).cloned()
    }

    /// Opposing aggregate backing a pool: total stake on the market's other
    /// bets for the same game and currency
    pub fn backing(&self, key: &PoolKey) -> Amount {
        let pools = self.pools.read().unwrap();
        self.catalog
            .opposing_bets(&key.market_id, &key.bet_id)
            .into_iter()
            .map(|bet_id| {
                pools
                    .get(&PoolKey { bet_id, ..*key })
                    .copied()
                    .unwrap_or(0)
            })
            .sum()
    }

    /// Total stake currently in a pool
    pub fn pool_total(&self, key: &PoolKey) -> Amount {
        self.pools.read().unwrap().get(key).copied().unwrap_or(0)
    }

    /// Refund a wager whose game never ran, paying `to` and zeroing the
    /// slip's amount. Allowed freely before the game starts, and after a
    /// recorded cancellation. A repeat call refunds 0 and is a no-op.
    pub fn cancelled_bet(
        &self,
        caller: Address,
        slip_id: SlipId,
        to: Address,
    ) -> StakebookResult<Amount> {
        self.require_slip_owner(caller, slip_id, false)?;
        let slip = self
            .get_slip(slip_id)
            .ok_or_else(|| InputError::InvalidInput(format!("unknown slip {}", slip_id)))?;
        let game = self.game(slip.game_id)?;

        let cancelled = self.registry.is_cancelled(game.id);
        if !cancelled && self.clock.now() >= game.start_time {
            return Err(SettlementError::GameWasNotCancelled { game_id: game.id }.into());
        }

        let refund = slip.amount;
        if refund > 0 {
            let key = slip.pool_key();
            let mut pools = self.pools.write().unwrap();
            if let Some(total) = pools.get_mut(&key) {
                *total = total.saturating_sub(refund);
            }
            drop(pools);

            if let Some(stored) = self.slips.write().unwrap().get_mut(&slip_id) {
                stored.amount = 0;
            }
        }

        tracing::info!(
            slip_id,
            refund,
            to = %crate::types::bytes_to_hex(&to[..4]),
            "wager refunded"
        );
        Ok(refund)
    }

    /// Settle a winning wager: pays principal plus the pro-rata winner share
    /// of the losing aggregate to `to`, and marks the slip paid.
    pub fn claim_bet(
        &self,
        caller: Address,
        slip_id: SlipId,
        to: Address,
    ) -> StakebookResult<Amount> {
        self.require_slip_owner(caller, slip_id, false)?;
        let slip = self
            .get_slip(slip_id)
            .ok_or_else(|| InputError::InvalidInput(format!("unknown slip {}", slip_id)))?;
        if slip.paid > 0 {
            return Err(SettlementError::AlreadyClaimed { slip_id }.into());
        }
        // A refunded slip holds no stake and can no longer win.
        if slip.amount == 0 {
            return Err(SettlementError::BetDidNotWin { slip_id }.into());
        }

        let game = self.game(slip.game_id)?;
        let (bet, result) = self.settled_context(&slip, &game)?;

        if !outcomes::won(&bet, &game, &result) {
            return Err(SettlementError::BetDidNotWin { slip_id }.into());
        }

        let key = slip.pool_key();
        let losing = self.backing(&key);
        if losing == 0 {
            return Err(SettlementError::BetPoolWasNotBacked { slip_id }.into());
        }

        let winner_pool = self.pool_total(&key);
        let winners_share = losing * self.settings().winner_share_bips() as Amount
            / FEE_DENOMINATOR as Amount;
        let payout = slip.amount + winners_share * slip.amount / winner_pool;

        if let Some(stored) = self.slips.write().unwrap().get_mut(&slip_id) {
            stored.paid = payout;
        }

        tracing::info!(
            slip_id,
            game_id = game.id,
            payout,
            to = %crate::types::bytes_to_hex(&to[..4]),
            "winning bet claimed"
        );
        Ok(payout)
    }

    /// Collect accrued, un-withdrawn fee shares across one or many pools for
    /// every waterfall role the caller holds, paying `recipient`. Returns
    /// the aggregate transferred; pools that are not (yet) payable
    /// contribute nothing.
    pub fn collect_fees(
        &self,
        caller: Address,
        keys: &[PoolKey],
        recipient: Address,
    ) -> StakebookResult<Amount> {
        let mut total = 0;
        for key in keys {
            total += self.collect_pool_fees(caller, key)?;
        }

        if total > 0 {
            tracing::info!(
                pools = keys.len(),
                total,
                recipient = %crate::types::bytes_to_hex(&recipient[..4]),
                "fees collected"
            );
        }
        Ok(total)
    }

    fn collect_pool_fees(&self, caller: Address, key: &PoolKey) -> StakebookResult<Amount> {
        let game = self.game(key.game_id)?;
        let Some(result) = self.registry.result(game.id) else {
            return Ok(0);
        };
        let Some(bet) = self.catalog.bet(&key.bet_id) else {
            return Ok(0);
        };
        if result.is_cancelled()
            || result.code_for(bet.mode.window()) == Outcome::Pending
            || !outcomes::won(&bet, &game, &result)
        {
            return Ok(0);
        }
        let losing = self.backing(key);
        if losing == 0 {
            return Ok(0);
        }

        let settings = self.settings();
        let winning_team = match result.code_for(bet.mode.window()) {
            Outcome::Home => Some(game.home_team),
            Outcome::Away => Some(game.away_team),
            _ => None,
        };

        let mut entitled: Vec<(FeeRole, u64)> = Vec::new();
        if self.roles.has(Role::Admin, caller) {
            entitled.push((FeeRole::Platform, settings.platform_fee_bips));
        }
        if game.bookie == caller {
            entitled.push((FeeRole::Bookie, settings.bookie_fee_bips));
        }
        if winning_team.and_then(|team| self.owners.team_owner(team)) == Some(caller) {
            entitled.push((FeeRole::Team, settings.team_fee_bips));
        }
        if self.owners.collectible_owner(&key.market_id) == Some(caller) {
            entitled.push((FeeRole::Market, settings.market_fee_bips));
        }
        if self.owners.collectible_owner(&key.bet_id) == Some(caller) {
            entitled.push((FeeRole::Bet, settings.bet_fee_bips));
        }

        let mut withdrawn = self.withdrawn.write().unwrap();
        let mut paid = 0;
        for (role, bips) in entitled {
            let accrued = losing * bips as Amount / FEE_DENOMINATOR as Amount;
            let taken = withdrawn.entry((*key, role)).or_insert(0);
            let available = accrued.saturating_sub(*taken);
            *taken += available;
            paid += available;
        }
        Ok(paid)
    }

    /// Gate for downstream reward systems: every slip must be owned by `owner`
    pub fn verify_user_owns_all_slips(
        &self,
        slip_ids: &[SlipId],
        owner: Address,
    ) -> StakebookResult<()> {
        for slip_id in slip_ids {
            self.require_slip_owner(owner, *slip_id, true)?;
        }
        Ok(())
    }

    /// Gate for referral systems: every slip must carry `referrer`
    pub fn validate_referrals(
        &self,
        slip_ids: &[SlipId],
        referrer: Address,
    ) -> StakebookResult<()> {
        let slips = self.slips.read().unwrap();
        for slip_id in slip_ids {
            let valid = slips
                .get(slip_id)
                .map(|slip| slip.referrer == referrer)
                .unwrap_or(false);
            if !valid {
                return Err(AuthError::NotYourReferral { slip_id: *slip_id }.into());
            }
        }
        Ok(())
    }

    fn require_slip_owner(
        &self,
        caller: Address,
        slip_id: SlipId,
        as_token: bool,
    ) -> StakebookResult<()> {
        if self.owners.slip_owner(slip_id) == Some(caller) {
            return Ok(());
        }
        if as_token {
            Err(AuthError::NotYourToken { slip_id }.into())
        } else {
            Err(AuthError::NotYourBet { slip_id }.into())
        }
    }

    fn game(&self, game_id: u128) -> StakebookResult<Game> {
        self.registry
            .game(game_id)
            .ok_or_else(|| InputError::InvalidInput(format!("unknown game {}", game_id)).into())
    }

    /// Resolve the bet definition and a settled (non-pending, non-cancelled)
    /// result for a slip's game
    fn settled_context(
        &self,
        slip: &Slip,
        game: &Game,
    ) -> StakebookResult<(BetDef, GameResult)> {
        let result = self
            .registry
            .result(game.id)
            .ok_or(SettlementError::GameResultsArePending { game_id: game.id })?;
        if result.is_cancelled() {
            return Err(SettlementError::GameWasCancelled { game_id: game.id }.into());
        }

        let bet = self
            .catalog
            .bet(&slip.bet_id)
            .ok_or_else(|| InputError::InvalidInput("unknown bet definition".to_string()))?;
        if result.code_for(bet.mode.window()) == Outcome::Pending {
            return Err(SettlementError::GameResultsArePending { game_id: game.id }.into());
        }

        Ok((bet, result))
    }
}
