//! Composition root: wires the clock, role table, catalog, registry,
//! settlement engine, oracle and record store into one application facade.
//!
//! The facade also owns persistence: terminal events (claims, refunds,
//! finalized results) are mirrored into the record store as they happen.

use crate::catalog::Catalog;
use crate::clock::Clock;
use crate::config::StakebookConfig;
use crate::errors::StakebookResult;
use crate::oracle::ResultOracle;
use crate::ownership::OwnerBook;
use crate::registry::GameRegistry;
use crate::roles::Roles;
use crate::settlement::SlipBook;
use crate::store::{self, RecordStore, SettledSlip, SettlementKind};
use crate::types::{id_from_label, Address, Amount, GameId, PoolKey, ResultSheet, SlipId};
use std::sync::Arc;

/// Assembled stakebook application
#[derive(Clone)]
pub struct StakebookApp {
    clock: Arc<dyn Clock>,
    roles: Roles,
    catalog: Catalog,
    registry: GameRegistry,
    owners: OwnerBook,
    slips: SlipBook,
    oracle: ResultOracle,
    store: Option<RecordStore>,
}

impl StakebookApp {
    /// Build the full application from a configuration, opening the record
    /// store when enabled
    pub fn new(
        config: StakebookConfig,
        clock: Arc<dyn Clock>,
        admin: Address,
    ) -> StakebookResult<Self> {
        let store = if config.storage.enabled {
            let store = RecordStore::open(&config.storage.data_dir).map_err(|e| {
                crate::errors::InputError::InvalidInput(format!(
                    "failed to open record store: {}",
                    e
                ))
            })?;
            Some(store)
        } else {
            None
        };

        Ok(Self::assemble(config, clock, admin, store))
    }

    /// Build an application without persistence
    pub fn in_memory(config: StakebookConfig, clock: Arc<dyn Clock>, admin: Address) -> Self {
        Self::assemble(config, clock, admin, None)
    }

    fn assemble(
        config: StakebookConfig,
        clock: Arc<dyn Clock>,
        admin: Address,
        store: Option<RecordStore>,
    ) -> Self {
        let roles = Roles::with_admin(admin);
        let catalog = Catalog::new();
        let registry = GameRegistry::new(clock.clone(), roles.clone());
        let owners = OwnerBook::new();
        let slips = SlipBook::new(
            clock.clone(),
            roles.clone(),
            catalog.clone(),
            registry.clone(),
            owners.clone(),
            config.settlement,
        );
        let oracle = ResultOracle::new(
            clock.clone(),
            roles.clone(),
            registry.clone(),
            id_from_label("stakebook-oracle"),
            config.oracle,
        );

        Self {
            clock,
            roles,
            catalog,
            registry,
            owners,
            slips,
            oracle,
            store,
        }
    }

    pub fn roles(&self) -> &Roles {
        &self.roles
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn registry(&self) -> &GameRegistry {
        &self.registry
    }

    pub fn owners(&self) -> &OwnerBook {
        &self.owners
    }

    pub fn slips(&self) -> &SlipBook {
        &self.slips
    }

    pub fn oracle(&self) -> &ResultOracle {
        &self.oracle
    }

    pub fn store(&self) -> Option<&RecordStore> {
        self.store.as_ref()
    }

    /// Claim a winning wager and mirror the terminal record into the store
    pub fn claim_bet(
        &self,
        caller: Address,
        slip_id: SlipId,
        to: Address,
    ) -> StakebookResult<Amount> {
        let payout = self.slips.claim_bet(caller, slip_id, to)?;
        self.persist_settlement(slip_id, payout, SettlementKind::Claimed);
        Ok(payout)
    }

    /// Refund a cancelled or not-yet-started wager, mirroring the record
    pub fn cancelled_bet(
        &self,
        caller: Address,
        slip_id: SlipId,
        to: Address,
    ) -> StakebookResult<Amount> {
        let refund = self.slips.cancelled_bet(caller, slip_id, to)?;
        if refund > 0 {
            self.persist_settlement(slip_id, refund, SettlementKind::Refunded);
        }
        Ok(refund)
    }

    /// Claim an oracle voting reward; the first successful claim finalizes
    /// the result, which is then persisted
    pub fn claim_reward(
        &self,
        caller: Address,
        game_id: GameId,
        to: Address,
    ) -> StakebookResult<Amount> {
        let reward = self.oracle.claim_reward(caller, game_id, to)?;
        self.persist_result(game_id);
        Ok(reward)
    }

    /// Trusted direct result write (admin mode), persisted like a finalized one
    pub fn set_scores(&self, caller: Address, sheet: ResultSheet) -> StakebookResult<()> {
        let game_id = sheet.game_id;
        self.registry.set_scores(caller, sheet)?;
        self.persist_result(game_id);
        Ok(())
    }

    /// Batch fee collection passthrough
    pub fn collect_fees(
        &self,
        caller: Address,
        keys: &[PoolKey],
        recipient: Address,
    ) -> StakebookResult<Amount> {
        self.slips.collect_fees(caller, keys, recipient)
    }

    fn persist_settlement(&self, slip_id: SlipId, paid: Amount, kind: SettlementKind) {
        let Some(store) = &self.store else { return };
        let Some(slip) = self.slips.get_slip(slip_id) else {
            return;
        };
        let record = SettledSlip {
            slip_id,
            game_id: slip.game_id,
            stake: match kind {
                SettlementKind::Claimed => slip.amount,
                SettlementKind::Refunded => paid,
            },
            paid,
            kind,
            settled_at: self.clock.now(),
        };
        if let Err(e) = store::store_settled_slip(store, &record) {
            tracing::error!(slip_id, "failed to persist settlement: {}", e);
        }
    }

    fn persist_result(&self, game_id: GameId) {
        let Some(store) = &self.store else { return };
        let Some(result) = self.registry.result(game_id) else {
            return;
        };
        if let Err(e) = store::store_result(store, &result) {
            tracing::error!(game_id, "failed to persist result: {}", e);
        }
    }
}
