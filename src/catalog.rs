//! Reference store for immutable catalog data: markets and bet definitions.
//!
//! Ingestion is an idempotent upsert by id; a bet settles only under markets
//! it was registered with.

use crate::types::{BetDef, BetId, Market, MarketId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Append-only catalog of markets and bet definitions
#[derive(Clone, Default)]
pub struct Catalog {
    bets: Arc<RwLock<HashMap<BetId, BetDef>>>,
    markets: Arc<RwLock<HashMap<MarketId, Market>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bulk-ingest bet definitions; re-ingesting an id overwrites it in place
    pub fn store_bets(&self, defs: Vec<BetDef>) {
        let mut bets = self.bets.write().unwrap();
        let count = defs.len();
        for def in defs {
            bets.insert(def.id, def);
        }
        tracing::debug!(count, total = bets.len(), "stored bet definitions");
    }

    /// Bulk-ingest markets; re-ingesting an id overwrites it in place
    pub fn store_markets(&self, defs: Vec<Market>) {
        let mut markets = self.markets.write().unwrap();
        let count = defs.len();
        for def in defs {
            markets.insert(def.id, def);
        }
        tracing::debug!(count, total = markets.len(), "stored markets");
    }

    pub fn bet(&self, id: &BetId) -> Option<BetDef> {
        self.bets.read().unwrap().get(id).cloned()
    }

    pub fn market(&self, id: &MarketId) -> Option<Market> {
        self.markets.read().unwrap().get(id).cloned()
    }

    /// True when the bet was registered as a member of the market
    pub fn valid_market(&self, market_id: &MarketId, bet_id: &BetId) -> bool {
        self.markets
            .read()
            .unwrap()
            .get(market_id)
            .map(|market| market.bets.contains(bet_id))
            .unwrap_or(false)
    }

    /// All sibling bets of the market except the one given
    pub fn opposing_bets(&self, market_id: &MarketId, bet_id: &BetId) -> Vec<BetId> {
        self.markets
            .read()
            .unwrap()
            .get(market_id)
            .map(|market| {
                market
                    .bets
                    .iter()
                    .filter(|member| *member != bet_id)
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{id_from_label, BetMode, Window};

    fn sample_bet(label: &str) -> BetDef {
        BetDef {
            id: id_from_label(label),
            mode: BetMode::TeamResult {
                window: Window::FullTime,
            },
            flag: true,
            team: Some(1),
        }
    }

    #[test]
    fn test_store_and_lookup() {
        let catalog = Catalog::new();
        let home = sample_bet("home");
        let away = sample_bet("away");
        catalog.store_bets(vec![home.clone(), away.clone()]);
        catalog.store_markets(vec![Market {
            id: id_from_label("1x2"),
            bets: vec![home.id, away.id],
        }]);

        assert_eq!(catalog.bet(&home.id), Some(home.clone()));
        assert!(catalog.valid_market(&id_from_label("1x2"), &away.id));
        assert!(!catalog.valid_market(&id_from_label("1x2"), &id_from_label("other")));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let catalog = Catalog::new();
        let bet = sample_bet("home");
        catalog.store_bets(vec![bet.clone()]);
        catalog.store_bets(vec![bet.clone()]);

        assert_eq!(catalog.bet(&bet.id), Some(bet));
    }

    #[test]
    fn test_opposing_bets_excludes_self() {
        let catalog = Catalog::new();
        let home = sample_bet("home");
        let away = sample_bet("away");
        let draw = sample_bet("draw");
        let market_id = id_from_label("1x2");
        catalog.store_markets(vec![Market {
            id: market_id,
            bets: vec![home.id, away.id, draw.id],
        }]);

        let opposing = catalog.opposing_bets(&market_id, &home.id);
        assert_eq!(opposing, vec![away.id, draw.id]);
    }
}
