//! Ownership book for slip tokens and fee-earning collectibles.
//!
//! Slips are bearer claims: whoever holds the slip token controls claim and
//! transfer rights, regardless of who placed the wager. Team and
//! market/bet collectible ownership lives in external token systems; this
//! book mirrors just the owner-of lookups the fee waterfall needs.

use crate::errors::{AuthError, StakebookResult};
use crate::types::{Address, SlipId, TeamId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Clone, Default)]
pub struct OwnerBook {
    slips: Arc<RwLock<HashMap<SlipId, Address>>>,
    teams: Arc<RwLock<HashMap<TeamId, Address>>>,
    collectibles: Arc<RwLock<HashMap<[u8; 32], Address>>>,
}

impl OwnerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a fresh slip token bound to `owner`
    pub fn mint_slip(&self, owner: Address) -> SlipId {
        let id = uuid::Uuid::new_v4().as_u128();
        self.slips.write().unwrap().insert(id, owner);
        id
    }

    pub fn slip_owner(&self, id: SlipId) -> Option<Address> {
        self.slips.read().unwrap().get(&id).copied()
    }

    /// Transfer a slip token; bearer semantics, the new owner gains claim rights
    pub fn transfer_slip(&self, caller: Address, id: SlipId, to: Address) -> StakebookResult<()> {
        let mut slips = self.slips.write().unwrap();
        match slips.get(&id) {
            Some(owner) if *owner == caller => {
                slips.insert(id, to);
                tracing::debug!(slip_id = id, "slip token transferred");
                Ok(())
            }
            _ => Err(AuthError::NotYourToken { slip_id: id }.into()),
        }
    }

    pub fn set_team_owner(&self, team: TeamId, owner: Address) {
        self.teams.write().unwrap().insert(team, owner);
    }

    pub fn team_owner(&self, team: TeamId) -> Option<Address> {
        self.teams.read().unwrap().get(&team).copied()
    }

    /// Record the holder of a market or bet ownership token
    pub fn set_collectible_owner(&self, id: [u8; 32], owner: Address) {
        self.collectibles.write().unwrap().insert(id, owner);
    }

    pub fn collectible_owner(&self, id: &[u8; 32]) -> Option<Address> {
        self.collectibles.read().unwrap().get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: Address = [1u8; 32];
    const BOB: Address = [2u8; 32];

    #[test]
    fn test_mint_and_transfer_slip() {
        let book = OwnerBook::new();
        let id = book.mint_slip(ALICE);
        assert_eq!(book.slip_owner(id), Some(ALICE));

        book.transfer_slip(ALICE, id, BOB).unwrap();
        assert_eq!(book.slip_owner(id), Some(BOB));

        // The previous owner no longer controls the token.
        assert!(book.transfer_slip(ALICE, id, ALICE).is_err());
    }

    #[test]
    fn test_minted_ids_are_unique() {
        let book = OwnerBook::new();
        let a = book.mint_slip(ALICE);
        let b = book.mint_slip(ALICE);
        assert_ne!(a, b);
    }

    #[test]
    fn test_team_and_collectible_owners() {
        let book = OwnerBook::new();
        book.set_team_owner(7, ALICE);
        book.set_collectible_owner([9u8; 32], BOB);

        assert_eq!(book.team_owner(7), Some(ALICE));
        assert_eq!(book.team_owner(8), None);
        assert_eq!(book.collectible_owner(&[9u8; 32]), Some(BOB));
    }
}
