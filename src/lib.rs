//! Stakebook - Pari-Mutuel Settlement Engine with a Proof-of-Stake Result Oracle
//!
//! Pool-based sports wagers settle against authoritative game results that
//! staked validators vote into place. Two coupled subsystems do the heavy
//! lifting: the slip book (pools, backing, claims, five-way fee waterfall)
//! and the result oracle (grace-gated voting on canonical result hashes,
//! quorum consensus, slashing, rank-decayed rewards).

pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod errors;
pub mod oracle;
pub mod outcomes;
pub mod ownership;
pub mod registry;
pub mod rewards;
pub mod roles;
pub mod settlement;
pub mod store;
pub mod types;

pub use catalog::Catalog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigLoader, OracleSettings, SettlementSettings, StakebookConfig};
pub use engine::StakebookApp;
pub use errors::{StakebookError, StakebookResult};
pub use oracle::{OracleState, ResultOracle, TopInfo};
pub use ownership::OwnerBook;
pub use registry::GameRegistry;
pub use roles::{Role, Roles};
pub use settlement::SlipBook;
pub use store::RecordStore;
pub use types::{
    Address, Amount, BetDef, BetId, BetMode, Game, GameId, GameResult, Market, MarketId, Outcome,
    PoolKey, ResultSheet, Slip, SlipDraft, SlipId, Window,
};
