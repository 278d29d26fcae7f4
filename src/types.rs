//! Shared type definitions for the stakebook system
//!
//! Canonical ids, amounts, outcome codes and the record types used by the
//! catalog, registry, settlement engine and oracle.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 32-byte catalog identifier for a bet definition
pub type BetId = [u8; 32];
/// 32-byte catalog identifier for a market
pub type MarketId = [u8; 32];
/// 128-bit team token identifier
pub type TeamId = u128;
/// 128-bit game identifier
pub type GameId = u128;
/// 128-bit slip token identifier
pub type SlipId = u128;
/// 32-byte account key
pub type Address = [u8; 32];
/// Token amount in base units
pub type Amount = u128;
/// Unix timestamp in seconds
pub type Timestamp = i64;

/// Native settlement currency sentinel
pub const NATIVE_CURRENCY: Address = [0u8; 32];

/// One whole token in base units
pub const ETHER: Amount = 1_000_000_000_000_000_000;

/// Outcome code for a game window
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    Pending,
    Home,
    Away,
    Draw,
    Cancelled,
}

impl Outcome {
    /// Derive a window's outcome from its score pair
    pub fn from_scores(home: u32, away: u32) -> Self {
        match home.cmp(&away) {
            std::cmp::Ordering::Greater => Outcome::Home,
            std::cmp::Ordering::Less => Outcome::Away,
            std::cmp::Ordering::Equal => Outcome::Draw,
        }
    }
}

/// Scoring window a bet settles against
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Window {
    FullTime,
    HalfTime,
    SecondHalf,
}

/// Which recorded score a threshold bet compares
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScoreSide {
    Home,
    Away,
    Total,
}

/// Podium slot for ranking bets
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum RankSlot {
    Gold,
    Silver,
    Bronze,
}

/// Derived boolean a condition bet evaluates; the bet's flag is the expected value
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConditionKind {
    HomeWins,
    AwayWins,
    Draw,
    BothTeamsScored,
}

/// Comparison mode of a bet definition.
///
/// Numeric operands (window, score pair, threshold line) ride along as
/// payloads; the boolean flag and team reference stay on [`BetDef`] with
/// mode-dependent semantics.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum BetMode {
    /// Exact score equality in the given window
    ExactScore { window: Window, home: u32, away: u32 },
    /// Boolean condition derived from the result sheet
    Condition { window: Window, kind: ConditionKind },
    /// The bet's team reference equals the winner of the window
    TeamResult { window: Window },
    /// Score threshold; the flag selects over (true) or under (false)
    Threshold { window: Window, side: ScoreSide, line: u32 },
    /// The bet's team reference occupies the given podium slot
    Ranking { slot: RankSlot },
}

impl BetMode {
    /// The window whose outcome code must be non-pending before settlement
    pub fn window(&self) -> Window {
        match self {
            BetMode::ExactScore { window, .. } => *window,
            BetMode::Condition { window, .. } => *window,
            BetMode::TeamResult { window } => *window,
            BetMode::Threshold { window, .. } => *window,
            // Podium slots are filled with the full-time sheet.
            BetMode::Ranking { .. } => Window::FullTime,
        }
    }
}

/// Immutable bet definition stored in the catalog
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BetDef {
    pub id: BetId,
    pub mode: BetMode,
    /// Expected value for condition bets, over/under selector for thresholds
    pub flag: bool,
    /// Team reference for team-equality and ranking modes
    pub team: Option<TeamId>,
}

/// Immutable market definition: the set of bets valid under it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Market {
    pub id: MarketId,
    pub bets: Vec<BetId>,
}

/// Game record; never mutated after creation
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Game {
    pub id: GameId,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    /// Ordered auxiliary participant/ranking references
    pub players: Vec<u128>,
    pub bookie: Address,
}

/// Raw result sheet as submitted by the bookie or a validator.
///
/// This tuple (and nothing else) feeds the canonical ballot hash.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ResultSheet {
    pub game_id: GameId,
    pub gold: u128,
    pub silver: u128,
    pub bronze: u128,
    pub cancel: bool,
    pub home_score: u32,
    pub away_score: u32,
    pub home_halftime_score: u32,
    pub away_halftime_score: u32,
}

impl ResultSheet {
    /// Canonical voting ballot key: SHA-256 of the bincode-encoded sheet
    pub fn ballot_hash(&self) -> [u8; 32] {
        let bytes = bincode::serialize(self).expect("result sheet serialization is infallible");
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hasher.finalize().into()
    }
}

/// Finalized per-game result: the raw sheet plus derived outcome codes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameResult {
    pub sheet: ResultSheet,
    pub halftime_result: Outcome,
    pub result: Outcome,
    pub second_half_result: Outcome,
}

impl GameResult {
    /// Derive outcome codes from a raw sheet
    pub fn from_sheet(sheet: ResultSheet) -> Self {
        if sheet.cancel {
            return Self {
                sheet,
                halftime_result: Outcome::Cancelled,
                result: Outcome::Cancelled,
                second_half_result: Outcome::Cancelled,
            };
        }

        let halftime_result =
            Outcome::from_scores(sheet.home_halftime_score, sheet.away_halftime_score);
        let result = Outcome::from_scores(sheet.home_score, sheet.away_score);
        let second_half_result = Outcome::from_scores(
            sheet.home_score.saturating_sub(sheet.home_halftime_score),
            sheet.away_score.saturating_sub(sheet.away_halftime_score),
        );

        Self {
            sheet,
            halftime_result,
            result,
            second_half_result,
        }
    }

    /// Outcome code for the given window
    pub fn code_for(&self, window: Window) -> Outcome {
        match window {
            Window::FullTime => self.result,
            Window::HalfTime => self.halftime_result,
            Window::SecondHalf => self.second_half_result,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.sheet.cancel
    }

    /// Score pair recorded for the given window
    pub fn scores_for(&self, window: Window) -> (u32, u32) {
        let s = &self.sheet;
        match window {
            Window::FullTime => (s.home_score, s.away_score),
            Window::HalfTime => (s.home_halftime_score, s.away_halftime_score),
            Window::SecondHalf => (
                s.home_score.saturating_sub(s.home_halftime_score),
                s.away_score.saturating_sub(s.away_halftime_score),
            ),
        }
    }
}

/// Wager slip; `paid` stays 0 until a successful claim
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slip {
    pub id: SlipId,
    pub amount: Amount,
    pub paid: Amount,
    pub bet_id: BetId,
    pub market_id: MarketId,
    pub game_id: GameId,
    pub currency: Address,
    pub referrer: Address,
}

impl Slip {
    pub fn pool_key(&self) -> PoolKey {
        PoolKey {
            bet_id: self.bet_id,
            market_id: self.market_id,
            game_id: self.game_id,
            currency: self.currency,
        }
    }
}

/// Wager submission before a slip token has been minted for it
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlipDraft {
    pub amount: Amount,
    pub bet_id: BetId,
    pub market_id: MarketId,
    pub game_id: GameId,
    pub currency: Address,
    pub referrer: Address,
}

/// Pool identity: one pool per (bet, market, game, currency)
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub bet_id: BetId,
    pub market_id: MarketId,
    pub game_id: GameId,
    pub currency: Address,
}

/// Derive a 32-byte id from a human-readable label
pub fn id_from_label(label: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(label.as_bytes());
    hasher.finalize().into()
}

/// Convert bytes to hexadecimal string
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
