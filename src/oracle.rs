//! Proof-of-stake result oracle.
//!
//! Staked validators (and their delegates) vote on the canonical hash of a
//! game's result sheet. The assigned bookie gets an exclusive grace window
//! after game end; once it elapses any validator may vote. A hash reaches
//! consensus with a quorum of total votes and a strict plurality; dissenting
//! voters are slashed, agreeing voters earn a reward that decays with
//! submission rank, and the first successful claim writes the finalized
//! result into the game registry.

use crate::clock::Clock;
use crate::config::OracleSettings;
use crate::errors::{ConsensusError, InputError, StakebookResult, TimingError};
use crate::registry::GameRegistry;
use crate::rewards;
use crate::roles::{Role, Roles};
use crate::types::{Address, Amount, GameId, ResultSheet};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// Per-game oracle lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OracleState {
    /// Before game end + grace: only the bookie may submit
    AwaitingBookie,
    /// Grace elapsed; any validator may vote (also holds during a tie)
    OpenVoting,
    /// Quorum reached with a strict plurality leader
    Consensus,
    /// Result written to the registry; terminal
    Finalized,
}

/// Leading-tally snapshot for a game
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopInfo {
    pub draw: bool,
    pub top_hash: [u8; 32],
    pub top_votes: u32,
    pub total_votes: u32,
}

#[derive(Clone, Debug)]
struct VoterRecord {
    hash: [u8; 32],
    /// Submission order among voters agreeing on the same hash
    rank: u32,
    claimed: bool,
    slashed: bool,
}

struct GameTally {
    /// Oracle settings frozen at the game's first vote
    settings: OracleSettings,
    votes_by_hash: HashMap<[u8; 32], u32>,
    ballots: HashMap<[u8; 32], ResultSheet>,
    voters: HashMap<Address, VoterRecord>,
    voted_principals: HashSet<Address>,
    top_hash: [u8; 32],
    top_votes: u32,
    total_votes: u32,
    draw: bool,
    rewards_paid: Amount,
    finalized: bool,
}

impl GameTally {
    fn new(settings: OracleSettings) -> Self {
        Self {
            settings,
            votes_by_hash: HashMap::new(),
            ballots: HashMap::new(),
            voters: HashMap::new(),
            voted_principals: HashSet::new(),
            top_hash: [0u8; 32],
            top_votes: 0,
            total_votes: 0,
            draw: false,
            rewards_paid: 0,
            finalized: false,
        }
    }

    fn has_consensus(&self) -> bool {
        self.top_votes > 0 && !self.draw && self.total_votes >= self.settings.min_votes
    }
}

/// Stake-weighted result oracle over a shared game registry
#[derive(Clone)]
pub struct ResultOracle {
    clock: Arc<dyn Clock>,
    roles: Roles,
    registry: GameRegistry,
    /// Identity the oracle uses for its registry write capability
    identity: Address,
    settings: Arc<RwLock<OracleSettings>>,
    validators: Arc<RwLock<HashSet<Address>>>,
    stakes: Arc<RwLock<HashMap<Address, Amount>>>,
    delegates: Arc<RwLock<HashMap<Address, Vec<Address>>>>,
    principals: Arc<RwLock<HashMap<Address, Address>>>,
    tallies: Arc<RwLock<HashMap<GameId, GameTally>>>,
    slashed_pot: Arc<RwLock<Amount>>,
}

impl ResultOracle {
    pub fn new(
        clock: Arc<dyn Clock>,
        roles: Roles,
        registry: GameRegistry,
        identity: Address,
        settings: OracleSettings,
    ) -> Self {
        roles.grant(Role::Oracle, identity);
        Self {
            clock,
            roles,
            registry,
            identity,
            settings: Arc::new(RwLock::new(settings)),
            validators: Arc::new(RwLock::new(HashSet::new())),
            stakes: Arc::new(RwLock::new(HashMap::new())),
            delegates: Arc::new(RwLock::new(HashMap::new())),
            principals: Arc::new(RwLock::new(HashMap::new())),
            tallies: Arc::new(RwLock::new(HashMap::new())),
            slashed_pot: Arc::new(RwLock::new(0)),
        }
    }

    pub fn settings(&self) -> OracleSettings {
        self.settings.read().unwrap().clone()
    }

    /// Replace the oracle settings. Takes effect for games whose voting
    /// starts afterwards; in-flight tallies keep their snapshot.
    pub fn update_settings(&self, caller: Address, settings: OracleSettings) -> StakebookResult<()> {
        self.roles.require(Role::Admin, caller)?;
        if settings.min_votes == 0 || settings.max_validators == 0 {
            return Err(InputError::InvalidInput(
                "quorum and validator cap cannot be zero".to_string(),
            )
            .into());
        }
        *self.settings.write().unwrap() = settings;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Validator lifecycle
    // ------------------------------------------------------------------

    /// Stake the fixed minimum and acquire voting rights. Returns the
    /// amount staked.
    pub fn acquire_validator_role(&self, caller: Address) -> StakebookResult<Amount> {
        if self.roles.has(Role::Validator, caller) {
            return Err(InputError::InvalidInput("already a validator".to_string()).into());
        }

        let settings = self.settings();
        let mut validators = self.validators.write().unwrap();
        if validators.len() as u32 >= settings.max_validators {
            return Err(ConsensusError::MaxQValidatorsReached {
                max: settings.max_validators,
            }
            .into());
        }

        let stake = settings.validator_stake_units();
        validators.insert(caller);
        self.stakes.write().unwrap().insert(caller, stake);
        self.roles.grant(Role::Validator, caller);

        tracing::info!(
            validator = %crate::types::bytes_to_hex(&caller[..4]),
            stake,
            "validator role acquired"
        );
        Ok(stake)
    }

    /// Return the remaining stake and revoke voting rights, dropping any
    /// delegates along the way. Returns the total amount released.
    pub fn renounce_validator_role(&self, caller: Address) -> StakebookResult<Amount> {
        if !self.validators.read().unwrap().contains(&caller) {
            return Err(InputError::InvalidInput("not a staked validator".to_string()).into());
        }

        let mut released = 0;
        let dropped = self.delegates.write().unwrap().remove(&caller).unwrap_or_default();
        for delegate in dropped {
            self.principals.write().unwrap().remove(&delegate);
            self.roles.revoke(Role::Validator, delegate);
            released += self.stakes.write().unwrap().remove(&delegate).unwrap_or(0);
        }

        released += self.stakes.write().unwrap().remove(&caller).unwrap_or(0);
        self.validators.write().unwrap().remove(&caller);
        self.roles.revoke(Role::Validator, caller);

        tracing::info!(
            validator = %crate::types::bytes_to_hex(&caller[..4]),
            released,
            "validator role renounced"
        );
        Ok(released)
    }

    /// Grant voting rights to `delegate`, backed by the principal's
    /// secondary bond. Returns the bond posted.
    pub fn delegate_role(&self, caller: Address, delegate: Address) -> StakebookResult<Amount> {
        if !self.validators.read().unwrap().contains(&caller) {
            return Err(InputError::InvalidInput(
                "only a staked validator may delegate".to_string(),
            )
            .into());
        }
        if self.roles.has(Role::Validator, delegate) {
            return Err(InputError::InvalidInput(
                "delegate already holds voting rights".to_string(),
            )
            .into());
        }

        let settings = self.settings();
        let mut delegates = self.delegates.write().unwrap();
        let list = delegates.entry(caller).or_default();
        if list.len() as u32 >= settings.max_delegates {
            return Err(InputError::InvalidInput(format!(
                "delegate limit of {} reached",
                settings.max_delegates
            ))
            .into());
        }

        let bond = settings.delegate_stake_units();
        list.push(delegate);
        self.principals.write().unwrap().insert(delegate, caller);
        self.stakes.write().unwrap().insert(delegate, bond);
        self.roles.grant(Role::Validator, delegate);

        tracing::info!(
            principal = %crate::types::bytes_to_hex(&caller[..4]),
            delegate = %crate::types::bytes_to_hex(&delegate[..4]),
            bond,
            "voting rights delegated"
        );
        Ok(bond)
    }

    /// Remove one delegate without touching the principal or its other
    /// delegates. Returns the released bond.
    pub fn revoke_delegate_role(&self, caller: Address, delegate: Address) -> StakebookResult<Amount> {
        let mut principals = self.principals.write().unwrap();
        if principals.get(&delegate) != Some(&caller) {
            return Err(InputError::InvalidInput("not your delegate".to_string()).into());
        }
        principals.remove(&delegate);
        drop(principals);

        if let Some(list) = self.delegates.write().unwrap().get_mut(&caller) {
            list.retain(|entry| *entry != delegate);
        }
        self.roles.revoke(Role::Validator, delegate);
        let bond = self.stakes.write().unwrap().remove(&delegate).unwrap_or(0);
        Ok(bond)
    }

    /// True for staked validators and their delegates alike
    pub fn is_validator(&self, address: Address) -> bool {
        self.roles.has(Role::Validator, address)
    }

    pub fn stake_of(&self, address: Address) -> Amount {
        self.stakes.read().unwrap().get(&address).copied().unwrap_or(0)
    }

    /// Stake forfeited by slashed voters, retained by the system
    pub fn slashed_pot(&self) -> Amount {
        *self.slashed_pot.read().unwrap()
    }

    // ------------------------------------------------------------------
    // Voting
    // ------------------------------------------------------------------

    /// Submit a result sheet as a vote for its canonical hash. Returns the
    /// ballot hash that was tallied.
    pub fn submit_game_results(
        &self,
        caller: Address,
        sheet: ResultSheet,
    ) -> StakebookResult<[u8; 32]> {
        let game_id = sheet.game_id;
        let game = self
            .registry
            .game(game_id)
            .ok_or_else(|| InputError::InvalidInput(format!("unknown game {}", game_id)))?;
        if self.registry.result(game_id).is_some() {
            return Err(InputError::InvalidInput(format!(
                "result for game {} already recorded",
                game_id
            ))
            .into());
        }

        let now = self.clock.now();
        if now < game.end_time {
            return Err(TimingError::GameNotEnded { game_id }.into());
        }

        let mut tallies = self.tallies.write().unwrap();

        // Grace threshold itself is open voting; see the boundary test.
        let grace = tallies
            .get(&game_id)
            .map(|tally| tally.settings.grace_period_secs)
            .unwrap_or_else(|| self.settings.read().unwrap().grace_period_secs);
        if now < game.end_time + grace && caller != game.bookie {
            return Err(TimingError::BookieGracePeriodStillActive { game_id }.into());
        }
        self.roles.require(Role::Validator, caller)?;

        let principal = self
            .principals
            .read()
            .unwrap()
            .get(&caller)
            .copied()
            .unwrap_or(caller);
        let tally = tallies
            .entry(game_id)
            .or_insert_with(|| GameTally::new(self.settings.read().unwrap().clone()));
        if !tally.voted_principals.insert(principal) {
            return Err(ConsensusError::AlreadyVoted { game_id }.into());
        }

        let hash = sheet.ballot_hash();
        let count = {
            let entry = tally.votes_by_hash.entry(hash).or_insert(0);
            *entry += 1;
            *entry
        };
        tally.ballots.entry(hash).or_insert(sheet);
        tally.voters.insert(
            caller,
            VoterRecord {
                hash,
                rank: count - 1,
                claimed: false,
                slashed: false,
            },
        );
        tally.total_votes += 1;

        // Strict-majority replacement: a hash takes the lead only on
        // strictly greater votes; matching the leader's count flags a draw
        // until some hash breaks the tie.
        if count > tally.top_votes {
            tally.top_hash = hash;
            tally.top_votes = count;
            tally.draw = false;
        } else if count == tally.top_votes && hash != tally.top_hash {
            tally.draw = true;
        }

        tracing::info!(
            game_id,
            voter = %crate::types::bytes_to_hex(&caller[..4]),
            ballot = %crate::types::bytes_to_hex(&hash[..8]),
            votes = count,
            total = tally.total_votes,
            "result vote tallied"
        );
        Ok(hash)
    }

    pub fn top_info(&self, game_id: GameId) -> Option<TopInfo> {
        self.tallies.read().unwrap().get(&game_id).map(|tally| TopInfo {
            draw: tally.draw,
            top_hash: tally.top_hash,
            top_votes: tally.top_votes,
            total_votes: tally.total_votes,
        })
    }

    /// Lifecycle state of a game as the oracle sees it
    pub fn state(&self, game_id: GameId) -> StakebookResult<OracleState> {
        let game = self
            .registry
            .game(game_id)
            .ok_or_else(|| InputError::InvalidInput(format!("unknown game {}", game_id)))?;

        if self.registry.result(game_id).is_some() {
            return Ok(OracleState::Finalized);
        }

        let tallies = self.tallies.read().unwrap();
        if let Some(tally) = tallies.get(&game_id) {
            if tally.has_consensus() {
                return Ok(OracleState::Consensus);
            }
        }

        let grace = tallies
            .get(&game_id)
            .map(|tally| tally.settings.grace_period_secs)
            .unwrap_or_else(|| self.settings.read().unwrap().grace_period_secs);
        if self.clock.now() < game.end_time + grace {
            Ok(OracleState::AwaitingBookie)
        } else {
            Ok(OracleState::OpenVoting)
        }
    }

    // ------------------------------------------------------------------
    // Rewards
    // ------------------------------------------------------------------

    /// Reward the caller would receive from `claim_reward` right now
    pub fn claimable_reward(&self, game_id: GameId, voter: Address) -> Amount {
        let tallies = self.tallies.read().unwrap();
        let Some(tally) = tallies.get(&game_id) else {
            return 0;
        };
        if !tally.has_consensus() {
            return 0;
        }
        match tally.voters.get(&voter) {
            Some(record) if record.hash == tally.top_hash && !record.claimed => {
                let reward = rewards::reward_at_rank(
                    record.rank,
                    tally.settings.max_reward_per_validator_units(),
                );
                let remaining = tally
                    .settings
                    .max_total_reward_per_game_units()
                    .saturating_sub(tally.rewards_paid);
                reward.min(remaining)
            }
            _ => 0,
        }
    }

    /// Claim the caller's voting reward for a decided game, paying `to`.
    ///
    /// A voter whose ballot is not the leading hash forfeits their stake on
    /// the first attempt and gets a deterministic `StakeWasLost` on every
    /// retry. The game's first successful claim writes the winning sheet
    /// into the registry, finalizing the result.
    pub fn claim_reward(
        &self,
        caller: Address,
        game_id: GameId,
        to: Address,
    ) -> StakebookResult<Amount> {
        let mut tallies = self.tallies.write().unwrap();
        let tally = tallies
            .get_mut(&game_id)
            .ok_or(ConsensusError::NoConsensus { game_id })?;
        if !tally.has_consensus() {
            return Err(ConsensusError::NoConsensus { game_id }.into());
        }

        let top_hash = tally.top_hash;
        let max_reward = tally.settings.max_reward_per_validator_units();
        let remaining = tally
            .settings
            .max_total_reward_per_game_units()
            .saturating_sub(tally.rewards_paid);

        let record = tally
            .voters
            .get_mut(&caller)
            .ok_or_else(|| InputError::InvalidInput("caller did not vote".to_string()))?;

        if record.hash != top_hash {
            if !record.slashed {
                record.slashed = true;
                let forfeited = self
                    .stakes
                    .write()
                    .unwrap()
                    .insert(caller, 0)
                    .unwrap_or(0);
                *self.slashed_pot.write().unwrap() += forfeited;
                tracing::warn!(
                    game_id,
                    voter = %crate::types::bytes_to_hex(&caller[..4]),
                    forfeited,
                    "dissenting voter slashed"
                );
            }
            return Err(ConsensusError::StakeWasLost { game_id }.into());
        }
        if record.claimed {
            return Err(ConsensusError::AlreadyClaimed { game_id }.into());
        }

        let reward = rewards::reward_at_rank(record.rank, max_reward).min(remaining);
        record.claimed = true;
        tally.rewards_paid += reward;

        if !tally.finalized {
            let sheet = tally
                .ballots
                .get(&top_hash)
                .cloned()
                .ok_or_else(|| InputError::InvalidInput("missing winning ballot".to_string()))?;
            if self.registry.result(game_id).is_none() {
                self.registry.set_scores(self.identity, sheet)?;
            }
            tally.finalized = true;
        }

        tracing::info!(
            game_id,
            voter = %crate::types::bytes_to_hex(&caller[..4]),
            reward,
            to = %crate::types::bytes_to_hex(&to[..4]),
            "voting reward claimed"
        );
        Ok(reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::types::{Game, ETHER};

    const ADMIN: Address = [0xAAu8; 32];
    const BOOKIE: Address = [0xBBu8; 32];
    const ORACLE_ID: Address = [0xEEu8; 32];

    const GAME_ID: u128 = 5;
    const START: i64 = 4_600;
    const END: i64 = 10_600;
    const GRACE: i64 = 600;

    fn validator(index: u8) -> Address {
        [0x50 + index; 32]
    }

    fn setup() -> (ManualClock, GameRegistry, ResultOracle) {
        let clock = ManualClock::starting_at(1_000);
        let roles = Roles::with_admin(ADMIN);
        let registry = GameRegistry::new(Arc::new(clock.clone()), roles.clone());
        registry
            .create_game(
                ADMIN,
                Game {
                    id: GAME_ID,
                    home_team: 10,
                    away_team: 20,
                    start_time: START,
                    end_time: END,
                    players: vec![],
                    bookie: BOOKIE,
                },
            )
            .unwrap();

        let oracle = ResultOracle::new(
            Arc::new(clock.clone()),
            roles,
            registry.clone(),
            ORACLE_ID,
            OracleSettings::default(),
        );
        (clock, registry, oracle)
    }

    fn sheet() -> ResultSheet {
        ResultSheet {
            game_id: GAME_ID,
            home_score: 1,
            away_score: 2,
            home_halftime_score: 0,
            away_halftime_score: 1,
            ..Default::default()
        }
    }

    fn lower_quorum(oracle: &ResultOracle, min_votes: u32) {
        let mut settings = oracle.settings();
        settings.min_votes = min_votes;
        oracle.update_settings(ADMIN, settings).unwrap();
    }

    #[test]
    fn test_acquire_and_renounce_validator_role() {
        let (_clock, _registry, oracle) = setup();
        let user = validator(0);

        let staked = oracle.acquire_validator_role(user).unwrap();
        assert_eq!(staked, 10_000 * ETHER);
        assert!(oracle.is_validator(user));
        assert_eq!(oracle.stake_of(user), staked);

        let released = oracle.renounce_validator_role(user).unwrap();
        assert_eq!(released, staked);
        assert!(!oracle.is_validator(user));
    }

    #[test]
    fn test_validator_cap() {
        let (_clock, _registry, oracle) = setup();
        for index in 0..10 {
            oracle.acquire_validator_role(validator(index)).unwrap();
        }

        let err = oracle.acquire_validator_role(validator(10)).unwrap_err();
        assert_eq!(err, ConsensusError::MaxQValidatorsReached { max: 10 }.into());

        // Renouncing frees a slot.
        oracle.renounce_validator_role(validator(3)).unwrap();
        assert!(oracle.acquire_validator_role(validator(10)).is_ok());
    }

    #[test]
    fn test_delegation_lifecycle() {
        let (_clock, _registry, oracle) = setup();
        let principal = validator(0);
        let first = validator(1);
        let second = validator(2);
        oracle.acquire_validator_role(principal).unwrap();

        assert_eq!(oracle.delegate_role(principal, first).unwrap(), 100 * ETHER);
        oracle.delegate_role(principal, second).unwrap();
        assert!(oracle.is_validator(first));
        assert!(oracle.is_validator(second));

        // Revoking one delegate leaves the principal and the other intact.
        oracle.revoke_delegate_role(principal, second).unwrap();
        assert!(oracle.is_validator(first));
        assert!(!oracle.is_validator(second));
        assert!(oracle.is_validator(principal));

        // A delegate cannot re-delegate, a stranger cannot revoke.
        assert!(oracle.delegate_role(first, validator(5)).is_err());
        assert!(oracle.revoke_delegate_role(validator(5), first).is_err());

        // Renouncing the principal drops the remaining delegate and
        // releases both stakes.
        let released = oracle.renounce_validator_role(principal).unwrap();
        assert_eq!(released, 10_000 * ETHER + 100 * ETHER);
        assert!(!oracle.is_validator(first));
    }

    #[test]
    fn test_delegate_limit() {
        let (_clock, _registry, oracle) = setup();
        let principal = validator(0);
        oracle.acquire_validator_role(principal).unwrap();

        for index in 1..=5 {
            oracle.delegate_role(principal, validator(index)).unwrap();
        }
        assert!(oracle.delegate_role(principal, validator(6)).is_err());
    }

    #[test]
    fn test_submit_timing_and_grace() {
        let (clock, _registry, oracle) = setup();
        oracle.acquire_validator_role(BOOKIE).unwrap();
        let other = validator(0);
        oracle.acquire_validator_role(other).unwrap();

        // Before the game ends nobody votes.
        let err = oracle.submit_game_results(BOOKIE, sheet()).unwrap_err();
        assert_eq!(err, TimingError::GameNotEnded { game_id: GAME_ID }.into());

        // During the grace window only the bookie may submit.
        clock.set(END + 10);
        let err = oracle.submit_game_results(other, sheet()).unwrap_err();
        assert_eq!(
            err,
            TimingError::BookieGracePeriodStillActive { game_id: GAME_ID }.into()
        );
        let hash = oracle.submit_game_results(BOOKIE, sheet()).unwrap();

        let info = oracle.top_info(GAME_ID).unwrap();
        assert_eq!(info.top_hash, hash);
        assert_eq!(info.top_votes, 1);
        assert_eq!(info.total_votes, 1);
        assert!(!info.draw);

        // Repeat vote from the same principal.
        let err = oracle.submit_game_results(BOOKIE, sheet()).unwrap_err();
        assert_eq!(err, ConsensusError::AlreadyVoted { game_id: GAME_ID }.into());

        // After the grace window the other validator joins in.
        clock.set(END + GRACE + 60);
        oracle.submit_game_results(other, sheet()).unwrap();
        assert_eq!(oracle.top_info(GAME_ID).unwrap().total_votes, 2);
    }

    #[test]
    fn test_grace_period_boundary() {
        let (clock, _registry, oracle) = setup();
        let voter = validator(0);
        oracle.acquire_validator_role(voter).unwrap();

        // One second before the threshold the window is still exclusive.
        clock.set(END + GRACE - 1);
        let err = oracle.submit_game_results(voter, sheet()).unwrap_err();
        assert_eq!(
            err,
            TimingError::BookieGracePeriodStillActive { game_id: GAME_ID }.into()
        );

        // At exactly end + grace, voting is open to all validators.
        clock.set(END + GRACE);
        assert!(oracle.submit_game_results(voter, sheet()).is_ok());
    }

    #[test]
    fn test_delegate_vote_counts_for_principal() {
        let (clock, _registry, oracle) = setup();
        let principal = validator(0);
        let delegate = validator(1);
        oracle.acquire_validator_role(principal).unwrap();
        oracle.delegate_role(principal, delegate).unwrap();

        clock.set(END + GRACE + 1);
        oracle.submit_game_results(delegate, sheet()).unwrap();

        // The principal's vote is spent by its delegate.
        let err = oracle.submit_game_results(principal, sheet()).unwrap_err();
        assert_eq!(err, ConsensusError::AlreadyVoted { game_id: GAME_ID }.into());
    }

    #[test]
    fn test_consensus_claims_and_slashing() {
        let (clock, registry, oracle) = setup();
        lower_quorum(&oracle, 5);

        let mut voters = vec![BOOKIE];
        oracle.acquire_validator_role(BOOKIE).unwrap();
        for index in 0..6 {
            let voter = validator(index);
            oracle.acquire_validator_role(voter).unwrap();
            voters.push(voter);
        }

        let agreed = sheet();
        let mut dissent = sheet();
        dissent.home_score = 3;

        clock.set(END + 10);
        oracle.submit_game_results(BOOKIE, agreed.clone()).unwrap();
        clock.set(END + GRACE + 1);
        for voter in &voters[1..3] {
            oracle.submit_game_results(*voter, agreed.clone()).unwrap();
        }

        // Quorum not yet reached.
        let err = oracle.claim_reward(BOOKIE, GAME_ID, BOOKIE).unwrap_err();
        assert_eq!(err, ConsensusError::NoConsensus { game_id: GAME_ID }.into());

        for voter in &voters[3..6] {
            oracle.submit_game_results(*voter, agreed.clone()).unwrap();
        }
        let dissenter = voters[6];
        oracle.submit_game_results(dissenter, dissent).unwrap();

        let info = oracle.top_info(GAME_ID).unwrap();
        assert_eq!(info.total_votes, 7);
        assert_eq!(info.top_votes, 6);
        assert_eq!(info.top_hash, agreed.ballot_hash());
        assert!(!info.draw);
        assert_eq!(oracle.state(GAME_ID).unwrap(), OracleState::Consensus);

        // First agreeing voter earns the full per-validator maximum; the
        // fifth earns the rank-4 value of the curve.
        let bookie_reward = oracle.claimable_reward(GAME_ID, BOOKIE);
        assert_eq!(bookie_reward, 60 * ETHER);
        assert_eq!(oracle.claim_reward(BOOKIE, GAME_ID, BOOKIE).unwrap(), bookie_reward);

        let fifth = voters[4];
        let expected = crate::rewards::reward_at_rank(4, 60 * ETHER);
        assert_eq!(oracle.claimable_reward(GAME_ID, fifth), expected);
        assert_eq!(oracle.claim_reward(fifth, GAME_ID, fifth).unwrap(), expected);

        // The dissenter is slashed, deterministically on every retry.
        let staked = oracle.stake_of(dissenter);
        let err = oracle.claim_reward(dissenter, GAME_ID, dissenter).unwrap_err();
        assert_eq!(err, ConsensusError::StakeWasLost { game_id: GAME_ID }.into());
        assert_eq!(oracle.stake_of(dissenter), 0);
        assert_eq!(oracle.slashed_pot(), staked);
        let err = oracle.claim_reward(dissenter, GAME_ID, dissenter).unwrap_err();
        assert_eq!(err, ConsensusError::StakeWasLost { game_id: GAME_ID }.into());

        // Repeat claims are rejected.
        let err = oracle.claim_reward(BOOKIE, GAME_ID, BOOKIE).unwrap_err();
        assert_eq!(err, ConsensusError::AlreadyClaimed { game_id: GAME_ID }.into());

        // The first successful claim finalized the result in the registry.
        let result = registry.result(GAME_ID).unwrap();
        assert_eq!(result.sheet.away_score, 2);
        assert_eq!(result.sheet.home_halftime_score, 0);
        assert_eq!(oracle.state(GAME_ID).unwrap(), OracleState::Finalized);

        // Voting is closed once the result is recorded.
        let late = validator(9);
        oracle.acquire_validator_role(late).unwrap();
        assert!(oracle.submit_game_results(late, agreed).is_err());
    }

    #[test]
    fn test_tie_sets_draw_until_broken() {
        let (clock, _registry, oracle) = setup();
        lower_quorum(&oracle, 2);

        for index in 0..3 {
            oracle.acquire_validator_role(validator(index)).unwrap();
        }

        let first = sheet();
        let mut second = sheet();
        second.away_score = 9;

        clock.set(END + GRACE + 1);
        oracle.submit_game_results(validator(0), first.clone()).unwrap();
        oracle.submit_game_results(validator(1), second).unwrap();

        let info = oracle.top_info(GAME_ID).unwrap();
        assert!(info.draw);
        assert_eq!(info.top_votes, 1);
        assert_eq!(oracle.state(GAME_ID).unwrap(), OracleState::OpenVoting);
        let err = oracle
            .claim_reward(validator(0), GAME_ID, validator(0))
            .unwrap_err();
        assert_eq!(err, ConsensusError::NoConsensus { game_id: GAME_ID }.into());

        // A third vote breaks the tie and clears the draw flag.
        oracle.submit_game_results(validator(2), first.clone()).unwrap();
        let info = oracle.top_info(GAME_ID).unwrap();
        assert!(!info.draw);
        assert_eq!(info.top_votes, 2);
        assert_eq!(info.top_hash, first.ballot_hash());
        assert_eq!(oracle.state(GAME_ID).unwrap(), OracleState::Consensus);
    }

    #[test]
    fn test_per_game_reward_cap() {
        let (clock, _registry, oracle) = setup();
        let mut settings = oracle.settings();
        settings.min_votes = 2;
        settings.max_total_reward_per_game = 100;
        oracle.update_settings(ADMIN, settings).unwrap();

        for index in 0..3 {
            oracle.acquire_validator_role(validator(index)).unwrap();
        }

        clock.set(END + GRACE + 1);
        for index in 0..3 {
            oracle.submit_game_results(validator(index), sheet()).unwrap();
        }

        // 60 to the first, then the 54 of rank 1 clipped to the 40 left.
        assert_eq!(
            oracle.claim_reward(validator(0), GAME_ID, validator(0)).unwrap(),
            60 * ETHER
        );
        assert_eq!(
            oracle.claim_reward(validator(1), GAME_ID, validator(1)).unwrap(),
            40 * ETHER
        );
        assert_eq!(
            oracle.claim_reward(validator(2), GAME_ID, validator(2)).unwrap(),
            0
        );
    }

    #[test]
    fn test_settings_snapshot_protects_inflight_games() {
        let (clock, _registry, oracle) = setup();
        lower_quorum(&oracle, 2);

        for index in 0..2 {
            oracle.acquire_validator_role(validator(index)).unwrap();
        }

        clock.set(END + GRACE + 1);
        oracle.submit_game_results(validator(0), sheet()).unwrap();

        // Raising the quorum now does not affect the in-flight game.
        lower_quorum(&oracle, 40);
        oracle.submit_game_results(validator(1), sheet()).unwrap();
        assert_eq!(oracle.state(GAME_ID).unwrap(), OracleState::Consensus);
        assert!(oracle.claim_reward(validator(0), GAME_ID, validator(0)).is_ok());
    }
}
