//! Error types for the stakebook settlement and oracle system
//!
//! Every failure is a rejected operation, never a partial state: an error
//! return means the call left all bookkeeping untouched.

use std::fmt;
use std::error::Error as StdError;

/// Root error type for all stakebook operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StakebookError {
    /// Time-threshold violations
    Timing(TimingError),

    /// Ownership and role violations
    Auth(AuthError),

    /// Wager and pool state violations
    Settlement(SettlementError),

    /// Oracle voting and staking violations
    Consensus(ConsensusError),

    /// Malformed or unknown inputs
    Input(InputError),
}

/// Time-threshold violations, evaluated against the engine clock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimingError {
    GameAlreadyStarted { game_id: u128 },
    GameNotEnded { game_id: u128 },
    BookieGracePeriodStillActive { game_id: u128 },
    /// Reserved for outer reward surfaces gated on a release date.
    ReleaseDatePending,
}

/// Ownership and role violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    NotYourBet { slip_id: u128 },
    NotYourToken { slip_id: u128 },
    NotYourReferral { slip_id: u128 },
    MissingRole(String),
}

/// Wager and pool outcome-state violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    GameWasCancelled { game_id: u128 },
    GameWasNotCancelled { game_id: u128 },
    GameResultsArePending { game_id: u128 },
    BetDidNotWin { slip_id: u128 },
    BetPoolWasNotBacked { slip_id: u128 },
    AlreadyClaimed { slip_id: u128 },
}

/// Oracle voting and staking violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    NoConsensus { game_id: u128 },
    AlreadyVoted { game_id: u128 },
    AlreadyClaimed { game_id: u128 },
    StakeWasLost { game_id: u128 },
    MaxQValidatorsReached { max: u32 },
}

/// Malformed or unknown inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    InvalidInput(String),
    /// Reserved for replay-protected external claim surfaces.
    UsedSignature,
}

// Display implementations
impl fmt::Display for StakebookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StakebookError::Timing(e) => write!(f, "Timing error: {}", e),
            StakebookError::Auth(e) => write!(f, "Authorization error: {}", e),
            StakebookError::Settlement(e) => write!(f, "Settlement error: {}", e),
            StakebookError::Consensus(e) => write!(f, "Consensus error: {}", e),
            StakebookError::Input(e) => write!(f, "Input error: {}", e),
        }
    }
}

impl fmt::Display for TimingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimingError::GameAlreadyStarted { game_id } => {
                write!(f, "Game {} already started", game_id)
            }
            TimingError::GameNotEnded { game_id } => write!(f, "Game {} has not ended", game_id),
            TimingError::BookieGracePeriodStillActive { game_id } => {
                write!(f, "Bookie grace period still active for game {}", game_id)
            }
            TimingError::ReleaseDatePending => write!(f, "Release date pending"),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::NotYourBet { slip_id } => write!(f, "Slip {} is not your bet", slip_id),
            AuthError::NotYourToken { slip_id } => write!(f, "Slip token {} is not yours", slip_id),
            AuthError::NotYourReferral { slip_id } => {
                write!(f, "Slip {} is not your referral", slip_id)
            }
            AuthError::MissingRole(role) => write!(f, "Caller lacks role: {}", role),
        }
    }
}

impl fmt::Display for SettlementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementError::GameWasCancelled { game_id } => {
                write!(f, "Game {} was cancelled", game_id)
            }
            SettlementError::GameWasNotCancelled { game_id } => {
                write!(f, "Game {} was not cancelled", game_id)
            }
            SettlementError::GameResultsArePending { game_id } => {
                write!(f, "Results for game {} are pending", game_id)
            }
            SettlementError::BetDidNotWin { slip_id } => write!(f, "Slip {} did not win", slip_id),
            SettlementError::BetPoolWasNotBacked { slip_id } => {
                write!(f, "Pool behind slip {} was not backed", slip_id)
            }
            SettlementError::AlreadyClaimed { slip_id } => {
                write!(f, "Slip {} was already claimed", slip_id)
            }
        }
    }
}

impl fmt::Display for ConsensusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsensusError::NoConsensus { game_id } => {
                write!(f, "No consensus for game {}", game_id)
            }
            ConsensusError::AlreadyVoted { game_id } => {
                write!(f, "Already voted on game {}", game_id)
            }
            ConsensusError::AlreadyClaimed { game_id } => {
                write!(f, "Reward for game {} already claimed", game_id)
            }
            ConsensusError::StakeWasLost { game_id } => {
                write!(f, "Stake was lost on game {}", game_id)
            }
            ConsensusError::MaxQValidatorsReached { max } => {
                write!(f, "Validator queue is full ({} max)", max)
            }
        }
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            InputError::UsedSignature => write!(f, "Signature was already used"),
        }
    }
}

// Standard Error trait implementations
impl StdError for StakebookError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StakebookError::Timing(e) => Some(e),
            StakebookError::Auth(e) => Some(e),
            StakebookError::Settlement(e) => Some(e),
            StakebookError::Consensus(e) => Some(e),
            StakebookError::Input(e) => Some(e),
        }
    }
}

impl StdError for TimingError {}
impl StdError for AuthError {}
impl StdError for SettlementError {}
impl StdError for ConsensusError {}
impl StdError for InputError {}

// From implementations for easy conversion
impl From<TimingError> for StakebookError {
    fn from(e: TimingError) -> Self {
        StakebookError::Timing(e)
    }
}

impl From<AuthError> for StakebookError {
    fn from(e: AuthError) -> Self {
        StakebookError::Auth(e)
    }
}

impl From<SettlementError> for StakebookError {
    fn from(e: SettlementError) -> Self {
        StakebookError::Settlement(e)
    }
}

impl From<ConsensusError> for StakebookError {
    fn from(e: ConsensusError) -> Self {
        StakebookError::Consensus(e)
    }
}

impl From<InputError> for StakebookError {
    fn from(e: InputError) -> Self {
        StakebookError::Input(e)
    }
}

/// Convenience type alias for Results
pub type StakebookResult<T> = Result<T, StakebookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let timing = TimingError::GameAlreadyStarted { game_id: 7 };
        let err = StakebookError::Timing(timing);

        assert!(err.to_string().contains("Timing error"));
        assert!(err.to_string().contains("7"));
    }

    #[test]
    fn test_error_conversion() {
        let err: StakebookError = ConsensusError::NoConsensus { game_id: 1 }.into();

        match err {
            StakebookError::Consensus(_) => {}
            _ => panic!("Expected consensus error"),
        }
    }

    #[test]
    fn test_error_source() {
        let err = StakebookError::Auth(AuthError::NotYourBet { slip_id: 3 });
        assert!(err.source().is_some());
    }

    #[test]
    fn test_settlement_error_details() {
        let err = SettlementError::BetPoolWasNotBacked { slip_id: 42 };
        assert!(err.to_string().contains("42"));
        assert!(err.to_string().contains("not backed"));
    }
}
