//! Error Types for the Huckleberry Protocol
//!
//! Every failure is a typed variant carrying enough detail (pool id,
//! available vs requested) to diagnose the rejected call. Errors are grouped
//! into four categories; no variant is retried internally.

use thiserror::Error;

use crate::access_control::Role;
use crate::types::{AccountId, Amount, AssetId, FeeKind, PoolId};

/// Result type alias for Huckleberry operations
pub type HuckResult<T> = Result<T, HuckError>;

/// Main error enum for all protocol errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HuckError {
    // ============ Input Errors ============
    /// Pool id is out of range
    #[error("invalid pool {pid} (registry holds {pool_count} pools)")]
    InvalidPool { pid: PoolId, pool_count: u64 },

    /// Zero amount not allowed
    #[error("amount must be greater than zero")]
    ZeroAmount,

    /// Withdrawal exceeds the caller's stake in a pool
    #[error("withdraw exceeds stake in pool {pid}: staked {staked}, requested {requested}")]
    InsufficientStake {
        pid: PoolId,
        staked: Amount,
        requested: Amount,
    },

    /// Ledger balance too low for a transfer or burn
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance { available: Amount, requested: Amount },

    /// Caller owns fewer shares than requested
    #[error("insufficient shares: owned {owned}, requested {requested}")]
    InsufficientShares { owned: Amount, requested: Amount },

    /// Vault deposit with nothing to deposit
    #[error("nothing to deposit")]
    NothingToDeposit,

    /// Vault share withdrawal of zero shares
    #[error("nothing to withdraw")]
    NothingToWithdraw,

    /// Amount converts to zero shares
    #[error("amount {amount} converts to zero shares")]
    TooSmallShares { amount: Amount },

    /// Pool window is empty or inverted
    #[error("invalid time window: start {start_time} must precede end {end_time}")]
    InvalidTimeWindow { start_time: u64, end_time: u64 },

    /// Fee above its configured ceiling
    #[error("{kind:?} fee {fee} bps exceeds maximum {maximum} bps")]
    FeeTooHigh { kind: FeeKind, fee: u64, maximum: u64 },

    /// Invalid address (e.g., zero address)
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },

    /// Asset not registered with the ledger
    #[error("unknown asset {}", short_hex(.asset))]
    UnknownAsset { asset: AssetId },

    /// Asset may not be recovered or swept
    #[error("forbidden token: {reason}")]
    ForbiddenToken { reason: &'static str },

    /// Invalid input parameter
    #[error("invalid {param}: {reason}")]
    InvalidInput { param: &'static str, reason: &'static str },

    // ============ Authorization Errors ============
    /// Caller lacks the role required by the operation
    #[error("account {} is missing role {role:?}", short_hex(.account))]
    Unauthorized { account: AccountId, role: Role },

    /// Spender allowance too low for a pull transfer
    #[error("insufficient allowance: available {available}, requested {requested}")]
    InsufficientAllowance { available: Amount, requested: Amount },

    // ============ Math Errors ============
    /// Arithmetic overflow occurred
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow occurred
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero
    #[error("division by zero")]
    DivisionByZero,

    // ============ State Errors ============
    /// Protocol is paused
    #[error("protocol is paused")]
    ProtocolPaused,

    /// Unpause requested while running
    #[error("protocol is not paused")]
    NotPaused,

    /// Second finalize call
    #[error("already initialized")]
    AlreadyInitialized,

    /// Component used before finalize
    #[error("not initialized")]
    NotInitialized,

    /// Reward reserve cannot cover a payout
    #[error("reward reserve of pool {pid} holds {available}, payout requires {required}")]
    InsufficientRewardReserve {
        pid: PoolId,
        available: Amount,
        required: Amount,
    },
}

/// Broad error classes used by callers to decide how to react
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Rejected before any mutation; resubmit with corrected input
    InvalidInput,
    /// Missing role or allowance
    InsufficientAuthorization,
    /// Named arithmetic guard tripped
    ArithmeticGuard,
    /// Component is in a state that forbids the call
    OperationalState,
}

impl HuckError {
    /// Returns a human-readable error code for logging/debugging
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidPool { .. } => "E001_INVALID_POOL",
            Self::ZeroAmount => "E002_ZERO_AMOUNT",
            Self::InsufficientStake { .. } => "E003_INSUFFICIENT_STAKE",
            Self::InsufficientBalance { .. } => "E004_INSUFFICIENT_BALANCE",
            Self::InsufficientShares { .. } => "E005_INSUFFICIENT_SHARES",
            Self::NothingToDeposit => "E006_NOTHING_TO_DEPOSIT",
            Self::NothingToWithdraw => "E007_NOTHING_TO_WITHDRAW",
            Self::TooSmallShares { .. } => "E008_TOO_SMALL_SHARES",
            Self::InvalidTimeWindow { .. } => "E009_INVALID_WINDOW",
            Self::FeeTooHigh { .. } => "E010_FEE_TOO_HIGH",
            Self::InvalidAddress { .. } => "E011_INVALID_ADDRESS",
            Self::UnknownAsset { .. } => "E012_UNKNOWN_ASSET",
            Self::ForbiddenToken { .. } => "E013_FORBIDDEN_TOKEN",
            Self::InvalidInput { .. } => "E014_INVALID_INPUT",
            Self::Unauthorized { .. } => "E020_UNAUTHORIZED",
            Self::InsufficientAllowance { .. } => "E021_INSUFFICIENT_ALLOWANCE",
            Self::Overflow => "E030_OVERFLOW",
            Self::Underflow => "E031_UNDERFLOW",
            Self::DivisionByZero => "E032_DIV_ZERO",
            Self::ProtocolPaused => "E040_PAUSED",
            Self::NotPaused => "E041_NOT_PAUSED",
            Self::AlreadyInitialized => "E042_ALREADY_INITIALIZED",
            Self::NotInitialized => "E043_NOT_INITIALIZED",
            Self::InsufficientRewardReserve { .. } => "E044_REWARD_RESERVE",
        }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized { .. } | Self::InsufficientAllowance { .. } => {
                ErrorCategory::InsufficientAuthorization
            }
            Self::Overflow | Self::Underflow | Self::DivisionByZero => {
                ErrorCategory::ArithmeticGuard
            }
            Self::ProtocolPaused
            | Self::NotPaused
            | Self::AlreadyInitialized
            | Self::NotInitialized
            | Self::InsufficientRewardReserve { .. } => ErrorCategory::OperationalState,
            _ => ErrorCategory::InvalidInput,
        }
    }

    /// Returns true if this error is recoverable (user can fix it)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InsufficientBalance { .. } => true,   // Get more funds
            Self::InsufficientAllowance { .. } => true, // Approve more
            Self::ProtocolPaused => true,               // Wait for unpause
            _ => self.category() == ErrorCategory::InvalidInput,
        }
    }
}

fn short_hex(bytes: &[u8; 32]) -> String {
    bytes[..4].iter().map(|b| format!("{b:02x}")).collect()
}
