//! Protocol Events
//!
//! Domain events are appended during execution and can be indexed off-chain.
//! The log is append-only: each emitted event extends a SHA-256 hash chain,
//! so a consumer holding the head digest can verify it replayed the exact
//! sequence.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::access_control::Role;
use crate::types::{AccountId, Amount, AssetId, FeeKind, PoolId};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Reward Pool Events (0x01 - 0x1F)
    PoolAdded = 0x01,
    PoolUpdated = 0x02,
    Deposited = 0x03,
    Withdrawn = 0x04,
    RewardPaid = 0x05,
    EmergencyWithdrawn = 0x06,
    RewardReserveSwept = 0x07,

    // Bond Events (0x20 - 0x3F)
    BondDeposited = 0x20,
    BondWithdrawn = 0x21,

    // Vault Events (0x40 - 0x5F)
    VaultDeposited = 0x40,
    VaultWithdrawn = 0x41,
    Harvested = 0x42,
    FeeUpdated = 0x43,
    TreasuryUpdated = 0x44,
    TokensRecovered = 0x45,

    // Protocol Events (0x80 - 0x9F)
    Paused = 0x80,
    Unpaused = 0x81,
    RoleGranted = 0x82,
    RoleRevoked = 0x83,
}

/// Main event enum containing all protocol events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum HuckEvent {
    // ============ Reward Pool Events ============

    /// Emitted when the operator registers a new pool
    PoolAdded {
        pid: PoolId,
        stake_asset: AssetId,
        reward_asset: AssetId,
        reward_per_second: Amount,
        start_time: u64,
        end_time: u64,
        timestamp: u64,
    },

    /// Emitted when a pool's emission rate or end time changes
    PoolUpdated {
        pid: PoolId,
        reward_per_second: Amount,
        end_time: u64,
        timestamp: u64,
    },

    /// Emitted when stake enters a pool (amount actually received)
    Deposited {
        user: AccountId,
        pid: PoolId,
        amount: Amount,
        timestamp: u64,
    },

    /// Emitted when stake leaves a pool
    Withdrawn {
        user: AccountId,
        pid: PoolId,
        amount: Amount,
        timestamp: u64,
    },

    /// Emitted when pending reward is paid out
    RewardPaid {
        user: AccountId,
        pid: PoolId,
        amount: Amount,
        timestamp: u64,
    },

    /// Emitted when a staker exits without reward
    EmergencyWithdrawn {
        user: AccountId,
        pid: PoolId,
        amount: Amount,
        timestamp: u64,
    },

    /// Emitted when the operator sweeps the unallocated reward reserve
    RewardReserveSwept {
        asset: AssetId,
        to: AccountId,
        amount: Amount,
        timestamp: u64,
    },

    // ============ Bond Events ============

    /// Emitted when underlying is locked for bond shares
    BondDeposited {
        user: AccountId,
        amount: Amount,
        locked: Amount,
        shares: Amount,
        timestamp: u64,
    },

    /// Emitted when bond shares are burned for underlying
    BondWithdrawn {
        user: AccountId,
        shares: Amount,
        released: Amount,
        timestamp: u64,
    },

    // ============ Vault Events ============

    /// Emitted on vault deposit
    VaultDeposited {
        user: AccountId,
        amount: Amount,
        shares: Amount,
        last_deposited_time: u64,
    },

    /// Emitted on vault withdrawal
    VaultWithdrawn {
        user: AccountId,
        amount: Amount,
        shares: Amount,
        timestamp: u64,
    },

    /// Emitted when pending rewards are compounded
    Harvested {
        sender: AccountId,
        total_pending: Amount,
        caller_reward: Amount,
        performance_reward: Amount,
        compounded_shares: Amount,
        timestamp: u64,
    },

    /// Emitted when a vault fee changes
    FeeUpdated {
        kind: FeeKind,
        old_bps: u64,
        new_bps: u64,
        timestamp: u64,
    },

    /// Emitted when the treasury address changes
    TreasuryUpdated {
        old_treasury: AccountId,
        new_treasury: AccountId,
        timestamp: u64,
    },

    /// Emitted when foreign tokens are recovered from the vault
    TokensRecovered {
        asset: AssetId,
        to: AccountId,
        amount: Amount,
        timestamp: u64,
    },

    // ============ Protocol Events ============

    /// Emitted when a component is paused
    Paused { by: AccountId, timestamp: u64 },

    /// Emitted when a component is unpaused
    Unpaused { by: AccountId, timestamp: u64 },

    /// Emitted when a role is granted
    RoleGranted {
        account: AccountId,
        role: Role,
        by: AccountId,
        timestamp: u64,
    },

    /// Emitted when a role is revoked
    RoleRevoked {
        account: AccountId,
        role: Role,
        by: AccountId,
        timestamp: u64,
    },
}

impl HuckEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::PoolAdded { .. } => EventType::PoolAdded,
            Self::PoolUpdated { .. } => EventType::PoolUpdated,
            Self::Deposited { .. } => EventType::Deposited,
            Self::Withdrawn { .. } => EventType::Withdrawn,
            Self::RewardPaid { .. } => EventType::RewardPaid,
            Self::EmergencyWithdrawn { .. } => EventType::EmergencyWithdrawn,
            Self::RewardReserveSwept { .. } => EventType::RewardReserveSwept,
            Self::BondDeposited { .. } => EventType::BondDeposited,
            Self::BondWithdrawn { .. } => EventType::BondWithdrawn,
            Self::VaultDeposited { .. } => EventType::VaultDeposited,
            Self::VaultWithdrawn { .. } => EventType::VaultWithdrawn,
            Self::Harvested { .. } => EventType::Harvested,
            Self::FeeUpdated { .. } => EventType::FeeUpdated,
            Self::TreasuryUpdated { .. } => EventType::TreasuryUpdated,
            Self::TokensRecovered { .. } => EventType::TokensRecovered,
            Self::Paused { .. } => EventType::Paused,
            Self::Unpaused { .. } => EventType::Unpaused,
            Self::RoleGranted { .. } => EventType::RoleGranted,
            Self::RoleRevoked { .. } => EventType::RoleRevoked,
        }
    }

    /// Get the timestamp when the event occurred
    pub fn timestamp(&self) -> u64 {
        match self {
            Self::PoolAdded { timestamp, .. }
            | Self::PoolUpdated { timestamp, .. }
            | Self::Deposited { timestamp, .. }
            | Self::Withdrawn { timestamp, .. }
            | Self::RewardPaid { timestamp, .. }
            | Self::EmergencyWithdrawn { timestamp, .. }
            | Self::RewardReserveSwept { timestamp, .. }
            | Self::BondDeposited { timestamp, .. }
            | Self::BondWithdrawn { timestamp, .. }
            | Self::VaultWithdrawn { timestamp, .. }
            | Self::Harvested { timestamp, .. }
            | Self::FeeUpdated { timestamp, .. }
            | Self::TreasuryUpdated { timestamp, .. }
            | Self::TokensRecovered { timestamp, .. }
            | Self::Paused { timestamp, .. }
            | Self::Unpaused { timestamp, .. }
            | Self::RoleGranted { timestamp, .. }
            | Self::RoleRevoked { timestamp, .. } => *timestamp,
            Self::VaultDeposited {
                last_deposited_time,
                ..
            } => *last_deposited_time,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Append-only event log with a chained head digest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<HuckEvent>,
    head: [u8; 32],
}

impl EventLog {
    /// Create a new empty event log
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit an event (append to log)
    pub fn emit(&mut self, event: HuckEvent) {
        self.head = chain(&self.head, &event);
        self.events.push(event);
    }

    /// Append every event of `other`, in order
    pub fn extend(&mut self, other: EventLog) {
        for event in other.events {
            self.emit(event);
        }
    }

    /// Get all events
    pub fn events(&self) -> &[HuckEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<HuckEvent> {
        self.events
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&HuckEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&HuckEvent> {
        self.events.last()
    }

    /// Check if any events were emitted
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Get number of events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when nothing was emitted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Digest committing to every event emitted so far
    pub fn head(&self) -> [u8; 32] {
        self.head
    }

    /// Recompute the chain over `events` from the empty digest
    pub fn verify(events: &[HuckEvent], head: &[u8; 32]) -> bool {
        let computed = events
            .iter()
            .fold([0u8; 32], |acc, event| chain(&acc, event));
        &computed == head
    }
}

fn chain(previous: &[u8; 32], event: &HuckEvent) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(previous);
    hasher.update(event.to_bytes());
    hasher.finalize().into()
}
