//! Core Types
//!
//! Identifiers and small value types shared by every component.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 32-byte account identifier
pub type AccountId = [u8; 32];

/// 32-byte asset identifier
pub type AssetId = [u8; 32];

/// Token amount in base units
pub type Amount = u128;

/// Reward pool identifier (registry index at insertion)
pub type PoolId = u64;

/// The all-zero account, never a valid recipient
pub const ZERO_ACCOUNT: AccountId = [0u8; 32];

/// Domain separators for identifier derivation
const ACCOUNT_DOMAIN: &[u8] = b"huckleberry/account";
const ASSET_DOMAIN: &[u8] = b"huckleberry/asset";

/// Derive a deterministic account id from a human-readable label
pub fn account_id(label: &str) -> AccountId {
    derive_id(ACCOUNT_DOMAIN, label)
}

/// Derive a deterministic asset id from a ticker or label
pub fn asset_id(label: &str) -> AssetId {
    derive_id(ASSET_DOMAIN, label)
}

fn derive_id(domain: &[u8], label: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(domain);
    hasher.update(label.as_bytes());
    hasher.finalize().into()
}

/// True for the all-zero account
pub fn is_zero_account(account: &AccountId) -> bool {
    account == &ZERO_ACCOUNT
}

/// Vault fee kinds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum FeeKind {
    /// Share of each harvest sent to the treasury
    Performance = 0,
    /// Share of each harvest paid to the harvest caller
    Call = 1,
}
