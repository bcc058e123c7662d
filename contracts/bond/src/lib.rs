//! Bond Converter
//!
//! Wraps one tax-bearing underlying token into a share token with a floating
//! exchange rate. The first deposit mints shares 1:1; later deposits mint at
//! the prevailing rate `total_locked / total_shares`. Withdrawals burn shares
//! and release the proportional slice of everything the converter holds.
//!
//! `total_locked` is the converter's observed balance of the underlying.
//! Reflection tax credited to the converter by unrelated transfers raises it
//! without minting shares, so the rate appreciates for every holder.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use huckleberry_common::{
    asset::AssetLedger,
    context::CallContext,
    errors::{HuckError, HuckResult},
    events::HuckEvent,
    math::{mul_div, price_per_full_share, safe_add, safe_sub},
    types::{AccountId, Amount, AssetId},
};

// ============ Types ============

/// Snapshot of the converter's books
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize,
)]
pub struct BondLedger {
    /// Shares outstanding
    pub total_shares: Amount,
    /// Underlying held by the converter
    pub total_locked: Amount,
}

impl BondLedger {
    /// Underlying per share, scaled by 1e18 (1e18 with no shares)
    pub fn exchange_rate(&self) -> HuckResult<Amount> {
        price_per_full_share(self.total_locked, self.total_shares)
    }

    /// Shares minted for `locked` newly locked underlying
    pub fn shares_for(&self, locked: Amount) -> HuckResult<Amount> {
        if self.total_shares == 0 || self.total_locked == 0 {
            return Ok(locked);
        }
        mul_div(locked, self.total_shares, self.total_locked)
    }

    /// Underlying released for burning `shares`
    pub fn released_for(&self, shares: Amount) -> HuckResult<Amount> {
        if self.total_shares == 0 {
            return Err(HuckError::DivisionByZero);
        }
        mul_div(shares, self.total_locked, self.total_shares)
    }
}

/// Outcome of [`BondConverter::deposit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondDeposit {
    /// Underlying the caller sent
    pub amount: Amount,
    /// Underlying that actually arrived
    pub locked: Amount,
    /// Shares minted to the caller
    pub shares: Amount,
}

/// Outcome of [`BondConverter::withdraw`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BondWithdrawal {
    /// Shares burned
    pub shares: Amount,
    /// Underlying sent out (recipient may net less after tax)
    pub released: Amount,
    /// Underlying that reached the caller
    pub received: Amount,
}

// ============ Converter ============

/// Floating-rate share converter over one underlying asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondConverter {
    account: AccountId,
    underlying: AssetId,
    share_asset: AssetId,
    total_shares: Amount,
}

impl BondConverter {
    /// Converter holding `underlying` in `account` and minting `share_asset`
    pub fn new(account: AccountId, underlying: AssetId, share_asset: AssetId) -> HuckResult<Self> {
        if underlying == share_asset {
            return Err(HuckError::InvalidInput {
                param: "share_asset",
                reason: "must differ from the underlying",
            });
        }
        Ok(Self {
            account,
            underlying,
            share_asset,
            total_shares: 0,
        })
    }

    /// Custody account
    pub fn account(&self) -> AccountId {
        self.account
    }

    /// Token locked by the converter
    pub fn underlying(&self) -> AssetId {
        self.underlying
    }

    /// Share token minted by the converter
    pub fn share_asset(&self) -> AssetId {
        self.share_asset
    }

    /// Shares outstanding
    pub fn total_shares(&self) -> Amount {
        self.total_shares
    }

    /// Current books, reading the locked balance from the ledger
    pub fn ledger_state<L: AssetLedger>(&self, ledger: &L) -> BondLedger {
        BondLedger {
            total_shares: self.total_shares,
            total_locked: ledger.balance_of(&self.underlying, &self.account),
        }
    }

    /// Underlying per share, scaled by 1e18
    pub fn exchange_rate<L: AssetLedger>(&self, ledger: &L) -> HuckResult<Amount> {
        self.ledger_state(ledger).exchange_rate()
    }

    /// Shares `locked` underlying would mint right now
    pub fn preview_deposit<L: AssetLedger>(&self, ledger: &L, locked: Amount) -> HuckResult<Amount> {
        self.ledger_state(ledger).shares_for(locked)
    }

    /// Underlying `shares` would release right now
    pub fn preview_withdraw<L: AssetLedger>(&self, ledger: &L, shares: Amount) -> HuckResult<Amount> {
        self.ledger_state(ledger).released_for(shares)
    }

    /// Lock `amount` of underlying from the caller and mint shares
    ///
    /// The caller must have approved the converter's account. Shares are
    /// priced on the amount that actually arrived.
    pub fn deposit<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        ledger: &mut L,
        amount: Amount,
    ) -> HuckResult<BondDeposit> {
        // 1. Amount must be positive
        if amount == 0 {
            return Err(HuckError::ZeroAmount);
        }
        let user = ctx.caller();

        // 2. Pull the underlying and measure what arrived
        let before = self.ledger_state(ledger);
        ledger.transfer_from(&self.underlying, &self.account, &user, &self.account, amount)?;
        let after = ledger.balance_of(&self.underlying, &self.account);
        let locked = safe_sub(after, before.total_locked)?;

        // 3. Price against the books before the deposit
        let shares = before.shares_for(locked)?;
        if shares == 0 {
            return Err(HuckError::TooSmallShares { amount });
        }

        // 4. Mint
        self.total_shares = safe_add(self.total_shares, shares)?;
        ledger.mint(&self.share_asset, &user, shares)?;

        debug!(amount, locked, shares, "bond deposit");
        ctx.emit(HuckEvent::BondDeposited {
            user,
            amount,
            locked,
            shares,
            timestamp: ctx.now(),
        });
        Ok(BondDeposit {
            amount,
            locked,
            shares,
        })
    }

    /// Burn `shares` from the caller and release their slice of the underlying
    pub fn withdraw<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        ledger: &mut L,
        shares: Amount,
    ) -> HuckResult<BondWithdrawal> {
        let user = ctx.caller();

        // 1. Price first; fails with DivisionByZero when nothing is outstanding
        let books = self.ledger_state(ledger);
        let released = books.released_for(shares)?;

        // 2. Caller must own the shares
        let owned = ledger.balance_of(&self.share_asset, &user);
        if owned < shares {
            return Err(HuckError::InsufficientShares {
                owned,
                requested: shares,
            });
        }

        // 3. Burn, then release
        self.total_shares = safe_sub(self.total_shares, shares)?;
        ledger.burn(&self.share_asset, &user, shares)?;
        let received = if released > 0 {
            ledger.transfer(&self.underlying, &self.account, &user, released)?
        } else {
            0
        };

        info!(shares, released, "bond withdraw");
        ctx.emit(HuckEvent::BondWithdrawn {
            user,
            shares,
            released,
            timestamp: ctx.now(),
        });
        Ok(BondWithdrawal {
            shares,
            released,
            received,
        })
    }
}
