//! Asset Ledger
//!
//! Boundary to the fungible-token ledger every component settles against.
//! Transfers report the amount the recipient actually received: a taxed
//! asset delivers less than was sent, and callers must credit the returned
//! figure rather than the requested one.
//!
//! [`InMemoryLedger`] is the reference implementation: a multi-asset
//! balance book with optional reflection tax, where the tax withheld on a
//! transfer is redistributed pro rata to every other holder.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{fees, precision};
use crate::errors::{HuckError, HuckResult};
use crate::math::{bps_of, mul_div, safe_add, safe_sub};
use crate::types::{AccountId, Amount, AssetId};

/// Operations the protocol needs from a token ledger
pub trait AssetLedger {
    /// Move `amount` of `asset` owned by `from`; returns the amount `to` received
    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> HuckResult<Amount>;

    /// Move `amount` out of `from` using the allowance granted to `spender`
    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> HuckResult<Amount>;

    /// Set the allowance of `spender` over `owner`'s balance
    fn approve(
        &mut self,
        asset: &AssetId,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> HuckResult<()>;

    /// Balance of `account` (zero for unknown assets)
    fn balance_of(&self, asset: &AssetId, account: &AccountId) -> Amount;

    /// Remaining allowance of `spender` over `owner`'s balance
    fn allowance(&self, asset: &AssetId, owner: &AccountId, spender: &AccountId) -> Amount;

    /// Total supply of `asset`
    fn total_supply(&self, asset: &AssetId) -> Amount;

    /// Decimal places of `asset`
    fn decimals(&self, asset: &AssetId) -> HuckResult<u8>;

    /// Create `amount` new units for `to`
    fn mint(&mut self, asset: &AssetId, to: &AccountId, amount: Amount) -> HuckResult<()>;

    /// Destroy `amount` units held by `from`
    fn burn(&mut self, asset: &AssetId, from: &AccountId, amount: Amount) -> HuckResult<()>;
}

// ============================================================================
// In-memory ledger
// ============================================================================

/// Static description of an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    /// Ticker
    pub symbol: String,
    /// Decimal places (0-18)
    pub decimals: u8,
    /// Tax withheld on each transfer, in basis points
    pub transfer_tax_bps: u64,
}

impl AssetMetadata {
    /// Untaxed asset
    pub fn new(symbol: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
            transfer_tax_bps: 0,
        }
    }

    /// Same asset with a reflection tax
    pub fn with_transfer_tax(mut self, bps: u64) -> Self {
        self.transfer_tax_bps = bps;
        self
    }
}

#[derive(Debug, Clone)]
struct AssetBook {
    metadata: AssetMetadata,
    total_supply: Amount,
    balances: BTreeMap<AccountId, Amount>,
    allowances: BTreeMap<(AccountId, AccountId), Amount>,
    tax_exempt: BTreeSet<AccountId>,
}

impl AssetBook {
    fn balance(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn credit(&mut self, account: &AccountId, amount: Amount) -> HuckResult<()> {
        let next = safe_add(self.balance(account), amount)?;
        self.balances.insert(*account, next);
        Ok(())
    }

    fn debit(&mut self, account: &AccountId, amount: Amount) -> HuckResult<()> {
        let available = self.balance(account);
        if available < amount {
            return Err(HuckError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        self.balances.insert(*account, available - amount);
        Ok(())
    }

    fn is_taxed(&self, from: &AccountId, to: &AccountId) -> bool {
        self.metadata.transfer_tax_bps > 0
            && from != to
            && !self.tax_exempt.contains(from)
            && !self.tax_exempt.contains(to)
    }

    fn move_funds(&mut self, from: &AccountId, to: &AccountId, amount: Amount) -> HuckResult<Amount> {
        let tax = if self.is_taxed(from, to) {
            bps_of(amount, self.metadata.transfer_tax_bps)?
        } else {
            0
        };
        let received = safe_sub(amount, tax)?;

        self.debit(from, amount)?;
        self.credit(to, received)?;
        if tax > 0 {
            self.reflect(tax, from, to)?;
        }
        Ok(received)
    }

    /// Spread `tax` over every holder except the two transfer parties.
    /// Rounding dust, or the whole tax when nobody is eligible, is burned.
    fn reflect(&mut self, tax: Amount, from: &AccountId, to: &AccountId) -> HuckResult<()> {
        let eligible: Vec<(AccountId, Amount)> = self
            .balances
            .iter()
            .filter(|(account, balance)| **balance > 0 && *account != from && *account != to)
            .map(|(account, balance)| (*account, *balance))
            .collect();
        let base = eligible
            .iter()
            .try_fold(0u128, |acc, (_, balance)| safe_add(acc, *balance))?;

        let mut distributed: Amount = 0;
        if base > 0 {
            for (account, balance) in &eligible {
                let share = mul_div(tax, *balance, base)?;
                self.credit(account, share)?;
                distributed = safe_add(distributed, share)?;
            }
        }

        let burned = safe_sub(tax, distributed)?;
        self.total_supply = safe_sub(self.total_supply, burned)?;
        debug!(
            symbol = %self.metadata.symbol,
            tax,
            distributed,
            burned,
            "transfer tax reflected"
        );
        Ok(())
    }
}

/// Multi-asset in-memory ledger
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    assets: BTreeMap<AssetId, AssetBook>,
}

impl InMemoryLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new asset
    pub fn register_asset(&mut self, asset: AssetId, metadata: AssetMetadata) -> HuckResult<()> {
        if self.assets.contains_key(&asset) {
            return Err(HuckError::InvalidInput {
                param: "asset",
                reason: "already registered",
            });
        }
        if metadata.decimals > precision::MAX_TOKEN_DECIMALS {
            return Err(HuckError::InvalidInput {
                param: "decimals",
                reason: "more than 18 decimals",
            });
        }
        validate_tax(metadata.transfer_tax_bps)?;

        self.assets.insert(
            asset,
            AssetBook {
                metadata,
                total_supply: 0,
                balances: BTreeMap::new(),
                allowances: BTreeMap::new(),
                tax_exempt: BTreeSet::new(),
            },
        );
        Ok(())
    }

    /// Metadata of a registered asset
    pub fn metadata(&self, asset: &AssetId) -> HuckResult<&AssetMetadata> {
        self.book(asset).map(|book| &book.metadata)
    }

    /// Change the transfer tax of an asset
    pub fn set_transfer_tax(&mut self, asset: &AssetId, bps: u64) -> HuckResult<()> {
        validate_tax(bps)?;
        self.book_mut(asset)?.metadata.transfer_tax_bps = bps;
        Ok(())
    }

    /// Exclude an account from paying or triggering transfer tax
    pub fn exempt_from_tax(&mut self, asset: &AssetId, account: AccountId) -> HuckResult<()> {
        self.book_mut(asset)?.tax_exempt.insert(account);
        Ok(())
    }

    fn book(&self, asset: &AssetId) -> HuckResult<&AssetBook> {
        self.assets
            .get(asset)
            .ok_or(HuckError::UnknownAsset { asset: *asset })
    }

    fn book_mut(&mut self, asset: &AssetId) -> HuckResult<&mut AssetBook> {
        self.assets
            .get_mut(asset)
            .ok_or(HuckError::UnknownAsset { asset: *asset })
    }
}

fn validate_tax(bps: u64) -> HuckResult<()> {
    if bps > fees::MAX_TRANSFER_TAX_BPS {
        return Err(HuckError::InvalidInput {
            param: "transfer_tax_bps",
            reason: "exceeds 10000",
        });
    }
    Ok(())
}

impl AssetLedger for InMemoryLedger {
    fn transfer(
        &mut self,
        asset: &AssetId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> HuckResult<Amount> {
        self.book_mut(asset)?.move_funds(from, to, amount)
    }

    fn transfer_from(
        &mut self,
        asset: &AssetId,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> HuckResult<Amount> {
        let book = self.book_mut(asset)?;
        let key = (*from, *spender);
        let available = book.allowances.get(&key).copied().unwrap_or(0);
        if available < amount {
            return Err(HuckError::InsufficientAllowance {
                available,
                requested: amount,
            });
        }

        let received = book.move_funds(from, to, amount)?;
        if available != Amount::MAX {
            book.allowances.insert(key, available - amount);
        }
        Ok(received)
    }

    fn approve(
        &mut self,
        asset: &AssetId,
        owner: &AccountId,
        spender: &AccountId,
        amount: Amount,
    ) -> HuckResult<()> {
        self.book_mut(asset)?
            .allowances
            .insert((*owner, *spender), amount);
        Ok(())
    }

    fn balance_of(&self, asset: &AssetId, account: &AccountId) -> Amount {
        self.assets
            .get(asset)
            .map(|book| book.balance(account))
            .unwrap_or(0)
    }

    fn allowance(&self, asset: &AssetId, owner: &AccountId, spender: &AccountId) -> Amount {
        self.assets
            .get(asset)
            .and_then(|book| book.allowances.get(&(*owner, *spender)).copied())
            .unwrap_or(0)
    }

    fn total_supply(&self, asset: &AssetId) -> Amount {
        self.assets
            .get(asset)
            .map(|book| book.total_supply)
            .unwrap_or(0)
    }

    fn decimals(&self, asset: &AssetId) -> HuckResult<u8> {
        self.book(asset).map(|book| book.metadata.decimals)
    }

    fn mint(&mut self, asset: &AssetId, to: &AccountId, amount: Amount) -> HuckResult<()> {
        let book = self.book_mut(asset)?;
        book.total_supply = safe_add(book.total_supply, amount)?;
        book.credit(to, amount)
    }

    fn burn(&mut self, asset: &AssetId, from: &AccountId, amount: Amount) -> HuckResult<()> {
        let book = self.book_mut(asset)?;
        book.debit(from, amount)?;
        book.total_supply = safe_sub(book.total_supply, amount)?;
        Ok(())
    }
}
