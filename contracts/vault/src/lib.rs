//! Auto-Compounding Vault
//!
//! Users deposit bond shares and receive vault shares. The vault stakes
//! everything it holds into one designated reward pool whose reward asset is
//! the bond's underlying. A harvest claims the pool reward and bonds it, pays
//! the caller fee and the treasury's performance fee out of the minted bond
//! shares, and stakes the rest, which raises the price of every vault share.
//!
//! ## Accounting
//!
//! - `total_balance = available + staked`, both in bond shares
//! - `price_per_full_share = total_balance * 1e18 / total_shares`
//! - Conversions floor; `withdraw(amount)` is the one exception, see there
//!
//! The vault is built uninitialized ([`VaultBuilder`]) and configured once
//! through [`AutoCompoundVault::finalize`].

pub mod protocol;

#[cfg(test)]
mod integration_tests;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use huckleberry_bond::BondConverter;
use huckleberry_common::{
    access_control::{check_permission, AccessControl, Role},
    asset::AssetLedger,
    constants::fees,
    context::CallContext,
    emergency::PauseState,
    errors::{HuckError, HuckResult},
    events::HuckEvent,
    lifecycle::Lifecycle,
    math::{amount_to_shares, bps_of, price_per_full_share, safe_add, safe_sub, shares_to_amount},
    types::{is_zero_account, AccountId, Amount, AssetId, FeeKind, PoolId},
};
use huckleberry_reward_pool::RewardRegistry;

pub use protocol::{Protocol, World};

// ============ Vault Config ============

/// Configuration installed by [`AutoCompoundVault::finalize`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Pool the vault stakes into
    pub pool_id: PoolId,
    /// Role administrator
    pub admin: AccountId,
    /// Fee and pause operator
    pub operator: AccountId,
    /// Performance fee recipient
    pub treasury: AccountId,
    /// Treasury cut of each harvest (bps)
    pub performance_fee_bps: u64,
    /// Harvest caller cut of each harvest (bps)
    pub call_fee_bps: u64,
}

impl VaultConfig {
    /// Config with default fees
    pub fn new(pool_id: PoolId, admin: AccountId, operator: AccountId, treasury: AccountId) -> Self {
        Self {
            pool_id,
            admin,
            operator,
            treasury,
            performance_fee_bps: fees::DEFAULT_PERFORMANCE_FEE_BPS,
            call_fee_bps: fees::DEFAULT_CALL_FEE_BPS,
        }
    }
}

/// Settings of a finalized vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultSettings {
    /// Pool the vault stakes into
    pub pool_id: PoolId,
    /// Bond share token (deposit token)
    pub stake_asset: AssetId,
    /// Bond underlying (pool reward token)
    pub reward_asset: AssetId,
    /// Performance fee recipient
    pub treasury: AccountId,
    /// Treasury cut of each harvest (bps)
    pub performance_fee_bps: u64,
    /// Harvest caller cut of each harvest (bps)
    pub call_fee_bps: u64,
    /// Roles
    pub access: AccessControl,
}

// ============ Types ============

/// Per-user vault position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultUser {
    /// Vault shares owned
    pub shares: Amount,
    /// Time of the last deposit
    pub last_deposited_time: u64,
    /// Underlying value of `shares` right after the last action
    pub amount_at_last_action: Amount,
    /// Time of the last deposit or withdrawal
    pub last_action_time: u64,
}

/// Lifecycle of a user position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultUserState {
    /// No shares
    Empty,
    /// Holds shares
    Staked,
}

/// Outcome of a deposit or withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultReceipt {
    /// Bond shares moved
    pub amount: Amount,
    /// Vault shares minted or burned
    pub shares: Amount,
}

/// Outcome (or preview) of a harvest; all amounts in bond shares
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    /// Bond shares minted from the collected reward
    pub total_pending: Amount,
    /// Paid to the harvest caller
    pub caller_reward: Amount,
    /// Paid to the treasury
    pub performance_reward: Amount,
    /// Left in the vault and staked
    pub compounded_shares: Amount,
}

/// Components a vault call settles against
pub struct Collaborators<'a, L> {
    /// Reward registry holding the vault's stake
    pub registry: &'a mut RewardRegistry,
    /// Bond converter minting the stake asset
    pub bond: &'a mut BondConverter,
    /// Token ledger
    pub ledger: &'a mut L,
}

#[derive(Debug, Clone, Copy)]
struct Route {
    pool_id: PoolId,
    stake_asset: AssetId,
    reward_asset: AssetId,
}

// ============ Builder ============

/// Builds an uninitialized vault
#[derive(Debug, Clone)]
pub struct VaultBuilder {
    account: AccountId,
}

impl VaultBuilder {
    /// Vault whose custody lives in `account`
    pub fn new(account: AccountId) -> Self {
        Self { account }
    }

    /// Uninitialized vault; call [`AutoCompoundVault::finalize`] before use
    pub fn build(self) -> AutoCompoundVault {
        AutoCompoundVault {
            account: self.account,
            settings: Lifecycle::default(),
            pause: PauseState::new(),
            total_shares: 0,
            users: BTreeMap::new(),
            last_harvest_time: 0,
        }
    }
}

// ============ Vault ============

/// Share-based auto-compounding vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoCompoundVault {
    account: AccountId,
    settings: Lifecycle<VaultSettings>,
    pause: PauseState,
    total_shares: Amount,
    users: BTreeMap<AccountId, VaultUser>,
    last_harvest_time: u64,
}

impl AutoCompoundVault {
    /// Shorthand for [`VaultBuilder::new`]
    pub fn builder(account: AccountId) -> VaultBuilder {
        VaultBuilder::new(account)
    }

    /// Bind the vault to its pool and install roles and fees; allowed once
    pub fn finalize(
        &mut self,
        config: VaultConfig,
        registry: &RewardRegistry,
        bond: &BondConverter,
        now: u64,
    ) -> HuckResult<()> {
        if self.settings.is_ready() {
            return Err(HuckError::AlreadyInitialized);
        }

        // 1. The pool must stake bond shares for the bond's underlying
        let pool = registry.pool_info(config.pool_id)?;
        if pool.stake_asset != bond.share_asset() {
            return Err(HuckError::InvalidInput {
                param: "pool_id",
                reason: "pool does not stake the bond share token",
            });
        }
        if pool.reward_asset != bond.underlying() {
            return Err(HuckError::InvalidInput {
                param: "pool_id",
                reason: "pool does not reward the bond underlying",
            });
        }

        // 2. Treasury and fee ceilings
        if is_zero_account(&config.treasury) {
            return Err(HuckError::InvalidAddress {
                reason: "treasury cannot be the zero account",
            });
        }
        validate_fee(FeeKind::Performance, config.performance_fee_bps)?;
        validate_fee(FeeKind::Call, config.call_fee_bps)?;

        // 3. Install
        let access = AccessControl::new(config.admin, config.operator, now)?;
        self.settings.finalize(VaultSettings {
            pool_id: config.pool_id,
            stake_asset: pool.stake_asset,
            reward_asset: pool.reward_asset,
            treasury: config.treasury,
            performance_fee_bps: config.performance_fee_bps,
            call_fee_bps: config.call_fee_bps,
            access,
        })?;
        info!(pool_id = config.pool_id, "vault initialized");
        Ok(())
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Custody account
    pub fn account(&self) -> AccountId {
        self.account
    }

    /// Settings, once finalized
    pub fn settings(&self) -> HuckResult<&VaultSettings> {
        self.settings.get()
    }

    /// Vault shares outstanding
    pub fn total_shares(&self) -> Amount {
        self.total_shares
    }

    /// Time of the last harvest
    pub fn last_harvest_time(&self) -> u64 {
        self.last_harvest_time
    }

    /// Whether deposits and harvests are halted
    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    /// Position of `account`
    pub fn user_info(&self, account: &AccountId) -> VaultUser {
        self.users.get(account).copied().unwrap_or_default()
    }

    /// Whether `account` holds shares
    pub fn user_state(&self, account: &AccountId) -> VaultUserState {
        if self.user_info(account).shares > 0 {
            VaultUserState::Staked
        } else {
            VaultUserState::Empty
        }
    }

    /// Bond shares held by the vault but not staked
    pub fn available<L: AssetLedger>(&self, ledger: &L) -> HuckResult<Amount> {
        let route = self.route()?;
        Ok(ledger.balance_of(&route.stake_asset, &self.account))
    }

    /// Bond shares under management: available plus staked
    pub fn total_balance<L: AssetLedger>(&self, registry: &RewardRegistry, ledger: &L) -> HuckResult<Amount> {
        let route = self.route()?;
        let staked = registry.user_info(route.pool_id, &self.account)?.amount;
        safe_add(ledger.balance_of(&route.stake_asset, &self.account), staked)
    }

    /// Bond shares per vault share, scaled by 1e18
    pub fn get_price_per_full_share<L: AssetLedger>(
        &self,
        registry: &RewardRegistry,
        ledger: &L,
    ) -> HuckResult<Amount> {
        price_per_full_share(self.total_balance(registry, ledger)?, self.total_shares)
    }

    /// Vault shares `amount` bond shares convert to right now
    pub fn amount_to_shares<L: AssetLedger>(
        &self,
        registry: &RewardRegistry,
        ledger: &L,
        amount: Amount,
    ) -> HuckResult<Amount> {
        amount_to_shares(amount, self.total_balance(registry, ledger)?, self.total_shares)
    }

    /// Bond shares `shares` vault shares convert to right now
    pub fn shares_to_amount<L: AssetLedger>(
        &self,
        registry: &RewardRegistry,
        ledger: &L,
        shares: Amount,
    ) -> HuckResult<Amount> {
        shares_to_amount(shares, self.total_balance(registry, ledger)?, self.total_shares)
    }

    /// What a harvest at `now` would collect and pay
    ///
    /// Runs the harvest on scratch copies of every component, so transfer
    /// tax and its reflection land exactly as in a real call. The pause
    /// switch is ignored.
    pub fn preview_harvest<L: AssetLedger + Clone>(
        &self,
        registry: &RewardRegistry,
        bond: &BondConverter,
        ledger: &L,
        now: u64,
    ) -> HuckResult<HarvestSummary> {
        let mut vault = self.clone();
        let mut registry = registry.clone();
        let mut bond = bond.clone();
        let mut ledger = ledger.clone();
        let mut ctx = CallContext::new(self.account, now);
        let mut c = Collaborators {
            registry: &mut registry,
            bond: &mut bond,
            ledger: &mut ledger,
        };
        vault.compound(&mut ctx, &mut c)
    }

    fn route(&self) -> HuckResult<Route> {
        let settings = self.settings.get()?;
        Ok(Route {
            pool_id: settings.pool_id,
            stake_asset: settings.stake_asset,
            reward_asset: settings.reward_asset,
        })
    }

    // ========================================================================
    // User Functions
    // ========================================================================

    /// Deposit `amount` bond shares and stake them
    pub fn deposit<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        c: &mut Collaborators<'_, L>,
        amount: Amount,
    ) -> HuckResult<VaultReceipt> {
        let route = self.route()?;
        self.pause.ensure_not_paused()?;
        if amount == 0 {
            return Err(HuckError::NothingToDeposit);
        }
        let user = ctx.caller();

        // 1. Price against the books before the transfer
        let pool_before = self.total_balance(&*c.registry, &*c.ledger)?;
        let received = c.ledger.transfer_from(
            &route.stake_asset,
            &self.account,
            &user,
            &self.account,
            amount,
        )?;
        let shares = amount_to_shares(received, pool_before, self.total_shares)?;
        if shares == 0 {
            return Err(HuckError::TooSmallShares { amount });
        }

        // 2. Book the shares
        let mut info = self.user_info(&user);
        info.shares = safe_add(info.shares, shares)?;
        info.last_deposited_time = ctx.now();
        self.total_shares = safe_add(self.total_shares, shares)?;

        // 3. Stake everything idle
        self.earn(ctx, c, route)?;

        info.amount_at_last_action = self.shares_to_amount(&*c.registry, &*c.ledger, info.shares)?;
        info.last_action_time = ctx.now();
        self.users.insert(user, info);

        debug!(amount = received, shares, "vault deposit");
        ctx.emit(HuckEvent::VaultDeposited {
            user,
            amount: received,
            shares,
            last_deposited_time: ctx.now(),
        });
        Ok(VaultReceipt {
            amount: received,
            shares,
        })
    }

    /// Deposit the caller's whole bond share balance
    pub fn deposit_all<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        c: &mut Collaborators<'_, L>,
    ) -> HuckResult<VaultReceipt> {
        let route = self.route()?;
        let amount = c.ledger.balance_of(&route.stake_asset, &ctx.caller());
        self.deposit(ctx, c, amount)
    }

    /// Withdraw exactly `amount` bond shares, burning the shares it converts to
    ///
    /// The share count is floored while the full `amount` is paid, so the
    /// withdrawer keeps the rounding: up to one share's worth leaves the vault.
    pub fn withdraw<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        c: &mut Collaborators<'_, L>,
        amount: Amount,
    ) -> HuckResult<VaultReceipt> {
        let route = self.route()?;
        let shares = if self.total_shares == 0 {
            0
        } else {
            self.amount_to_shares(&*c.registry, &*c.ledger, amount)?
        };
        if shares == 0 {
            return Err(HuckError::TooSmallShares { amount });
        }
        self.withdraw_exact(ctx, c, route, shares, amount)
    }

    /// Burn `shares` vault shares for their bond share value
    pub fn withdraw_shares<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        c: &mut Collaborators<'_, L>,
        shares: Amount,
    ) -> HuckResult<VaultReceipt> {
        let route = self.route()?;
        if shares == 0 {
            return Err(HuckError::NothingToWithdraw);
        }
        let owned = self.user_info(&ctx.caller()).shares;
        if shares > owned {
            return Err(HuckError::InsufficientShares {
                owned,
                requested: shares,
            });
        }
        let amount = self.shares_to_amount(&*c.registry, &*c.ledger, shares)?;
        self.withdraw_exact(ctx, c, route, shares, amount)
    }

    /// Burn every share the caller owns
    pub fn withdraw_all<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        c: &mut Collaborators<'_, L>,
    ) -> HuckResult<VaultReceipt> {
        let shares = self.user_info(&ctx.caller()).shares;
        self.withdraw_shares(ctx, c, shares)
    }

    fn withdraw_exact<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        c: &mut Collaborators<'_, L>,
        route: Route,
        shares: Amount,
        amount: Amount,
    ) -> HuckResult<VaultReceipt> {
        let user = ctx.caller();

        // 1. Burn
        let mut info = self.user_info(&user);
        if shares > info.shares {
            return Err(HuckError::InsufficientShares {
                owned: info.shares,
                requested: shares,
            });
        }
        info.shares -= shares;
        self.total_shares = safe_sub(self.total_shares, shares)?;

        // 2. Unstake whatever the idle balance does not cover
        let available = c.ledger.balance_of(&route.stake_asset, &self.account);
        if available < amount {
            let staked = c.registry.user_info(route.pool_id, &self.account)?.amount;
            let shortfall = (amount - available).min(staked);
            if shortfall > 0 {
                let registry = &mut *c.registry;
                let ledger = &mut *c.ledger;
                ctx.as_caller(self.account, |ctx| {
                    registry.withdraw(ctx, ledger, route.pool_id, shortfall)
                })?;
            }
        }

        // 3. Pay out
        let payout = amount.min(c.ledger.balance_of(&route.stake_asset, &self.account));
        if payout > 0 {
            c.ledger
                .transfer(&route.stake_asset, &self.account, &user, payout)?;
        }

        info.amount_at_last_action = self.shares_to_amount(&*c.registry, &*c.ledger, info.shares)?;
        info.last_action_time = ctx.now();
        self.users.insert(user, info);

        debug!(amount = payout, shares, "vault withdraw");
        ctx.emit(HuckEvent::VaultWithdrawn {
            user,
            amount: payout,
            shares,
            timestamp: ctx.now(),
        });
        Ok(VaultReceipt {
            amount: payout,
            shares,
        })
    }

    /// Claim pool reward, bond it, pay fees in bond shares, stake the rest
    pub fn harvest<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        c: &mut Collaborators<'_, L>,
    ) -> HuckResult<HarvestSummary> {
        self.pause.ensure_not_paused()?;
        self.compound(ctx, c)
    }

    fn compound<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        c: &mut Collaborators<'_, L>,
    ) -> HuckResult<HarvestSummary> {
        let route = self.route()?;
        let (treasury, call_fee_bps, performance_fee_bps) = {
            let settings = self.settings.get()?;
            (settings.treasury, settings.call_fee_bps, settings.performance_fee_bps)
        };
        let caller = ctx.caller();

        // 1. Claim with a zero-amount deposit
        {
            let registry = &mut *c.registry;
            let ledger = &mut *c.ledger;
            ctx.as_caller(self.account, |ctx| registry.deposit(ctx, ledger, route.pool_id, 0))?;
        }

        // 2. Bond every held reward unit; an amount that would mint nothing
        //    waits for the next harvest
        let held = c.ledger.balance_of(&route.reward_asset, &self.account);
        let mut total_pending = 0;
        if held > 0 && c.bond.preview_deposit(&*c.ledger, held)? > 0 {
            let bond_account = c.bond.account();
            c.ledger
                .approve(&route.reward_asset, &self.account, &bond_account, held)?;
            let bond = &mut *c.bond;
            let ledger = &mut *c.ledger;
            let minted = ctx.as_caller(self.account, |ctx| bond.deposit(ctx, ledger, held))?;
            total_pending = minted.shares;
        }

        // 3. Fees come out of the minted bond shares
        let caller_reward = bps_of(total_pending, call_fee_bps)?;
        let performance_reward = bps_of(total_pending, performance_fee_bps)?;
        if caller_reward > 0 {
            c.ledger
                .transfer(&route.stake_asset, &self.account, &caller, caller_reward)?;
        }
        if performance_reward > 0 {
            c.ledger
                .transfer(&route.stake_asset, &self.account, &treasury, performance_reward)?;
        }
        let compounded_shares = safe_sub(total_pending, safe_add(caller_reward, performance_reward)?)?;

        // 4. Stake
        self.earn(ctx, c, route)?;
        self.last_harvest_time = ctx.now();

        info!(total_pending, caller_reward, performance_reward, compounded_shares, "harvest");
        ctx.emit(HuckEvent::Harvested {
            sender: caller,
            total_pending,
            caller_reward,
            performance_reward,
            compounded_shares,
            timestamp: ctx.now(),
        });
        Ok(HarvestSummary {
            total_pending,
            caller_reward,
            performance_reward,
            compounded_shares,
        })
    }

    /// Stake every idle bond share into the pool
    fn earn<L: AssetLedger>(
        &self,
        ctx: &mut CallContext,
        c: &mut Collaborators<'_, L>,
        route: Route,
    ) -> HuckResult<Amount> {
        let idle = c.ledger.balance_of(&route.stake_asset, &self.account);
        if idle == 0 {
            return Ok(0);
        }
        let registry_account = c.registry.account();
        c.ledger
            .approve(&route.stake_asset, &self.account, &registry_account, idle)?;

        let registry = &mut *c.registry;
        let ledger = &mut *c.ledger;
        let receipt = ctx.as_caller(self.account, |ctx| {
            registry.deposit(ctx, ledger, route.pool_id, idle)
        })?;
        Ok(receipt.amount)
    }

    // ========================================================================
    // Admin / Operator Functions
    // ========================================================================

    /// Change the treasury; admin only
    pub fn set_treasury(&mut self, ctx: &mut CallContext, treasury: AccountId) -> HuckResult<()> {
        let settings = self.settings.get_mut()?;
        check_permission(&settings.access, &ctx.caller(), Role::Admin)?;
        if is_zero_account(&treasury) {
            return Err(HuckError::InvalidAddress {
                reason: "treasury cannot be the zero account",
            });
        }

        let old_treasury = std::mem::replace(&mut settings.treasury, treasury);
        ctx.emit(HuckEvent::TreasuryUpdated {
            old_treasury,
            new_treasury: treasury,
            timestamp: ctx.now(),
        });
        Ok(())
    }

    /// Change the performance fee; operator only
    pub fn set_performance_fee(&mut self, ctx: &mut CallContext, bps: u64) -> HuckResult<()> {
        self.set_fee(ctx, FeeKind::Performance, bps)
    }

    /// Change the harvest caller fee; operator only
    pub fn set_call_fee(&mut self, ctx: &mut CallContext, bps: u64) -> HuckResult<()> {
        self.set_fee(ctx, FeeKind::Call, bps)
    }

    fn set_fee(&mut self, ctx: &mut CallContext, kind: FeeKind, bps: u64) -> HuckResult<()> {
        let settings = self.settings.get_mut()?;
        check_permission(&settings.access, &ctx.caller(), Role::Operator)?;
        validate_fee(kind, bps)?;

        let slot = match kind {
            FeeKind::Performance => &mut settings.performance_fee_bps,
            FeeKind::Call => &mut settings.call_fee_bps,
        };
        let old_bps = std::mem::replace(slot, bps);
        info!(kind = ?kind, old_bps, new_bps = bps, "fee updated");
        ctx.emit(HuckEvent::FeeUpdated {
            kind,
            old_bps,
            new_bps: bps,
            timestamp: ctx.now(),
        });
        Ok(())
    }

    /// Halt deposits and harvests; operator only
    pub fn pause(&mut self, ctx: &mut CallContext) -> HuckResult<()> {
        check_permission(&self.settings.get()?.access, &ctx.caller(), Role::Operator)?;
        self.pause.pause(ctx)
    }

    /// Resume deposits and harvests; operator only
    pub fn unpause(&mut self, ctx: &mut CallContext) -> HuckResult<()> {
        check_permission(&self.settings.get()?.access, &ctx.caller(), Role::Operator)?;
        self.pause.unpause(ctx)
    }

    /// Pull the whole stake out of the pool without reward and pause; admin only
    ///
    /// Users keep withdrawing from the idle balance afterwards.
    pub fn emergency_exit<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        c: &mut Collaborators<'_, L>,
    ) -> HuckResult<Amount> {
        let route = self.route()?;
        check_permission(&self.settings.get()?.access, &ctx.caller(), Role::Admin)?;

        let registry = &mut *c.registry;
        let ledger = &mut *c.ledger;
        let returned = ctx.as_caller(self.account, |ctx| {
            registry.emergency_withdraw(ctx, ledger, route.pool_id)
        })?;
        if !self.pause.is_paused() {
            self.pause.pause(ctx)?;
        }
        info!(returned, "vault emergency exit");
        Ok(returned)
    }

    /// Send the vault's balance of a foreign `asset` to the admin caller
    pub fn recover_stuck_tokens<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        ledger: &mut L,
        asset: AssetId,
    ) -> HuckResult<Amount> {
        let route = self.route()?;
        check_permission(&self.settings.get()?.access, &ctx.caller(), Role::Admin)?;
        if asset == route.stake_asset {
            return Err(HuckError::ForbiddenToken {
                reason: "token cannot be the deposit token",
            });
        }
        if asset == route.reward_asset {
            return Err(HuckError::ForbiddenToken {
                reason: "token cannot be the underlying of the deposit token",
            });
        }

        let amount = ledger.balance_of(&asset, &self.account);
        if amount > 0 {
            ledger.transfer(&asset, &self.account, &ctx.caller(), amount)?;
        }
        ctx.emit(HuckEvent::TokensRecovered {
            asset,
            to: ctx.caller(),
            amount,
            timestamp: ctx.now(),
        });
        Ok(amount)
    }

    /// Grant a vault role; admin only
    pub fn grant_role(&mut self, ctx: &mut CallContext, account: AccountId, role: Role) -> HuckResult<bool> {
        self.settings.get_mut()?.access.grant_role(ctx, account, role)
    }

    /// Revoke a vault role; admin only
    pub fn revoke_role(&mut self, ctx: &mut CallContext, account: AccountId, role: Role) -> HuckResult<bool> {
        self.settings.get_mut()?.access.revoke_role(ctx, account, role)
    }
}

fn validate_fee(kind: FeeKind, bps: u64) -> HuckResult<()> {
    let maximum = match kind {
        FeeKind::Performance => fees::MAX_PERFORMANCE_FEE_BPS,
        FeeKind::Call => fees::MAX_CALL_FEE_BPS,
    };
    if bps > maximum {
        return Err(HuckError::FeeTooHigh {
            kind,
            fee: bps,
            maximum,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use huckleberry_common::types::account_id;

    #[test]
    fn test_config_uses_default_fees() {
        let config = VaultConfig::new(3, account_id("admin"), account_id("operator"), account_id("treasury"));
        assert_eq!(config.pool_id, 3);
        assert_eq!(config.performance_fee_bps, 200);
        assert_eq!(config.call_fee_bps, 25);
    }

    #[test]
    fn test_validate_fee_ceilings() {
        assert!(validate_fee(FeeKind::Performance, 500).is_ok());
        assert!(validate_fee(FeeKind::Call, 100).is_ok());
        assert_eq!(
            validate_fee(FeeKind::Call, 101),
            Err(HuckError::FeeTooHigh { kind: FeeKind::Call, fee: 101, maximum: 100 })
        );
    }

    #[test]
    fn test_built_vault_is_empty_and_uninitialized() {
        let vault = AutoCompoundVault::builder(account_id("vault")).build();
        assert_eq!(vault.total_shares(), 0);
        assert!(!vault.is_paused());
        assert_eq!(vault.settings(), Err(HuckError::NotInitialized));
        assert_eq!(vault.user_state(&account_id("alice")), VaultUserState::Empty);
    }
}
