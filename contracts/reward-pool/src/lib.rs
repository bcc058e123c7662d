//! Reward Pool Registry
//!
//! Owns a list of time-windowed reward pools. Each pool pairs one staking
//! asset with one reward asset and emits a fixed amount per second between
//! its start and end time, shared among stakers in proportion to stake.
//!
//! ## Flow
//!
//! Every state-changing call first brings the pool's accumulator up to the
//! call's timestamp, then settles the caller's pending reward, then applies
//! the stake change and resets the caller's reward debt. A zero-amount
//! deposit or withdrawal is therefore a plain reward claim.
//!
//! Stake and reward custody live in the registry's own ledger account.
//! Reward payouts are drawn only from the reward reserve: the registry's
//! balance of the reward asset minus the stake it holds in that asset.

pub mod pool;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use huckleberry_common::{
    access_control::{check_permission, AccessControl, Role},
    asset::AssetLedger,
    context::CallContext,
    errors::{HuckError, HuckResult},
    events::HuckEvent,
    lifecycle::Lifecycle,
    math::{accumulator_scale, safe_add, safe_sub},
    types::{AccountId, Amount, AssetId, PoolId},
};

pub use pool::{advance, Pool, UserStake};

// ============ Registry Config ============

/// Configuration installed by [`RewardRegistry::finalize`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Role administrator
    pub admin: AccountId,
    /// Pool operator
    pub operator: AccountId,
}

/// Outcome of a deposit or withdrawal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StakeReceipt {
    /// Pool touched
    pub pid: PoolId,
    /// Stake credited (deposit) or sent back (withdraw)
    pub amount: Amount,
    /// Reward paid out by this call
    pub reward_paid: Amount,
}

// ============ Registry ============

/// Multi-pool reward registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardRegistry {
    account: AccountId,
    access: Lifecycle<AccessControl>,
    pools: Vec<Pool>,
    stakes: Vec<BTreeMap<AccountId, UserStake>>,
}

impl RewardRegistry {
    /// Uninitialized registry holding custody in `account`
    pub fn new(account: AccountId) -> Self {
        Self {
            account,
            access: Lifecycle::default(),
            pools: Vec::new(),
            stakes: Vec::new(),
        }
    }

    /// Install roles; allowed once
    pub fn finalize(&mut self, config: RegistryConfig, now: u64) -> HuckResult<()> {
        if self.access.is_ready() {
            return Err(HuckError::AlreadyInitialized);
        }
        let access = AccessControl::new(config.admin, config.operator, now)?;
        self.access.finalize(access)?;
        info!("reward registry initialized");
        Ok(())
    }

    /// Custody account
    pub fn account(&self) -> AccountId {
        self.account
    }

    /// Role registry, once initialized
    pub fn access(&self) -> HuckResult<&AccessControl> {
        self.access.get()
    }

    /// Grant a role; admin only
    pub fn grant_role(&mut self, ctx: &mut CallContext, account: AccountId, role: Role) -> HuckResult<bool> {
        self.access.get_mut()?.grant_role(ctx, account, role)
    }

    /// Revoke a role; admin only
    pub fn revoke_role(&mut self, ctx: &mut CallContext, account: AccountId, role: Role) -> HuckResult<bool> {
        self.access.get_mut()?.revoke_role(ctx, account, role)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Number of pools ever added
    pub fn pool_length(&self) -> u64 {
        self.pools.len() as u64
    }

    /// Stored state of a pool
    pub fn pool_info(&self, pid: PoolId) -> HuckResult<&Pool> {
        let idx = self.pool_index(pid)?;
        Ok(&self.pools[idx])
    }

    /// Position of `account` in a pool (zeroed if it never staked)
    pub fn user_info(&self, pid: PoolId, account: &AccountId) -> HuckResult<UserStake> {
        let idx = self.pool_index(pid)?;
        Ok(self.stakes[idx].get(account).copied().unwrap_or_default())
    }

    /// Reward `account` could claim at `now`
    pub fn pending_reward(&self, pid: PoolId, account: &AccountId, now: u64) -> HuckResult<Amount> {
        let idx = self.pool_index(pid)?;
        let pool = advance(&self.pools[idx], now)?;
        let stake = self.stakes[idx].get(account).copied().unwrap_or_default();
        pool.pending_for(&stake)
    }

    /// Balance of `asset` available for reward payouts
    pub fn reward_reserve<L: AssetLedger>(&self, ledger: &L, asset: &AssetId) -> HuckResult<Amount> {
        let custody = self
            .pools
            .iter()
            .filter(|pool| &pool.stake_asset == asset)
            .try_fold(0u128, |acc, pool| safe_add(acc, pool.current_supply))?;
        Ok(ledger.balance_of(asset, &self.account).saturating_sub(custody))
    }

    fn pool_index(&self, pid: PoolId) -> HuckResult<usize> {
        usize::try_from(pid)
            .ok()
            .filter(|idx| *idx < self.pools.len())
            .ok_or(HuckError::InvalidPool {
                pid,
                pool_count: self.pools.len() as u64,
            })
    }

    // ========================================================================
    // Operator Functions
    // ========================================================================

    /// Register a new pool; operator only. Returns its id.
    pub fn add_pool<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        ledger: &L,
        stake_asset: AssetId,
        reward_asset: AssetId,
        start_time: u64,
        end_time: u64,
        reward_per_second: Amount,
    ) -> HuckResult<PoolId> {
        // 1. Operator only
        check_permission(self.access.get()?, &ctx.caller(), Role::Operator)?;

        // 2. Scale the accumulator for the decimal gap between the assets
        let acc_scale = accumulator_scale(ledger.decimals(&stake_asset)?, ledger.decimals(&reward_asset)?)?;

        // 3. Validate the window and append
        let pool = Pool::new(
            stake_asset,
            reward_asset,
            reward_per_second,
            start_time,
            end_time,
            acc_scale,
            ctx.now(),
        )?;
        let pid = self.pools.len() as PoolId;
        self.pools.push(pool);
        self.stakes.push(BTreeMap::new());

        info!(pid, start_time, end_time, reward_per_second, "pool added");
        ctx.emit(HuckEvent::PoolAdded {
            pid,
            stake_asset,
            reward_asset,
            reward_per_second,
            start_time,
            end_time,
            timestamp: ctx.now(),
        });
        Ok(pid)
    }

    /// Change emission rate and end time; operator only
    ///
    /// Reward up to now is accounted at the old rate first. Emission does
    /// not resume for time that passed after the old end.
    pub fn set_pool(
        &mut self,
        ctx: &mut CallContext,
        pid: PoolId,
        reward_per_second: Amount,
        end_time: u64,
    ) -> HuckResult<()> {
        check_permission(self.access.get()?, &ctx.caller(), Role::Operator)?;
        let idx = self.pool_index(pid)?;
        let now = ctx.now();

        let mut pool = advance(&self.pools[idx], now)?;
        if end_time <= pool.start_time {
            return Err(HuckError::InvalidTimeWindow {
                start_time: pool.start_time,
                end_time,
            });
        }
        pool.reward_per_second = reward_per_second;
        pool.end_time = end_time;
        pool.last_reward_time = pool.last_reward_time.max(now.min(end_time));
        self.pools[idx] = pool;

        info!(pid, reward_per_second, end_time, "pool updated");
        ctx.emit(HuckEvent::PoolUpdated {
            pid,
            reward_per_second,
            end_time,
            timestamp: now,
        });
        Ok(())
    }

    /// Transfer the unallocated reward reserve of `asset` to `to`; operator only
    pub fn sweep_reward_reserve<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        ledger: &mut L,
        asset: AssetId,
        to: AccountId,
    ) -> HuckResult<Amount> {
        check_permission(self.access.get()?, &ctx.caller(), Role::Operator)?;
        let amount = self.reward_reserve(ledger, &asset)?;
        if amount > 0 {
            ledger.transfer(&asset, &self.account, &to, amount)?;
        }

        info!(amount, "reward reserve swept");
        ctx.emit(HuckEvent::RewardReserveSwept {
            asset,
            to,
            amount,
            timestamp: ctx.now(),
        });
        Ok(amount)
    }

    // ========================================================================
    // Staking
    // ========================================================================

    /// Bring one pool up to the call's timestamp
    pub fn update_pool(&mut self, ctx: &CallContext, pid: PoolId) -> HuckResult<&Pool> {
        self.access.get()?;
        let idx = self.pool_index(pid)?;
        self.pools[idx] = advance(&self.pools[idx], ctx.now())?;
        Ok(&self.pools[idx])
    }

    /// Bring every pool up to the call's timestamp
    pub fn mass_update_pools(&mut self, ctx: &CallContext) -> HuckResult<()> {
        self.access.get()?;
        for pool in self.pools.iter_mut() {
            *pool = advance(pool, ctx.now())?;
        }
        Ok(())
    }

    /// Stake `amount` (zero claims only) and collect pending reward
    pub fn deposit<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        ledger: &mut L,
        pid: PoolId,
        amount: Amount,
    ) -> HuckResult<StakeReceipt> {
        self.access.get()?;
        let idx = self.pool_index(pid)?;
        let user = ctx.caller();

        // 1. Account reward up to now
        self.pools[idx] = advance(&self.pools[idx], ctx.now())?;

        // 2. Reward owed to the existing stake
        let existing = self.stakes[idx].get(&user).copied();
        let mut stake = existing.unwrap_or_default();
        let pending = self.pools[idx].pending_for(&stake)?;

        // 3. Pull the new stake; credit what actually arrived
        let received = if amount > 0 {
            let stake_asset = self.pools[idx].stake_asset;
            ledger.transfer_from(&stake_asset, &self.account, &user, &self.account, amount)?
        } else {
            0
        };

        // 4. Apply the stake change and reset the debt
        let pool = &mut self.pools[idx];
        pool.current_supply = safe_add(pool.current_supply, received)?;
        stake.amount = safe_add(stake.amount, received)?;
        stake.reward_debt = pool.accrued(stake.amount)?;
        if existing.is_some() || received > 0 {
            self.stakes[idx].insert(user, stake);
        }

        // 5. Pay out
        self.pay_reward(ctx, ledger, idx, user, pending)?;

        debug!(pid, amount = received, reward = pending, "deposit");
        ctx.emit(HuckEvent::Deposited {
            user,
            pid,
            amount: received,
            timestamp: ctx.now(),
        });
        Ok(StakeReceipt {
            pid,
            amount: received,
            reward_paid: pending,
        })
    }

    /// Unstake `amount` (zero claims only) and collect pending reward
    pub fn withdraw<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        ledger: &mut L,
        pid: PoolId,
        amount: Amount,
    ) -> HuckResult<StakeReceipt> {
        self.access.get()?;
        let idx = self.pool_index(pid)?;
        let user = ctx.caller();

        // 1. Stake must cover the withdrawal
        let existing = self.stakes[idx].get(&user).copied();
        let mut stake = existing.unwrap_or_default();
        if amount > stake.amount {
            return Err(HuckError::InsufficientStake {
                pid,
                staked: stake.amount,
                requested: amount,
            });
        }

        // 2. Account reward up to now and settle the existing stake
        self.pools[idx] = advance(&self.pools[idx], ctx.now())?;
        let pending = self.pools[idx].pending_for(&stake)?;

        // 3. Apply the stake change and reset the debt
        let pool = &mut self.pools[idx];
        pool.current_supply = safe_sub(pool.current_supply, amount)?;
        stake.amount -= amount;
        stake.reward_debt = pool.accrued(stake.amount)?;
        let stake_asset = pool.stake_asset;
        if existing.is_some() {
            self.stakes[idx].insert(user, stake);
        }

        // 4. Pay out reward, then return stake
        self.pay_reward(ctx, ledger, idx, user, pending)?;
        if amount > 0 {
            ledger.transfer(&stake_asset, &self.account, &user, amount)?;
        }

        debug!(pid, amount, reward = pending, "withdraw");
        ctx.emit(HuckEvent::Withdrawn {
            user,
            pid,
            amount,
            timestamp: ctx.now(),
        });
        Ok(StakeReceipt {
            pid,
            amount,
            reward_paid: pending,
        })
    }

    /// Return the caller's whole stake and forfeit pending reward
    pub fn emergency_withdraw<L: AssetLedger>(
        &mut self,
        ctx: &mut CallContext,
        ledger: &mut L,
        pid: PoolId,
    ) -> HuckResult<Amount> {
        self.access.get()?;
        let idx = self.pool_index(pid)?;
        let user = ctx.caller();

        // Remaining stakers keep the reward accrued before the exit
        self.pools[idx] = advance(&self.pools[idx], ctx.now())?;

        let existing = self.stakes[idx].get(&user).copied();
        let amount = existing.map(|stake| stake.amount).unwrap_or(0);
        let pool = &mut self.pools[idx];
        pool.current_supply = safe_sub(pool.current_supply, amount)?;
        let stake_asset = pool.stake_asset;
        if existing.is_some() {
            self.stakes[idx].insert(user, UserStake::default());
        }

        if amount > 0 {
            ledger.transfer(&stake_asset, &self.account, &user, amount)?;
        }

        info!(pid, amount, "emergency withdraw");
        ctx.emit(HuckEvent::EmergencyWithdrawn {
            user,
            pid,
            amount,
            timestamp: ctx.now(),
        });
        Ok(amount)
    }

    fn pay_reward<L: AssetLedger>(
        &self,
        ctx: &mut CallContext,
        ledger: &mut L,
        idx: usize,
        to: AccountId,
        amount: Amount,
    ) -> HuckResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let reward_asset = self.pools[idx].reward_asset;
        let reserve = self.reward_reserve(ledger, &reward_asset)?;
        if reserve < amount {
            return Err(HuckError::InsufficientRewardReserve {
                pid: idx as PoolId,
                available: reserve,
                required: amount,
            });
        }
        ledger.transfer(&reward_asset, &self.account, &to, amount)?;
        ctx.emit(HuckEvent::RewardPaid {
            user: to,
            pid: idx as PoolId,
            amount,
            timestamp: ctx.now(),
        });
        Ok(())
    }
}
