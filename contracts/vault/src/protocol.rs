//! Transactional executor
//!
//! A [`World`] bundles the ledger with the registry, bond converter and
//! vault. [`Protocol::execute`] runs one top-level call against a scratch
//! copy of the world and commits it, together with the call's events, only
//! if the call returns `Ok`. A failed call leaves every component and the
//! ledger untouched.

use tracing::{debug, warn};

use huckleberry_bond::{BondConverter, BondDeposit, BondWithdrawal};
use huckleberry_common::{
    asset::AssetLedger,
    context::CallContext,
    errors::HuckResult,
    events::EventLog,
    types::{AccountId, Amount, PoolId},
};
use huckleberry_reward_pool::{RewardRegistry, StakeReceipt};

use crate::{AutoCompoundVault, Collaborators, HarvestSummary, VaultReceipt};

/// Every component of the yield stack plus the ledger they settle on
#[derive(Debug, Clone)]
pub struct World<L> {
    /// Token balances and allowances
    pub ledger: L,
    /// Reward pool registry
    pub registry: RewardRegistry,
    /// Bond converter
    pub bond: BondConverter,
    /// Auto-compounding vault
    pub vault: AutoCompoundVault,
}

impl<L: AssetLedger> World<L> {
    /// The vault and mutable handles on everything it settles against
    pub fn split(&mut self) -> (&mut AutoCompoundVault, Collaborators<'_, L>) {
        (
            &mut self.vault,
            Collaborators {
                registry: &mut self.registry,
                bond: &mut self.bond,
                ledger: &mut self.ledger,
            },
        )
    }
}

/// Runs calls against a [`World`] with all-or-nothing semantics
#[derive(Debug, Clone)]
pub struct Protocol<L> {
    world: World<L>,
    log: EventLog,
}

impl<L: AssetLedger + Clone> Protocol<L> {
    /// Wrap a fully set-up world
    pub fn new(world: World<L>) -> Self {
        Self {
            world,
            log: EventLog::new(),
        }
    }

    /// Committed state
    pub fn world(&self) -> &World<L> {
        &self.world
    }

    /// Direct access for genesis setup (minting, tax exemptions)
    ///
    /// Changes made here bypass the executor and emit no events.
    pub fn world_mut(&mut self) -> &mut World<L> {
        &mut self.world
    }

    /// Events of every committed call, in order
    pub fn events(&self) -> &EventLog {
        &self.log
    }

    /// Run `op` as `caller` at time `now`; commit only on success
    pub fn execute<T, F>(&mut self, caller: AccountId, now: u64, op: F) -> HuckResult<T>
    where
        F: FnOnce(&mut World<L>, &mut CallContext) -> HuckResult<T>,
    {
        let mut scratch = self.world.clone();
        let mut ctx = CallContext::new(caller, now);

        match op(&mut scratch, &mut ctx) {
            Ok(out) => {
                let events = ctx.into_events();
                debug!(events = events.len(), now, "call committed");
                self.world = scratch;
                self.log.extend(events);
                Ok(out)
            }
            Err(err) => {
                warn!(code = err.code(), error = %err, now, "call rolled back");
                Err(err)
            }
        }
    }

    // ========================================================================
    // Registry Calls
    // ========================================================================

    /// Stake into pool `pid`; zero claims only
    pub fn stake(&mut self, caller: AccountId, now: u64, pid: PoolId, amount: Amount) -> HuckResult<StakeReceipt> {
        self.execute(caller, now, |world, ctx| {
            world.registry.deposit(ctx, &mut world.ledger, pid, amount)
        })
    }

    /// Unstake from pool `pid`; zero claims only
    pub fn unstake(&mut self, caller: AccountId, now: u64, pid: PoolId, amount: Amount) -> HuckResult<StakeReceipt> {
        self.execute(caller, now, |world, ctx| {
            world.registry.withdraw(ctx, &mut world.ledger, pid, amount)
        })
    }

    /// Leave pool `pid` without reward
    pub fn emergency_unstake(&mut self, caller: AccountId, now: u64, pid: PoolId) -> HuckResult<Amount> {
        self.execute(caller, now, |world, ctx| {
            world.registry.emergency_withdraw(ctx, &mut world.ledger, pid)
        })
    }

    // ========================================================================
    // Bond Calls
    // ========================================================================

    /// Lock underlying for bond shares
    pub fn bond_deposit(&mut self, caller: AccountId, now: u64, amount: Amount) -> HuckResult<BondDeposit> {
        self.execute(caller, now, |world, ctx| {
            world.bond.deposit(ctx, &mut world.ledger, amount)
        })
    }

    /// Burn bond shares for underlying
    pub fn bond_withdraw(&mut self, caller: AccountId, now: u64, shares: Amount) -> HuckResult<BondWithdrawal> {
        self.execute(caller, now, |world, ctx| {
            world.bond.withdraw(ctx, &mut world.ledger, shares)
        })
    }

    // ========================================================================
    // Vault Calls
    // ========================================================================

    /// Deposit bond shares into the vault
    pub fn vault_deposit(&mut self, caller: AccountId, now: u64, amount: Amount) -> HuckResult<VaultReceipt> {
        self.execute(caller, now, |world, ctx| {
            let (vault, mut c) = world.split();
            vault.deposit(ctx, &mut c, amount)
        })
    }

    /// Deposit the caller's whole bond share balance
    pub fn vault_deposit_all(&mut self, caller: AccountId, now: u64) -> HuckResult<VaultReceipt> {
        self.execute(caller, now, |world, ctx| {
            let (vault, mut c) = world.split();
            vault.deposit_all(ctx, &mut c)
        })
    }

    /// Withdraw exactly `amount` bond shares
    pub fn vault_withdraw(&mut self, caller: AccountId, now: u64, amount: Amount) -> HuckResult<VaultReceipt> {
        self.execute(caller, now, |world, ctx| {
            let (vault, mut c) = world.split();
            vault.withdraw(ctx, &mut c, amount)
        })
    }

    /// Burn `shares` vault shares
    pub fn vault_withdraw_shares(&mut self, caller: AccountId, now: u64, shares: Amount) -> HuckResult<VaultReceipt> {
        self.execute(caller, now, |world, ctx| {
            let (vault, mut c) = world.split();
            vault.withdraw_shares(ctx, &mut c, shares)
        })
    }

    /// Burn every vault share the caller owns
    pub fn vault_withdraw_all(&mut self, caller: AccountId, now: u64) -> HuckResult<VaultReceipt> {
        self.execute(caller, now, |world, ctx| {
            let (vault, mut c) = world.split();
            vault.withdraw_all(ctx, &mut c)
        })
    }

    /// Claim, pay fees and compound
    pub fn harvest(&mut self, caller: AccountId, now: u64) -> HuckResult<HarvestSummary> {
        self.execute(caller, now, |world, ctx| {
            let (vault, mut c) = world.split();
            vault.harvest(ctx, &mut c)
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Bond shares under vault management
    pub fn total_balance(&self) -> HuckResult<Amount> {
        self.world
            .vault
            .total_balance(&self.world.registry, &self.world.ledger)
    }

    /// Bond shares per vault share, scaled by 1e18
    pub fn price_per_full_share(&self) -> HuckResult<Amount> {
        self.world
            .vault
            .get_price_per_full_share(&self.world.registry, &self.world.ledger)
    }

    /// Reward `account` could claim from pool `pid` at `now`
    pub fn pending_reward(&self, pid: PoolId, account: &AccountId, now: u64) -> HuckResult<Amount> {
        self.world.registry.pending_reward(pid, account, now)
    }

    /// What a harvest at `now` would collect and pay
    pub fn preview_harvest(&self, now: u64) -> HuckResult<HarvestSummary> {
        self.world.vault.preview_harvest(
            &self.world.registry,
            &self.world.bond,
            &self.world.ledger,
            now,
        )
    }
}
