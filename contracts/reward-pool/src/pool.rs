//! Pool accumulator
//!
//! A pool emits `reward_per_second` of its reward asset during
//! `[start_time, end_time]`, shared among stakers in proportion to stake.
//! Reward is tracked by a per-share accumulator: a staker's entitlement is
//! `amount * acc_reward_per_share / acc_scale - reward_debt`.

use serde::{Deserialize, Serialize};

use huckleberry_common::{
    errors::{HuckError, HuckResult},
    math::{accrued_reward, accumulator_increment, clamped_duration, safe_sub},
    types::{Amount, AssetId},
    U256,
};

// ============================================================================
// Types
// ============================================================================

/// One reward pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    /// Asset stakers lock
    pub stake_asset: AssetId,
    /// Asset emitted as reward
    pub reward_asset: AssetId,
    /// Emission per second while the window is open
    pub reward_per_second: Amount,
    /// Emission start (seconds)
    pub start_time: u64,
    /// Emission end (seconds)
    pub end_time: u64,
    /// Reward per staked unit, scaled by `acc_scale`
    pub acc_reward_per_share: U256,
    /// Time up to which reward has been accounted
    pub last_reward_time: u64,
    /// Total stake held by the pool
    pub current_supply: Amount,
    /// Fixed-point scale of the accumulator (1e12 times the decimal gap)
    pub acc_scale: U256,
}

/// Position of one account in one pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStake {
    /// Staked amount
    pub amount: Amount,
    /// Reward already accounted for `amount`
    pub reward_debt: Amount,
}

impl Pool {
    /// Create a pool; accrual starts at `max(start_time, now)`
    pub fn new(
        stake_asset: AssetId,
        reward_asset: AssetId,
        reward_per_second: Amount,
        start_time: u64,
        end_time: u64,
        acc_scale: U256,
        now: u64,
    ) -> HuckResult<Self> {
        if start_time >= end_time {
            return Err(HuckError::InvalidTimeWindow {
                start_time,
                end_time,
            });
        }
        Ok(Self {
            stake_asset,
            reward_asset,
            reward_per_second,
            start_time,
            end_time,
            acc_reward_per_share: U256::zero(),
            last_reward_time: start_time.max(now),
            current_supply: 0,
            acc_scale,
        })
    }

    /// Whether the pool emits at `now`
    pub fn is_emitting(&self, now: u64) -> bool {
        now >= self.start_time && now < self.end_time
    }

    /// Reward accrued by `amount` at the current accumulator value
    pub fn accrued(&self, amount: Amount) -> HuckResult<Amount> {
        accrued_reward(amount, self.acc_reward_per_share, self.acc_scale)
    }

    /// Reward owed to `stake` at the current accumulator value
    pub fn pending_for(&self, stake: &UserStake) -> HuckResult<Amount> {
        safe_sub(self.accrued(stake.amount)?, stake.reward_debt)
    }

    /// Total emission of `[from, to]` after clamping to the window
    pub fn emission_between(&self, from: u64, to: u64) -> HuckResult<Amount> {
        let seconds = clamped_duration(self.start_time, self.end_time, from, to);
        self.reward_per_second
            .checked_mul(seconds as u128)
            .ok_or(HuckError::Overflow)
    }
}

// ============================================================================
// Core Functions
// ============================================================================

/// Bring `pool` up to `now`
///
/// Pure and idempotent: advancing twice to the same `now` returns the same
/// pool. With no stake the clock moves but nothing accrues, so emission of
/// an empty interval is never redistributed. `last_reward_time` never passes
/// `end_time`.
pub fn advance(pool: &Pool, now: u64) -> HuckResult<Pool> {
    let mut next = pool.clone();
    if now <= pool.last_reward_time {
        return Ok(next);
    }

    let horizon = now.min(pool.end_time);
    if pool.current_supply > 0 {
        let elapsed = horizon.saturating_sub(pool.last_reward_time);
        if elapsed > 0 {
            let reward = pool
                .reward_per_second
                .checked_mul(elapsed as u128)
                .ok_or(HuckError::Overflow)?;
            let increment = accumulator_increment(reward, pool.acc_scale, pool.current_supply)?;
            next.acc_reward_per_share = pool
                .acc_reward_per_share
                .checked_add(increment)
                .ok_or(HuckError::Overflow)?;
        }
    }
    next.last_reward_time = pool.last_reward_time.max(horizon);
    Ok(next)
}
