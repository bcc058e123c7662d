//! Mathematical Utilities for the Huckleberry Protocol
//!
//! Checked fixed-point arithmetic for reward accrual and share conversion.
//! Products are formed in 256 bits so `a * b / c` never wraps for any pair of
//! `u128` operands; results are narrowed back with an explicit overflow check.
//! All divisions floor, so every conversion rounds against the caller.

use primitive_types::U256;

use crate::constants::{fees, precision};
use crate::errors::{HuckError, HuckResult};
use crate::types::Amount;

/// Narrow a 256-bit intermediate back to an amount
pub fn to_amount(value: U256) -> HuckResult<Amount> {
    if value > U256::from(u128::MAX) {
        return Err(HuckError::Overflow);
    }
    Ok(value.low_u128())
}

/// `a * b / denominator`, floored
pub fn mul_div(a: Amount, b: Amount, denominator: Amount) -> HuckResult<Amount> {
    if denominator == 0 {
        return Err(HuckError::DivisionByZero);
    }
    // u128 * u128 always fits in 256 bits
    let product = U256::from(a) * U256::from(b);
    to_amount(product / U256::from(denominator))
}

/// Portion of `amount` expressed in basis points
pub fn bps_of(amount: Amount, bps: u64) -> HuckResult<Amount> {
    mul_div(amount, bps as u128, fees::BPS_DENOMINATOR as u128)
}

/// Safe addition
pub fn safe_add(a: Amount, b: Amount) -> HuckResult<Amount> {
    a.checked_add(b).ok_or(HuckError::Overflow)
}

/// Safe subtraction
pub fn safe_sub(a: Amount, b: Amount) -> HuckResult<Amount> {
    a.checked_sub(b).ok_or(HuckError::Underflow)
}

// ============================================================================
// Reward accrual
// ============================================================================

/// Effective emission time of `[from, to]` inside the window `[start_time, end_time]`
///
/// Zero when the interval starts after the window closes or ends before it
/// opens. An interval starting exactly at `end_time` also yields zero, while
/// one ending exactly at `start_time` yields zero through the subtraction.
pub fn clamped_duration(start_time: u64, end_time: u64, from: u64, to: u64) -> u64 {
    if from > end_time || to < start_time {
        return 0;
    }
    let lower = from.max(start_time);
    let upper = to.min(end_time);
    upper.saturating_sub(lower)
}

/// Accumulator scale for a pool: `1e12 * 10^(stake_decimals - reward_decimals)`
///
/// When the staked asset carries more decimals than the reward asset, a plain
/// 1e12 scale loses the per-second reward to flooring; the extra factor
/// restores it. Pools whose reward asset has at least as many decimals as
/// the staked asset use the base 1e12.
pub fn accumulator_scale(stake_decimals: u8, reward_decimals: u8) -> HuckResult<U256> {
    if stake_decimals > precision::MAX_TOKEN_DECIMALS {
        return Err(HuckError::InvalidInput {
            param: "stake_decimals",
            reason: "more than 18 decimals",
        });
    }
    if reward_decimals > precision::MAX_TOKEN_DECIMALS {
        return Err(HuckError::InvalidInput {
            param: "reward_decimals",
            reason: "more than 18 decimals",
        });
    }
    let gap = stake_decimals.saturating_sub(reward_decimals);
    Ok(U256::from(precision::ACC_REWARD_PRECISION) * U256::exp10(gap as usize))
}

/// Increment of the per-share accumulator for `reward` spread over `supply`
pub fn accumulator_increment(reward: Amount, scale: U256, supply: Amount) -> HuckResult<U256> {
    if supply == 0 {
        return Err(HuckError::DivisionByZero);
    }
    let scaled = U256::from(reward)
        .checked_mul(scale)
        .ok_or(HuckError::Overflow)?;
    Ok(scaled / U256::from(supply))
}

/// Reward accrued by `amount` of stake at accumulator value `acc`
pub fn accrued_reward(amount: Amount, acc: U256, scale: U256) -> HuckResult<Amount> {
    if scale.is_zero() {
        return Err(HuckError::DivisionByZero);
    }
    let product = U256::from(amount)
        .checked_mul(acc)
        .ok_or(HuckError::Overflow)?;
    to_amount(product / scale)
}

// ============================================================================
// Share conversion
// ============================================================================

/// Shares minted for `amount` when `total_shares` claim `total_balance`
///
/// The first deposit (no shares outstanding) mints 1:1.
pub fn amount_to_shares(
    amount: Amount,
    total_balance: Amount,
    total_shares: Amount,
) -> HuckResult<Amount> {
    if total_shares == 0 {
        return Ok(amount);
    }
    mul_div(amount, total_shares, total_balance)
}

/// Underlying claimed by `shares` when `total_shares` claim `total_balance`
pub fn shares_to_amount(
    shares: Amount,
    total_balance: Amount,
    total_shares: Amount,
) -> HuckResult<Amount> {
    if total_shares == 0 {
        return Ok(shares);
    }
    mul_div(shares, total_balance, total_shares)
}

/// Price of one full share scaled by 1e18 (exactly 1e18 with no shares)
pub fn price_per_full_share(total_balance: Amount, total_shares: Amount) -> HuckResult<Amount> {
    if total_shares == 0 {
        return Ok(precision::PRICE_PRECISION);
    }
    mul_div(total_balance, precision::PRICE_PRECISION, total_shares)
}
