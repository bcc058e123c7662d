//! Protocol Constants
//!
//! Magic numbers and configuration ceilings for the Huckleberry yield stack.
//! Fee parameters follow the auto-compounding vault lineage (call fee paid
//! to whoever triggers a harvest, performance fee to the treasury).

/// Fee Configuration (in basis points, 100 = 1%)
pub mod fees {
    /// Basis points denominator
    pub const BPS_DENOMINATOR: u64 = 10_000;

    /// Maximum performance fee (5%)
    pub const MAX_PERFORMANCE_FEE_BPS: u64 = 500;

    /// Maximum harvest caller fee (1%)
    pub const MAX_CALL_FEE_BPS: u64 = 100;

    /// Default performance fee (2%)
    pub const DEFAULT_PERFORMANCE_FEE_BPS: u64 = 200;

    /// Default harvest caller fee (0.25%)
    pub const DEFAULT_CALL_FEE_BPS: u64 = 25;

    /// Maximum transfer tax an asset may carry (100%)
    pub const MAX_TRANSFER_TAX_BPS: u64 = BPS_DENOMINATOR;
}

/// Fixed-point precision
pub mod precision {
    /// Base scale of the per-share reward accumulator
    pub const ACC_REWARD_PRECISION: u128 = 1_000_000_000_000;

    /// Scale used for price-per-share and exchange-rate quotes (1e18)
    pub const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;

    /// Largest supported token decimals
    pub const MAX_TOKEN_DECIMALS: u8 = 18;
}

/// Reward pool parameters
pub mod pool {
    /// Seconds in one day, the usual emission window unit
    pub const SECONDS_PER_DAY: u64 = 86_400;
}

