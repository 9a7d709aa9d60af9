//! SmarDex swap math with exact integer semantics
//!
//! Mirrors the pool contract's library: every multiplication happens before
//! the division it feeds, every division truncates toward zero, and square
//! roots round down. Intermediates are unbounded `BigUint` so nothing wraps;
//! only the final amount is narrowed back to `U256`.

use crate::error::MathError;
use crate::fees::{PoolFees, FEES_BASE};
use crate::pool_traits::PoolSnapshot;
use ethers_core::types::U256;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use tracing::trace;

/// Relative tolerance for "fictive price equals price average" (1 ppm)
pub const APPROX_PRECISION: u64 = 1;
pub const APPROX_PRECISION_BASE: u64 = 1_000_000;

/// Window over which the price average converges to the fictive price
pub const MAX_BLOCK_DIFF_SECONDS: u64 = 300;

/// Oriented swap inputs: "in" is the token entering the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParams {
    pub amount: BigUint,
    pub reserve_in: BigUint,
    pub reserve_out: BigUint,
    pub fictive_reserve_in: BigUint,
    pub fictive_reserve_out: BigUint,
    pub price_average_in: BigUint,
    pub price_average_out: BigUint,
    pub fees: PoolFees,
}

/// Computed amount plus the pool state the trade would leave behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub amount: BigUint,
    pub new_reserve_in: BigUint,
    pub new_reserve_out: BigUint,
    pub new_fictive_reserve_in: BigUint,
    pub new_fictive_reserve_out: BigUint,
}

/// Fee constants lifted into big integers once per swap
struct FeeFactors {
    base: BigUint,
    lp: BigUint,
    /// `base - lp - pool`: share of the input that trades
    reversed: BigUint,
    /// `base - pool`: share of the input credited to reserves
    base_minus_pool: BigUint,
    /// `2 * base - 2 * pool - lp`
    first_leg_offset: BigUint,
}

impl FeeFactors {
    fn new(fees: &PoolFees) -> Result<Self, MathError> {
        if !fees.is_valid() {
            return Err(MathError::ArithmeticDomain("fees exceed the fee base"));
        }
        Ok(Self {
            base: BigUint::from(FEES_BASE),
            lp: BigUint::from(fees.fees_lp),
            reversed: BigUint::from(FEES_BASE - fees.total()),
            base_minus_pool: BigUint::from(FEES_BASE - fees.fees_pool),
            first_leg_offset: BigUint::from(2 * FEES_BASE - 2 * fees.fees_pool - fees.fees_lp),
        })
    }
}

pub fn u256_to_biguint(value: U256) -> BigUint {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    BigUint::from_bytes_be(&bytes)
}

pub fn biguint_to_u256(value: &BigUint) -> Result<U256, MathError> {
    let bytes = value.to_bytes_be();
    if bytes.len() > 32 {
        return Err(MathError::Overflow);
    }
    Ok(U256::from_big_endian(&bytes))
}

/// Exact output for selling `amount_in` of token0 (`token0_in`) or token1.
pub fn quote_sell(
    snapshot: &PoolSnapshot,
    token0_in: bool,
    amount_in: U256,
    now: u64,
) -> Result<U256, MathError> {
    let params = SwapParams::from_snapshot(snapshot, token0_in, amount_in, now)?;
    let outcome = params.get_amount_out()?;
    biguint_to_u256(&outcome.amount)
}

/// Minimal input of the `token0_in` side needed to receive `amount_out`.
pub fn quote_buy(
    snapshot: &PoolSnapshot,
    token0_in: bool,
    amount_out: U256,
    now: u64,
) -> Result<U256, MathError> {
    let params = SwapParams::from_snapshot(snapshot, token0_in, amount_out, now)?;
    let outcome = params.get_amount_in()?;
    biguint_to_u256(&outcome.amount)
}

impl SwapParams {
    /// Orient a snapshot for a trade and roll its price average forward to `now`.
    pub fn from_snapshot(
        snapshot: &PoolSnapshot,
        token0_in: bool,
        amount: U256,
        now: u64,
    ) -> Result<Self, MathError> {
        let (reserve_in, reserve_out, fictive_in, fictive_out, average_in, average_out) =
            if token0_in {
                (
                    snapshot.reserve0,
                    snapshot.reserve1,
                    snapshot.fictive_reserve0,
                    snapshot.fictive_reserve1,
                    snapshot.price_average0,
                    snapshot.price_average1,
                )
            } else {
                (
                    snapshot.reserve1,
                    snapshot.reserve0,
                    snapshot.fictive_reserve1,
                    snapshot.fictive_reserve0,
                    snapshot.price_average1,
                    snapshot.price_average0,
                )
            };

        let fictive_reserve_in = u256_to_biguint(fictive_in);
        let fictive_reserve_out = u256_to_biguint(fictive_out);
        let (price_average_in, price_average_out) = updated_price_average(
            &fictive_reserve_in,
            &fictive_reserve_out,
            snapshot.price_average_timestamp,
            &u256_to_biguint(average_in),
            &u256_to_biguint(average_out),
            now,
        )?;

        Ok(Self {
            amount: u256_to_biguint(amount),
            reserve_in: u256_to_biguint(reserve_in),
            reserve_out: u256_to_biguint(reserve_out),
            fictive_reserve_in,
            fictive_reserve_out,
            price_average_in,
            price_average_out,
            fees: snapshot.fees,
        })
    }

    fn with_amount(&self, amount: BigUint) -> Self {
        Self {
            amount,
            ..self.clone()
        }
    }

    fn with_fictive(&self, amount: BigUint, fictive_in: BigUint, fictive_out: BigUint) -> Self {
        Self {
            amount,
            fictive_reserve_in: fictive_in,
            fictive_reserve_out: fictive_out,
            ..self.clone()
        }
    }

    /// Params for the second leg, continuing from the first leg's reserves
    fn after(&self, leg: &SwapOutcome, amount: BigUint) -> Result<Self, MathError> {
        let (fictive_in, fictive_out) = compute_fictive_reserves(
            &leg.new_reserve_in,
            &leg.new_reserve_out,
            &leg.new_fictive_reserve_in,
            &leg.new_fictive_reserve_out,
        )?;
        Ok(Self {
            amount,
            reserve_in: leg.new_reserve_in.clone(),
            reserve_out: leg.new_reserve_out.clone(),
            fictive_reserve_in: fictive_in,
            fictive_reserve_out: fictive_out,
            price_average_in: self.price_average_in.clone(),
            price_average_out: self.price_average_out.clone(),
            fees: self.fees,
        })
    }

    fn ensure_tradeable(&self) -> Result<(), MathError> {
        if self.amount.is_zero() {
            return Err(MathError::ZeroAmount);
        }
        if self.reserve_in.is_zero()
            || self.reserve_out.is_zero()
            || self.fictive_reserve_in.is_zero()
            || self.fictive_reserve_out.is_zero()
        {
            return Err(MathError::NoLiquidity("reserves are empty"));
        }
        if self.price_average_in.is_zero() || self.price_average_out.is_zero() {
            return Err(MathError::NoLiquidity("price average is zero"));
        }
        Ok(())
    }

    /// Fictive price sits on the price average (within 1 ppm)
    fn at_price_average(&self) -> bool {
        ratio_approx_eq(
            &self.fictive_reserve_in,
            &self.fictive_reserve_out,
            &self.price_average_in,
            &self.price_average_out,
        )
    }

    /// Output for an exact input of `self.amount`
    pub fn get_amount_out(&self) -> Result<SwapOutcome, MathError> {
        let fees = FeeFactors::new(&self.fees)?;
        self.ensure_tradeable()?;

        let amount_in_with_fees = &self.amount * &fees.reversed / &fees.base;
        let first_amount_in =
            compute_first_trade_qty_in(&self.with_amount(amount_in_with_fees.clone()), &fees);

        // a single leg starting on the average re-anchors fictive reserves first
        let (mut fictive_in, mut fictive_out) =
            (self.fictive_reserve_in.clone(), self.fictive_reserve_out.clone());
        if first_amount_in == amount_in_with_fees && self.at_price_average() {
            (fictive_in, fictive_out) = compute_fictive_reserves(
                &self.reserve_in,
                &self.reserve_out,
                &fictive_in,
                &fictive_out,
            )?;
        }

        let first_amount_in_no_fees = &first_amount_in * &fees.base / &fees.reversed;
        let first = apply_k_const_rule_out(
            &self.with_fictive(first_amount_in_no_fees.clone(), fictive_in, fictive_out),
            &fees,
        )?;

        let remaining = checked_sub(&self.amount, &first_amount_in_no_fees, "first leg exceeds amount")?;
        if first_amount_in < amount_in_with_fees && !remaining.is_zero() {
            trace!(first_leg = %first_amount_in_no_fees, remaining = %remaining, "two-leg sell");
            let second = apply_k_const_rule_out(&self.after(&first, remaining)?, &fees)?;
            let amount = &first.amount + &second.amount;
            return Ok(SwapOutcome { amount, ..second });
        }

        Ok(first)
    }

    /// Input required for an exact output of `self.amount`
    pub fn get_amount_in(&self) -> Result<SwapOutcome, MathError> {
        let fees = FeeFactors::new(&self.fees)?;
        self.ensure_tradeable()?;
        if self.amount >= self.fictive_reserve_out {
            return Err(insufficient(&self.amount, &self.fictive_reserve_out));
        }

        let first_amount_out = compute_first_trade_qty_out(self, &fees);

        let (mut fictive_in, mut fictive_out) =
            (self.fictive_reserve_in.clone(), self.fictive_reserve_out.clone());
        if first_amount_out == self.amount && self.at_price_average() {
            (fictive_in, fictive_out) = compute_fictive_reserves(
                &self.reserve_in,
                &self.reserve_out,
                &fictive_in,
                &fictive_out,
            )?;
        }

        let first = apply_k_const_rule_in(
            &self.with_fictive(first_amount_out.clone(), fictive_in, fictive_out),
            &fees,
        )?;

        if first_amount_out < self.amount {
            let remaining = &self.amount - &first_amount_out;
            trace!(first_leg = %first_amount_out, remaining = %remaining, "two-leg buy");
            let second = apply_k_const_rule_in(&self.after(&first, remaining)?, &fees)?;
            let amount = &first.amount + &second.amount;
            return Ok(SwapOutcome { amount, ..second });
        }

        Ok(first)
    }
}

/// Roll the stored price average forward to `now`.
///
/// The "in" average is reset to the fictive reserve and the "out" average
/// moves linearly toward the fictive price over [`MAX_BLOCK_DIFF_SECONDS`].
/// A `now` earlier than the stored timestamp is treated as the same second.
pub fn updated_price_average(
    fictive_reserve_in: &BigUint,
    fictive_reserve_out: &BigUint,
    last_timestamp: u64,
    price_average_in: &BigUint,
    price_average_out: &BigUint,
    now: u64,
) -> Result<(BigUint, BigUint), MathError> {
    if last_timestamp == 0 {
        return Ok((fictive_reserve_in.clone(), fictive_reserve_out.clone()));
    }
    if now <= last_timestamp {
        return Ok((price_average_in.clone(), price_average_out.clone()));
    }
    if price_average_in.is_zero() {
        return Err(MathError::NoLiquidity("price average is zero"));
    }

    let time_diff = (now - last_timestamp).min(MAX_BLOCK_DIFF_SECONDS);
    let new_in = fictive_reserve_in.clone();
    let new_out = (BigUint::from(MAX_BLOCK_DIFF_SECONDS - time_diff) * price_average_out * &new_in
        / price_average_in
        + BigUint::from(time_diff) * fictive_reserve_out)
        / BigUint::from(MAX_BLOCK_DIFF_SECONDS);

    Ok((new_in, new_out))
}

fn approx_eq(x: &BigUint, y: &BigUint) -> bool {
    let precision = BigUint::from(APPROX_PRECISION);
    let base = BigUint::from(APPROX_PRECISION_BASE);
    if x > y {
        *x < y + y * &precision / &base
    } else {
        *y < x + x * &precision / &base
    }
}

/// `x_num / x_den ≈ y_num / y_den`, cross-multiplied
pub fn ratio_approx_eq(x_num: &BigUint, x_den: &BigUint, y_num: &BigUint, y_den: &BigUint) -> bool {
    approx_eq(&(x_num * y_den), &(x_den * y_num))
}

/// Re-derive fictive reserves from the real ones, keeping the fictive price.
pub fn compute_fictive_reserves(
    reserve_in: &BigUint,
    reserve_out: &BigUint,
    fictive_reserve_in: &BigUint,
    fictive_reserve_out: &BigUint,
) -> Result<(BigUint, BigUint), MathError> {
    if reserve_in.is_zero() || fictive_reserve_in.is_zero() || fictive_reserve_out.is_zero() {
        return Err(MathError::NoLiquidity("cannot rebalance empty reserves"));
    }

    let (new_in, new_out) = if reserve_out * fictive_reserve_in < reserve_in * fictive_reserve_out {
        let temp = reserve_out * reserve_out / fictive_reserve_out * fictive_reserve_in / reserve_in;
        let new_in = &temp * fictive_reserve_in / fictive_reserve_out
            + reserve_out * fictive_reserve_in / fictive_reserve_out;
        let new_out = reserve_out + &temp;
        (new_in, new_out)
    } else {
        (
            fictive_reserve_in * reserve_out / fictive_reserve_out + reserve_in,
            reserve_in * fictive_reserve_out / fictive_reserve_in + reserve_out,
        )
    };

    Ok((new_in >> 2usize, new_out >> 2usize))
}

/// Largest input (net of fees) that moves the fictive price no further than
/// the price average. `params.amount` is the fee-adjusted input.
fn compute_first_trade_qty_in(params: &SwapParams, fees: &FeeFactors) -> BigUint {
    let amount = &params.amount;
    if &params.fictive_reserve_out * &params.price_average_in
        <= &params.fictive_reserve_in * &params.price_average_out
    {
        return amount.clone();
    }

    let to_sub = &params.fictive_reserve_in * &fees.first_leg_offset;
    let to_div = &fees.base_minus_pool << 1usize;
    let in_sqrt = ((&params.fictive_reserve_in * &params.fictive_reserve_out) << 2usize)
        / &params.price_average_out
        * &params.price_average_in
        * (&fees.reversed * &fees.base_minus_pool)
        + &params.fictive_reserve_in * &params.fictive_reserve_in * (&fees.lp * &fees.lp);

    // compare squares so the root is only taken when it matters
    if in_sqrt < (amount * &to_div + &to_sub).pow(2) {
        let root = in_sqrt.sqrt();
        if root > to_sub {
            return (root - to_sub) / to_div;
        }
        return BigUint::zero();
    }
    amount.clone()
}

/// Largest output whose trade stops at the price average
fn compute_first_trade_qty_out(params: &SwapParams, fees: &FeeFactors) -> BigUint {
    let amount = &params.amount;
    if &params.fictive_reserve_out * &params.price_average_in
        <= &params.fictive_reserve_in * &params.price_average_out
    {
        return amount.clone();
    }

    let out_pred_fees = &params.fictive_reserve_in * &fees.lp * &params.price_average_out
        / &params.price_average_in;
    let to_add = ((&params.fictive_reserve_out * &fees.reversed) << 1usize) + &out_pred_fees;
    let to_div = &fees.reversed << 1usize;
    let in_sqrt = ((&params.fictive_reserve_out * &params.fictive_reserve_in) << 2usize)
        / &params.price_average_in
        * &params.price_average_out
        * (&fees.reversed * &fees.base_minus_pool)
        + &out_pred_fees * &out_pred_fees;

    let scaled = amount * &to_div;
    if to_add <= scaled {
        return amount.clone();
    }
    if in_sqrt > (&to_add - &scaled).pow(2) {
        let root = in_sqrt.sqrt();
        if to_add > root {
            return (to_add - root) / to_div;
        }
        return BigUint::zero();
    }
    amount.clone()
}

/// x·y=k on fictive reserves for an exact input
fn apply_k_const_rule_out(params: &SwapParams, fees: &FeeFactors) -> Result<SwapOutcome, MathError> {
    let amount_in_with_fee = &params.amount * &fees.reversed;
    let numerator = &amount_in_with_fee * &params.fictive_reserve_out;
    let denominator = &params.fictive_reserve_in * &fees.base + &amount_in_with_fee;
    if denominator.is_zero() {
        return Err(MathError::NoLiquidity("fictive reserve in is zero"));
    }
    let amount_out = numerator / denominator;

    let amount_in_with_fee_lp = (amount_in_with_fee + &params.amount * &fees.lp) / &fees.base;
    let new_reserve_out = sub_reserve(&params.reserve_out, &amount_out)?;
    let new_fictive_reserve_out = sub_reserve(&params.fictive_reserve_out, &amount_out)?;

    Ok(SwapOutcome {
        new_reserve_in: &params.reserve_in + &amount_in_with_fee_lp,
        new_fictive_reserve_in: &params.fictive_reserve_in + &amount_in_with_fee_lp,
        new_reserve_out,
        new_fictive_reserve_out,
        amount: amount_out,
    })
}

/// x·y=k on fictive reserves for an exact output, rounded up by one
fn apply_k_const_rule_in(params: &SwapParams, fees: &FeeFactors) -> Result<SwapOutcome, MathError> {
    if params.amount >= params.fictive_reserve_out {
        return Err(insufficient(&params.amount, &params.fictive_reserve_out));
    }
    let numerator = &params.fictive_reserve_in * &params.amount * &fees.base;
    let denominator = (&params.fictive_reserve_out - &params.amount) * &fees.reversed;
    if denominator.is_zero() {
        return Err(MathError::ArithmeticDomain("fee leaves nothing to trade"));
    }
    let amount_in = numerator / denominator + BigUint::one();

    let amount_in_with_fee_lp = &amount_in * &fees.base_minus_pool / &fees.base;
    let new_reserve_out = sub_reserve(&params.reserve_out, &params.amount)?;

    Ok(SwapOutcome {
        new_reserve_in: &params.reserve_in + &amount_in_with_fee_lp,
        new_fictive_reserve_in: &params.fictive_reserve_in + &amount_in_with_fee_lp,
        new_reserve_out,
        new_fictive_reserve_out: &params.fictive_reserve_out - &params.amount,
        amount: amount_in,
    })
}

fn sub_reserve(reserve: &BigUint, amount: &BigUint) -> Result<BigUint, MathError> {
    if amount > reserve {
        return Err(insufficient(amount, reserve));
    }
    Ok(reserve - amount)
}

fn checked_sub(a: &BigUint, b: &BigUint, what: &'static str) -> Result<BigUint, MathError> {
    if b > a {
        return Err(MathError::ArithmeticDomain(what));
    }
    Ok(a - b)
}

fn insufficient(requested: &BigUint, available: &BigUint) -> MathError {
    MathError::InsufficientLiquidity {
        requested: requested.to_string(),
        available: available.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::FEES_LEGACY_LAYER_ONE;
    use proptest::prelude::*;

    const NOW: u64 = 1_700_000_000;

    fn big(value: u64) -> BigUint {
        BigUint::from(value)
    }

    /// Real, fictive and average reserves all equal, average taken this second
    fn balanced(reserve: u64, fees: PoolFees) -> PoolSnapshot {
        let value = U256::from(reserve);
        PoolSnapshot {
            reserve0: value,
            reserve1: value,
            fictive_reserve0: value,
            fictive_reserve1: value,
            price_average0: value,
            price_average1: value,
            price_average_timestamp: NOW,
            fees,
        }
    }

    #[test]
    fn test_zero_fee_sell_matches_constant_product() {
        let snapshot = balanced(1_000_000, PoolFees::ZERO);

        // fictive reserves are re-anchored to (r + r) / 4 before the trade
        let fictive = 500_000u64;
        let expected = 1_000 * fictive / (fictive + 1_000);

        let out = quote_sell(&snapshot, true, U256::from(1_000u64), NOW).unwrap();
        assert_eq!(out, U256::from(expected));
        assert_eq!(out, U256::from(998u64));

        let out_token1 = quote_sell(&snapshot, false, U256::from(1_000u64), NOW).unwrap();
        assert_eq!(out_token1, out);
    }

    #[test]
    fn test_fees_reduce_output() {
        let free = quote_sell(&balanced(1_000_000, PoolFees::ZERO), true, U256::from(1_000u64), NOW).unwrap();
        let charged =
            quote_sell(&balanced(1_000_000, FEES_LEGACY_LAYER_ONE), true, U256::from(1_000u64), NOW)
                .unwrap();

        assert_eq!(charged, U256::from(996u64));
        assert!(charged < free);
        assert!(charged < U256::from(1_000u64));
    }

    #[test]
    fn test_buy_inverts_sell_zero_fee() {
        let snapshot = balanced(1_000_000, PoolFees::ZERO);
        let out = quote_sell(&snapshot, true, U256::from(1_000u64), NOW).unwrap();
        let back = quote_buy(&snapshot, true, out, NOW).unwrap();

        assert_eq!(back, U256::from(1_000u64));
    }

    #[test]
    fn test_round_trip_sample_with_fees() {
        let snapshot = balanced(1_000_000, FEES_LEGACY_LAYER_ONE);
        let amount = U256::from(10_000u64);

        let out = quote_sell(&snapshot, true, amount, NOW).unwrap();
        assert_eq!(out, U256::from(9_797u64));

        let back = quote_buy(&snapshot, true, out, NOW).unwrap();
        assert_eq!(back, U256::from(10_000u64));
        assert!(back >= amount);
    }

    #[test]
    fn test_round_trip_can_fall_short_by_rounding() {
        // floor division on both legs loses a unit or two on ordinary trades
        let free = balanced(1_000_000, PoolFees::ZERO);
        let out = quote_sell(&free, true, U256::from(708u64), NOW).unwrap();
        assert_eq!(out, U256::from(706u64));
        assert_eq!(quote_buy(&free, true, out, NOW).unwrap(), U256::from(707u64));

        let charged = balanced(1_000_000, FEES_LEGACY_LAYER_ONE);
        let out = quote_sell(&charged, true, U256::from(1_000u64), NOW).unwrap();
        assert_eq!(out, U256::from(996u64));
        assert_eq!(quote_buy(&charged, true, out, NOW).unwrap(), U256::from(999u64));

        // the largest shortfall on a balanced pool is three units
        let out = quote_sell(&charged, true, U256::from(45_715u64), NOW).unwrap();
        assert_eq!(out, U256::from(41_856u64));
        assert_eq!(quote_buy(&charged, true, out, NOW).unwrap(), U256::from(45_712u64));

        // selling what a buy asked for can come back one short as well
        let paid = quote_buy(&charged, true, U256::from(1_000u64), NOW).unwrap();
        assert_eq!(paid, U256::from(1_003u64));
        assert_eq!(quote_sell(&charged, true, paid, NOW).unwrap(), U256::from(999u64));
    }

    #[test]
    fn test_favourable_direction_skips_rebalance() {
        // token1 priced at twice its fictive value: selling it moves toward the average
        let mut snapshot = balanced(1_000_000, PoolFees::ZERO);
        snapshot.price_average1 = U256::from(2_000_000u64);

        // plain x·y=k on the untouched 1,000,000 fictive reserves
        let out = quote_sell(&snapshot, false, U256::from(1_000u64), NOW).unwrap();
        assert_eq!(out, U256::from(999u64));
    }

    #[test]
    fn test_large_favourable_trade_uses_two_legs() {
        let mut snapshot = balanced(1_000_000, PoolFees::ZERO);
        snapshot.price_average1 = U256::from(2_000_000u64);

        let half = quote_sell(&snapshot, false, U256::from(500_000u64), NOW).unwrap();
        let full = quote_sell(&snapshot, false, U256::from(1_000_000u64), NOW).unwrap();

        assert!(half > U256::zero());
        assert!(full >= half);
        assert!(full < U256::from(1_000_000u64));
    }

    #[test]
    fn test_zero_amount_rejected() {
        let snapshot = balanced(1_000_000, PoolFees::ZERO);
        assert_eq!(
            quote_sell(&snapshot, true, U256::zero(), NOW),
            Err(MathError::ZeroAmount)
        );
        assert_eq!(
            quote_buy(&snapshot, true, U256::zero(), NOW),
            Err(MathError::ZeroAmount)
        );
    }

    #[test]
    fn test_empty_pool_reports_no_liquidity() {
        let mut snapshot = balanced(1_000_000, PoolFees::ZERO);
        snapshot.fictive_reserve1 = U256::zero();
        snapshot.price_average_timestamp = 0;

        assert!(matches!(
            quote_sell(&snapshot, true, U256::from(1_000u64), NOW),
            Err(MathError::NoLiquidity(_))
        ));
        assert!(matches!(
            quote_buy(&snapshot, false, U256::from(1_000u64), NOW),
            Err(MathError::NoLiquidity(_))
        ));

        let mut no_average = balanced(1_000_000, PoolFees::ZERO);
        no_average.price_average0 = U256::zero();
        assert_eq!(
            quote_sell(&no_average, true, U256::from(1_000u64), NOW),
            Err(MathError::NoLiquidity("price average is zero"))
        );
    }

    #[test]
    fn test_buy_beyond_reserves_is_rejected() {
        let snapshot = balanced(1_000_000, PoolFees::ZERO);

        assert!(matches!(
            quote_buy(&snapshot, true, U256::from(1_000_000u64), NOW),
            Err(MathError::InsufficientLiquidity { .. })
        ));
        // passes the raw check but not the re-anchored 500,000 fictive reserve
        assert!(matches!(
            quote_buy(&snapshot, true, U256::from(600_000u64), NOW),
            Err(MathError::InsufficientLiquidity { .. })
        ));
    }

    #[test]
    fn test_invalid_fees_rejected() {
        let snapshot = balanced(1_000_000, PoolFees::new(FEES_BASE, 0));
        assert!(matches!(
            quote_sell(&snapshot, true, U256::from(1_000u64), NOW),
            Err(MathError::ArithmeticDomain(_))
        ));
    }

    #[test]
    fn test_price_average_update() {
        let fictive_in = big(2_000_000);
        let fictive_out = big(1_000_000);
        let average = big(1_000_000);

        // first observation adopts the fictive reserves
        let (avg_in, avg_out) =
            updated_price_average(&fictive_in, &fictive_out, 0, &average, &average, NOW).unwrap();
        assert_eq!((avg_in, avg_out), (big(2_000_000), big(1_000_000)));

        // same second keeps the stored average
        let (avg_in, avg_out) =
            updated_price_average(&fictive_in, &fictive_out, NOW, &average, &average, NOW).unwrap();
        assert_eq!((avg_in, avg_out), (big(1_000_000), big(1_000_000)));

        // half way through the window
        let (avg_in, avg_out) =
            updated_price_average(&fictive_in, &fictive_out, NOW, &average, &average, NOW + 150)
                .unwrap();
        assert_eq!((avg_in, avg_out), (big(2_000_000), big(1_500_000)));

        // past the window the average equals the fictive price
        let (avg_in, avg_out) =
            updated_price_average(&fictive_in, &fictive_out, NOW, &average, &average, NOW + 5_000)
                .unwrap();
        assert_eq!((avg_in, avg_out), (big(2_000_000), big(1_000_000)));

        // local clock behind the chain
        let (avg_in, avg_out) =
            updated_price_average(&fictive_in, &fictive_out, NOW, &average, &average, NOW - 10)
                .unwrap();
        assert_eq!((avg_in, avg_out), (big(1_000_000), big(1_000_000)));
    }

    #[test]
    fn test_compute_fictive_reserves() {
        let million = big(1_000_000);

        let (fictive_in, fictive_out) =
            compute_fictive_reserves(&million, &million, &million, &big(2_000_000)).unwrap();
        assert_eq!((fictive_in, fictive_out), (big(187_500), big(375_000)));

        let (fictive_in, fictive_out) =
            compute_fictive_reserves(&million, &million, &big(2_000_000), &million).unwrap();
        assert_eq!((fictive_in, fictive_out), (big(750_000), big(375_000)));

        assert!(compute_fictive_reserves(&million, &million, &BigUint::zero(), &million).is_err());
    }

    #[test]
    fn test_ratio_approx_eq() {
        let million = big(1_000_000);
        assert!(ratio_approx_eq(&million, &million, &million, &million));
        assert!(ratio_approx_eq(&big(1_000_000_000), &million, &big(1_000_000_500), &million));
        assert!(!ratio_approx_eq(&million, &million, &big(2_000_000), &million));
    }

    #[test]
    fn test_biguint_conversion_bounds() {
        assert_eq!(biguint_to_u256(&u256_to_biguint(U256::MAX)).unwrap(), U256::MAX);
        let too_big = u256_to_biguint(U256::MAX) + BigUint::one();
        assert_eq!(biguint_to_u256(&too_big), Err(MathError::Overflow));
    }

    proptest! {
        #[test]
        fn prop_sell_is_monotonic(
            reserve in 1_000_000u64..1_000_000_000_000u64,
            a in 1u64..1_000_000u64,
            b in 1u64..1_000_000u64,
            charged in any::<bool>(),
        ) {
            let fees = if charged { FEES_LEGACY_LAYER_ONE } else { PoolFees::ZERO };
            let snapshot = balanced(reserve, fees);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

            let out_lo = quote_sell(&snapshot, true, U256::from(lo), NOW).unwrap();
            let out_hi = quote_sell(&snapshot, true, U256::from(hi), NOW).unwrap();
            prop_assert!(out_lo <= out_hi);
        }

        #[test]
        fn prop_round_trip_within_three_units(
            amount in 1u64..200_000u64,
            charged in any::<bool>(),
        ) {
            let fees = if charged { FEES_LEGACY_LAYER_ONE } else { PoolFees::ZERO };
            let snapshot = balanced(1_000_000, fees);

            let out = quote_sell(&snapshot, true, U256::from(amount), NOW).unwrap();
            prop_assume!(!out.is_zero());
            let back = quote_buy(&snapshot, true, out, NOW).unwrap();
            prop_assert!(back + U256::from(3u64) >= U256::from(amount));
        }

        #[test]
        fn prop_buy_is_monotonic(
            reserve in 1_000_000u64..1_000_000_000_000u64,
            a in 1u64..250_000u64,
            b in 1u64..250_000u64,
            charged in any::<bool>(),
        ) {
            let fees = if charged { FEES_LEGACY_LAYER_ONE } else { PoolFees::ZERO };
            let snapshot = balanced(reserve, fees);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

            let in_lo = quote_buy(&snapshot, false, U256::from(lo), NOW).unwrap();
            let in_hi = quote_buy(&snapshot, false, U256::from(hi), NOW).unwrap();
            prop_assert!(in_lo <= in_hi);
        }
    }
}
