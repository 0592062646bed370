//! Checked integer helpers. All division rounds toward zero.

use crate::error::PoolError;

/// `floor(a × b / denom)` without requiring `a × b` to fit in a `u128`.
///
/// Splits `a = q × denom + r`, so the result is `q × b + floor(r × b / denom)`.
/// Exact whenever the result and `r × b` fit, which holds for every
/// `denom ≤ u64::MAX` paired with `b ≤ PRECISION`, and for `b ≤ u64::MAX`
/// paired with `denom ≤ PRECISION`.
pub fn mul_div_floor(a: u128, b: u128, denom: u128) -> Result<u128, PoolError> {
    if denom == 0 {
        return Err(PoolError::InvariantViolation("division by zero".into()));
    }
    let q = a / denom;
    let r = a % denom;
    let whole = q.checked_mul(b).ok_or(PoolError::Overflow)?;
    let frac = r.checked_mul(b).ok_or(PoolError::Overflow)? / denom;
    whole.checked_add(frac).ok_or(PoolError::Overflow)
}

pub fn add_u128(a: u128, b: u128) -> Result<u128, PoolError> {
    a.checked_add(b).ok_or(PoolError::Overflow)
}
