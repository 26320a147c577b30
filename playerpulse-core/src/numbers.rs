//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Truncate a f64 toward zero, saturating at the i64 range and returning 0 for NaN values.
#[must_use]
pub fn trunc_f64_to_i64(value: f64) -> i64 {
    saturating_f64_to_i64(value.trunc())
}

/// Round a f64 half to even, saturating at the i64 range and returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    saturating_f64_to_i64(value.round_ties_even())
}

fn saturating_f64_to_i64(integral: f64) -> i64 {
    if integral.is_nan() {
        return 0;
    }
    cast::<f64, i64>(integral).unwrap_or(if integral.is_sign_negative() {
        i64::MIN
    } else {
        i64::MAX
    })
}

/// Clamp a f64 into `[low, high]` and truncate to u32, returning `low` for NaN values.
#[must_use]
pub fn clamp_trunc_f64_to_u32(value: f64, low: u32, high: u32) -> u32 {
    if value.is_nan() {
        return low;
    }
    let clamped = value.clamp(f64::from(low), f64::from(high)).trunc();
    cast::<f64, u32>(clamped).unwrap_or(low)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Convert u128 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u128_to_f64(value: u128) -> f64 {
    cast::<u128, f64>(value).unwrap_or(f64::MAX)
}

/// Widen usize to u64, saturating on exotic targets.
#[must_use]
pub fn usize_to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
