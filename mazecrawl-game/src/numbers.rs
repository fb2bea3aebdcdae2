//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;
use std::time::Duration;

/// Convert a cell count to f64 while allowing precision loss in a single location.
#[must_use]
pub fn usize_to_f64(value: usize) -> f64 {
    cast::<usize, f64>(value).unwrap_or(0.0)
}

/// Round a f64 and clamp it to the u8 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_u8(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    let clamped = value.clamp(0.0, f64::from(u8::MAX)).round();
    cast::<f64, u8>(clamped).unwrap_or(0)
}

/// Whole-number percentage of `part` over `total`, rounded to nearest.
///
/// A zero `total` yields 0 rather than dividing by zero.
#[must_use]
pub fn percent_of(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    round_f64_to_u8(usize_to_f64(part) * 100.0 / usize_to_f64(total))
}

/// Milliseconds in a duration, saturating at `u64::MAX`.
#[must_use]
pub fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
