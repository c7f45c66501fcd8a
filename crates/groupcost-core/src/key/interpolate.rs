//! Byte-key interpolation.

/// Number of bytes past the common prefix that take part in interpolation.
const WINDOW: usize = 4;

/// Estimates how far `target` lies between `low` and `high`, scaled to
/// `total`, assuming keys are spread uniformly over the byte-string space.
///
/// Keys are treated as if padded with trailing zero bytes to a common
/// length. The common prefix of `low` and `high` is skipped, and the next
/// four bytes of each key are read as big-endian integers. The result is
/// `(target - low) / (high - low) * total`, rounded half up and clamped to
/// `[0, total]`. When `low` and `high` are equal, or `high` sorts before
/// `low`, the position is 0.
///
/// An empty `low` stands for the start of the key space, which is how the
/// first bucket of a histogram is interpolated.
///
/// ```
/// use groupcost_core::uniform_portion;
///
/// assert_eq!(uniform_portion(b"A", b"Z", b"M", 100), 48);
/// ```
#[must_use]
pub fn uniform_portion(low: &[u8], high: &[u8], target: &[u8], total: u64) -> u64 {
    let width = low.len().max(high.len());
    let Some(first_mismatch) = (0..width).find(|&i| byte_at(low, i) != byte_at(high, i)) else {
        return 0;
    };

    let lo = window_value(low, first_mismatch);
    let hi = window_value(high, first_mismatch);
    let key = window_value(target, first_mismatch);
    if hi <= lo || key <= lo {
        return 0;
    }

    let span = u128::from(hi - lo);
    let offset = u128::from(key - lo);
    let portion = (offset * u128::from(total) + span / 2) / span;
    u64::try_from(portion).map_or(total, |p| p.min(total))
}

fn byte_at(key: &[u8], idx: usize) -> u8 {
    key.get(idx).copied().unwrap_or(0)
}

fn window_value(key: &[u8], start: usize) -> u64 {
    (0..WINDOW).fold(0u64, |acc, i| (acc << 8) | u64::from(byte_at(key, start + i)))
}
