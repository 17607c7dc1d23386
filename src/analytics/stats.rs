//! Descriptive statistics over price-per-sqft samples.
//!
//! Quantile contract: linear interpolation between closest ranks. For a
//! sorted sample `x` of length `n` and probability `p`, the value sits at
//! fractional rank `h = p * (n - 1)`:
//!
//! `q(p) = x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`
//!
//! This is the default method of the common statistical packages. The
//! interpolation step is evaluated from the nearer end, as they do, so results
//! agree bit-for-bit rather than only within tolerance.

use crate::analytics::types::PpsfSummary;

/// Sort a sample ascending. NaN never reaches here because cleaned rows have
/// finite prices and areas.
pub fn sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut values: Vec<f64> = values.into_iter().collect();
    values.sort_by(f64::total_cmp);
    values
}

/// Linear-interpolation quantile of an already sorted sample.
/// Returns `None` for an empty sample.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);

    let h = p * (sorted.len() - 1) as f64;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    let t = h - lo as f64;

    Some(lerp(sorted[lo], sorted[hi], t))
}

/// Median: mean of the two middle values for even-sized samples
pub fn median_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Median, 25th and 75th percentile and count of a sample
pub fn summarize_ppsf(values: impl IntoIterator<Item = f64>) -> Option<PpsfSummary> {
    let sorted = sorted(values);
    Some(PpsfSummary {
        median_ppsf: median_sorted(&sorted)?,
        p25_ppsf: quantile_sorted(&sorted, 0.25)?,
        p75_ppsf: quantile_sorted(&sorted, 0.75)?,
        listing_count: sorted.len(),
    })
}

/// Tukey fences `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]` of a sorted sample
pub fn iqr_bounds(sorted: &[f64]) -> Option<(f64, f64)> {
    let q1 = quantile_sorted(sorted, 0.25)?;
    let q3 = quantile_sorted(sorted, 0.75)?;
    let iqr = q3 - q1;
    Some((q1 - 1.5 * iqr, q3 + 1.5 * iqr))
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}
