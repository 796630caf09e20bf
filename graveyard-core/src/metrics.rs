//! Death statistics — pure functions over a single ticker's final-month trace.
//!
//! Every function takes time-sorted slices in, scalar out. No dependencies
//! on the data layer or the jobs; degenerate inputs return the documented
//! fallback values instead of erroring so the output schema stays uniform.

/// Metrics characterizing one ticker's final month of trading.
#[derive(Debug, Clone, PartialEq)]
pub struct DeathMetrics {
    pub dollar_volume: f64,
    pub exodus_ratio: f64,
    pub volatility: f64,
    pub final_drop_pct: f64,
}

impl DeathMetrics {
    /// Compute all metrics from a time-sorted close/volume trace.
    pub fn compute(closes: &[f64], volumes: &[f64]) -> Self {
        Self {
            dollar_volume: dollar_volume(closes, volumes),
            exodus_ratio: exodus_ratio(volumes),
            volatility: sample_std_dev(&row_returns(closes)),
            final_drop_pct: final_drop_pct(closes),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
///
/// Returns 0.0 for fewer than 2 values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>()
        / (values.len() - 1) as f64;
    var.sqrt()
}

/// Row-over-row fractional price changes.
///
/// The first row has no prior value and is dropped, so the result is one
/// shorter than the input.
pub fn row_returns(closes: &[f64]) -> Vec<f64> {
    closes.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
}

/// Liquidity proxy: total volume times mean close over the trace.
///
/// Deliberately not a per-row dollar-volume sum; the downstream ranking
/// depends on this exact single-number approximation.
pub fn dollar_volume(closes: &[f64], volumes: &[f64]) -> f64 {
    volumes.iter().sum::<f64>() * mean(closes)
}

/// Volume-exodus ratio: mean volume of the last quarter of rows over mean
/// volume of the first quarter, offset by +1 to guard a zero denominator.
///
/// A quarter is `max(len / 4, 1)` rows. Returns 0.0 for an empty trace.
pub fn exodus_ratio(volumes: &[f64]) -> f64 {
    if volumes.is_empty() {
        return 0.0;
    }
    let quarter = (volumes.len() / 4).max(1);
    let early = mean(&volumes[..quarter]);
    let late = mean(&volumes[volumes.len() - quarter..]);
    late / (early + 1.0)
}

/// Fractional decline from the trace's peak close to its final close.
///
/// Returns 0.0 when the peak is not positive or the trace is empty.
pub fn final_drop_pct(closes: &[f64]) -> f64 {
    let peak = closes.iter().copied().fold(f64::NAN, f64::max);
    let Some(&last) = closes.last() else {
        return 0.0;
    };
    if peak > 0.0 {
        (peak - last) / peak
    } else {
        0.0
    }
}
