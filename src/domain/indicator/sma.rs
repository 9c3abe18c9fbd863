//! Simple moving average over a trailing window.
//!
//! SMA(n) at index i = mean(values[i-n+1..=i]).
//! Warmup: first (n-1) entries are `None`.

/// Rolling mean of `values` with window `period`; each window is summed
/// from scratch.
pub fn calculate_sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; values.len()];
    }

    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < period {
                None
            } else {
                let window = &values[i + 1 - period..=i];
                Some(window.iter().sum::<f64>() / period as f64)
            }
        })
        .collect()
}
