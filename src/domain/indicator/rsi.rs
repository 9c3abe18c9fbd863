//! RSI (Relative Strength Index), simple-mean variant.
//!
//! Average gain/loss is the plain mean of the last n bar-to-bar gains/losses,
//! not Wilder's exponential smoothing.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are `None` (need n price changes).

pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || closes.len() < 2 {
        return vec![None; closes.len()];
    }

    let mut gains: Vec<f64> = Vec::with_capacity(closes.len() - 1);
    let mut losses: Vec<f64> = Vec::with_capacity(closes.len() - 1);

    for pair in closes.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(if change > 0.0 { change } else { 0.0 });
        losses.push(if change < 0.0 { -change } else { 0.0 });
    }

    let mut values = Vec::with_capacity(closes.len());
    values.push(None);

    // gains[i - 1] is the change that ends on bar i.
    for i in 1..closes.len() {
        if i < period {
            values.push(None);
            continue;
        }
        let avg_gain = gains[i - period..i].iter().sum::<f64>() / period as f64;
        let avg_loss = losses[i - period..i].iter().sum::<f64>() / period as f64;
        values.push(Some(rsi_from_averages(avg_gain, avg_loss)));
    }

    values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn rsi_empty() {
        assert!(calculate_rsi(&[], 14).is_empty());
    }

    #[test]
    fn rsi_single_bar() {
        assert_eq!(calculate_rsi(&[100.0], 14), vec![None]);
    }

    #[test]
    fn rsi_warmup_period() {
        let closes: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&closes, 14);

        assert_eq!(series.len(), 15);
        for (i, v) in series.iter().take(14).enumerate() {
            assert!(v.is_none(), "bar {} should be undefined", i);
        }
        assert!(series[14].is_some(), "bar 14 should be defined");
    }

    #[test]
    fn rsi_all_gains_is_exactly_100() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&closes, 14);
        assert_eq!(series[14], Some(100.0));
    }

    #[test]
    fn rsi_flat_window_is_100() {
        let closes = vec![50.0; 20];
        let series = calculate_rsi(&closes, 14);
        assert_eq!(series[19], Some(100.0));
    }

    #[test]
    fn rsi_all_losses_is_zero() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&closes, 14);
        let rsi = series[14].unwrap();
        assert!(rsi.abs() < f64::EPSILON, "RSI should be 0 when all losses");
    }

    #[test]
    fn rsi_uses_simple_mean_not_wilder() {
        // Alternating +3/-2: any 14-change window holds 7 gains and 7 losses,
        // so avg_gain = 1.5, avg_loss = 1.0, RS = 1.5, RSI = 60.
        let mut closes = vec![100.0];
        for i in 0..40 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 3.0 } else { last - 2.0 });
        }
        let series = calculate_rsi(&closes, 14);
        for v in series.iter().skip(14) {
            assert_relative_eq!(v.unwrap(), 60.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn rsi_window_drops_old_losses() {
        // One early loss followed by 14 gains: once the loss leaves the
        // window, RSI returns to 100.
        let mut closes = vec![100.0, 90.0];
        for i in 1..=14 {
            closes.push(90.0 + i as f64);
        }
        let series = calculate_rsi(&closes, 14);
        assert!(series[14].unwrap() < 100.0);
        assert_eq!(series[15], Some(100.0));
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&[100.0, 101.0], 0);
        assert_eq!(series, vec![None, None]);
    }

    #[test]
    fn rsi_known_calculation() {
        let closes = [
            44.0, 44.25, 44.50, 43.75, 44.50, 44.25, 44.75, 45.25, 45.50, 45.25, 45.50, 46.0,
            46.25, 46.0, 46.50,
        ];
        let series = calculate_rsi(&closes, 14);
        // gains: 0.25+0.25+0.75+0.5+0.5+0.25+0.25+0.5+0.25+0.5 = 4.0
        // losses: 0.75+0.25+0.25+0.25 = 1.5
        let expected = 100.0 - 100.0 / (1.0 + 4.0 / 1.5);
        assert_relative_eq!(series[14].unwrap(), expected, epsilon = 1e-9);
    }
}
