//! Placeholder sequence model.
//!
//! Scales closes into `[0, 1]` and shapes them into 60-step lookback windows the
//! way a recurrent model would consume them, but no network is run: the estimate
//! is the last scaled value grown by 2% and mapped back to price space.

use super::error::{ensure_finite, PredictError};

pub const LOOKBACK: usize = 60;
pub const PLACEHOLDER_GROWTH: f64 = 1.02;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinMaxScaler {
    min: f64,
    scale: f64,
}

impl MinMaxScaler {
    /// A constant series gets a unit scale, so it transforms to zeros.
    pub fn fit(data: &[f64]) -> Result<Self, PredictError> {
        ensure_finite(data)?;
        let min = data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        Ok(Self {
            min,
            scale: if range == 0.0 { 1.0 } else { range },
        })
    }

    pub fn transform(&self, v: f64) -> f64 {
        (v - self.min) / self.scale
    }

    pub fn inverse(&self, v: f64) -> f64 {
        v * self.scale + self.min
    }
}

/// `(window, target)` pairs: each window holds `lookback` consecutive values and the
/// target is the value right after it.
pub fn sequence_windows(scaled: &[f64], lookback: usize) -> Vec<(&[f64], f64)> {
    (lookback..scaled.len())
        .map(|i| (&scaled[i - lookback..i], scaled[i]))
        .collect()
}

pub fn predict_next(closes: &[f64]) -> Result<f64, PredictError> {
    let scaler = MinMaxScaler::fit(closes)?;
    let scaled: Vec<f64> = closes.iter().map(|&v| scaler.transform(v)).collect();

    let windows = sequence_windows(&scaled, LOOKBACK);
    if windows.is_empty() {
        return Err(PredictError::InsufficientHistory {
            model: "LSTM",
            needed: LOOKBACK + 1,
            got: closes.len(),
        });
    }
    tracing::trace!(windows = windows.len(), lookback = LOOKBACK, "built sequence windows");

    let last_scaled = scaled[scaled.len() - 1];
    Ok(scaler.inverse(last_scaled * PLACEHOLDER_GROWTH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaler_maps_into_unit_interval_and_back() {
        let data = [10.0, 20.0, 15.0];
        let s = MinMaxScaler::fit(&data).unwrap();
        assert_eq!(s.transform(10.0), 0.0);
        assert_eq!(s.transform(20.0), 1.0);
        assert_eq!(s.transform(15.0), 0.5);
        assert_eq!(s.inverse(0.5), 15.0);
    }

    #[test]
    fn windows_pair_lookback_with_next_value() {
        let data: Vec<f64> = (0..5).map(f64::from).collect();
        let w = sequence_windows(&data, 3);
        assert_eq!(w.len(), 2);
        assert_eq!(w[0], (&[0.0, 1.0, 2.0][..], 3.0));
        assert_eq!(w[1], (&[1.0, 2.0, 3.0][..], 4.0));
        assert!(sequence_windows(&data, 5).is_empty());
    }

    #[test]
    fn grows_last_scaled_value_by_two_percent() {
        // min 100, max 200, last 150 -> scaled 0.5 -> 0.51 -> 151.
        let mut closes: Vec<f64> = vec![100.0; 30];
        closes.extend(vec![200.0; 30]);
        closes.push(150.0);
        let got = predict_next(&closes).unwrap();
        assert!((got - 151.0).abs() < 1e-9);
    }

    #[test]
    fn constant_series_predicts_the_constant() {
        let closes = vec![75.0; 61];
        assert_eq!(predict_next(&closes).unwrap(), 75.0);
    }

    #[test]
    fn requires_more_than_one_lookback_of_history() {
        let closes = vec![1.0; LOOKBACK];
        assert_eq!(
            predict_next(&closes),
            Err(PredictError::InsufficientHistory {
                model: "LSTM",
                needed: 61,
                got: 60
            })
        );
        assert!(predict_next(&vec![1.0; LOOKBACK + 1]).is_ok());
    }
}
