use super::error::{ensure_finite, PredictError};

/// Ordinary least squares of close on its index `0..n`, evaluated one step past the end.
pub fn predict_next(closes: &[f64]) -> Result<f64, PredictError> {
    ensure_finite(closes)?;

    let n = closes.len();
    if n == 1 {
        return Ok(closes[0]);
    }

    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = closes.iter().sum::<f64>() / nf;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in closes.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let estimate = intercept + slope * nf;

    if estimate.is_finite() {
        Ok(estimate)
    } else {
        Err(PredictError::NonFiniteEstimate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extends_a_perfect_line() {
        let closes: Vec<f64> = (0..10).map(|i| 100.0 + 2.5 * i as f64).collect();
        let next = predict_next(&closes).unwrap();
        assert!((next - 125.0).abs() < 1e-9);
    }

    #[test]
    fn fits_noisy_series() {
        let closes = [10.0, 12.0, 11.0, 13.0];
        // slope = 4 / 5 = 0.8, intercept = 11.5 - 0.8 * 1.5 = 10.3
        let next = predict_next(&closes).unwrap();
        assert!((next - 13.5).abs() < 1e-9);
    }

    #[test]
    fn single_point_predicts_itself() {
        assert_eq!(predict_next(&[42.0]).unwrap(), 42.0);
    }

    #[test]
    fn rejects_empty_and_non_finite() {
        assert_eq!(predict_next(&[]), Err(PredictError::EmptyHistory));
        assert_eq!(
            predict_next(&[1.0, f64::NAN]),
            Err(PredictError::NonFiniteInput { index: 1 })
        );
    }
}
