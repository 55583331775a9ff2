use super::error::{ensure_finite, PredictError};

/// Autoregressive order on the differenced series.
pub const AR_ORDER: usize = 5;

/// Growth applied to the last close when the model cannot be fitted.
pub const FALLBACK_GROWTH: f64 = 1.01;

/// ARIMA(5,1,0) one-step forecast. Any fitting failure degrades to `last * 1.01`.
pub fn predict_next(closes: &[f64]) -> Result<f64, PredictError> {
    if closes.is_empty() {
        return Err(PredictError::EmptyHistory);
    }

    match forecast(closes, AR_ORDER) {
        Ok(v) => Ok(v),
        Err(err) => {
            tracing::debug!(error = %err, points = closes.len(), "ARIMA fit failed; using fallback");
            Ok(closes[closes.len() - 1] * FALLBACK_GROWTH)
        }
    }
}

/// Fit AR(p) on first differences by conditional least squares (no constant) and
/// integrate the next difference back onto the last close.
pub fn forecast(closes: &[f64], p: usize) -> Result<f64, PredictError> {
    ensure_finite(closes)?;

    let diffs: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    let phi = fit_ar(&diffs, p)?;

    let m = diffs.len();
    let next_diff: f64 = phi
        .iter()
        .enumerate()
        .map(|(i, coef)| coef * diffs[m - 1 - i])
        .sum();

    let estimate = closes[closes.len() - 1] + next_diff;
    if estimate.is_finite() {
        Ok(estimate)
    } else {
        Err(PredictError::NonFiniteEstimate)
    }
}

/// Least-squares AR coefficients `phi[0..p]` where `phi[i]` multiplies lag `i + 1`.
pub fn fit_ar(series: &[f64], p: usize) -> Result<Vec<f64>, PredictError> {
    // Need more equations than unknowns.
    let needed = 2 * p + 1;
    if p == 0 || series.len() < needed {
        return Err(PredictError::InsufficientHistory {
            model: "ARIMA",
            needed: needed + 1,
            got: series.len() + 1,
        });
    }

    let mut xtx = vec![vec![0.0; p]; p];
    let mut xty = vec![0.0; p];
    for t in p..series.len() {
        for i in 0..p {
            let xi = series[t - 1 - i];
            xty[i] += xi * series[t];
            for j in 0..p {
                xtx[i][j] += xi * series[t - 1 - j];
            }
        }
    }

    solve(xtx, xty)
}

/// Gaussian elimination with partial pivoting.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>, PredictError> {
    let n = b.len();
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return Err(PredictError::Singular);
    }
    let tol = scale * 1e-12;

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= tol {
            return Err(PredictError::Singular);
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }

    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(PredictError::NonFiniteEstimate)
    }
}
