//! Toy next-day estimators and the dispatcher that runs all three.

pub mod arima;
pub mod error;
pub mod linear;
pub mod lstm;

pub use error::PredictError;

use crate::domain::prediction::ModelKind;
use crate::market::{HistoryRange, MarketDataProvider};
use crate::round2;
use anyhow::Context;
use serde::{Deserialize, Serialize};

/// History window the estimators are fed with.
pub const PREDICTION_HISTORY: HistoryRange = HistoryRange::TwoYears;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub prediction: f64,
    pub confidence: f64,
    pub accuracy: f64,
}

impl ModelPrediction {
    fn new(kind: ModelKind, estimate: f64) -> Self {
        Self {
            prediction: round2(estimate),
            confidence: round2(kind.confidence()),
            accuracy: kind.accuracy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSet {
    #[serde(rename = "LSTM")]
    pub lstm: ModelPrediction,
    #[serde(rename = "ARIMA")]
    pub arima: ModelPrediction,
    #[serde(rename = "Linear Regression")]
    pub linear_regression: ModelPrediction,
}

impl PredictionSet {
    pub fn get(&self, kind: ModelKind) -> &ModelPrediction {
        match kind {
            ModelKind::Lstm => &self.lstm,
            ModelKind::Arima => &self.arima,
            ModelKind::LinearRegression => &self.linear_regression,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (ModelKind, &ModelPrediction)> {
        ModelKind::ALL.into_iter().map(move |k| (k, self.get(k)))
    }
}

pub fn estimate(kind: ModelKind, closes: &[f64]) -> Result<f64, PredictError> {
    match kind {
        ModelKind::Lstm => lstm::predict_next(closes),
        ModelKind::Arima => arima::predict_next(closes),
        ModelKind::LinearRegression => linear::predict_next(closes),
    }
}

/// Run the estimators in order; the first failure aborts the whole set.
pub fn run_all(closes: &[f64]) -> Result<PredictionSet, PredictError> {
    Ok(PredictionSet {
        lstm: ModelPrediction::new(ModelKind::Lstm, estimate(ModelKind::Lstm, closes)?),
        arima: ModelPrediction::new(ModelKind::Arima, estimate(ModelKind::Arima, closes)?),
        linear_regression: ModelPrediction::new(
            ModelKind::LinearRegression,
            estimate(ModelKind::LinearRegression, closes)?,
        ),
    })
}

pub async fn predict_symbol(
    provider: &dyn MarketDataProvider,
    symbol: &str,
) -> anyhow::Result<PredictionSet> {
    let history = provider
        .fetch_history(symbol, PREDICTION_HISTORY)
        .await?;
    let closes = history.closes();
    let set = run_all(&closes).with_context(|| format!("prediction failed for {symbol}"))?;
    tracing::debug!(%symbol, points = closes.len(), "ran estimators");
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trending(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + i as f64 * 0.5 + if i % 2 == 0 { 0.3 } else { -0.3 })
            .collect()
    }

    #[test]
    fn runs_every_model_with_fixed_labels() {
        let closes = trending(120);
        let set = run_all(&closes).unwrap();

        for (kind, p) in set.entries() {
            assert_eq!(p.confidence, kind.confidence());
            assert_eq!(p.accuracy, kind.accuracy());
            assert!(p.prediction.is_finite());
            assert_eq!(p.prediction, round2(p.prediction));
        }

        let last = closes[closes.len() - 1];
        let lstm = estimate(ModelKind::Lstm, &closes).unwrap();
        assert_eq!(set.lstm.prediction, round2(lstm));
        assert!(lstm > last);
    }

    #[test]
    fn serializes_with_model_labels_as_keys() {
        let set = run_all(&trending(80)).unwrap();
        let v = serde_json::to_value(&set).unwrap();
        assert_eq!(v["LSTM"]["confidence"], json!(0.85));
        assert_eq!(v["ARIMA"]["accuracy"], json!(73.1));
        assert_eq!(v["Linear Regression"]["confidence"], json!(0.68));
    }

    #[test]
    fn short_history_fails_the_whole_set() {
        let err = run_all(&trending(30)).unwrap_err();
        assert!(matches!(
            err,
            PredictError::InsufficientHistory { model: "LSTM", .. }
        ));
    }
}
