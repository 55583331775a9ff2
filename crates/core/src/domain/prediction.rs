use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The three estimators, each carrying fixed confidence/accuracy labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    #[serde(rename = "LSTM")]
    Lstm,
    #[serde(rename = "ARIMA")]
    Arima,
    #[serde(rename = "Linear Regression")]
    LinearRegression,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Lstm, ModelKind::Arima, ModelKind::LinearRegression];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Lstm => "LSTM",
            ModelKind::Arima => "ARIMA",
            ModelKind::LinearRegression => "Linear Regression",
        }
    }

    /// Fixed label, not derived from fit quality.
    pub fn confidence(self) -> f64 {
        match self {
            ModelKind::Lstm => 0.85,
            ModelKind::Arima => 0.72,
            ModelKind::LinearRegression => 0.68,
        }
    }

    /// Fixed label, in percent.
    pub fn accuracy(self) -> f64 {
        match self {
            ModelKind::Lstm => 87.3,
            ModelKind::Arima => 73.1,
            ModelKind::LinearRegression => 65.8,
        }
    }
}

impl std::str::FromStr for ModelKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown model type: {s}"))
    }
}

/// Row of the `predictions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub stock_symbol: String,
    pub model_type: ModelKind,
    pub predicted_price: f64,
    pub confidence: f64,
    pub prediction_date: DateTime<Utc>,
    pub target_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_kind_round_trips_through_its_label() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
            assert_eq!(
                serde_json::to_value(kind).unwrap(),
                serde_json::json!(kind.as_str())
            );
        }
        assert!("GARCH".parse::<ModelKind>().is_err());
    }
}
