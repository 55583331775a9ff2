use crate::market::{PriceBar, PriceHistory};
use crate::round2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response shape of the stock lookup: latest close, day-over-day change and the bars behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockQuote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub historical_data: Vec<PriceBar>,
}

impl StockQuote {
    pub fn from_history(history: PriceHistory) -> anyhow::Result<Self> {
        let n = history.bars.len();
        anyhow::ensure!(
            n >= 2,
            "need at least two closes for {} (got {n})",
            history.symbol
        );

        let current = history.bars[n - 1].close;
        let previous = history.bars[n - 2].close;
        anyhow::ensure!(
            previous != 0.0,
            "previous close for {} is zero",
            history.symbol
        );

        let change = current - previous;
        let change_percent = change / previous * 100.0;

        Ok(Self {
            name: history.name.unwrap_or_else(|| history.symbol.clone()),
            symbol: history.symbol,
            price: round2(current),
            change: round2(change),
            change_percent: round2(change_percent),
            historical_data: history.bars,
        })
    }
}

/// Row of the `stocks` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockRecord {
    pub id: Uuid,
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub last_updated: DateTime<Utc>,
}
