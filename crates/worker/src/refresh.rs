use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};

use stockcast_core::market::{MarketDataProvider, PriceHistory};
use stockcast_core::predict::{self, PredictionSet, PREDICTION_HISTORY};

#[derive(Debug, Clone)]
pub struct SymbolRefresh {
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub predictions: PredictionSet,
}

impl SymbolRefresh {
    pub fn from_history(history: PriceHistory) -> anyhow::Result<Self> {
        let current_price = history
            .bars
            .last()
            .map(|b| b.close)
            .or(history.regular_market_price)
            .with_context(|| format!("no price available for {}", history.symbol))?;

        let predictions = predict::run_all(&history.closes())
            .with_context(|| format!("prediction failed for {}", history.symbol))?;

        Ok(Self {
            name: history.name.unwrap_or_else(|| history.symbol.clone()),
            symbol: history.symbol,
            current_price,
            predictions,
        })
    }
}

pub async fn evaluate_symbol(
    provider: &dyn MarketDataProvider,
    symbol: &str,
) -> anyhow::Result<SymbolRefresh> {
    let history = provider.fetch_history(symbol, PREDICTION_HISTORY).await?;
    SymbolRefresh::from_history(history)
}

/// Upsert the stock row and append one prediction row per model, both or neither.
pub async fn persist(
    pool: &sqlx::PgPool,
    refresh: &SymbolRefresh,
    now: DateTime<Utc>,
    target_date: NaiveDate,
) -> anyhow::Result<u64> {
    let mut tx = pool.begin().await.context("begin transaction failed")?;

    stockcast_core::storage::stocks::upsert_stock(
        &mut *tx,
        &refresh.symbol,
        &refresh.name,
        refresh.current_price,
        now,
    )
    .await?;

    let rows = stockcast_core::storage::predictions::insert_prediction_set(
        &mut *tx,
        &refresh.symbol,
        &refresh.predictions,
        now,
        target_date,
    )
    .await?;

    tx.commit()
        .await
        .with_context(|| format!("commit refresh failed for {}", refresh.symbol))?;
    Ok(rows)
}
