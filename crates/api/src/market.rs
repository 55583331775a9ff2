use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use stockcast_core::domain::prediction::PredictionRecord;
use stockcast_core::domain::stock::StockQuote;
use stockcast_core::indicators::{self, IndicatorReport};
use stockcast_core::market::{normalize_symbol, HistoryRange};
use stockcast_core::predict::{self, PredictionSet};
use stockcast_core::sentiment::{self, SentimentReport, SentimentSource};

use crate::app::AppState;
use crate::error::ApiError;

const STOCK_HISTORY: HistoryRange = HistoryRange::OneYear;
const SAVED_PREDICTIONS_LIMIT: i64 = 30;

/// Strict validation for the database-backed and indicator routes. Stock, predict and
/// sentiment take the path segment as given; the provider rejects what it cannot serve.
fn symbol_param(raw: &str) -> Result<String, ApiError> {
    normalize_symbol(raw).map_err(ApiError::bad_request)
}

pub async fn get_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<StockQuote>, ApiError> {
    let history = state.market.fetch_history(&symbol, STOCK_HISTORY).await?;
    let mut quote = StockQuote::from_history(history)?;
    // Echo the ticker as requested, not the provider's canonical spelling.
    quote.symbol = symbol;
    Ok(Json(quote))
}

pub async fn predict_stock(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<PredictionSet>, ApiError> {
    let set = predict::predict_symbol(state.market.as_ref(), &symbol).await?;
    Ok(Json(set))
}

#[derive(Debug, Default, Deserialize)]
pub struct SentimentParams {
    #[serde(default)]
    source: SentimentSource,
}

pub async fn get_sentiment(
    Path(symbol): Path<String>,
    Query(params): Query<SentimentParams>,
) -> Json<SentimentReport> {
    Json(sentiment::report(symbol.trim(), params.source))
}

pub async fn get_indicators(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<IndicatorReport>, ApiError> {
    let symbol = symbol_param(&symbol)?;
    let report = indicators::indicators_for_symbol(state.market.as_ref(), &symbol).await?;
    Ok(Json(report))
}

pub async fn get_saved_predictions(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<PredictionRecord>>, ApiError> {
    let pool = state.pool()?;
    let symbol = symbol_param(&symbol)?;
    let rows = stockcast_core::storage::predictions::recent_predictions(
        pool,
        &symbol,
        SAVED_PREDICTIONS_LIMIT,
    )
    .await?;
    Ok(Json(rows))
}
