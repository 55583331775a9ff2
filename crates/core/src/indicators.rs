//! Moving averages and RSI over daily closes.

use crate::market::{HistoryRange, MarketDataProvider, PriceHistory};
use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ta::indicators::{ExponentialMovingAverage, RelativeStrengthIndex, SimpleMovingAverage};
use ta::Next;

pub const INDICATOR_HISTORY: HistoryRange = HistoryRange::SixMonths;

const SMA_SHORT: usize = 20;
const SMA_LONG: usize = 50;
const EMA_FAST: usize = 12;
const EMA_SLOW: usize = 26;
const RSI_PERIOD: usize = 14;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub close: f64,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_12: f64,
    pub ema_26: f64,
    pub rsi_14: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorReport {
    pub symbol: String,
    pub latest: Option<IndicatorPoint>,
    pub points: Vec<IndicatorPoint>,
}

/// SMA values are withheld until a full window is seen, RSI until a full window of
/// price changes is seen; EMAs are seeded with the first close.
pub fn compute(history: &PriceHistory) -> anyhow::Result<IndicatorReport> {
    let err = |e: ta::errors::TaError| anyhow!("indicator setup failed: {e}");
    let mut sma_short = SimpleMovingAverage::new(SMA_SHORT).map_err(err)?;
    let mut sma_long = SimpleMovingAverage::new(SMA_LONG).map_err(err)?;
    let mut ema_fast = ExponentialMovingAverage::new(EMA_FAST).map_err(err)?;
    let mut ema_slow = ExponentialMovingAverage::new(EMA_SLOW).map_err(err)?;
    let mut rsi = RelativeStrengthIndex::new(RSI_PERIOD).map_err(err)?;

    let points: Vec<IndicatorPoint> = history
        .bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let seen = i + 1;
            let short = sma_short.next(bar.close);
            let long = sma_long.next(bar.close);
            let rsi_value = rsi.next(bar.close);
            IndicatorPoint {
                date: bar.date,
                close: bar.close,
                sma_20: (seen >= SMA_SHORT).then_some(short),
                sma_50: (seen >= SMA_LONG).then_some(long),
                ema_12: ema_fast.next(bar.close),
                ema_26: ema_slow.next(bar.close),
                rsi_14: (seen > RSI_PERIOD).then_some(rsi_value),
            }
        })
        .collect();

    Ok(IndicatorReport {
        symbol: history.symbol.clone(),
        latest: points.last().cloned(),
        points,
    })
}

pub async fn indicators_for_symbol(
    provider: &dyn MarketDataProvider,
    symbol: &str,
) -> anyhow::Result<IndicatorReport> {
    let history = provider.fetch_history(symbol, INDICATOR_HISTORY).await?;
    compute(&history)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::PriceBar;

    fn history(closes: impl IntoIterator<Item = f64>) -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceHistory {
            symbol: "QQQ".to_string(),
            name: None,
            currency: None,
            regular_market_price: None,
            bars: closes
                .into_iter()
                .enumerate()
                .map(|(i, close)| PriceBar {
                    date: start + chrono::Duration::days(i as i64),
                    open: None,
                    high: None,
                    low: None,
                    close,
                    volume: None,
                })
                .collect(),
        }
    }

    #[test]
    fn windows_gate_sma_and_rsi() {
        let report = compute(&history((1..=60).map(f64::from))).unwrap();
        assert_eq!(report.points.len(), 60);

        assert!(report.points[18].sma_20.is_none());
        assert_eq!(report.points[19].sma_20, Some(10.5));
        assert!(report.points[48].sma_50.is_none());
        assert_eq!(report.points[49].sma_50, Some(25.5));

        assert!(report.points[13].rsi_14.is_none());
        assert!(report.points[14].rsi_14.is_some());

        assert_eq!(report.points[0].ema_12, 1.0);
        assert_eq!(report.latest, report.points.last().cloned());
    }

    #[test]
    fn rising_series_has_high_rsi() {
        let report = compute(&history((1..=40).map(f64::from))).unwrap();
        let rsi = report.latest.unwrap().rsi_14.unwrap();
        assert!(rsi > 90.0, "rsi {rsi}");
    }

    #[test]
    fn constant_series_keeps_averages_flat() {
        let report = compute(&history(std::iter::repeat(42.0).take(30))).unwrap();
        let last = report.latest.unwrap();
        assert_eq!(last.sma_20, Some(42.0));
        assert!((last.ema_12 - 42.0).abs() < 1e-9);
        assert!((last.ema_26 - 42.0).abs() < 1e-9);
    }

    #[test]
    fn empty_history_has_no_latest_point() {
        let report = compute(&history(std::iter::empty())).unwrap();
        assert!(report.points.is_empty());
        assert!(report.latest.is_none());
    }
}
