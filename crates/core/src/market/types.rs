use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};

/// Lookback windows accepted by the chart endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryRange {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
    #[serde(rename = "1mo")]
    OneMonth,
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
}

impl HistoryRange {
    pub fn as_str(self) -> &'static str {
        match self {
            HistoryRange::OneDay => "1d",
            HistoryRange::FiveDays => "5d",
            HistoryRange::OneMonth => "1mo",
            HistoryRange::ThreeMonths => "3mo",
            HistoryRange::SixMonths => "6mo",
            HistoryRange::OneYear => "1y",
            HistoryRange::TwoYears => "2y",
        }
    }
}

impl std::fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One daily bar. Serialized with the column names clients already chart against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
    pub volume: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub symbol: String,
    pub name: Option<String>,
    pub currency: Option<String>,
    pub regular_market_price: Option<f64>,
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub chart: Chart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartError {
    pub code: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: ChartIndicators,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: Option<String>,
    pub currency: Option<String>,
    pub long_name: Option<String>,
    pub short_name: Option<String>,
    pub regular_market_price: Option<f64>,
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartQuote {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

impl ChartEnvelope {
    /// Flatten the chart payload into a history, dropping bars without a close.
    pub fn into_history(self, requested_symbol: &str) -> anyhow::Result<PriceHistory> {
        if let Some(err) = self.chart.error {
            bail!(
                "market data error for {requested_symbol}: {}",
                err.description
                    .or(err.code)
                    .unwrap_or_else(|| "unknown error".to_string())
            );
        }

        let result = self
            .chart
            .result
            .and_then(|mut r| if r.is_empty() { None } else { Some(r.swap_remove(0)) })
            .with_context(|| format!("no market data found for {requested_symbol}"))?;

        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
        let offset = result.meta.gmtoffset;

        let mut bars = Vec::with_capacity(result.timestamp.len());
        for (i, ts) in result.timestamp.iter().enumerate() {
            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };
            if !close.is_finite() {
                continue;
            }
            let date = DateTime::from_timestamp(ts + offset, 0)
                .with_context(|| format!("invalid bar timestamp {ts}"))?
                .date_naive();
            bars.push(PriceBar {
                date,
                open: quote.open.get(i).copied().flatten(),
                high: quote.high.get(i).copied().flatten(),
                low: quote.low.get(i).copied().flatten(),
                close,
                volume: quote.volume.get(i).copied().flatten(),
            });
        }

        let symbol = result
            .meta
            .symbol
            .unwrap_or_else(|| requested_symbol.to_string());

        Ok(PriceHistory {
            symbol,
            name: result.meta.long_name.or(result.meta.short_name),
            currency: result.meta.currency,
            regular_market_price: result.meta.regular_market_price,
            bars,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_chart_and_skips_null_closes() {
        let v = json!({
            "chart": {
                "result": [{
                    "meta": {
                        "symbol": "AAPL",
                        "currency": "USD",
                        "longName": "Apple Inc.",
                        "shortName": "Apple",
                        "regularMarketPrice": 191.5,
                        "gmtoffset": -14400
                    },
                    "timestamp": [1717767000, 1718026200, 1718112600],
                    "indicators": {
                        "quote": [{
                            "open": [194.6, 196.9, null],
                            "high": [196.9, 197.3, null],
                            "low": [194.1, 192.2, null],
                            "close": [196.89, 193.12, null],
                            "volume": [53103900, 97262100, null]
                        }]
                    }
                }],
                "error": null
            }
        });

        let env: ChartEnvelope = serde_json::from_value(v).unwrap();
        let history = env.into_history("aapl").unwrap();
        assert_eq!(history.symbol, "AAPL");
        assert_eq!(history.name.as_deref(), Some("Apple Inc."));
        assert_eq!(history.bars.len(), 2);
        assert_eq!(history.bars[0].date, NaiveDate::from_ymd_opt(2024, 6, 7).unwrap());
        assert_eq!(history.closes(), vec![196.89, 193.12]);
        assert_eq!(history.bars[1].volume, Some(97262100));
    }

    #[test]
    fn surfaces_provider_error() {
        let v = json!({
            "chart": {
                "result": null,
                "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}
            }
        });

        let env: ChartEnvelope = serde_json::from_value(v).unwrap();
        let err = env.into_history("ZZZZ").unwrap_err();
        assert!(err.to_string().contains("symbol may be delisted"));
    }

    #[test]
    fn empty_result_is_an_error() {
        let v = json!({"chart": {"result": [], "error": null}});
        let env: ChartEnvelope = serde_json::from_value(v).unwrap();
        assert!(env.into_history("ZZZZ").is_err());
    }

    #[test]
    fn bars_serialize_with_pascal_case_columns() {
        let bar = PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 6, 7).unwrap(),
            open: Some(1.0),
            high: None,
            low: None,
            close: 2.0,
            volume: Some(10),
        };
        let v = serde_json::to_value(&bar).unwrap();
        assert_eq!(v["Date"], json!("2024-06-07"));
        assert_eq!(v["Close"], json!(2.0));
    }
}
