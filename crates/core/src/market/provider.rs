use crate::config::Settings;
use crate::market::types::{ChartEnvelope, HistoryRange, PriceHistory};
use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; stockcast/0.1)";
const CHART_PATH: &str = "/v8/finance/chart";

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn provider_name(&self) -> &'static str;

    async fn fetch_history(&self, symbol: &str, range: HistoryRange) -> Result<PriceHistory>;
}

#[derive(Debug, Clone)]
pub struct YahooChartProvider {
    http: reqwest::Client,
    base_url: String,
}

impl YahooChartProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let user_agent = settings
            .market_data_user_agent
            .clone()
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.market_data_timeout_secs))
            .user_agent(user_agent)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url: settings.market_data_base_url.clone(),
        })
    }

    fn url(&self, symbol: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url.trim_end_matches('/'),
            CHART_PATH,
            symbol
        )
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooChartProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_chart"
    }

    async fn fetch_history(&self, symbol: &str, range: HistoryRange) -> Result<PriceHistory> {
        let symbol = normalize_symbol(symbol)?;

        let res = self
            .http
            .get(self.url(&symbol))
            .query(&[("range", range.as_str()), ("interval", "1d")])
            .send()
            .await
            .with_context(|| format!("market data request failed for {symbol}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;

        // Unknown tickers come back as 404 with a chart.error body; prefer that message.
        let envelope = match serde_json::from_str::<ChartEnvelope>(&text) {
            Ok(env) => env,
            Err(err) if !status.is_success() => {
                anyhow::bail!("market data HTTP {status} for {symbol}: {err}")
            }
            Err(err) => {
                return Err(err).context("failed to parse market data response");
            }
        };

        let history = envelope.into_history(&symbol)?;
        tracing::debug!(
            %symbol,
            %range,
            bars = history.bars.len(),
            "fetched price history"
        );
        Ok(history)
    }
}

/// Trim and upper-case a ticker, rejecting anything that cannot be a symbol path segment.
pub fn normalize_symbol(raw: &str) -> Result<String> {
    let symbol = raw.trim().to_ascii_uppercase();
    anyhow::ensure!(!symbol.is_empty(), "symbol must be non-empty");
    anyhow::ensure!(symbol.len() <= 12, "symbol too long: {symbol}");
    anyhow::ensure!(
        symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '=')),
        "invalid symbol: {symbol}"
    );
    Ok(symbol)
}

/// Most recent traded price: last daily close, else the exchange's regular-market price.
pub async fn latest_price(provider: &dyn MarketDataProvider, symbol: &str) -> Result<f64> {
    let history = provider.fetch_history(symbol, HistoryRange::OneDay).await?;
    history
        .bars
        .last()
        .map(|b| b.close)
        .or(history.regular_market_price)
        .with_context(|| format!("no current price available for {symbol}"))
}
