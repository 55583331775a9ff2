use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockcast_core::config::Settings;
use stockcast_core::market::{normalize_symbol, YahooChartProvider};
use stockcast_core::time::us_market;

mod refresh;

#[derive(Debug, Parser)]
#[command(name = "stockcast_worker")]
struct Args {
    /// Comma-separated tickers to refresh, e.g. AAPL,MSFT.
    #[arg(long, env = "SYMBOLS", value_delimiter = ',', required = true)]
    symbols: Vec<String>,

    /// Market as-of date (YYYY-MM-DD). Defaults to the latest closed US session.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Do everything except writing to the database.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let holidays = us_market::configured_holidays();
    let as_of_date =
        us_market::resolve_as_of_date(args.as_of_date.as_deref(), chrono::Utc::now(), &holidays)?;
    let target_date = us_market::next_trading_day(as_of_date, &holidays);

    let symbols = parse_symbols(&args.symbols)?;
    let provider = YahooChartProvider::from_settings(&settings)?;

    if args.dry_run {
        for symbol in &symbols {
            match refresh::evaluate_symbol(&provider, symbol).await {
                Ok(r) => tracing::info!(
                    %as_of_date,
                    %target_date,
                    symbol = %r.symbol,
                    price = r.current_price,
                    lstm = r.predictions.lstm.prediction,
                    arima = r.predictions.arima.prediction,
                    linear = r.predictions.linear_regression.prediction,
                    dry_run = true,
                    "evaluated symbol"
                ),
                Err(e) => tracing::warn!(%symbol, error = %format!("{e:#}"), "symbol skipped"),
            }
        }
        return Ok(());
    }

    let db_url = settings.require_database_url()?;
    let pool = stockcast_core::storage::connect(db_url, settings.db_max_connections).await?;
    stockcast_core::storage::migrate(&pool).await?;

    let mut lock_conn = pool.acquire().await.context("acquire lock connection failed")?;
    let acquired =
        stockcast_core::storage::lock::try_acquire_refresh_lock(&mut lock_conn, as_of_date).await?;
    if !acquired {
        tracing::warn!(%as_of_date, "refresh lock not acquired; another run in progress");
        return Ok(());
    }

    let mut refreshed = 0usize;
    let mut failed = 0usize;
    for symbol in &symbols {
        let result = async {
            let r = refresh::evaluate_symbol(&provider, symbol).await?;
            let rows = refresh::persist(&pool, &r, chrono::Utc::now(), target_date).await?;
            anyhow::Ok((r, rows))
        }
        .await;

        match result {
            Ok((r, rows)) => {
                refreshed += 1;
                tracing::info!(
                    %as_of_date,
                    %target_date,
                    symbol = %r.symbol,
                    price = r.current_price,
                    rows,
                    "persisted predictions"
                );
            }
            Err(e) => {
                failed += 1;
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(%symbol, error = %format!("{e:#}"), "symbol refresh failed");
            }
        }
    }

    if let Err(e) =
        stockcast_core::storage::lock::release_refresh_lock(&mut lock_conn, as_of_date).await
    {
        tracing::warn!(error = %e, "failed to release refresh lock");
    }

    tracing::info!(%as_of_date, refreshed, failed, "refresh run finished");
    Ok(())
}

fn parse_symbols(raw: &[String]) -> anyhow::Result<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    for s in raw.iter().filter(|s| !s.trim().is_empty()) {
        let symbol = normalize_symbol(s)?;
        if !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    anyhow::ensure!(!out.is_empty(), "no symbols given");
    Ok(out)
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_symbols() {
        let args = Args::try_parse_from([
            "stockcast_worker",
            "--symbols",
            "aapl, MSFT,,aapl",
            "--dry-run",
        ])
        .unwrap();
        assert!(args.dry_run);
        assert_eq!(parse_symbols(&args.symbols).unwrap(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn rejects_empty_or_invalid_symbol_lists() {
        assert!(parse_symbols(&[" ".to_string()]).is_err());
        assert!(parse_symbols(&["NOT A TICKER".to_string()]).is_err());
    }
}
