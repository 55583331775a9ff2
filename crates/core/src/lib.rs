pub mod domain;
pub mod indicators;
pub mod market;
pub mod portfolio;
pub mod predict;
pub mod sentiment;
pub mod storage;
pub mod time;

/// Round to two decimal places, the precision every price-like value is reported in.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

pub mod config {
    use anyhow::Context;

    pub const DEFAULT_MARKET_DATA_BASE_URL: &str = "https://query1.finance.yahoo.com";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub db_max_connections: u32,
        pub sentry_dsn: Option<String>,
        pub market_data_base_url: String,
        pub market_data_timeout_secs: u64,
        pub market_data_user_agent: Option<String>,
        pub allowed_origins: Vec<String>,
        pub port: u16,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let db_max_connections = match std::env::var("DB_MAX_CONNECTIONS") {
                Ok(s) => s
                    .parse::<u32>()
                    .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {s}"))?,
                Err(_) => 5,
            };

            let port = match std::env::var("PORT") {
                Ok(s) => s
                    .parse::<u16>()
                    .with_context(|| format!("PORT is not a valid port: {s}"))?,
                Err(_) => 5000,
            };

            let market_data_timeout_secs = std::env::var("MARKET_DATA_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30);

            let allowed_origins = std::env::var("ALLOWED_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();

            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                db_max_connections,
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                market_data_base_url: std::env::var("MARKET_DATA_BASE_URL")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_MARKET_DATA_BASE_URL.to_string()),
                market_data_timeout_secs,
                market_data_user_agent: std::env::var("MARKET_DATA_USER_AGENT").ok(),
                allowed_origins,
                port,
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }
    }
}
