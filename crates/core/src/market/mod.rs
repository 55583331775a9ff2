pub mod provider;
pub mod types;

pub use provider::{latest_price, normalize_symbol, MarketDataProvider, YahooChartProvider};
pub use types::{HistoryRange, PriceBar, PriceHistory};
