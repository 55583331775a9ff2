use axum::{
    http::HeaderValue,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use stockcast_core::market::MarketDataProvider;

use crate::error::ApiError;
use crate::{market, portfolio, ws};

#[derive(Clone)]
pub struct AppState {
    pub pool: Option<PgPool>,
    pub market: Arc<dyn MarketDataProvider>,
}

impl AppState {
    pub fn pool(&self) -> Result<&PgPool, ApiError> {
        self.pool.as_ref().ok_or(ApiError::Unavailable)
    }
}

pub fn build_router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/stock/:symbol", get(market::get_stock))
        .route("/api/predict/:symbol", get(market::predict_stock))
        .route("/api/sentiment/:symbol", get(market::get_sentiment))
        .route("/api/indicators/:symbol", get(market::get_indicators))
        .route("/api/predictions/:symbol", get(market::get_saved_predictions))
        .route("/api/users", post(portfolio::register_user))
        .route(
            "/api/portfolio/:user_id",
            get(portfolio::get_portfolio).post(portfolio::add_holding),
        )
        .route(
            "/api/portfolio/:user_id/value",
            get(portfolio::get_portfolio_value),
        )
        .route(
            "/api/portfolio/:user_id/holdings/:symbol",
            delete(portfolio::remove_holding),
        )
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

/// Any origin unless `ALLOWED_ORIGINS` narrows it.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
