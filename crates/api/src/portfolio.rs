use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use stockcast_core::domain::user::{NewUser, User};
use stockcast_core::market::{latest_price, normalize_symbol};
use stockcast_core::portfolio::{PortfolioError, Position, Valuation};
use stockcast_core::storage::portfolio::{self as portfolio_store, PortfolioEntry};
use stockcast_core::storage::users;

use crate::app::AppState;
use crate::error::ApiError;

pub async fn register_user(
    State(state): State<AppState>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let pool = state.pool()?;
    let new_user = body.validated().map_err(ApiError::bad_request)?;

    let user = users::create_user(pool, &new_user)
        .await?
        .ok_or_else(|| ApiError::Conflict("username or email already registered".to_string()))?;

    tracing::info!(user_id = %user.id, "registered user");
    Ok((StatusCode::CREATED, Json(user)))
}

async fn require_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    users::get_user(state.pool()?, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))
}

pub async fn get_portfolio(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<PortfolioEntry>>, ApiError> {
    require_user(&state, user_id).await?;
    let entries = portfolio_store::list_entries(state.pool()?, user_id).await?;
    Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct AddHolding {
    symbol: String,
    shares: i64,
    avg_cost: f64,
}

#[derive(Debug, Serialize)]
pub struct HoldingResponse {
    symbol: String,
    position: Option<Position>,
}

fn portfolio_error(err: anyhow::Error) -> ApiError {
    match err.downcast_ref::<PortfolioError>() {
        Some(invalid) => ApiError::BadRequest(invalid.to_string()),
        None => ApiError::Internal(err),
    }
}

pub async fn add_holding(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<AddHolding>,
) -> Result<Json<HoldingResponse>, ApiError> {
    let pool = state.pool()?;
    let symbol = normalize_symbol(&body.symbol).map_err(ApiError::bad_request)?;

    let position = portfolio_store::update_portfolio(pool, user_id, |pm| {
        Ok(pm.add(&symbol, body.shares, body.avg_cost)?)
    })
    .await
    .map_err(portfolio_error)?
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;

    tracing::info!(%user_id, %symbol, shares = position.shares, avg_cost = position.avg_cost, "holding added");
    Ok(Json(HoldingResponse {
        symbol,
        position: Some(position),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct RemoveParams {
    shares: Option<i64>,
}

pub async fn remove_holding(
    State(state): State<AppState>,
    Path((user_id, symbol)): Path<(Uuid, String)>,
    Query(params): Query<RemoveParams>,
) -> Result<Json<HoldingResponse>, ApiError> {
    let pool = state.pool()?;
    let symbol = normalize_symbol(&symbol).map_err(ApiError::bad_request)?;
    if let Some(n) = params.shares {
        if n <= 0 {
            return Err(ApiError::BadRequest(format!("shares must be positive (got {n})")));
        }
    }

    let (held, position) = portfolio_store::update_portfolio(pool, user_id, |pm| {
        let held = pm.position(&symbol).is_some();
        Ok((held, pm.remove(&symbol, params.shares)))
    })
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("user {user_id} not found")))?;

    if !held {
        return Err(ApiError::NotFound(format!("no position in {symbol}")));
    }

    tracing::info!(%user_id, %symbol, closed = position.is_none(), "holding removed");
    Ok(Json(HoldingResponse { symbol, position }))
}

/// Prices each holding one symbol at a time; symbols whose price cannot be
/// fetched are left out of the totals.
pub async fn get_portfolio_value(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Valuation>, ApiError> {
    require_user(&state, user_id).await?;
    let manager = portfolio_store::load_manager(state.pool()?, user_id).await?;

    let mut prices = HashMap::new();
    for symbol in manager.positions().keys() {
        match latest_price(state.market.as_ref(), symbol).await {
            Ok(price) => {
                prices.insert(symbol.clone(), price);
            }
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "price lookup failed; excluding from valuation");
            }
        }
    }

    Ok(Json(manager.valuation(&prices)))
}
