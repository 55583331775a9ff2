use crate::portfolio::{PortfolioManager, Position};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row of the `portfolio_entries` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub stock_symbol: String,
    pub shares: i64,
    pub avg_cost: f64,
    pub purchase_date: DateTime<Utc>,
}

pub async fn list_entries(pool: &sqlx::PgPool, user_id: Uuid) -> anyhow::Result<Vec<PortfolioEntry>> {
    let rows = sqlx::query_as::<_, (Uuid, Uuid, String, i64, f64, DateTime<Utc>)>(
        "SELECT id, user_id, stock_symbol, shares, avg_cost, purchase_date \
         FROM portfolio_entries \
         WHERE user_id = $1 \
         ORDER BY stock_symbol ASC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("select portfolio_entries failed")?;

    Ok(rows
        .into_iter()
        .map(
            |(id, user_id, stock_symbol, shares, avg_cost, purchase_date)| PortfolioEntry {
                id,
                user_id,
                stock_symbol,
                shares,
                avg_cost,
                purchase_date,
            },
        )
        .collect())
}

pub async fn load_manager(pool: &sqlx::PgPool, user_id: Uuid) -> anyhow::Result<PortfolioManager> {
    let entries = list_entries(pool, user_id).await?;
    Ok(manager_from_rows(
        entries
            .into_iter()
            .map(|e| (e.stock_symbol, e.shares, e.avg_cost)),
    ))
}

fn manager_from_rows(rows: impl IntoIterator<Item = (String, i64, f64)>) -> PortfolioManager {
    PortfolioManager::from_positions(
        rows.into_iter()
            .map(|(symbol, shares, avg_cost)| (symbol, Position { shares, avg_cost })),
    )
}

/// Row-level changes that turn `before` into `after`.
#[derive(Debug, Default, PartialEq)]
struct PositionDiff {
    removed: Vec<String>,
    upserted: Vec<(String, Position)>,
}

impl PositionDiff {
    fn between(before: &PortfolioManager, after: &PortfolioManager) -> Self {
        let removed = before
            .positions()
            .keys()
            .filter(|symbol| after.position(symbol).is_none())
            .cloned()
            .collect();
        let upserted = after
            .positions()
            .iter()
            .filter(|(symbol, position)| before.position(symbol) != Some(*position))
            .map(|(symbol, position)| (symbol.clone(), *position))
            .collect();
        Self { removed, upserted }
    }
}

/// Load a user's holdings into a [`PortfolioManager`], apply `f`, and write back only
/// what changed, all under a row lock on the user. `Ok(None)` when the user is unknown.
pub async fn update_portfolio<T>(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    f: impl FnOnce(&mut PortfolioManager) -> anyhow::Result<T>,
) -> anyhow::Result<Option<T>> {
    let mut tx = pool.begin().await.context("begin transaction failed")?;

    let user: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR UPDATE")
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .context("lock users row failed")?;
    if user.is_none() {
        return Ok(None);
    }

    let rows = sqlx::query_as::<_, (String, i64, f64)>(
        "SELECT stock_symbol, shares, avg_cost FROM portfolio_entries WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await
    .context("select portfolio_entries failed")?;

    let before = manager_from_rows(rows);
    let mut after = before.clone();
    let out = f(&mut after)?;
    let diff = PositionDiff::between(&before, &after);

    for symbol in &diff.removed {
        sqlx::query("DELETE FROM portfolio_entries WHERE user_id = $1 AND stock_symbol = $2")
            .bind(user_id)
            .bind(symbol)
            .execute(&mut *tx)
            .await
            .context("delete portfolio_entries failed")?;
    }

    for (symbol, position) in &diff.upserted {
        sqlx::query(
            "INSERT INTO portfolio_entries (user_id, stock_symbol, shares, avg_cost) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, stock_symbol) DO UPDATE \
               SET shares = EXCLUDED.shares, avg_cost = EXCLUDED.avg_cost",
        )
        .bind(user_id)
        .bind(symbol)
        .bind(position.shares)
        .bind(position.avg_cost)
        .execute(&mut *tx)
        .await
        .context("upsert portfolio_entries failed")?;
    }

    tx.commit().await.context("commit transaction failed")?;
    Ok(Some(out))
}
