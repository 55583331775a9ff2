use crate::domain::stock::StockRecord;
use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

type StockRow = (Uuid, String, String, f64, DateTime<Utc>);

fn into_record((id, symbol, name, current_price, last_updated): StockRow) -> StockRecord {
    StockRecord {
        id,
        symbol,
        name,
        current_price,
        last_updated,
    }
}

pub async fn upsert_stock(
    conn: &mut sqlx::PgConnection,
    symbol: &str,
    name: &str,
    current_price: f64,
    last_updated: DateTime<Utc>,
) -> anyhow::Result<StockRecord> {
    // Column is VARCHAR(100); long display names are cut on a char boundary.
    let name: String = name.trim().chars().take(100).collect();

    let row = sqlx::query_as::<_, StockRow>(
        "INSERT INTO stocks (symbol, name, current_price, last_updated) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (symbol) DO UPDATE \
           SET name = EXCLUDED.name, current_price = EXCLUDED.current_price, last_updated = EXCLUDED.last_updated \
         RETURNING id, symbol, name, current_price, last_updated",
    )
    .bind(symbol)
    .bind(name)
    .bind(current_price)
    .bind(last_updated)
    .fetch_one(&mut *conn)
    .await
    .with_context(|| format!("upsert stocks failed for {symbol}"))?;

    Ok(into_record(row))
}

pub async fn get_stock(pool: &sqlx::PgPool, symbol: &str) -> anyhow::Result<Option<StockRecord>> {
    let row = sqlx::query_as::<_, StockRow>(
        "SELECT id, symbol, name, current_price, last_updated FROM stocks WHERE symbol = $1",
    )
    .bind(symbol)
    .fetch_optional(pool)
    .await
    .context("select stocks failed")?;

    Ok(row.map(into_record))
}
