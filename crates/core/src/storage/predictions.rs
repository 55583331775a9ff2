use crate::domain::prediction::{ModelKind, PredictionRecord};
use crate::predict::PredictionSet;
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// One row per model in a single statement; callers own the transaction.
pub async fn insert_prediction_set(
    conn: &mut sqlx::PgConnection,
    symbol: &str,
    set: &PredictionSet,
    prediction_date: DateTime<Utc>,
    target_date: NaiveDate,
) -> anyhow::Result<u64> {
    let entries: Vec<_> = set.entries().collect();
    let mut qb = sqlx::QueryBuilder::new(
        "INSERT INTO predictions (stock_symbol, model_type, predicted_price, confidence, prediction_date, target_date) ",
    );
    qb.push_values(entries, |mut b, (kind, p)| {
        b.push_bind(symbol)
            .push_bind(kind.as_str())
            .push_bind(p.prediction)
            .push_bind(p.confidence)
            .push_bind(prediction_date)
            .push_bind(target_date);
    });

    let res = qb
        .build()
        .persistent(false)
        .execute(&mut *conn)
        .await
        .with_context(|| format!("insert predictions failed for {symbol}"))?;

    Ok(res.rows_affected())
}

pub async fn recent_predictions(
    pool: &sqlx::PgPool,
    symbol: &str,
    limit: i64,
) -> anyhow::Result<Vec<PredictionRecord>> {
    let rows = sqlx::query_as::<_, (Uuid, String, String, f64, f64, DateTime<Utc>, NaiveDate)>(
        "SELECT id, stock_symbol, model_type, predicted_price, confidence, prediction_date, target_date \
         FROM predictions \
         WHERE stock_symbol = $1 \
         ORDER BY prediction_date DESC, model_type ASC \
         LIMIT $2",
    )
    .bind(symbol)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("select predictions failed")?;

    let mut out = Vec::with_capacity(rows.len());
    for (id, stock_symbol, model_type, predicted_price, confidence, prediction_date, target_date) in rows {
        let model_type = model_type
            .parse::<ModelKind>()
            .with_context(|| format!("invalid model_type in DB for prediction id={id}"))?;
        out.push(PredictionRecord {
            id,
            stock_symbol,
            model_type,
            predicted_price,
            confidence,
            prediction_date,
            target_date,
        });
    }
    Ok(out)
}
