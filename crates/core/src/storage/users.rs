use crate::domain::user::{hash_password, NewUser, User};
use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Insert a validated user. `None` when the username or email is already taken.
pub async fn create_user(pool: &sqlx::PgPool, new_user: &NewUser) -> anyhow::Result<Option<User>> {
    let password_hash = hash_password(&new_user.password);

    let row = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
        "INSERT INTO users (username, email, password_hash) \
         VALUES ($1, $2, $3) \
         ON CONFLICT DO NOTHING \
         RETURNING id, username, email, created_at",
    )
    .bind(&new_user.username)
    .bind(&new_user.email)
    .bind(password_hash)
    .fetch_optional(pool)
    .await
    .context("insert users failed")?;

    Ok(row.map(|(id, username, email, created_at)| User {
        id,
        username,
        email,
        created_at,
    }))
}

pub async fn get_user(pool: &sqlx::PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
    let row = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
        "SELECT id, username, email, created_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("select users failed")?;

    Ok(row.map(|(id, username, email, created_at)| User {
        id,
        username,
        email,
        created_at,
    }))
}
