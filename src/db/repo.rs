use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use crate::config::DatabaseConfig;
use crate::db::models::User;

/// Handle to the `users` table. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);

        // Every connection to `:memory:` is its own database, so pin the pool
        // to one connection that is never reaped.
        let pool = if is_memory_url(&config.url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(config.max_connections)
                .connect_with(options)
                .await?
        };

        tracing::info!(url = %config.url, "connected to SQLite");
        Ok(Self::new(pool))
    }

    /// In-memory store with the schema applied.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let store = Self::connect(&DatabaseConfig::default()).await?;
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL,
                email TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn create(&self, username: &str, email: &str) -> Result<User, sqlx::Error> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = %user.id, "inserted user");
        Ok(user)
    }

    /// All users, oldest first.
    pub async fn list_all(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, username, email FROM users ORDER BY rowid")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}
