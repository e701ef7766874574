use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::debug;

use crate::error::StoreError;

pub type DB = SqlitePool;

/// Open (creating if needed) the database at `path` and bring the schema up to date.
pub async fn open(path: &str) -> Result<DB, StoreError> {
    let opts = SqliteConnectOptions::from_str(path)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    migrate(&pool).await?;
    debug!(path, "database ready");
    Ok(pool)
}

/// In-memory database. A single connection, since every new connection to
/// `:memory:` would get its own empty database.
pub async fn open_in_memory() -> Result<DB, StoreError> {
    let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(opts)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

async fn migrate(pool: &DB) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
