use std::{future::Future, str::FromStr, sync::Arc};

use sqlx::{
    Sqlite, SqlitePool, Transaction,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::{conf::Settings, pkg::internal::auth::IdentityVerifier, prelude::Result};

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub fn db_pool(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_lazy_with(options);
    Ok(pool)
}

pub trait GetTxn {
    fn begin_txn(&self) -> impl Future<Output = Result<Transaction<'static, Sqlite>>> + Send;

    /// Takes the write lock up front, waiting on the busy timeout, so reads
    /// inside the transaction never need a lock upgrade.
    fn begin_write_txn(&self)
    -> impl Future<Output = Result<Transaction<'static, Sqlite>>> + Send;
}

impl GetTxn for SqlitePool {
    async fn begin_txn(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.begin().await?)
    }

    async fn begin_write_txn(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.begin_with("BEGIN IMMEDIATE").await?)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Arc<SqlitePool>,
    pub identity: Arc<IdentityVerifier>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Result<AppState> {
        Ok(AppState {
            db_pool: Arc::new(db_pool(
                &settings.database_url,
                settings.database_pool_max_connections,
            )?),
            identity: Arc::new(IdentityVerifier::new(
                &settings.jwt_secret,
                &settings.jwt_audience,
            )),
        })
    }

    pub async fn close(&self) {
        self.db_pool.close().await;
        tracing::debug!("db pool closed");
    }

    /// Private in-memory database with migrations applied. A single pinned
    /// connection keeps the database alive for the life of the pool.
    #[cfg(test)]
    pub async fn ephemeral() -> Result<AppState> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
            .await?;
        Self::migrated(pool).await
    }

    /// File database behind a multi-connection pool, for tests where
    /// connections contend for the write lock.
    #[cfg(test)]
    pub async fn on_disk(path: &std::path::Path) -> Result<AppState> {
        let pool = db_pool(&format!("sqlite://{}", path.display()), 5)?;
        Self::migrated(pool).await
    }

    #[cfg(test)]
    async fn migrated(pool: SqlitePool) -> Result<AppState> {
        use crate::pkg::internal::auth::tests::{AUDIENCE, SECRET};

        MIGRATOR.run(&pool).await?;
        Ok(AppState {
            db_pool: Arc::new(pool),
            identity: Arc::new(IdentityVerifier::new(SECRET, AUDIENCE)),
        })
    }
}
