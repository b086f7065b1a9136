use crate::{
    conf::Settings,
    pkg::server::state::{GetTxn, MIGRATOR, db_pool},
    prelude::Result,
};

pub async fn apply(settings: &Settings) -> Result<()> {
    let pool = db_pool(&settings.database_url, 1)?;
    tracing::debug!("connected to db");
    let mut tx = pool.begin_txn().await?;
    MIGRATOR.run(&mut *tx).await?;
    tx.commit().await?;
    pool.close().await;

    println!("Migrations applied successfully");
    Ok(())
}
