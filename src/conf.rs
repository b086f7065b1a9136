use config::{Config, Environment};
use lazy_static::lazy_static;
use serde::Deserialize;

use crate::prelude::Result;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub service_name: String,
    pub listen_port: String,
    pub base_url: String,
    pub database_url: String,
    pub database_pool_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_audience: String,
    pub filter_debounce_ms: u64,
}

impl Settings {
    pub fn new() -> Result<Self> {
        let conf = Config::builder()
            .set_default("service_name", "jobboard")?
            .set_default("listen_port", "3000")?
            .set_default("base_url", "http://localhost:3000")?
            .set_default("database_url", "sqlite://jobboard.db")?
            .set_default("database_pool_max_connections", 5)?
            .set_default("jwt_secret", "")?
            .set_default("jwt_audience", "authenticated")?
            .set_default("filter_debounce_ms", 300)?
            .add_source(Environment::default())
            .build()?;
        let s: Settings = conf.try_deserialize()?;
        if s.jwt_secret.is_empty() {
            tracing::warn!("JWT_SECRET is empty, every bearer token will be rejected");
        }
        Ok(s)
    }
}

lazy_static! {
    pub static ref settings: Settings = Settings::new().expect("improperly configured");
}
