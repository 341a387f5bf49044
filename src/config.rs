use std::env;

use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Upper bound accepted for a fixed-amount discount value.
    pub max_fixed_discount: Decimal,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET")?;
        let max_fixed_discount = env::var("MAX_FIXED_DISCOUNT")
            .ok()
            .and_then(|v| v.parse::<Decimal>().ok())
            .unwrap_or_else(|| Decimal::from(99_999));
        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            max_fixed_discount,
        })
    }
}
