use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Runtime settings, read from the process environment (and `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub run_migrations: bool,
    /// Shared secret the identity provider signs session tokens with.
    pub auth_jwt_secret: String,
    pub payment: PaymentConfig,
    /// Where the storefront lives; checkout redirects land here.
    pub public_base_url: String,
}

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub api_base: String,
    pub api_key: String,
    pub webhook_secret: String,
    pub currency: String,
    pub webhook_tolerance_secs: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_owned()),
            port: parse_or(&lookup, "PORT", 8000)?,
            run_migrations: parse_or(&lookup, "RUN_MIGRATIONS", true)?,
            auth_jwt_secret: required("AUTH_JWT_SECRET")?,
            payment: PaymentConfig {
                api_base: lookup("PAYMENT_API_BASE")
                    .unwrap_or_else(|| "https://api.stripe.com".to_owned()),
                api_key: required("PAYMENT_API_KEY")?,
                webhook_secret: required("PAYMENT_WEBHOOK_SECRET")?,
                currency: lookup("PAYMENT_CURRENCY").unwrap_or_else(|| "usd".to_owned()),
                webhook_tolerance_secs: parse_or(&lookup, "WEBHOOK_TOLERANCE_SECS", 300)?,
            },
            public_base_url: lookup("PUBLIC_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_owned())
                .unwrap_or_else(|| "http://localhost:3000".to_owned()),
        })
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}
