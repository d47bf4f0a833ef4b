//! Service settings loaded with the `config` crate
//!
//! Values come from environment variables with a per-struct prefix and
//! fall back to the defaults set here.

use anyhow::Result;
use config::{Config, Environment};
use serde::Deserialize;

/// HTTP listener settings
///
/// # Environment Variables
/// - `SERVER_HOST` (default: "0.0.0.0")
/// - `SERVER_PORT` (default: the service's own port)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env(default_port: u16) -> Result<Self> {
        let config = Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(default_port))?
            .add_source(Environment::with_prefix("SERVER").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Alert evaluation settings
///
/// # Environment Variables
/// - `ALERT_ECHEANCE_DAYS`: look-ahead window for upcoming marché deadlines,
///   0 to 3650 days (default: 15)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AlertSettings {
    pub echeance_days: i64,
}

impl AlertSettings {
    pub const MAX_ECHEANCE_DAYS: i64 = 3650;

    pub fn from_env() -> Result<Self> {
        let config = Config::builder()
            .set_default("echeance_days", 15_i64)?
            .add_source(Environment::with_prefix("ALERT").try_parsing(true))
            .build()?;

        let settings: Self = config.try_deserialize()?;
        if !(0..=Self::MAX_ECHEANCE_DAYS).contains(&settings.echeance_days) {
            anyhow::bail!(
                "ALERT_ECHEANCE_DAYS must be between 0 and {}, got {}",
                Self::MAX_ECHEANCE_DAYS,
                settings.echeance_days
            );
        }

        Ok(settings)
    }
}

impl From<AlertSettings> for rules::AlertThresholds {
    fn from(settings: AlertSettings) -> Self {
        Self {
            echeance_days: settings.echeance_days,
        }
    }
}
