use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;

/// Listener settings shared by every service binary.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Loads `configuration.*` (optional) and `APP__*` variables after reading `.env`.
    ///
    /// `SERVER_PORT` is honoured when `APP__PORT` is not set.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let mut builder = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        if std::env::var("APP__PORT").is_err() {
            if let Ok(port) = std::env::var("SERVER_PORT") {
                builder = builder.set_override("port", port)?;
            }
        }

        Ok(builder.build()?.try_deserialize()?)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
