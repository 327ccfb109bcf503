use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

/// URL scheme selecting the in-process store instead of PostgreSQL.
pub const MEMORY_DATABASE_URL: &str = "memory://";

/// Longest share-token lifetime any configuration may allow (ten years).
pub const TTL_CEILING_SECONDS: i64 = 315_360_000;

/// Largest tolerated clock skew for a token's issue time.
pub const LEEWAY_CEILING_SECONDS: i64 = 3600;

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub capability: CapabilityConfig,
    pub security: SecurityConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

impl DatabaseConfig {
    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }
}

/// Settings for signing and checking chat share tokens.
#[derive(Clone, Deserialize)]
pub struct CapabilityConfig {
    pub secret: String,
    pub default_ttl_seconds: i64,
    pub max_ttl_seconds: i64,
    /// Tolerated clock skew when a token's `iat` is ahead of local time.
    pub leeway_seconds: i64,
}

impl std::fmt::Debug for CapabilityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityConfig")
            .field("secret", &"<redacted>")
            .field("default_ttl_seconds", &self.default_ttl_seconds)
            .field("max_ttl_seconds", &self.max_ttl_seconds)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub share_redeem_limit: u32,
    pub share_redeem_window_seconds: u64,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = ChatConfig {
            common: common_config,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("chat-service"), false)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", "10")?,
                min_connections: parse_env("DATABASE_MIN_CONNECTIONS", "1")?,
            },
            capability: CapabilityConfig {
                secret: match env::var("CAPABILITY_SECRET") {
                    Ok(secret) => secret,
                    Err(_) => get_env("JWT_SECRET", None, is_prod)?,
                },
                default_ttl_seconds: parse_env("CAPABILITY_DEFAULT_TTL_SECONDS", "3600")?,
                max_ttl_seconds: parse_env("CAPABILITY_MAX_TTL_SECONDS", "604800")?,
                leeway_seconds: parse_env("CAPABILITY_LEEWAY_SECONDS", "5")?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some("*"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            rate_limit: RateLimitConfig {
                share_redeem_limit: parse_env("RATE_LIMIT_SHARE_REDEEM_LIMIT", "60")?,
                share_redeem_window_seconds: parse_env(
                    "RATE_LIMIT_SHARE_REDEEM_WINDOW_SECONDS",
                    "60",
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.capability.secret.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CAPABILITY_SECRET must not be empty"
            )));
        }

        if self.capability.default_ttl_seconds <= 0 || self.capability.max_ttl_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Capability token TTLs must be positive"
            )));
        }

        if self.capability.default_ttl_seconds > self.capability.max_ttl_seconds {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CAPABILITY_DEFAULT_TTL_SECONDS must not exceed CAPABILITY_MAX_TTL_SECONDS"
            )));
        }

        if self.capability.max_ttl_seconds > TTL_CEILING_SECONDS {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CAPABILITY_MAX_TTL_SECONDS must not exceed {}",
                TTL_CEILING_SECONDS
            )));
        }

        if !(0..=LEEWAY_CEILING_SECONDS).contains(&self.capability.leeway_seconds) {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CAPABILITY_LEEWAY_SECONDS must be between 0 and {}",
                LEEWAY_CEILING_SECONDS
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS"
            )));
        }

        if self.environment == Environment::Prod {
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }

            if self.database.is_memory() {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "In-memory store is not allowed in production"
                )));
            }

            if self.capability.secret.len() < 32 {
                tracing::warn!("CAPABILITY_SECRET is shorter than 32 bytes");
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), false)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("Invalid {}: {}", key, e)))
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
