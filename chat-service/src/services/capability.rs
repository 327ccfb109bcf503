//! Share tokens for individual chats.
//!
//! A token is an HS256 JWT whose claims name one chat and a validity window.
//! Nothing is stored server-side: the MAC is the only proof of validity, and
//! a token simply stops working once `exp` passes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{CapabilityConfig, LEEWAY_CEILING_SECONDS, TTL_CEILING_SECONDS};
use crate::models::Chat;
use crate::services::{Clock, Store, SystemClock};

/// Claims carried by a share token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityClaims {
    /// Chat the bearer may read.
    #[serde(rename = "chatId")]
    pub chat_id: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub chat_id: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }
}

/// Why a token was not honoured.
///
/// Every variant except `Store` is a denial and reaches the client only as a
/// bare `401 Unauthorized`.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token outside its validity window")]
    Expired,

    #[error("Shared chat {0} no longer exists")]
    ResourceGone(i64),

    #[error("Store failure: {0}")]
    Store(AppError),
}

impl CapabilityError {
    pub fn is_denial(&self) -> bool {
        !matches!(self, CapabilityError::Store(_))
    }

    fn reason(&self) -> &'static str {
        match self {
            CapabilityError::Malformed(_) => "malformed",
            CapabilityError::InvalidSignature => "invalid_signature",
            CapabilityError::Expired => "expired",
            CapabilityError::ResourceGone(_) => "resource_gone",
            CapabilityError::Store(_) => "store_error",
        }
    }
}

impl IntoResponse for CapabilityError {
    fn into_response(self) -> Response {
        metrics::counter!("capability_redemptions_total", "outcome" => self.reason()).increment(1);

        match self {
            CapabilityError::Store(err) => err.into_response(),
            denial => {
                tracing::debug!(reason = denial.reason(), error = %denial, "Share token rejected");
                (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
            }
        }
    }
}

/// Issues and redeems chat share tokens.
#[derive(Clone)]
pub struct CapabilityService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
    max_ttl: Duration,
    leeway_seconds: i64,
}

impl CapabilityService {
    pub fn new(config: &CapabilityConfig) -> Result<Self, anyhow::Error> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &CapabilityConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, anyhow::Error> {
        if config.secret.is_empty() {
            anyhow::bail!("Capability secret must not be empty");
        }
        if config.default_ttl_seconds <= 0 || config.max_ttl_seconds <= 0 {
            anyhow::bail!("Capability token TTLs must be positive");
        }
        if config.default_ttl_seconds > TTL_CEILING_SECONDS
            || config.max_ttl_seconds > TTL_CEILING_SECONDS
        {
            anyhow::bail!(
                "Capability token TTLs must not exceed {} seconds",
                TTL_CEILING_SECONDS
            );
        }
        if !(0..=LEEWAY_CEILING_SECONDS).contains(&config.leeway_seconds) {
            anyhow::bail!(
                "Capability leeway must be between 0 and {} seconds",
                LEEWAY_CEILING_SECONDS
            );
        }
        let default_ttl = Duration::try_seconds(config.default_ttl_seconds)
            .ok_or_else(|| anyhow::anyhow!("Default token TTL out of range"))?;
        let max_ttl = Duration::try_seconds(config.max_ttl_seconds)
            .ok_or_else(|| anyhow::anyhow!("Maximum token TTL out of range"))?;

        // Expiry is checked against the injected clock in `verify`, not by the
        // library's wall-clock check.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            clock,
            default_ttl,
            max_ttl,
            leeway_seconds: config.leeway_seconds,
        })
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Lifetime for a requested number of seconds, capped at the configured
    /// maximum. Values too small to represent come back as zero.
    pub fn ttl_from_seconds(&self, seconds: i64) -> Duration {
        Duration::try_seconds(seconds.min(self.max_ttl.num_seconds())).unwrap_or_else(Duration::zero)
    }

    /// Mint a token for `chat_id` valid for `ttl` (capped at the configured maximum).
    pub fn issue(&self, chat_id: i64, ttl: Duration) -> Result<IssuedToken, AppError> {
        if ttl <= Duration::zero() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Token lifetime must be positive"
            )));
        }
        let ttl = ttl.min(self.max_ttl);

        let now = self.clock.now();
        let iat = now.timestamp();
        let exp = iat
            .checked_add(ttl.num_seconds())
            .ok_or_else(|| anyhow::anyhow!("Token expiry out of range"))?;

        let claims = CapabilityClaims { chat_id, iat, exp };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode share token: {}", e))?;

        metrics::counter!("capability_tokens_issued_total").increment(1);
        tracing::info!(chat_id, expires_at = exp, "Share token issued");

        Ok(IssuedToken {
            token,
            chat_id,
            issued_at: timestamp(iat)?,
            expires_at: timestamp(exp)?,
        })
    }

    /// Check structure, signature, then validity window. Performs no I/O.
    pub fn verify(&self, token: &str) -> Result<CapabilityClaims, CapabilityError> {
        let claims = decode::<CapabilityClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => CapabilityError::InvalidSignature,
                ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
                    CapabilityError::Expired
                }
                _ => CapabilityError::Malformed(e.to_string()),
            })?
            .claims;

        let now = self.clock.now().timestamp();
        if now >= claims.exp || now.saturating_add(self.leeway_seconds) < claims.iat {
            return Err(CapabilityError::Expired);
        }

        Ok(claims)
    }

    /// Exchange a token for the chat it names.
    pub async fn redeem<S>(&self, token: &str, store: &S) -> Result<Chat, CapabilityError>
    where
        S: Store + ?Sized,
    {
        let claims = self.verify(token)?;

        let chat = store
            .find_chat(claims.chat_id)
            .await
            .map_err(CapabilityError::Store)?
            .ok_or(CapabilityError::ResourceGone(claims.chat_id))?;

        metrics::counter!("capability_redemptions_total", "outcome" => "ok").increment(1);
        Ok(chat)
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>, AppError> {
    Utc.timestamp_opt(secs, 0)
        .single()
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Timestamp out of range: {}", secs)))
}
