use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::{Clock, DefaultClock},
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use std::{
    net::{IpAddr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};
use tokio::task::JoinHandle;

/// Rate limiter keyed by client IP address
pub type IpRateLimiter = Arc<RateLimiter<IpAddr, DashMapStateStore<IpAddr>, DefaultClock>>;

/// Create a keyed rate limiter allowing `attempts` per `window_seconds` per IP.
pub fn create_ip_rate_limiter(attempts: u32, window_seconds: u64) -> IpRateLimiter {
    let attempts = NonZeroU32::new(attempts).unwrap_or(NonZeroU32::MIN);
    let period_ms = (window_seconds.max(1) * 1000) / u64::from(attempts.get());
    let quota = Quota::with_period(Duration::from_millis(period_ms.max(1)))
        .unwrap_or_else(|| Quota::per_second(attempts))
        .allow_burst(attempts);

    Arc::new(RateLimiter::dashmap(quota))
}

/// Drop limiter entries whose quota has fully replenished, every `every`.
///
/// Without this the keyed store keeps one entry per address ever seen.
pub fn spawn_pruning(limiter: IpRateLimiter, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            limiter.retain_recent();
            limiter.shrink_to_fit();
            tracing::debug!(tracked = limiter.len(), "Pruned rate limiter state");
        }
    })
}

/// Middleware for IP-based rate limiting.
///
/// Keys on the TCP peer address only. Client-supplied headers such as
/// `x-forwarded-for` are ignored because a caller can rotate them freely.
pub async fn ip_rate_limit_middleware(
    State(limiter): State<IpRateLimiter>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ConnectInfo(addr)) = peer else {
        tracing::warn!("Could not determine IP for rate limiting");
        return Ok(next.run(request).await);
    };
    let ip = addr.ip();

    match limiter.check_key(&ip) {
        Ok(_) => Ok(next.run(request).await),
        Err(negative) => {
            let wait_time = negative.wait_time_from(DefaultClock::default().now());
            tracing::warn!(ip = %ip, "Rate limit exceeded");
            Err(AppError::TooManyRequests(
                "Too many requests from this IP. Please try again later.".to_string(),
                Some(wait_time.as_secs().max(1)),
            ))
        }
    }
}
