//! Shared setup for chat-service integration tests.
//!
//! Builds the real router over an in-memory store and a manual clock, so the
//! tests run without PostgreSQL and can move time at will.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::connect_info::MockConnectInfo,
    http::{Request, StatusCode},
    Router,
};
use chat_service::{
    build_router,
    config::{
        CapabilityConfig, ChatConfig, DatabaseConfig, Environment, RateLimitConfig,
        SecurityConfig, MEMORY_DATABASE_URL,
    },
    services::{CapabilityService, ManualClock, MemoryStore, Store},
    AppState,
};
use chrono::{TimeZone, Utc};
use service_core::middleware::rate_limit::create_ip_rate_limiter;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-test-capability-secret-0123456789";

/// Fixed starting point for the manual clock.
pub const EPOCH: i64 = 1_700_000_000;

pub fn test_config() -> ChatConfig {
    ChatConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "chat-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: MEMORY_DATABASE_URL.to_string(),
            max_connections: 1,
            min_connections: 1,
        },
        capability: CapabilityConfig {
            secret: TEST_SECRET.to_string(),
            default_ttl_seconds: 3600,
            max_ttl_seconds: 86400,
            leeway_seconds: 5,
        },
        security: SecurityConfig {
            allowed_origins: vec!["*".to_string()],
        },
        rate_limit: RateLimitConfig {
            share_redeem_limit: 1000,
            share_redeem_window_seconds: 60,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub clock: Arc<ManualClock>,
    pub store: Arc<dyn Store>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn Store>) -> Self {
        Self::build(test_config(), store)
    }

    /// App whose share redemption route allows `limit` requests per minute.
    pub fn with_redeem_limit(limit: u32) -> Self {
        let mut config = test_config();
        config.rate_limit.share_redeem_limit = limit;
        Self::build(config, Arc::new(MemoryStore::new()))
    }

    fn build(config: ChatConfig, store: Arc<dyn Store>) -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.timestamp_opt(EPOCH, 0).single().expect("valid epoch"),
        ));
        let capabilities = CapabilityService::with_clock(&config.capability, clock.clone())
            .expect("capability service");
        let share_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.share_redeem_limit,
            config.rate_limit.share_redeem_window_seconds,
        );

        let state = AppState {
            config,
            store: store.clone(),
            capabilities,
            share_rate_limiter,
        };

        Self {
            // Every request appears to come from the same TCP peer.
            router: build_router(state)
                .layer(MockConnectInfo(SocketAddr::from(([203, 0, 113, 9], 5555)))),
            clock,
            store,
        }
    }

    /// Send a request and return status plus raw body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body")
            .to_vec();
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        self.send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .body(Body::empty())
                .expect("request"),
        )
        .await
    }

    pub async fn send_json(
        &self,
        method: &str,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let (status, bytes) = self
            .send(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await;
        (status, json(&bytes))
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, bytes) = self.get(uri).await;
        (status, json(&bytes))
    }

    pub async fn create_user(&self, name: &str, email: &str) -> i64 {
        let (status, body) = self
            .send_json(
                "POST",
                "/api/v1/users",
                serde_json::json!({ "name": name, "email": email }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create user: {}", body);
        body["user_id"].as_i64().expect("user_id")
    }

    pub async fn create_chat(&self, user_id: i64, message: &str, data: Option<&str>) -> i64 {
        let (status, body) = self
            .send_json(
                "POST",
                &format!("/api/v1/users/{}/chats", user_id),
                serde_json::json!({ "message": message, "data": data }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create chat: {}", body);
        body["chat_id"].as_i64().expect("chat_id")
    }

    /// Returns the share response body.
    pub async fn share(
        &self,
        user_id: i64,
        chat_id: i64,
        ttl_seconds: Option<i64>,
    ) -> serde_json::Value {
        let body = match ttl_seconds {
            Some(ttl) => serde_json::json!({ "ttl_seconds": ttl }),
            None => serde_json::json!({}),
        };
        let (status, body) = self
            .send_json(
                "POST",
                &format!("/api/v1/users/{}/chats/{}/share", user_id, chat_id),
                body,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "share: {}", body);
        body
    }
}

pub fn json(bytes: &[u8]) -> serde_json::Value {
    if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(bytes).unwrap_or(serde_json::Value::Null)
    }
}
