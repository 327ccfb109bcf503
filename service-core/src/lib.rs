//! service-core: shared HTTP infrastructure for the chat API.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;
