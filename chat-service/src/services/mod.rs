//! Services layer for chat-service.
//!
//! Data access behind the [`Store`] trait and the capability token service
//! used for chat share links.

pub mod capability;
mod clock;
mod database;
mod memory;
mod store;

pub use capability::{CapabilityClaims, CapabilityError, CapabilityService, IssuedToken};
pub use clock::{Clock, ManualClock, SystemClock};
pub use database::Database;
pub use memory::MemoryStore;
pub use store::Store;
