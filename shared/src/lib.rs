//! Shared types for the Mesa POS
//!
//! Domain models, domain events and utility types used by both the
//! server and its clients (staff dashboard, table ordering pages).

pub mod event;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Event re-exports (for convenient access)
pub use event::{DomainEvent, Topic};
