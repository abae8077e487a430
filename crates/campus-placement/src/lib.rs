//! Placement-cell backend: identity, job approval, application timelines,
//! the notification feed and the quiz ranking engine.

pub mod config;
pub mod error;
pub mod http;
pub mod store;
pub mod telemetry;
pub mod workflows;

pub use http::{placement_router, PlacementState};
pub use store::MemoryStore;
pub use workflows::error::{PlacementError, RepositoryError};
