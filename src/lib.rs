//! Vendor catalog synchronization service: authenticate against the vendor,
//! walk its category tree, pull per-category product deltas (including
//! soft-deletes), enrich with images and prices, persist idempotently, and
//! serve the result through a small dashboard. Readers always see
//! last-known-good data; a failed run never leaves a half-written tree.

pub mod api;
pub mod catalog;
pub mod env_boot;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod store;
pub mod tracing;
pub mod util;
pub mod vendor;

pub use error::SyncError;
pub use orchestrator::{PriceReport, SyncOrchestrator, SyncReport};
