//! State storage and cache coordination for the competition hub.
//!
//! Holds the latest competition snapshot and the latest update per platform
//! (atomic whole-value replacement in both cases), and owns the registry of
//! plugin caches the hub can invalidate in one sweep.

pub mod cache;
pub mod error;
pub mod registry;
pub mod store;

pub use cache::{CacheKey, PlainCache};
pub use error::{CacheError, StateResult};
pub use registry::{CacheClearOutcome, CacheRegistry, Clearable};
pub use store::StateStore;
