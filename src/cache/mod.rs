//! Cache Module
//!
//! Read-through caching of the dog collection with a TTL freshness check.

mod store;


// Re-export public types
pub use store::{CacheConfig, ReadThroughCache};

// == Public Constants ==
/// Default snapshot TTL in seconds
pub const DEFAULT_TTL_SECS: u64 = 60;
