//! Cache Module
//!
//! Provides the in-memory multi-field cache engine with pluggable
//! expiration policies and LRU eviction.

mod clock;
mod entry;
mod lru;
mod policy;
mod stats;
mod store;
mod value;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, EntryTimes, Ttl};
pub(crate) use lru::LruTracker;
pub use policy::{
    CompositePolicy, DeadlineFieldPolicy, ExpirePolicy, PolicySettings, Reportable,
    SlidingPolicy, TtlPolicy,
};
pub use stats::{CacheReport, CacheStats, StatsCollector};
pub use store::{CacheStore, SweepOutcome, SWEEP_BATCH_SIZE};
pub use value::MultiFieldValue;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
