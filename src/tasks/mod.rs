//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache store.
//!
//! # Tasks
//! - Sweep: Purges expired cache entries at the configured interval

mod sweeper;

pub use sweeper::Sweeper;
