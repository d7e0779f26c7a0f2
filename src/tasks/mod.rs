//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside the cache.
//!
//! # Tasks
//! - Janitor: Removes expired cache entries at a fixed interval

mod janitor;

pub use janitor::Janitor;
