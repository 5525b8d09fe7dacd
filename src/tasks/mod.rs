//! Background Tasks Module
//!
//! Contains background tasks that run periodically alongside a cache provider.
//!
//! # Tasks
//! - Sweeper: Purges expired memory cache entries at configured intervals

mod sweeper;

pub use sweeper::{spawn_sweeper, MIN_SWEEP_INTERVAL};
