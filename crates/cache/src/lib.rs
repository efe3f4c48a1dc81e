//! Flipbook Cache Library
//!
//! Memoizes rendered page surfaces keyed by page and effective pixel
//! geometry, bounded by a memory budget with LRU eviction.

pub mod config;
pub mod key;
pub mod ram;
pub mod surface;

pub use config::{CacheConfig, ConfigError};
pub use key::{clamp_density, SurfaceKey, MAX_DENSITY, MIN_DENSITY};
pub use ram::{CacheStats, SurfaceCache};
pub use surface::Surface;
