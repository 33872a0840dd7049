//! Worker Layer - Background Task Processing
//!
//! 实现 CacheSweeper，周期清理过期缓存与空闲会话

mod cache_sweeper;

pub use cache_sweeper::{CacheSweeper, CacheSweeperConfig, SweepReport};
