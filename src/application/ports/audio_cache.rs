//! Audio Cache Port - 音频缓存管理
//!
//! 定义持久化音频缓存的抽象接口，具体实现使用 Sled
//!
//! 缓存只是性能优化，从不影响正确性：所有操作对调用方都不失败，
//! 存储层的错误在实现内部以 [`CacheError`] 表达、记录日志后降级。

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// 缓存条目存活时间：48 小时
pub const AUDIO_CACHE_TTL: Duration = Duration::from_secs(48 * 60 * 60);

/// Audio Cache 错误（仅实现内部使用）
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Storage engine unavailable: {0}")]
    Unavailable(String),

    #[error("Open blocked: {0}")]
    Blocked(String),

    #[error("Schema version changed: stored v{stored}, expected v{expected}")]
    VersionChanged { stored: u32, expected: u32 },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_size_bytes: u64,
}

/// Audio Cache Port
///
/// key → (音频负载, 写入时间) 的持久化映射，固定 TTL 过期
#[async_trait]
pub trait AudioCachePort: Send + Sync {
    /// 读取音频
    ///
    /// 未命中、已过期或存储不可用时返回 `None`；
    /// 过期条目在后台删除，调用方不等待
    async fn get(&self, cache_key: &str) -> Option<Vec<u8>>;

    /// 写入音频，整条替换（负载 + 写入时间）
    async fn put(&self, cache_key: &str, audio_data: Vec<u8>);

    /// 删除单条缓存
    async fn delete(&self, cache_key: &str);

    /// 清理所有过期条目，返回删除数量；失败返回 0
    async fn sweep_expired(&self) -> usize;

    /// 清空缓存
    async fn clear(&self);

    /// 获取缓存统计信息
    async fn stats(&self) -> CacheStats;
}
