//! Cache Commands - 缓存维护命令

/// 清理过期条目
#[derive(Debug, Clone, Default)]
pub struct SweepExpiredCacheCommand;

/// 清理结果
#[derive(Debug, Clone)]
pub struct SweepExpiredCacheResponse {
    pub removed: usize,
}

/// 清空缓存
#[derive(Debug, Clone, Default)]
pub struct ClearCacheCommand;

/// 删除单条缓存
#[derive(Debug, Clone)]
pub struct InvalidateCacheEntryCommand {
    pub cache_key: String,
}
