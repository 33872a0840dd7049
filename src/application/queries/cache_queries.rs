//! Cache Queries - 缓存状态查询

use crate::domain::dialogue::Dialogue;

/// 当前对话是否已有整段缓存
#[derive(Debug, Clone)]
pub struct GetDialogueCacheStatusQuery {
    pub dialogue: Dialogue,
}

/// 整段缓存状态响应
#[derive(Debug, Clone)]
pub struct DialogueCacheStatusResponse {
    /// 空对话没有 key
    pub cache_key: Option<String>,
    pub cached: bool,
}

/// 缓存统计查询
#[derive(Debug, Clone, Default)]
pub struct GetCacheStatsQuery;
