//! Domain Layer - 领域层
//!
//! 包含:
//! - Cache Key: 哈希原语与确定性缓存 key 构建
//! - Dialogue Context: 对话只读投影、turn 解析与生成前校验
//! - Audio Tags: 内联标签剥离与费用估算

pub mod audio_tags;
pub mod cache_key;
pub mod dialogue;
