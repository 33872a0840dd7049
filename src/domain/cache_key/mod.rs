//! Cache Key - 内容寻址缓存 key 派生
//!
//! 相同的 text + voice + model 请求（无论来自哪条对话行、哪份文档）
//! 必须命中同一条缓存

mod builder;
mod hasher;

pub use builder::{
    build_dialogue_key, build_line_key, CacheKeyBuilder, CacheKeyError, CacheKeyKind,
    CACHE_KEY_VERSION, DEFAULT_OUTPUT_FORMAT,
};
pub use hasher::{cyrb53_hex, hash_hex, hash_hex_with, DigestError, Digester, Sha256Digester};
