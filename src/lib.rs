//! Dialogue Director - 对话音频生成与内容寻址缓存
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Dialogue Context: 对话行、说话人、说话轮次与生成前校验
//! - Cache Key: 确定性缓存 key 推导（规范化 JSON + SHA-256）
//! - Audio Tags: 内联标签剥离与计费字符
//!
//! 应用层 (application/):
//! - Ports: 端口定义（AudioCache, SpeechSynthesis, Playback, SessionManager）
//! - Commands: 缓存优先的生成编排、会话、缓存维护
//! - Queries: 会话状态、缓存状态、费用估算
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API + WebSocket
//! - Memory: SessionManager, PlaybackRegistry 内存实现
//! - Worker: CacheSweeper 后台过期清理
//! - Persistence: Sled 音频缓存
//! - Adapters: ElevenLabs 合成客户端、Fake 合成器
//! - Events: WebSocket 事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
