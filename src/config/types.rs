//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::commands::handlers::GenerationConfig;
use crate::domain::cache_key::DEFAULT_OUTPUT_FORMAT;
use crate::domain::dialogue::{FAST_MODEL_ID, FULL_MODEL_ID};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 语音合成配置
    #[serde(default)]
    pub synthesis: SynthesisConfig,

    /// 音频缓存配置
    #[serde(default)]
    pub cache: CacheConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// GC 配置
    #[serde(default)]
    pub gc: GcConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// 生成编排配置
    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            full_model_id: self.synthesis.full_model_id.clone(),
            fast_model_id: self.synthesis.fast_model_id.clone(),
            output_format: self.synthesis.output_format.clone(),
            cache_hit_delay: Duration::from_millis(self.playback.cache_hit_delay_ms),
            generated_delay: Duration::from_millis(self.playback.generated_delay_ms),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5070
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 语音合成配置
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisConfig {
    /// 合成 API 基础 URL
    #[serde(default = "default_synthesis_url")]
    pub base_url: String,

    /// API key（使用 fake 合成器时可为空）
    #[serde(default)]
    pub api_key: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_synthesis_timeout")]
    pub timeout_secs: u64,

    /// 输出格式，参与缓存 key 计算
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// 完整模型（支持内联标签和对话合成）
    #[serde(default = "default_full_model")]
    pub full_model_id: String,

    /// 快速模型
    #[serde(default = "default_fast_model")]
    pub fast_model_id: String,

    /// 使用进程内 fake 合成器（离线运行）
    #[serde(default)]
    pub fake: bool,
}

fn default_synthesis_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_synthesis_timeout() -> u64 {
    240
}

fn default_output_format() -> String {
    DEFAULT_OUTPUT_FORMAT.to_string()
}

fn default_full_model() -> String {
    FULL_MODEL_ID.to_string()
}

fn default_fast_model() -> String {
    FAST_MODEL_ID.to_string()
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            base_url: default_synthesis_url(),
            api_key: String::new(),
            timeout_secs: default_synthesis_timeout(),
            output_format: default_output_format(),
            full_model_id: default_full_model(),
            fast_model_id: default_fast_model(),
            fake: false,
        }
    }
}

/// 音频缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// 为 false 时缓存全部降级为未命中
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    /// Sled 数据库目录
    #[serde(default = "default_cache_path")]
    pub db_path: PathBuf,

    /// 条目存活时间（秒），默认 48 小时
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_path() -> PathBuf {
    PathBuf::from("data/audio-cache.sled")
}

fn default_cache_ttl() -> u64 {
    48 * 60 * 60
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            db_path: default_cache_path(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

/// 播放配置
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// 缓存命中后自动播放延迟（毫秒）
    #[serde(default = "default_cache_hit_delay")]
    pub cache_hit_delay_ms: u64,

    /// 新生成后自动播放延迟（毫秒）
    #[serde(default = "default_generated_delay")]
    pub generated_delay_ms: u64,
}

fn default_cache_hit_delay() -> u64 {
    50
}

fn default_generated_delay() -> u64 {
    100
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            cache_hit_delay_ms: default_cache_hit_delay(),
            generated_delay_ms: default_generated_delay(),
        }
    }
}

/// GC（垃圾回收）配置
#[derive(Debug, Clone, Deserialize)]
pub struct GcConfig {
    /// 是否启用周期清理
    #[serde(default = "default_gc_enabled")]
    pub enabled: bool,

    /// GC 间隔时间（秒）
    #[serde(default = "default_gc_interval")]
    pub interval_secs: u64,

    /// Session 空闲过期时间（秒）
    #[serde(default = "default_session_expire")]
    pub session_expire_secs: u64,
}

fn default_gc_enabled() -> bool {
    true
}

fn default_gc_interval() -> u64 {
    3600 // 1 小时
}

fn default_session_expire() -> u64 {
    86400 // 24 小时
}

impl Default for GcConfig {
    fn default() -> Self {
        Self {
            enabled: default_gc_enabled(),
            interval_secs: default_gc_interval(),
            session_expire_secs: default_session_expire(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5070);
        assert_eq!(config.synthesis.full_model_id, "eleven_v3");
        assert_eq!(config.synthesis.fast_model_id, "eleven_flash_v2_5");
        assert_eq!(config.cache.ttl_secs, 172_800);
    }

    #[test]
    fn test_server_addr() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:5070");
    }

    #[test]
    fn test_generation_config() {
        let generation = AppConfig::default().generation();
        assert_eq!(generation.output_format, "mp3_44100_128");
        assert_eq!(generation.cache_hit_delay, Duration::from_millis(50));
        assert_eq!(generation.generated_delay, Duration::from_millis(100));
    }
}
