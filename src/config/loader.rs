//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "DIALOGUE";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `DIALOGUE_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `DIALOGUE_SERVER__PORT=8080`
/// - `DIALOGUE_SYNTHESIS__API_KEY=sk_...`
/// - `DIALOGUE_SYNTHESIS__FAKE=true`
/// - `DIALOGUE_CACHE__DB_PATH=/data/audio-cache.sled`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5070)?
        .set_default("synthesis.base_url", "https://api.elevenlabs.io")?
        .set_default("synthesis.api_key", "")?
        .set_default("synthesis.timeout_secs", 240)?
        .set_default("synthesis.output_format", "mp3_44100_128")?
        .set_default("synthesis.full_model_id", "eleven_v3")?
        .set_default("synthesis.fast_model_id", "eleven_flash_v2_5")?
        .set_default("synthesis.fake", false)?
        .set_default("cache.enabled", true)?
        .set_default("cache.db_path", "data/audio-cache.sled")?
        .set_default("cache.ttl_secs", 48 * 60 * 60)?
        .set_default("playback.cache_hit_delay_ms", 50)?
        .set_default("playback.generated_delay_ms", 100)?
        .set_default("gc.enabled", true)?
        .set_default("gc.interval_secs", 3600)?
        .set_default("gc.session_expire_secs", 86400)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: DIALOGUE_SYNTHESIS__BASE_URL=http://localhost:9000
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 构建配置
    let config = builder.build()?;

    // 5. 反序列化为 AppConfig
    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    // 6. 验证配置
    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.synthesis.base_url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Synthesis base URL cannot be empty".to_string(),
        ));
    }

    if !config.synthesis.fake && config.synthesis.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "API key cannot be empty".to_string(),
        ));
    }

    if config.synthesis.output_format.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Output format cannot be empty".to_string(),
        ));
    }

    if config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Cache TTL cannot be 0".to_string(),
        ));
    }

    if config.cache.enabled && config.cache.db_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Cache path cannot be empty".to_string(),
        ));
    }

    if config.gc.enabled && config.gc.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "GC interval cannot be 0 when GC is enabled".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    if config.synthesis.fake {
        tracing::info!("Synthesis: fake (offline)");
    } else {
        tracing::info!("Synthesis URL: {}", config.synthesis.base_url);
        tracing::info!("Synthesis Timeout: {}s", config.synthesis.timeout_secs);
    }
    tracing::info!(
        "Models: full={}, fast={}",
        config.synthesis.full_model_id,
        config.synthesis.fast_model_id
    );
    tracing::info!("Output Format: {}", config.synthesis.output_format);
    tracing::info!("Cache Enabled: {}", config.cache.enabled);
    tracing::info!("Cache Path: {:?}", config.cache.db_path);
    tracing::info!("Cache TTL: {}s", config.cache.ttl_secs);
    tracing::info!("GC Enabled: {}", config.gc.enabled);
    if config.gc.enabled {
        tracing::info!("GC Interval: {}s", config.gc.interval_secs);
        tracing::info!("Session Expire: {}s", config.gc.session_expire_secs);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.synthesis.api_key = "test-key".to_string();
        config
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validation_requires_api_key_unless_fake() {
        let mut config = AppConfig::default();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("API key cannot be empty"));

        config.synthesis.fake = true;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = valid_config();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_ttl() {
        let mut config = valid_config();
        config.cache.ttl_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_gc_interval() {
        let mut config = valid_config();
        config.gc.interval_secs = 0;
        assert!(validate_config(&config).is_err());

        config.gc.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[synthesis]\nfake = true\n\n[cache]\nttl_secs = 60\n\n[playback]\ncache_hit_delay_ms = 10"
        )
        .unwrap();

        let config = load_config_from_path(Some(&path)).unwrap();
        assert!(config.synthesis.fake);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.playback.cache_hit_delay_ms, 10);
        assert_eq!(config.playback.generated_delay_ms, 100);
        assert_eq!(config.synthesis.full_model_id, "eleven_v3");
    }
}
