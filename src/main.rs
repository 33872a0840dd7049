//! Dialogue Director - 对话音频生成服务
//!
//! - Domain: dialogue/, cache_key/, audio_tags
//! - Application: commands, queries, ports
//! - Infrastructure: http, memory, worker, persistence, adapters, events

use std::sync::Arc;
use std::time::Duration;

use dialogue_director::application::SpeechSynthesisPort;
use dialogue_director::config::{load_config, print_config, AppConfig};
use dialogue_director::infrastructure::adapters::{
    ElevenLabsClient, ElevenLabsClientConfig, FakeSpeechSynthesizer,
};
use dialogue_director::infrastructure::events::EventPublisher;
use dialogue_director::infrastructure::http::{AppState, HttpServer};
use dialogue_director::infrastructure::memory::{InMemoryPlaybackRegistry, InMemorySessionManager};
use dialogue_director::infrastructure::persistence::{SledAudioCache, SledCacheConfig};
use dialogue_director::infrastructure::worker::{CacheSweeper, CacheSweeperConfig};

fn init_logging(config: &AppConfig) {
    let log_filter = format!(
        "{},dialogue_director={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

fn build_synthesizer(config: &AppConfig) -> anyhow::Result<Arc<dyn SpeechSynthesisPort>> {
    if config.synthesis.fake {
        tracing::warn!("Using fake speech synthesizer, generated audio is synthetic");
        return Ok(FakeSpeechSynthesizer::new().arc());
    }

    let client_config =
        ElevenLabsClientConfig::new(&config.synthesis.base_url, &config.synthesis.api_key)
            .with_timeout(config.synthesis.timeout_secs);
    Ok(Arc::new(ElevenLabsClient::new(client_config)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_logging(&config);

    tracing::info!("Dialogue Director - 对话音频生成服务");
    print_config(&config);

    // 确保缓存目录存在；失败时缓存降级为未命中，不阻止启动
    if let Some(parent) = config.cache.db_path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(parent).await {
            tracing::warn!(path = %parent.display(), error = %e, "Failed to create cache directory");
        }
    }

    // 音频缓存（首次使用时打开）
    let audio_cache = SledAudioCache::new(SledCacheConfig {
        db_path: config.cache.db_path.clone(),
        enabled: config.cache.enabled,
        ttl: Duration::from_secs(config.cache.ttl_secs),
    })
    .arc();

    let synthesizer = build_synthesizer(&config)?;
    let event_publisher = EventPublisher::new().arc();
    let session_manager = InMemorySessionManager::new().arc();
    let playback = InMemoryPlaybackRegistry::new(event_publisher.clone()).arc();

    // 过期清理：启用周期清理时首轮立即执行，否则只在启动时清理一次
    let sweeper = CacheSweeper::new(
        CacheSweeperConfig {
            interval: Duration::from_secs(config.gc.interval_secs),
            session_expire_secs: config.gc.session_expire_secs,
        },
        audio_cache.clone(),
        session_manager.clone(),
        playback.clone(),
        event_publisher.clone(),
    );
    if config.gc.enabled {
        tokio::spawn(sweeper.run());
    } else {
        let report = sweeper.sweep_once().await;
        tracing::info!(expired_entries = report.expired_entries, "Startup cache sweep finished");
    }

    let state = AppState::new(
        session_manager,
        audio_cache.clone(),
        synthesizer,
        playback,
        event_publisher,
        config.generation(),
    );

    let server = HttpServer::new(&config.server, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    audio_cache.close().await;
    tracing::info!("Server shutdown complete");

    Ok(())
}
