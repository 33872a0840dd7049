//! Sled-based Audio Cache Implementation
//!
//! 存储布局:
//! - `audio` 树: cache key → bincode(StoredEntry)
//! - `audio_by_timestamp` 树: be(stored_at) ++ cache key → 空值，按时间有序，供过期清理范围扫描
//! - 默认树 `schema_version`: 当前 schema 版本
//!
//! 连接在首次使用时打开并缓存；打开失败不缓存，下次调用重新尝试。

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::transaction::{TransactionError, TransactionResult};
use sled::{Db, IVec, Transactional, Tree};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::application::ports::{AudioCachePort, CacheError, CacheStats, AUDIO_CACHE_TTL};

/// 存储 schema 版本
pub const CACHE_DB_VERSION: u32 = 1;

const ENTRIES_TREE: &str = "audio";
const TIMESTAMP_INDEX_TREE: &str = "audio_by_timestamp";
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Sled 缓存配置
#[derive(Debug, Clone)]
pub struct SledCacheConfig {
    /// 数据库路径
    pub db_path: PathBuf,
    /// 为 false 时视为存储引擎不可用，所有操作走降级路径
    pub enabled: bool,
    /// 条目存活时间
    pub ttl: Duration,
}

impl Default for SledCacheConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("data/audio-cache.sled"),
            enabled: true,
            ttl: AUDIO_CACHE_TTL,
        }
    }
}

/// 持久化条目，写入后 stored_at 不再修改
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    key: String,
    payload: Vec<u8>,
    stored_at: i64,
}

/// 读取结果
enum Lookup {
    Hit(Vec<u8>),
    Miss,
    Expired { stored_at: i64 },
    Corrupted(String),
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn timestamp_prefix(stored_at: i64) -> [u8; 8] {
    (stored_at.max(0) as u64).to_be_bytes()
}

fn index_key(stored_at: i64, cache_key: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + cache_key.len());
    key.extend_from_slice(&timestamp_prefix(stored_at));
    key.extend_from_slice(cache_key.as_bytes());
    key
}

fn decode_entry(raw: &[u8]) -> Result<StoredEntry, CacheError> {
    bincode::deserialize(raw).map_err(|e| CacheError::SerializationError(e.to_string()))
}

fn db_err(e: sled::Error) -> CacheError {
    CacheError::DatabaseError(e.to_string())
}

fn transaction_err(e: TransactionError<()>) -> CacheError {
    match e {
        TransactionError::Abort(()) => CacheError::DatabaseError("transaction aborted".to_string()),
        TransactionError::Storage(e) => db_err(e),
    }
}

/// 打开失败分类：目录锁被其他进程持有视为 Blocked
fn classify_open_error(e: sled::Error) -> CacheError {
    match e {
        sled::Error::Io(io) => {
            let message = io.to_string();
            if io.kind() == std::io::ErrorKind::WouldBlock
                || message.contains("could not acquire lock")
            {
                CacheError::Blocked(message)
            } else {
                CacheError::Unavailable(message)
            }
        }
        other => db_err(other),
    }
}

/// 已打开的连接
struct CacheConnection {
    db: Db,
    entries: Tree,
    by_timestamp: Tree,
}

impl CacheConnection {
    fn open(path: &Path) -> Result<Self, CacheError> {
        let db = sled::open(path).map_err(classify_open_error)?;
        Self::upgrade(&db)?;

        let entries = db.open_tree(ENTRIES_TREE).map_err(db_err)?;
        let by_timestamp = db.open_tree(TIMESTAMP_INDEX_TREE).map_err(db_err)?;

        Ok(Self {
            db,
            entries,
            by_timestamp,
        })
    }

    /// schema 升级：仅在存储版本缺失或更旧时执行，树不存在时才创建
    fn upgrade(db: &Db) -> Result<(), CacheError> {
        let stored = match db.get(SCHEMA_VERSION_KEY).map_err(db_err)? {
            Some(raw) => {
                let bytes: [u8; 4] = raw.as_ref().try_into().map_err(|_| {
                    CacheError::SerializationError("malformed schema version".to_string())
                })?;
                u32::from_be_bytes(bytes)
            }
            None => 0,
        };

        if stored > CACHE_DB_VERSION {
            return Err(CacheError::VersionChanged {
                stored,
                expected: CACHE_DB_VERSION,
            });
        }

        if stored < CACHE_DB_VERSION {
            let existing = db.tree_names();
            for name in [ENTRIES_TREE, TIMESTAMP_INDEX_TREE] {
                if !existing.iter().any(|n| n.as_ref() == name.as_bytes()) {
                    db.open_tree(name).map_err(db_err)?;
                    tracing::debug!(tree = name, "Created audio cache tree");
                }
            }
            db.insert(SCHEMA_VERSION_KEY, &CACHE_DB_VERSION.to_be_bytes())
                .map_err(db_err)?;
            db.flush().map_err(db_err)?;
            tracing::info!(
                from_version = stored,
                to_version = CACHE_DB_VERSION,
                "Audio cache schema upgraded"
            );
        }

        Ok(())
    }

    fn lookup(&self, cache_key: &str, now_ms: i64, ttl_ms: i64) -> Result<Lookup, CacheError> {
        let raw = match self.entries.get(cache_key.as_bytes()).map_err(db_err)? {
            Some(raw) => raw,
            None => return Ok(Lookup::Miss),
        };

        let entry = match decode_entry(&raw) {
            Ok(entry) => entry,
            Err(e) => return Ok(Lookup::Corrupted(e.to_string())),
        };

        if now_ms - entry.stored_at > ttl_ms {
            return Ok(Lookup::Expired {
                stored_at: entry.stored_at,
            });
        }

        Ok(Lookup::Hit(entry.payload))
    }

    /// 原子写入条目及其索引，替换旧条目时一并移除旧索引
    fn insert(&self, entry: &StoredEntry) -> Result<(), CacheError> {
        let encoded =
            bincode::serialize(entry).map_err(|e| CacheError::SerializationError(e.to_string()))?;
        let new_index_key = index_key(entry.stored_at, &entry.key);

        let result: TransactionResult<()> =
            (&self.entries, &self.by_timestamp).transaction(|(entries, index)| {
                if let Some(old) = entries.insert(entry.key.as_bytes(), encoded.as_slice())? {
                    if let Ok(old_entry) = decode_entry(&old) {
                        index.remove(index_key(old_entry.stored_at, &entry.key))?;
                    }
                }
                index.insert(new_index_key.as_slice(), Vec::<u8>::new())?;
                Ok(())
            });

        result.map_err(transaction_err)
    }

    /// 原子删除条目及其索引，返回是否存在
    fn remove(&self, cache_key: &str) -> Result<bool, CacheError> {
        let result: TransactionResult<bool> =
            (&self.entries, &self.by_timestamp).transaction(|(entries, index)| {
                match entries.remove(cache_key.as_bytes())? {
                    Some(old) => {
                        if let Ok(old_entry) = decode_entry(&old) {
                            index.remove(index_key(old_entry.stored_at, cache_key))?;
                        }
                        Ok(true)
                    }
                    None => Ok(false),
                }
            });

        result.map_err(transaction_err)
    }

    /// 条件删除：仅当条目仍是读取时看到的那一份才删除
    ///
    /// `expected_stored_at` 为 `Some` 时要求 stored_at 相同；为 `None` 时要求条目仍无法解码。
    /// 期间被重新写入的条目保持不动。
    fn remove_stale(
        &self,
        cache_key: &str,
        expected_stored_at: Option<i64>,
    ) -> Result<bool, CacheError> {
        let result: TransactionResult<bool> =
            (&self.entries, &self.by_timestamp).transaction(|(entries, index)| {
                let raw = match entries.get(cache_key.as_bytes())? {
                    Some(raw) => raw,
                    None => return Ok(false),
                };
                match (decode_entry(&raw), expected_stored_at) {
                    (Ok(entry), Some(expected)) if entry.stored_at == expected => {
                        entries.remove(cache_key.as_bytes())?;
                        index.remove(index_key(entry.stored_at, cache_key))?;
                        Ok(true)
                    }
                    (Err(_), None) => {
                        entries.remove(cache_key.as_bytes())?;
                        Ok(true)
                    }
                    _ => Ok(false),
                }
            });

        result.map_err(transaction_err)
    }

    /// 删除 stored_at 早于 expired_before 的所有条目
    fn sweep(&self, expired_before: i64) -> Result<usize, CacheError> {
        let candidates = self
            .by_timestamp
            .range(..timestamp_prefix(expired_before))
            .keys()
            .collect::<Result<Vec<IVec>, sled::Error>>()
            .map_err(db_err)?;

        let mut removed = 0;
        for row in candidates {
            if row.len() < 8 {
                self.by_timestamp.remove(&row).map_err(db_err)?;
                continue;
            }
            let cache_key = String::from_utf8_lossy(&row[8..]).into_owned();

            let result: TransactionResult<bool> =
                (&self.entries, &self.by_timestamp).transaction(|(entries, index)| {
                    index.remove(row.as_ref())?;
                    match entries.get(cache_key.as_bytes())? {
                        Some(raw) => match decode_entry(&raw) {
                            Ok(entry) if entry.stored_at < expired_before => {
                                entries.remove(cache_key.as_bytes())?;
                                Ok(true)
                            }
                            // 已被更新的写入替换，只清理陈旧索引
                            Ok(_) => Ok(false),
                            Err(_) => {
                                entries.remove(cache_key.as_bytes())?;
                                Ok(true)
                            }
                        },
                        None => Ok(false),
                    }
                });

            if result.map_err(transaction_err)? {
                removed += 1;
            }
        }

        Ok(removed)
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.entries.clear().map_err(db_err)?;
        self.by_timestamp.clear().map_err(db_err)?;
        Ok(())
    }

    fn stats(&self) -> Result<CacheStats, CacheError> {
        let mut stats = CacheStats::default();
        for item in self.entries.iter().values() {
            let raw = item.map_err(db_err)?;
            stats.entry_count += 1;
            if let Ok(entry) = decode_entry(&raw) {
                stats.total_size_bytes += entry.payload.len() as u64;
            }
        }
        Ok(stats)
    }

    fn flush(&self) -> Result<(), CacheError> {
        self.db.flush().map_err(db_err)?;
        Ok(())
    }
}

/// Sled 音频缓存
///
/// 连接惰性打开并缓存，并发的首次调用共享同一次打开
pub struct SledAudioCache {
    config: SledCacheConfig,
    connection: Mutex<Option<Arc<CacheConnection>>>,
}

impl SledAudioCache {
    /// 创建缓存实例（不触碰磁盘）
    pub fn new(config: SledCacheConfig) -> Self {
        tracing::info!(
            db_path = %config.db_path.display(),
            enabled = config.enabled,
            ttl_secs = config.ttl.as_secs(),
            "SledAudioCache configured"
        );
        Self {
            config,
            connection: Mutex::new(None),
        }
    }

    /// 使用默认 TTL 打开指定路径
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::new(SledCacheConfig {
            db_path: path.as_ref().to_path_buf(),
            ..Default::default()
        })
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    fn ttl_ms(&self) -> i64 {
        self.config.ttl.as_millis() as i64
    }

    /// 获取连接，必要时打开；失败时不缓存以便下次重试
    async fn connection(&self) -> Result<Arc<CacheConnection>, CacheError> {
        if !self.config.enabled {
            return Err(CacheError::Unavailable("audio cache disabled".to_string()));
        }

        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }

        match CacheConnection::open(&self.config.db_path) {
            Ok(conn) => {
                let conn = Arc::new(conn);
                *guard = Some(conn.clone());
                tracing::info!(db_path = %self.config.db_path.display(), "Audio cache opened");
                Ok(conn)
            }
            Err(e) => {
                match &e {
                    CacheError::Blocked(_) | CacheError::VersionChanged { .. } => {
                        tracing::warn!(error = %e, "Audio cache open failed, will retry on next use");
                    }
                    _ => {
                        tracing::error!(error = %e, "Failed to open audio cache");
                    }
                }
                Err(e)
            }
        }
    }

    /// 后台删除，不阻塞调用方
    fn spawn_delete(conn: Arc<CacheConnection>, cache_key: String, expected_stored_at: Option<i64>) {
        tokio::spawn(async move {
            if let Err(e) = conn.remove_stale(&cache_key, expected_stored_at) {
                tracing::warn!(cache_key = %cache_key, error = %e, "Failed to delete stale audio");
            }
        });
    }

    /// 以指定时间读取
    pub async fn get_at(&self, cache_key: &str, now_ms: i64) -> Option<Vec<u8>> {
        let conn = match self.connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::debug!(cache_key = %cache_key, error = %e, "Audio cache unavailable, treating as miss");
                return None;
            }
        };

        match conn.lookup(cache_key, now_ms, self.ttl_ms()) {
            Ok(Lookup::Hit(data)) => {
                tracing::debug!(cache_key = %cache_key, size_bytes = data.len(), "Audio cache hit");
                Some(data)
            }
            Ok(Lookup::Miss) => None,
            Ok(Lookup::Expired { stored_at }) => {
                tracing::debug!(cache_key = %cache_key, stored_at = stored_at, "Audio cache entry expired");
                Self::spawn_delete(conn, cache_key.to_string(), Some(stored_at));
                None
            }
            Ok(Lookup::Corrupted(reason)) => {
                tracing::warn!(cache_key = %cache_key, reason = %reason, "Corrupted audio cache entry");
                Self::spawn_delete(conn, cache_key.to_string(), None);
                None
            }
            Err(e) => {
                tracing::error!(cache_key = %cache_key, error = %e, "Failed to get cached audio");
                None
            }
        }
    }

    /// 以指定时间写入
    pub async fn put_at(&self, cache_key: &str, audio_data: Vec<u8>, now_ms: i64) {
        let conn = match self.connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::debug!(cache_key = %cache_key, error = %e, "Audio cache unavailable, skipping write");
                return;
            }
        };

        let size = audio_data.len();
        let entry = StoredEntry {
            key: cache_key.to_string(),
            payload: audio_data,
            stored_at: now_ms,
        };

        match conn.insert(&entry) {
            Ok(()) => {
                tracing::debug!(cache_key = %cache_key, size_bytes = size, "Audio cached");
            }
            Err(e) => {
                tracing::error!(cache_key = %cache_key, error = %e, "Failed to cache audio");
            }
        }
    }

    /// 以指定时间清理过期条目
    pub async fn sweep_expired_at(&self, now_ms: i64) -> usize {
        let conn = match self.connection().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::debug!(error = %e, "Audio cache unavailable, skipping sweep");
                return 0;
            }
        };

        match conn.sweep(now_ms - self.ttl_ms()) {
            Ok(removed) => {
                if removed > 0 {
                    tracing::info!(removed = removed, "Cleaned up expired audio cache entries");
                }
                removed
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to clean up audio cache");
                0
            }
        }
    }

    /// 显式重置钩子：丢弃当前连接，下次操作重新打开并校验 schema
    ///
    /// 不是通知回调，没有自动调用方。sled 的文件锁保证同一时刻只有一个进程持有数据库，
    /// 因此运行中不会被其他上下文升级；需要在外部替换数据库文件后重新打开时手动调用。
    pub async fn handle_version_change(&self) {
        self.drop_connection("Audio cache connection reset").await;
    }

    /// 关闭连接（确定性释放，如测试与进程退出）
    pub async fn close(&self) {
        self.drop_connection("Audio cache closed").await;
    }

    async fn drop_connection(&self, message: &'static str) {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.take() {
            if let Err(e) = conn.flush() {
                tracing::warn!(error = %e, "Failed to flush audio cache before closing");
            }
            tracing::info!("{}", message);
        }
    }
}

#[async_trait]
impl AudioCachePort for SledAudioCache {
    async fn get(&self, cache_key: &str) -> Option<Vec<u8>> {
        self.get_at(cache_key, now_ms()).await
    }

    async fn put(&self, cache_key: &str, audio_data: Vec<u8>) {
        self.put_at(cache_key, audio_data, now_ms()).await
    }

    async fn delete(&self, cache_key: &str) {
        let conn = match self.connection().await {
            Ok(conn) => conn,
            Err(_) => return,
        };
        if let Err(e) = conn.remove(cache_key) {
            tracing::error!(cache_key = %cache_key, error = %e, "Failed to delete cached audio");
        }
    }

    async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(now_ms()).await
    }

    async fn clear(&self) {
        let conn = match self.connection().await {
            Ok(conn) => conn,
            Err(_) => return,
        };
        match conn.clear() {
            Ok(()) => tracing::info!("Audio cache cleared"),
            Err(e) => tracing::error!(error = %e, "Failed to clear audio cache"),
        }
    }

    async fn stats(&self) -> CacheStats {
        let conn = match self.connection().await {
            Ok(conn) => conn,
            Err(_) => return CacheStats::default(),
        };
        conn.stats().unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to get audio cache stats");
            CacheStats::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    const T0: i64 = 1_700_000_000_000;

    fn test_cache() -> (TempDir, SledAudioCache) {
        let dir = tempdir().unwrap();
        let cache = SledAudioCache::open(dir.path().join("cache.sled"));
        (dir, cache)
    }

    fn ttl_ms() -> i64 {
        AUDIO_CACHE_TTL.as_millis() as i64
    }

    async fn wait_until_empty(cache: &SledAudioCache) -> bool {
        for _ in 0..100 {
            if cache.stats().await.entry_count == 0 {
                return true;
            }
            tokio::task::yield_now().await;
        }
        false
    }

    fn write_schema_version(path: &Path, version: u32) {
        let db = sled::open(path).unwrap();
        db.insert(SCHEMA_VERSION_KEY, &version.to_be_bytes()).unwrap();
        db.flush().unwrap();
    }

    #[tokio::test]
    async fn test_cache_put_get_round_trip() {
        let (_dir, cache) = test_cache();
        let audio = vec![0xff, 0xfb, 0x90, 0x00, 1, 2, 3];

        cache.put("audio:line:v1:abc", audio.clone()).await;

        assert_eq!(cache.get("audio:line:v1:abc").await, Some(audio));
        assert_eq!(cache.get("audio:line:v1:missing").await, None);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_entry() {
        let (_dir, cache) = test_cache();

        cache.put_at("k", vec![1], T0).await;
        cache.put_at("k", vec![2, 2], T0 + 10).await;

        assert_eq!(cache.get_at("k", T0 + 20).await, Some(vec![2, 2]));
        let stats = cache.stats().await;
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.total_size_bytes, 2);

        let conn = cache.connection().await.unwrap();
        assert_eq!(conn.by_timestamp.len(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_resets_stored_at() {
        let (_dir, cache) = test_cache();

        cache.put_at("k", vec![1], T0).await;
        cache.put_at("k", vec![2], T0 + 1000).await;

        // 第一次写入已过期，但覆盖写入仍然新鲜
        assert_eq!(cache.sweep_expired_at(T0 + ttl_ms() + 500).await, 0);
        assert_eq!(cache.get_at("k", T0 + ttl_ms() + 500).await, Some(vec![2]));
    }

    #[tokio::test]
    async fn test_expiration_boundary() {
        let (_dir, cache) = test_cache();
        cache.put_at("k", vec![7], T0).await;

        assert_eq!(cache.get_at("k", T0 + ttl_ms() - 1).await, Some(vec![7]));
        assert_eq!(cache.get_at("k", T0 + ttl_ms()).await, Some(vec![7]));
        assert_eq!(cache.get_at("k", T0 + ttl_ms() + 1).await, None);
    }

    #[tokio::test]
    async fn test_lazy_expiration_deletes_in_background() {
        let (_dir, cache) = test_cache();
        cache.put_at("k", vec![7], T0).await;

        assert_eq!(cache.get_at("k", T0 + ttl_ms() + 1).await, None);
        assert!(wait_until_empty(&cache).await);
        assert_eq!(cache.get_at("k", T0).await, None);
    }

    #[tokio::test]
    async fn test_expired_read_keeps_rewritten_entry() {
        let (_dir, cache) = test_cache();
        cache.put_at("k", vec![1], T0).await;

        assert_eq!(cache.get_at("k", T0 + ttl_ms() + 1).await, None);
        cache.put_at("k", vec![2], T0 + ttl_ms() + 2).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(cache.get_at("k", T0 + ttl_ms() + 3).await, Some(vec![2]));
        assert_eq!(cache.stats().await.entry_count, 1);
        let conn = cache.connection().await.unwrap();
        assert_eq!(conn.by_timestamp.len(), 1);
    }

    #[test]
    fn test_remove_stale_is_conditional() {
        let dir = tempdir().unwrap();
        let conn = CacheConnection::open(&dir.path().join("cache.sled")).unwrap();
        conn.insert(&StoredEntry {
            key: "k".to_string(),
            payload: vec![1],
            stored_at: T0 + 5,
        })
        .unwrap();

        // stored_at 不匹配：条目已被重写，不删除
        assert!(!conn.remove_stale("k", Some(T0)).unwrap());
        // 条目可解码，不按损坏处理
        assert!(!conn.remove_stale("k", None).unwrap());
        assert_eq!(conn.entries.len(), 1);

        assert!(conn.remove_stale("k", Some(T0 + 5)).unwrap());
        assert!(conn.entries.is_empty());
        assert!(conn.by_timestamp.is_empty());
        assert!(!conn.remove_stale("k", Some(T0 + 5)).unwrap());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_expired() {
        let (_dir, cache) = test_cache();
        cache.put_at("old", vec![1], T0).await;
        cache.put_at("fresh", vec![2], T0 + 60_000).await;

        let removed = cache.sweep_expired_at(T0 + ttl_ms() + 1).await;
        assert_eq!(removed, 1);

        assert_eq!(cache.get_at("old", T0).await, None);
        assert_eq!(cache.get_at("fresh", T0 + ttl_ms() + 1).await, Some(vec![2]));
        assert_eq!(cache.sweep_expired_at(T0 + ttl_ms() + 1).await, 0);

        let conn = cache.connection().await.unwrap();
        assert_eq!(conn.by_timestamp.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let (_dir, cache) = test_cache();
        cache.put("a", vec![1]).await;
        cache.put("b", vec![2]).await;

        cache.delete("a").await;
        cache.delete("never-stored").await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(vec![2]));

        cache.clear().await;
        assert_eq!(cache.stats().await, CacheStats::default());
        let conn = cache.connection().await.unwrap();
        assert!(conn.by_timestamp.is_empty());
    }

    #[tokio::test]
    async fn test_schema_created_on_first_use() {
        let (dir, cache) = test_cache();
        cache.put("k", vec![1]).await;
        cache.close().await;

        let db = sled::open(dir.path().join("cache.sled")).unwrap();
        let names = db.tree_names();
        assert!(names.iter().any(|n| n.as_ref() == ENTRIES_TREE.as_bytes()));
        assert!(names.iter().any(|n| n.as_ref() == TIMESTAMP_INDEX_TREE.as_bytes()));
        let version = db.get(SCHEMA_VERSION_KEY).unwrap().unwrap();
        assert_eq!(version.as_ref(), &CACHE_DB_VERSION.to_be_bytes());
    }

    #[tokio::test]
    async fn test_connection_is_shared() {
        let (_dir, cache) = test_cache();
        let cache = Arc::new(cache);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                tokio::spawn(async move { cache.put(&format!("k{}", i), vec![i as u8]).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let a = cache.connection().await.unwrap();
        let b = cache.connection().await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.stats().await.entry_count, 8);
    }

    #[tokio::test]
    async fn test_disabled_cache_degrades() {
        let dir = tempdir().unwrap();
        let cache = SledAudioCache::new(SledCacheConfig {
            db_path: dir.path().join("cache.sled"),
            enabled: false,
            ttl: AUDIO_CACHE_TTL,
        });

        cache.put("k", vec![1]).await;
        assert_eq!(cache.get("k").await, None);
        cache.delete("k").await;
        cache.clear().await;
        assert_eq!(cache.sweep_expired().await, 0);
        assert_eq!(cache.stats().await, CacheStats::default());
        assert!(!dir.path().join("cache.sled").exists());
    }

    #[tokio::test]
    async fn test_unopenable_path_degrades() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("not-a-dir");
        std::fs::write(&file_path, b"occupied").unwrap();
        let cache = SledAudioCache::open(&file_path);

        cache.put("k", vec![1]).await;
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.sweep_expired().await, 0);
        assert_eq!(cache.stats().await.entry_count, 0);
    }

    #[tokio::test]
    async fn test_blocked_open_retries_later() {
        let (dir, cache) = test_cache();
        let path = dir.path().join("cache.sled");
        let holder = sled::open(&path).unwrap();

        cache.put("k", vec![1]).await;
        assert_eq!(cache.get("k").await, None);

        drop(holder);
        cache.put("k", vec![2]).await;
        assert_eq!(cache.get("k").await, Some(vec![2]));
    }

    #[tokio::test]
    async fn test_newer_schema_version_fails_open_then_recovers() {
        let (dir, cache) = test_cache();
        let path = dir.path().join("cache.sled");
        write_schema_version(&path, CACHE_DB_VERSION + 1);

        cache.put("k", vec![1]).await;
        assert_eq!(cache.get("k").await, None);
        assert!(matches!(
            cache.connection().await.err(),
            Some(CacheError::VersionChanged { .. })
        ));

        write_schema_version(&path, CACHE_DB_VERSION);
        cache.put("k", vec![1]).await;
        assert_eq!(cache.get("k").await, Some(vec![1]));
    }

    #[tokio::test]
    async fn test_version_change_reopens_fresh() {
        let (_dir, cache) = test_cache();
        cache.put("k", vec![9]).await;
        let before = cache.connection().await.unwrap();
        drop(before);

        cache.handle_version_change().await;
        assert!(cache.connection.lock().await.is_none());

        assert_eq!(cache.get("k").await, Some(vec![9]));
    }

    #[tokio::test]
    async fn test_corrupted_entry_treated_as_miss() {
        let (_dir, cache) = test_cache();
        let conn = cache.connection().await.unwrap();
        conn.entries.insert("bad", vec![0xde, 0xad]).unwrap();
        drop(conn);

        assert_eq!(cache.get("bad").await, None);
        assert!(wait_until_empty(&cache).await);
    }

    #[tokio::test]
    async fn test_corrupted_read_keeps_rewritten_entry() {
        let (_dir, cache) = test_cache();
        let conn = cache.connection().await.unwrap();
        conn.entries.insert("k", vec![0xde, 0xad]).unwrap();
        drop(conn);

        assert_eq!(cache.get_at("k", T0).await, None);
        cache.put_at("k", vec![3], T0 + 1).await;
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(cache.get_at("k", T0 + 2).await, Some(vec![3]));
    }
}
