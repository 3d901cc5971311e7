//! 翻译缓存模块
//!
//! 以区块的原始文本（`raw`）为键，保存最近一次产出的完整译文替换。
//! 缓存与进程同寿命，由文档会话持有并以引用传入调度器——
//! 不存在环境级的全局单例。
//!
//! 失效纪律：转换配置（提供方、密钥、模型、端点、目标语言）发生任何
//! 变化时必须在调度新任务之前同步调用 [`TranslationCache::clear`]，
//! 整体清空、从不部分清理，避免混用不同配置下产出的译文。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

// ============================================================================
// 核心类型
// ============================================================================

/// 翻译缓存
///
/// 单线程驱动循环是唯一写入方（见并发模型），写操作是追加/覆盖式的，
/// 对相同键幂等，因此无需内部加锁；多线程复用时需由调用方串行化写入。
#[derive(Debug, Default)]
pub struct TranslationCache {
    entries: HashMap<String, String>,
    stats: CacheStats,
}

/// 缓存统计信息（原子计数，读取不影响写入方）
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub invalidations: AtomicU64,
}

/// 统计数据的一致性快照
#[derive(Debug, Clone, Copy)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub entries: usize,
}

// ============================================================================
// 实现
// ============================================================================

impl TranslationCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 查询译文
    ///
    /// 命中时返回完整的译文替换；对相同 `raw` 的命中永远优先于重新计算。
    pub fn get(&self, raw_key: &str) -> Option<&str> {
        match self.entries.get(raw_key) {
            Some(translated) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(translated.as_str())
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// 是否包含指定键（不计入命中统计）
    pub fn contains(&self, raw_key: &str) -> bool {
        self.entries.contains_key(raw_key)
    }

    /// 写入译文（相同键覆盖，幂等）
    pub fn put(&mut self, raw_key: impl Into<String>, translated_raw: impl Into<String>) {
        self.entries.insert(raw_key.into(), translated_raw.into());
    }

    /// 整体清空
    ///
    /// 配置变更时的强制动作；没有部分失效的路径。
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        self.stats.invalidations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("翻译缓存已整体清空，丢弃 {} 个条目", dropped);
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 获取统计快照
    pub fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            invalidations: self.stats.invalidations.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

impl CacheStatsSnapshot {
    /// 缓存命中率
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
