//! 翻译会话
//!
//! 会话是整个引擎的主入口，拥有并协调全部子系统：
//! 翻译缓存、标注集合、转换服务和当前趟次的取消句柄。
//! 缓存以值的形式归会话所有、按引用传入调度器，
//! 不存在模块级的全局可变状态。

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::anchor::annotation::{Annotation, AnnotationStore};
use crate::anchor::hash::ContextHash;
use crate::anchor::highlight::{compute_highlights, HighlightSpan};
use crate::config::TranslatorConfig;
use crate::error::TranslationResult;
use crate::pipeline::scheduler::{run_pass, PassHandle, PassOutcome};
use crate::provider::{DeepLxTransformer, TextTransformer};
use crate::segment::segment;
use crate::storage::cache::{CacheStatsSnapshot, TranslationCache};

/// 翻译会话
pub struct TranslationSession {
    config: TranslatorConfig,
    cache: TranslationCache,
    annotations: AnnotationStore,
    transformer: Arc<dyn TextTransformer>,
    current_pass: Option<PassHandle>,
    stats: SessionStats,
}

impl TranslationSession {
    /// 以指定转换服务创建会话
    pub fn new(
        config: TranslatorConfig,
        transformer: Arc<dyn TextTransformer>,
    ) -> TranslationResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cache: TranslationCache::new(),
            annotations: AnnotationStore::new(),
            transformer,
            current_pass: None,
            stats: SessionStats::default(),
        })
    }

    /// 以配置中的默认提供方（DeepLX）创建会话
    pub fn with_default_provider(config: TranslatorConfig) -> TranslationResult<Self> {
        let transformer = Arc::new(DeepLxTransformer::from_config(&config));
        Self::new(config, transformer)
    }

    /// 当前配置
    pub fn config(&self) -> &TranslatorConfig {
        &self.config
    }

    /// 更新配置
    ///
    /// 配置标识发生变化时（提供方、密钥、模型、端点、语言），
    /// 在返回之前**同步**取消在途趟次并整体清空缓存——
    /// 早于任何新任务的调度，防止吐出旧配置下产出的译文。
    pub fn set_config(&mut self, config: TranslatorConfig) -> TranslationResult<()> {
        config.validate()?;
        if config.fingerprint() != self.config.fingerprint() {
            tracing::info!("转换配置变化，取消在途趟次并清空缓存");
            self.cancel();
            self.cache.clear();
            self.transformer = Arc::new(DeepLxTransformer::from_config(&config));
        }
        self.config = config;
        Ok(())
    }

    /// 更新配置并替换转换服务实现
    pub fn set_config_with_transformer(
        &mut self,
        config: TranslatorConfig,
        transformer: Arc<dyn TextTransformer>,
    ) -> TranslationResult<()> {
        config.validate()?;
        if config.fingerprint() != self.config.fingerprint() {
            tracing::info!("转换配置变化，取消在途趟次并清空缓存");
            self.cancel();
            self.cache.clear();
        }
        self.transformer = transformer;
        self.config = config;
        Ok(())
    }

    /// 取消当前在途趟次（同步生效）
    pub fn cancel(&mut self) {
        if let Some(pass) = &self.current_pass {
            if !pass.is_cancelled() {
                pass.cancel();
                self.stats.passes_cancelled.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// 驱动一个完整的翻译趟次
    ///
    /// 开始前同步取消上一趟次；之后分割文档、应用缓存、
    /// 调度过期区块并把部分/最终结果通过 `on_update` 流回调用方。
    pub async fn translate(
        &mut self,
        document: &str,
        on_update: impl FnMut(&str),
        on_progress: impl FnMut(usize, usize),
    ) -> TranslationResult<PassOutcome> {
        // 新趟次开始前，旧趟次必须已被同步标记取消
        self.cancel();
        let handle = PassHandle::new();
        self.current_pass = Some(handle.clone());

        let blocks = segment(document);
        self.stats.passes_started.fetch_add(1, Ordering::Relaxed);
        self.stats
            .blocks_segmented
            .fetch_add(blocks.len(), Ordering::Relaxed);

        let outcome = run_pass(
            &blocks,
            &mut self.cache,
            Arc::clone(&self.transformer),
            &self.config,
            &handle,
            on_update,
            on_progress,
        )
        .await?;

        self.stats
            .items_completed
            .fetch_add(outcome.completed, Ordering::Relaxed);
        self.stats
            .items_failed
            .fetch_add(outcome.failed_items, Ordering::Relaxed);

        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // 标注
    // ------------------------------------------------------------------

    /// 创建一条锚定在指定区块内容哈希上的标注
    pub fn annotate(
        &mut self,
        text: impl Into<String>,
        note: impl Into<String>,
        context_hash: ContextHash,
        start_offset: usize,
        end_offset: usize,
    ) -> &Annotation {
        self.annotations
            .create(text, note, context_hash, start_offset, end_offset)
    }

    /// 删除一条标注
    pub fn remove_annotation(&mut self, id: u64) -> bool {
        self.annotations.remove(id)
    }

    /// 清空全部标注
    pub fn clear_annotations(&mut self) {
        self.annotations.clear();
    }

    /// 标注集合的只读视图
    pub fn annotations(&self) -> &AnnotationStore {
        &self.annotations
    }

    /// 计算某个区块当前应显示的高亮区间
    pub fn highlights_for_block(
        &self,
        plain_text: &str,
        context_hash: ContextHash,
    ) -> Vec<HighlightSpan> {
        compute_highlights(plain_text, context_hash, self.annotations.all())
    }

    /// 导出标注为制表符分隔文本
    pub fn export_annotations(&self) -> String {
        self.annotations.export_delimited()
    }

    // ------------------------------------------------------------------
    // 统计
    // ------------------------------------------------------------------

    /// 缓存统计快照
    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    /// 会话统计快照
    pub fn stats(&self) -> SessionStatsSnapshot {
        self.stats.snapshot()
    }
}

/// 会话统计（原子计数）
#[derive(Debug, Default)]
pub struct SessionStats {
    pub passes_started: AtomicU64,
    pub passes_cancelled: AtomicU64,
    pub blocks_segmented: AtomicUsize,
    pub items_completed: AtomicUsize,
    pub items_failed: AtomicUsize,
}

/// 会话统计的一致性快照
#[derive(Debug, Clone, Copy)]
pub struct SessionStatsSnapshot {
    pub passes_started: u64,
    pub passes_cancelled: u64,
    pub blocks_segmented: usize,
    pub items_completed: usize,
    pub items_failed: usize,
}

impl SessionStats {
    /// 获取统计快照
    pub fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            passes_started: self.passes_started.load(Ordering::Relaxed),
            passes_cancelled: self.passes_cancelled.load(Ordering::Relaxed),
            blocks_segmented: self.blocks_segmented.load(Ordering::Relaxed),
            items_completed: self.items_completed.load(Ordering::Relaxed),
            items_failed: self.items_failed.load(Ordering::Relaxed),
        }
    }
}
