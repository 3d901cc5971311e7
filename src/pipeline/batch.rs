//! 任务划分模块
//!
//! 按文档顺序将过期区块（缓存未命中的可译区块）划分为任务：
//! 连续的小块文本/标题合并为批次以摊薄单次调用延迟；
//! 代码块和超长文本隔离为单发任务，避免拼接翻译带来的截断与格式漂移。
//!
//! 批次线格式：各条目的**内容**（不含标题井号、代码围栏）用私有分隔符
//! 拼接为一次请求，返回后按同一分隔符拆回。拆分数量不足时，
//! 缺失的尾部条目回填原文而不是让整个批次失败。

use crate::config::constants::BATCH_DELIMITER;
use crate::segment::{Block, BlockKind};
use crate::storage::TranslationCache;

// ============================================================================
// 核心类型
// ============================================================================

/// 任务类型（封闭和类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    /// 多个小区块拼接为一次请求
    Batch,
    /// 单个区块独立请求（代码块、超长文本）
    Singleton,
}

/// 任务状态。任务创建后除状态外不可变。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Done,
    Failed,
}

/// 任务中的一个条目：区块及其在文档区块序列中的下标
#[derive(Debug, Clone)]
pub struct JobItem {
    pub index: usize,
    pub block: Block,
}

/// 翻译任务
#[derive(Debug, Clone)]
pub struct Job {
    pub id: usize,
    pub kind: JobKind,
    pub items: Vec<JobItem>,
    pub state: JobState,
}

impl Job {
    fn new(id: usize, kind: JobKind, items: Vec<JobItem>) -> Self {
        Self {
            id,
            kind,
            items,
            state: JobState::Pending,
        }
    }

    /// 任务的简要描述，用于日志
    pub fn summary(&self) -> String {
        format!(
            "Job {} ({:?}): {} 项, {} 字符",
            self.id,
            self.kind,
            self.items.len(),
            self.items
                .iter()
                .map(|item| item.block.content_chars())
                .sum::<usize>()
        )
    }
}

// ============================================================================
// 任务划分
// ============================================================================

/// 将过期区块划分为任务序列
///
/// 按文档顺序应用规则：
/// - 分隔符与空内容区块永不参与；
/// - 缓存命中（以 `raw` 为键）的区块不算过期；
/// - 内容长度低于 `max_block_chars` 的文本/标题累积进当前批次，
///   批次达到 `batch_size` 条即封口；
/// - 代码块或超长区块立即封口当前批次，并自成单发任务。
pub fn partition_jobs(
    blocks: &[Block],
    cache: &TranslationCache,
    batch_size: usize,
    max_block_chars: usize,
) -> Vec<Job> {
    let mut jobs = Vec::new();
    let mut open_batch: Vec<JobItem> = Vec::new();
    let mut next_id = 0usize;

    let mut flush_batch = |open: &mut Vec<JobItem>, jobs: &mut Vec<Job>, next_id: &mut usize| {
        if open.is_empty() {
            return;
        }
        jobs.push(Job::new(*next_id, JobKind::Batch, std::mem::take(open)));
        *next_id += 1;
    };

    for (index, block) in blocks.iter().enumerate() {
        if !block.is_translatable() || cache.contains(&block.raw) {
            continue;
        }

        let oversized = block.content_chars() >= max_block_chars;
        if block.kind == BlockKind::Code || oversized {
            flush_batch(&mut open_batch, &mut jobs, &mut next_id);
            jobs.push(Job::new(
                next_id,
                JobKind::Singleton,
                vec![JobItem {
                    index,
                    block: block.clone(),
                }],
            ));
            next_id += 1;
            continue;
        }

        open_batch.push(JobItem {
            index,
            block: block.clone(),
        });
        if open_batch.len() >= batch_size {
            flush_batch(&mut open_batch, &mut jobs, &mut next_id);
        }
    }
    flush_batch(&mut open_batch, &mut jobs, &mut next_id);

    jobs
}

// ============================================================================
// 批次线格式
// ============================================================================

/// 将批次条目的内容拼接为一次请求的载荷
pub fn join_batch_payload(items: &[JobItem]) -> String {
    items
        .iter()
        .map(|item| item.block.content.as_str())
        .collect::<Vec<_>>()
        .join(BATCH_DELIMITER)
}

/// 按分隔符拆回批次结果
///
/// 拆分数量少于条目数时，缺失的尾部条目回填对应原文；
/// 多出的部分直接忽略。两种情况都不是错误。
pub fn split_batch_reply(reply: &str, items: &[JobItem]) -> Vec<String> {
    let mut parts: Vec<String> = reply
        .split(BATCH_DELIMITER.trim_matches('\n'))
        .map(|part| part.trim_matches('\n').to_string())
        .collect();

    if parts.len() != items.len() {
        tracing::warn!(
            "批次拆分数量不匹配: 期望 {} 实得 {}，尾部回填原文",
            items.len(),
            parts.len()
        );
    }
    parts.truncate(items.len());
    while parts.len() < items.len() {
        let item = &items[parts.len()];
        parts.push(item.block.content.clone());
    }
    parts
}

/// 把译后内容重新包装为区块的 `raw` 替换
///
/// 标题重挂井号前缀，代码块在本地保留围栏与语言标签，
/// 只有内部文本参与过转换；分隔符原样返回。
pub fn reassemble_raw(block: &Block, translated_content: &str) -> String {
    match block.kind {
        BlockKind::Text => translated_content.to_string(),
        BlockKind::Heading => format!(
            "{}{}",
            block.header_prefix.as_deref().unwrap_or(""),
            translated_content
        ),
        BlockKind::Code => {
            let mut lines: Vec<&str> = block.raw.split('\n').collect();
            let open = lines.first().copied().unwrap_or("```");
            let close = if lines.len() >= 2 {
                lines.pop().filter(|l| l.trim_start().starts_with("```"))
            } else {
                None
            };
            match close {
                Some(close) => format!("{}\n{}\n{}", open, translated_content, close),
                None => format!("{}\n{}", open, translated_content),
            }
        }
        BlockKind::Separator => block.raw.clone(),
    }
}
