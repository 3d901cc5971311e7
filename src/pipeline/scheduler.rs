//! 趟次调度模块
//!
//! 一个趟次（pass）是把文档全部过期区块翻到最新的一次完整尝试。
//! 固定大小的工作池（信号量许可数 `C`）并发拉取任务，每个任务恰好
//! 等待一次外部转换调用；结果通过事件通道汇聚回单一的驱动循环，
//! 重建文档缓冲区只由驱动循环写入，不存在共享内存写竞争。
//!
//! 完成判定是对全部任务句柄的显式join：事件通道关闭（所有发送端
//! 析构）即全部任务已结束，不轮询计数器。
//!
//! 失败语义：单个任务失败只记录日志并让其条目保持原文，
//! 仍计入完成数，整体进度总能到达100%；失败从不中断趟次。
//!
//! 取消语义：每次文档缓冲区写入前都检查趟次的取消标志，
//! 而不仅在趟次开始时检查；被取消的趟次不再产生任何发布。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};

use crate::config::TranslatorConfig;
use crate::error::TranslationResult;
use crate::provider::{TextTransformer, TransformRequest};
use crate::segment::Block;
use crate::storage::TranslationCache;

use super::batch::{
    join_batch_payload, partition_jobs, reassemble_raw, split_batch_reply, Job, JobKind, JobState,
};
use super::stream::StreamAggregator;

// ============================================================================
// 趟次句柄与结果
// ============================================================================

/// 趟次句柄：跨任务共享的取消标志
///
/// 开启新趟次（新文档或配置切换）前必须同步调用前一趟次的
/// [`PassHandle::cancel`]，之后旧趟次的所有在途与未来写入都会被抑制。
#[derive(Debug, Clone, Default)]
pub struct PassHandle {
    cancelled: Arc<AtomicBool>,
}

impl PassHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记趟次为已取消（同步，立即生效）
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// 查询取消标志
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// 一个趟次的最终结果
#[derive(Debug, Clone)]
pub struct PassOutcome {
    /// 重建后的文档文本
    pub document: String,
    /// 已完成（含失败回填）的条目数
    pub completed: usize,
    /// 过期条目总数
    pub total: usize,
    /// 失败后回填原文的条目数
    pub failed_items: usize,
    /// 趟次是否被取消
    pub cancelled: bool,
}

/// 工作任务发给驱动循环的事件
enum PassEvent {
    /// 单发任务的流式中间态（已重新包裹围栏/前缀）
    Partial { index: usize, raw: String },
    /// 一个条目的最终结果
    Resolved {
        index: usize,
        raw_key: String,
        new_raw: String,
        translated: bool,
    },
}

// ============================================================================
// 趟次驱动
// ============================================================================

/// 驱动一个完整的翻译趟次
///
/// 1. 以缓存命中重建初始文档；
/// 2. 把过期区块划分为任务并在 `C` 个并发槽位上派发；
/// 3. 按事件到达顺序把结果合并进文档缓冲区（区块间不保证全局顺序）；
/// 4. 每个条目解析后报告单调递增的进度；
/// 5. 等待全部任务句柄join后返回。
///
/// `on_update` 收到节流后的文档快照（条目解析时无条件发布）；
/// `on_progress` 收到 `(当前完成数, 总数)`。
pub async fn run_pass(
    blocks: &[Block],
    cache: &mut TranslationCache,
    transformer: Arc<dyn TextTransformer>,
    config: &TranslatorConfig,
    handle: &PassHandle,
    mut on_update: impl FnMut(&str),
    mut on_progress: impl FnMut(usize, usize),
) -> TranslationResult<PassOutcome> {
    // 第一步：缓存命中直接落入重建缓冲区
    let mut document: Vec<String> = Vec::with_capacity(blocks.len());
    for block in blocks {
        if block.is_translatable() {
            match cache.get(&block.raw) {
                Some(translated) => document.push(translated.to_string()),
                None => document.push(block.raw.clone()),
            }
        } else {
            document.push(block.raw.clone());
        }
    }

    // 第二步：划分任务
    let jobs = partition_jobs(blocks, cache, config.batch_size, config.max_block_chars);
    let total: usize = jobs.iter().map(|job| job.items.len()).sum();

    tracing::info!(
        "趟次开始: {} 个区块, {} 个过期条目, {} 个任务, 并发 {}",
        blocks.len(),
        total,
        jobs.len(),
        config.concurrency
    );

    if total == 0 {
        let text = document.join("\n");
        if !handle.is_cancelled() {
            on_update(&text);
            on_progress(0, 0);
        }
        return Ok(PassOutcome {
            document: text,
            completed: 0,
            total: 0,
            failed_items: 0,
            cancelled: handle.is_cancelled(),
        });
    }

    // 第三步：派发任务
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let (tx, mut rx) = mpsc::unbounded_channel::<PassEvent>();
    let stream_interval = config.stream_interval();
    let system = system_instruction(config);

    let mut handles = Vec::with_capacity(jobs.len());
    for job in jobs {
        let semaphore = Arc::clone(&semaphore);
        let transformer = Arc::clone(&transformer);
        let tx = tx.clone();
        let handle = handle.clone();
        let system = system.clone();
        handles.push(tokio::spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            if handle.is_cancelled() {
                return;
            }
            execute_job(job, transformer, &system, stream_interval, &handle, &tx).await;
            drop(permit);
        }));
    }
    drop(tx);

    // 第四步：驱动循环——文档缓冲区与缓存的唯一写入方
    let mut completed = 0usize;
    let mut failed_items = 0usize;

    while let Some(event) = rx.recv().await {
        if handle.is_cancelled() {
            break;
        }
        match event {
            PassEvent::Partial { index, raw } => {
                document[index] = raw;
                on_update(&document.join("\n"));
            }
            PassEvent::Resolved {
                index,
                raw_key,
                new_raw,
                translated,
            } => {
                document[index] = new_raw.clone();
                if translated {
                    cache.put(raw_key, new_raw);
                } else {
                    failed_items += 1;
                }
                completed += 1;
                on_progress(completed, total);
                // 条目解析后的完整缓冲区无条件发布
                on_update(&document.join("\n"));
            }
        }
    }

    // 第五步：显式join全部任务句柄
    let cancelled = handle.is_cancelled();
    if cancelled {
        for h in &handles {
            h.abort();
        }
    }
    for h in handles {
        let _ = h.await;
    }

    tracing::info!(
        "趟次结束: 完成 {}/{}, 失败回填 {}, 取消 {}",
        completed,
        total,
        failed_items,
        cancelled
    );

    Ok(PassOutcome {
        document: document.join("\n"),
        completed,
        total,
        failed_items,
        cancelled,
    })
}

/// 执行单个任务，把结果作为事件发回驱动循环
async fn execute_job(
    mut job: Job,
    transformer: Arc<dyn TextTransformer>,
    system: &str,
    stream_interval: std::time::Duration,
    handle: &PassHandle,
    tx: &mpsc::UnboundedSender<PassEvent>,
) {
    job.state = JobState::Running;
    tracing::debug!("派发 {}", job.summary());

    match job.kind {
        JobKind::Batch => execute_batch(&mut job, transformer, system, tx).await,
        JobKind::Singleton => {
            execute_singleton(&mut job, transformer, system, stream_interval, handle, tx).await
        }
    }
}

async fn execute_batch(
    job: &mut Job,
    transformer: Arc<dyn TextTransformer>,
    system: &str,
    tx: &mpsc::UnboundedSender<PassEvent>,
) {
    let payload = join_batch_payload(&job.items);
    let request = TransformRequest::new(system, payload);

    match transformer.transform(request).await {
        Ok(reply) => {
            let parts = split_batch_reply(&reply, &job.items);
            for (item, part) in job.items.iter().zip(parts) {
                let new_raw = reassemble_raw(&item.block, &part);
                let _ = tx.send(PassEvent::Resolved {
                    index: item.index,
                    raw_key: item.block.raw.clone(),
                    new_raw,
                    translated: true,
                });
            }
            job.state = JobState::Done;
        }
        Err(e) => {
            // 失败非致命：条目保持原文，仍计入进度
            tracing::warn!("批次任务 {} 失败，条目回填原文: {}", job.id, e);
            for item in &job.items {
                let _ = tx.send(PassEvent::Resolved {
                    index: item.index,
                    raw_key: item.block.raw.clone(),
                    new_raw: item.block.raw.clone(),
                    translated: false,
                });
            }
            job.state = JobState::Failed;
        }
    }
}

async fn execute_singleton(
    job: &mut Job,
    transformer: Arc<dyn TextTransformer>,
    system: &str,
    stream_interval: std::time::Duration,
    handle: &PassHandle,
    tx: &mpsc::UnboundedSender<PassEvent>,
) {
    let item = match job.items.first() {
        Some(item) => item.clone(),
        None => return,
    };

    // 代码块只发送围栏内部文本，围栏与语言标签在本地保留
    let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<String>();
    let request =
        TransformRequest::new(system, item.block.content.clone()).with_deltas(delta_tx);

    let mut aggregator = StreamAggregator::new(stream_interval);
    let mut call = transformer.transform(request);
    let mut deltas_open = true;

    let result = loop {
        if !deltas_open {
            break call.await;
        }
        tokio::select! {
            result = &mut call => break result,
            maybe_delta = delta_rx.recv() => {
                match maybe_delta {
                    Some(delta) => {
                        if aggregator.push(&delta) && !handle.is_cancelled() {
                            let _ = tx.send(PassEvent::Partial {
                                index: item.index,
                                raw: reassemble_raw(&item.block, aggregator.text()),
                            });
                        }
                    }
                    None => deltas_open = false,
                }
            }
        }
    };

    match result {
        Ok(text) => {
            let _ = tx.send(PassEvent::Resolved {
                index: item.index,
                raw_key: item.block.raw.clone(),
                new_raw: reassemble_raw(&item.block, text.trim_matches('\n')),
                translated: true,
            });
            job.state = JobState::Done;
        }
        Err(e) => {
            tracing::warn!("单发任务 {} 失败，条目回填原文: {}", job.id, e);
            let _ = tx.send(PassEvent::Resolved {
                index: item.index,
                raw_key: item.block.raw.clone(),
                new_raw: item.block.raw.clone(),
                translated: false,
            });
            job.state = JobState::Failed;
        }
    }
}

/// 构造转换请求的系统指令
fn system_instruction(config: &TranslatorConfig) -> String {
    let delimiter_token = crate::config::constants::BATCH_DELIMITER.trim();
    format!(
        "You are a professional translator. Translate the following Markdown text \
         from {} to {}. Preserve Markdown syntax and inline formatting. If the input \
         contains the delimiter line \"{}\", keep every delimiter unchanged and keep \
         the number of segments identical. Output the translation only.",
        config.source_lang, config.target_lang, delimiter_token
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_handle_cancel_is_shared() {
        let handle = PassHandle::new();
        let clone = handle.clone();
        assert!(!clone.is_cancelled());
        handle.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_system_instruction_names_languages_and_delimiter() {
        let config = TranslatorConfig::default_with_lang("ja", None);
        let system = system_instruction(&config);
        assert!(system.contains("to ja"));
        assert!(system.contains("@@XLAT-SEG@@"));
    }
}
