//! 翻译趟次集成测试
//!
//! 用进程内的假转换服务驱动完整趟次，覆盖缓存幂等、增量重译、
//! 失败回填、进度单调、取消抑制与配置切换失效。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::BoxFuture;

use markflow::config::constants::BATCH_DELIMITER;
use markflow::config::TranslatorConfig;
use markflow::core::TranslationSession;
use markflow::error::ProviderError;
use markflow::pipeline::scheduler::{run_pass, PassHandle};
use markflow::provider::{TextTransformer, TransformRequest};
use markflow::segment::segment;
use markflow::storage::TranslationCache;

// ============================================================================
// 测试用转换服务
// ============================================================================

/// 把每个片段包进全角括号的确定性转换服务，并记录调用次数
struct MarkingTransformer {
    calls: Arc<AtomicUsize>,
}

impl MarkingTransformer {
    fn new() -> (Arc<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Self {
                calls: Arc::clone(&calls),
            }),
            calls,
        )
    }
}

impl TextTransformer for MarkingTransformer {
    fn transform(
        &self,
        request: TransformRequest,
    ) -> BoxFuture<'static, Result<String, ProviderError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = request
            .input
            .split(BATCH_DELIMITER)
            .map(|part| format!("【{}】", part))
            .collect::<Vec<_>>()
            .join(BATCH_DELIMITER);
        Box::pin(async move { Ok(reply) })
    }
}

/// 永远失败的转换服务
struct FailingTransformer;

impl TextTransformer for FailingTransformer {
    fn transform(
        &self,
        _request: TransformRequest,
    ) -> BoxFuture<'static, Result<String, ProviderError>> {
        Box::pin(async { Err(ProviderError::Network("连接被拒绝".to_string())) })
    }
}

/// 先推送增量、停顿片刻后返回完整结果的流式转换服务
struct StreamingTransformer {
    deltas: Vec<String>,
    final_text: String,
}

impl TextTransformer for StreamingTransformer {
    fn transform(
        &self,
        request: TransformRequest,
    ) -> BoxFuture<'static, Result<String, ProviderError>> {
        let deltas = self.deltas.clone();
        let final_text = self.final_text.clone();
        Box::pin(async move {
            if let Some(tx) = &request.deltas {
                for delta in &deltas {
                    let _ = tx.send(delta.clone());
                }
            }
            // 给驱动循环留出消费增量的时间窗
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(final_text)
        })
    }
}

/// 收到第一个请求就取消趟次的转换服务
struct CancellingTransformer {
    handle: PassHandle,
}

impl TextTransformer for CancellingTransformer {
    fn transform(
        &self,
        request: TransformRequest,
    ) -> BoxFuture<'static, Result<String, ProviderError>> {
        self.handle.cancel();
        let input = request.input;
        Box::pin(async move { Ok(input) })
    }
}

fn test_config() -> TranslatorConfig {
    let mut config = TranslatorConfig::default();
    config.stream_interval_ms = 0;
    config
}

// ============================================================================
// 端到端趟次
// ============================================================================

/// 测试一个混合文档的完整趟次：标题挂回前缀、代码围栏保留、分隔符原样
#[tokio::test]
async fn test_full_pass_translates_mixed_document() {
    let doc = "# Title\n\nSome paragraph.\n\n```rust\nlet x = 1;\n```";
    let (transformer, _calls) = MarkingTransformer::new();
    let mut session = TranslationSession::new(test_config(), transformer).unwrap();

    let outcome = session.translate(doc, |_| {}, |_, _| {}).await.unwrap();

    assert!(!outcome.cancelled);
    assert_eq!(outcome.completed, outcome.total);
    assert_eq!(outcome.failed_items, 0);
    assert_eq!(
        outcome.document,
        "# 【Title】\n\n【Some paragraph.】\n\n```rust\n【let x = 1;】\n```"
    );
}

/// 测试相同文档的第二趟完全命中缓存，不再发起任何转换调用
#[tokio::test]
async fn test_second_pass_is_served_from_cache() {
    let doc = "alpha\n\nbeta\n\ngamma";
    let (transformer, calls) = MarkingTransformer::new();
    let mut session = TranslationSession::new(test_config(), transformer).unwrap();

    let first = session.translate(doc, |_| {}, |_, _| {}).await.unwrap();
    let calls_after_first = calls.load(Ordering::SeqCst);
    assert!(calls_after_first > 0);

    let second = session.translate(doc, |_| {}, |_, _| {}).await.unwrap();

    assert_eq!(second.total, 0);
    assert_eq!(second.document, first.document);
    assert_eq!(calls.load(Ordering::SeqCst), calls_after_first);
}

/// 测试编辑单个区块后只有该区块被重译，其余沿用缓存
#[tokio::test]
async fn test_edited_block_only_retranslates_itself() {
    let (transformer, calls) = MarkingTransformer::new();
    let mut session = TranslationSession::new(test_config(), transformer).unwrap();

    session
        .translate("alpha\n\nbeta\n\ngamma", |_| {}, |_, _| {})
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1); // 三个小块合为一个批次

    let outcome = session
        .translate("alpha\n\nBETA!\n\ngamma", |_| {}, |_, _| {})
        .await
        .unwrap();

    assert_eq!(outcome.total, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(outcome.document, "【alpha】\n\n【BETA!】\n\n【gamma】");
}

// ============================================================================
// 失败与进度
// ============================================================================

/// 测试任务全部失败时条目回填原文且进度仍到达100%
#[tokio::test]
async fn test_failures_backfill_and_progress_completes() {
    let doc = "# Head\n\nbody text\n\n```sh\nls\n```";
    let progress = Arc::new(Mutex::new(Vec::<(usize, usize)>::new()));
    let progress_sink = Arc::clone(&progress);

    let mut session =
        TranslationSession::new(test_config(), Arc::new(FailingTransformer)).unwrap();
    let outcome = session
        .translate(
            doc,
            |_| {},
            move |done, total| progress_sink.lock().unwrap().push((done, total)),
        )
        .await
        .unwrap();

    assert_eq!(outcome.completed, outcome.total);
    assert_eq!(outcome.failed_items, outcome.total);
    // 全部回填原文，重建结果与输入逐字节一致
    assert_eq!(outcome.document, doc);

    let progress = progress.lock().unwrap();
    let last = progress.last().copied().unwrap();
    assert_eq!(last, (outcome.total, outcome.total));
}

/// 测试进度严格单调递增且总数恒定
#[tokio::test]
async fn test_progress_is_monotone() {
    let doc = "one\n\ntwo\n\nthree\n\nfour\n\nfive";
    let mut config = test_config();
    config.batch_size = 1; // 每个条目一个任务，多次进度回调
    let (transformer, _calls) = MarkingTransformer::new();
    let mut session = TranslationSession::new(config, transformer).unwrap();

    let progress = Arc::new(Mutex::new(Vec::<(usize, usize)>::new()));
    let progress_sink = Arc::clone(&progress);
    let outcome = session
        .translate(
            doc,
            |_| {},
            move |done, total| progress_sink.lock().unwrap().push((done, total)),
        )
        .await
        .unwrap();

    let progress = progress.lock().unwrap();
    assert_eq!(progress.len(), outcome.total);
    assert!(progress.windows(2).all(|w| w[1].0 == w[0].0 + 1));
    assert!(progress.iter().all(|&(_, total)| total == outcome.total));
}

// ============================================================================
// 取消
// ============================================================================

/// 测试已取消的趟次不发布任何更新
#[tokio::test]
async fn test_precancelled_pass_publishes_nothing() {
    let blocks = segment("alpha\n\nbeta");
    let mut cache = TranslationCache::new();
    let (transformer, _calls) = MarkingTransformer::new();
    let config = test_config();

    let handle = PassHandle::new();
    handle.cancel();

    let updates = Arc::new(Mutex::new(Vec::<String>::new()));
    let updates_sink = Arc::clone(&updates);
    let outcome = run_pass(
        &blocks,
        &mut cache,
        transformer,
        &config,
        &handle,
        move |snapshot| updates_sink.lock().unwrap().push(snapshot.to_string()),
        |_, _| {},
    )
    .await
    .unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.completed, 0);
    assert!(updates.lock().unwrap().is_empty());
    assert!(cache.is_empty());
}

/// 测试趟次中途取消后在途结果被丢弃，缓存不再吸收写入
#[tokio::test]
async fn test_mid_pass_cancellation_suppresses_writes() {
    let blocks = segment("alpha\n\nbeta");
    let mut cache = TranslationCache::new();
    let config = test_config();

    let handle = PassHandle::new();
    let transformer = Arc::new(CancellingTransformer {
        handle: handle.clone(),
    });

    let outcome = run_pass(
        &blocks,
        &mut cache,
        transformer,
        &config,
        &handle,
        |_| {},
        |_, _| {},
    )
    .await
    .unwrap();

    assert!(outcome.cancelled);
    assert_eq!(outcome.completed, 0);
    assert!(cache.is_empty());
}

// ============================================================================
// 配置切换
// ============================================================================

/// 测试配置标识变化后缓存整体失效，相同文档被重新翻译
#[tokio::test]
async fn test_config_change_invalidates_cache() {
    let doc = "alpha\n\nbeta";
    let (transformer, calls) = MarkingTransformer::new();
    let mut session = TranslationSession::new(
        test_config(),
        Arc::clone(&transformer) as Arc<dyn TextTransformer>,
    )
    .unwrap();

    session.translate(doc, |_| {}, |_, _| {}).await.unwrap();
    let calls_before = calls.load(Ordering::SeqCst);

    let mut changed = session.config().clone();
    changed.target_lang = "ja".to_string();
    session
        .set_config_with_transformer(changed, transformer)
        .unwrap();

    let outcome = session.translate(doc, |_| {}, |_, _| {}).await.unwrap();

    assert!(outcome.total > 0);
    assert!(calls.load(Ordering::SeqCst) > calls_before);
    assert!(session.cache_stats().invalidations >= 1);
}

/// 测试仅调度参数变化时缓存保留
#[tokio::test]
async fn test_scheduling_change_keeps_cache() {
    let doc = "alpha\n\nbeta";
    let (transformer, calls) = MarkingTransformer::new();
    let mut session = TranslationSession::new(test_config(), transformer).unwrap();

    session.translate(doc, |_| {}, |_, _| {}).await.unwrap();
    let calls_before = calls.load(Ordering::SeqCst);

    let mut changed = session.config().clone();
    changed.concurrency = 8;
    changed.batch_size = 2;
    session.set_config(changed).unwrap();

    let outcome = session.translate(doc, |_| {}, |_, _| {}).await.unwrap();

    assert_eq!(outcome.total, 0);
    assert_eq!(calls.load(Ordering::SeqCst), calls_before);
}

// ============================================================================
// 流式输出
// ============================================================================

/// 测试单发任务的流式中间态会以部分文本快照形式发布
#[tokio::test]
async fn test_streaming_partials_are_published() {
    let mut config = test_config();
    config.max_block_chars = 1; // 全部区块走单发路径
    let transformer = Arc::new(StreamingTransformer {
        deltas: vec!["部分".to_string(), "完整".to_string()],
        final_text: "部分完整".to_string(),
    });
    let mut session = TranslationSession::new(config, transformer).unwrap();

    let updates = Arc::new(Mutex::new(Vec::<String>::new()));
    let updates_sink = Arc::clone(&updates);
    let outcome = session
        .translate(
            "streaming text",
            move |snapshot| updates_sink.lock().unwrap().push(snapshot.to_string()),
            |_, _| {},
        )
        .await
        .unwrap();

    assert_eq!(outcome.document, "部分完整");

    let updates = updates.lock().unwrap();
    // 第一个增量立即可见，早于最终结果
    assert!(updates.iter().any(|s| s.as_str() == "部分"));
    assert_eq!(updates.last().map(String::as_str), Some("部分完整"));
}

/// 测试零增量的提供方与流式提供方产出相同的最终文档
#[tokio::test]
async fn test_zero_delta_provider_is_equivalent() {
    let mut config = test_config();
    config.max_block_chars = 1;
    let transformer = Arc::new(StreamingTransformer {
        deltas: Vec::new(),
        final_text: "译文".to_string(),
    });
    let mut session = TranslationSession::new(config, transformer).unwrap();

    let outcome = session.translate("text", |_| {}, |_, _| {}).await.unwrap();
    assert_eq!(outcome.document, "译文");
    assert_eq!(outcome.completed, outcome.total);
}
