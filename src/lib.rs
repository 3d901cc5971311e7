//! # Markflow Library
//!
//! 增量式Markdown翻译引擎：把文档切分为结构区块，按内容缓存避免
//! 重复翻译，在有限并发下批量调度外部转换服务，并把流式结果
//! 逐步合并回文档缓冲区。标注按区块内容哈希锚定，高亮按字符
//! 偏移裁剪。
//!
//! ## 模块组织
//!
//! - `core` - 翻译会话与统计
//! - `segment` - Markdown区块分割
//! - `pipeline` - 任务划分、趟次调度与流式聚合
//! - `storage` - 翻译缓存
//! - `provider` - 文本转换服务契约与实现
//! - `anchor` - 内容哈希、标注与高亮
//! - `render` - 渲染契约（样式映射与哈希属性）
//! - `config` - 配置加载与校验
//! - `error` - 错误类型

pub mod anchor;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod render;
pub mod segment;
pub mod storage;

// Re-export commonly used items for convenience
pub use anchor::annotation::{Annotation, AnnotationStore};
pub use anchor::hash::{content_hash, ContextHash};
pub use anchor::highlight::{compute_highlights, HighlightSpan, TextRun};
pub use config::TranslatorConfig;
pub use core::TranslationSession;
pub use error::{ProviderError, TranslationError, TranslationResult};
pub use pipeline::scheduler::{PassHandle, PassOutcome};
pub use provider::{TextTransformer, TransformRequest};
pub use segment::{segment, Block, BlockKind};
pub use storage::TranslationCache;
