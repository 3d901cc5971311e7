//! 标注锚定模块
//!
//! 将用户的文本选择映射为位置无关的身份：所在区块的内容哈希
//! 加上区块内字符偏移。文档被编辑、重译或重渲染后，
//! 标注依然能够附着到内容相同的区块上。
//!
//! - [`hash`]: 内容归一化与32位内容哈希
//! - [`annotation`]: 标注的创建、存储与导出
//! - [`highlight`]: 高亮区间计算与内联树遍历

pub mod annotation;
pub mod hash;
pub mod highlight;

pub use annotation::{Annotation, AnnotationStore};
pub use hash::{content_hash, normalize_content, ContextHash};
pub use highlight::{
    compute_highlights, highlight_inline_tree, split_runs, HighlightSpan, InlineNode,
    RenderedInline, TextRun,
};
