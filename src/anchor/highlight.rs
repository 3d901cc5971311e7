//! 高亮计算模块
//!
//! 给定一个区块的渲染纯文本与锚定在它上面的标注集合，
//! 计算确定性的高亮子区间：重叠的标注按起始偏移排序后依次裁剪到
//! 尚未被占用的剩余文本上，保证输出区间两两不相交、
//! 且并集等于所有匹配标注区间裁剪到区块边界后的并集。
//!
//! 所有偏移都是**字符**偏移（非字节），相对整个区块拍平后的纯文本。

use super::annotation::Annotation;
use super::hash::ContextHash;

// ============================================================================
// 区间计算
// ============================================================================

/// 一个不相交的高亮区间（字符偏移，左闭右开）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightSpan {
    pub start: usize,
    pub end: usize,
    pub annotation_id: u64,
}

/// 文本片段：高亮的（携带标注ID）或普通的
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String,
    pub annotation_id: Option<u64>,
}

/// 计算区块的高亮区间集合
///
/// 只选取 `context_hash` 匹配的标注；按起始偏移（平偏移时按ID）排序后
/// 从左到右扫描：每条标注的显示区间是其声明区间与"尚未被更早标注
/// 占用的部分"的交集，并裁剪到区块边界内。被完全覆盖的标注产生空区间，
/// 不会出现在结果中。
pub fn compute_highlights(
    plain_text: &str,
    context_hash: ContextHash,
    annotations: &[Annotation],
) -> Vec<HighlightSpan> {
    let len = plain_text.chars().count();

    let mut matching: Vec<&Annotation> = annotations
        .iter()
        .filter(|a| a.context_hash == context_hash)
        .collect();
    matching.sort_by_key(|a| (a.start_offset, a.id));

    let mut spans = Vec::new();
    let mut cursor = 0usize;
    for ann in matching {
        let start = ann.start_offset.max(cursor).min(len);
        let end = ann.end_offset.min(len);
        if start < end {
            spans.push(HighlightSpan {
                start,
                end,
                annotation_id: ann.id,
            });
            cursor = end;
        }
    }
    spans
}

/// 将区块纯文本按高亮区间切分为连续片段序列
///
/// 未落入任何区间的部分作为普通片段输出；片段拼接后等于原文本。
pub fn split_runs(plain_text: &str, spans: &[HighlightSpan]) -> Vec<TextRun> {
    runs_for_range(plain_text, 0, spans)
}

/// 对位于绝对偏移 `base` 处的一段文本计算片段切分
fn runs_for_range(text: &str, base: usize, spans: &[HighlightSpan]) -> Vec<TextRun> {
    let mut runs: Vec<TextRun> = Vec::new();
    for (i, ch) in text.chars().enumerate() {
        let pos = base + i;
        let id = spans
            .iter()
            .find(|sp| sp.start <= pos && pos < sp.end)
            .map(|sp| sp.annotation_id);
        match runs.last_mut() {
            Some(run) if run.annotation_id == id => run.text.push(ch),
            _ => runs.push(TextRun {
                text: ch.to_string(),
                annotation_id: id,
            }),
        }
    }
    runs
}

// ============================================================================
// 内联结构树遍历
// ============================================================================

/// 区块渲染后的内联结构树节点（渲染协作方产出）
///
/// 偏移定义在整个区块拍平后的纯文本上，而非各子树内部，
/// 因此遍历必须跨整棵树维护同一个累计偏移。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineNode {
    /// 纯文本叶子
    Text(String),
    /// 斜体
    Emphasis(Vec<InlineNode>),
    /// 加粗
    Strong(Vec<InlineNode>),
    /// 链接
    Link {
        dest: String,
        children: Vec<InlineNode>,
    },
    /// 行内代码。对高亮而言是不透明叶子：内部文本参与偏移计数，
    /// 但不会被切分，其自身的语法着色由独立的局部渲染负责。
    CodeSpan(String),
    /// 图片。不贡献纯文本字符。
    Image { dest: String, alt: String },
}

/// 应用高亮后的内联节点
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedInline {
    Run(TextRun),
    Emphasis(Vec<RenderedInline>),
    Strong(Vec<RenderedInline>),
    Link {
        dest: String,
        children: Vec<RenderedInline>,
    },
    CodeSpan {
        text: String,
        annotation_id: Option<u64>,
    },
    Image {
        dest: String,
        alt: String,
    },
}

/// 拍平内联树为区块纯文本（偏移的参照系）
pub fn flatten_plain_text(nodes: &[InlineNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            InlineNode::Text(s) => out.push_str(s),
            InlineNode::Emphasis(children)
            | InlineNode::Strong(children)
            | InlineNode::Link { children, .. } => out.push_str(&flatten_plain_text(children)),
            InlineNode::CodeSpan(s) => out.push_str(s),
            InlineNode::Image { .. } => {}
        }
    }
    out
}

/// 对整棵内联树应用高亮区间
///
/// 显式深度优先遍历，偏移以累加器参数/返回值的形式显式穿线，
/// 返回 `(渲染节点, 消耗的字符数)`，保持遍历的引用透明性。
pub fn highlight_inline_tree(
    nodes: &[InlineNode],
    spans: &[HighlightSpan],
) -> Vec<RenderedInline> {
    walk(nodes, 0, spans).0
}

fn walk(
    nodes: &[InlineNode],
    offset: usize,
    spans: &[HighlightSpan],
) -> (Vec<RenderedInline>, usize) {
    let mut rendered = Vec::with_capacity(nodes.len());
    let mut consumed = 0usize;

    for node in nodes {
        let base = offset + consumed;
        match node {
            InlineNode::Text(s) => {
                let runs = runs_for_range(s, base, spans);
                consumed += s.chars().count();
                rendered.extend(runs.into_iter().map(RenderedInline::Run));
            }
            InlineNode::Emphasis(children) => {
                let (inner, n) = walk(children, base, spans);
                consumed += n;
                rendered.push(RenderedInline::Emphasis(inner));
            }
            InlineNode::Strong(children) => {
                let (inner, n) = walk(children, base, spans);
                consumed += n;
                rendered.push(RenderedInline::Strong(inner));
            }
            InlineNode::Link { dest, children } => {
                let (inner, n) = walk(children, base, spans);
                consumed += n;
                rendered.push(RenderedInline::Link {
                    dest: dest.clone(),
                    children: inner,
                });
            }
            InlineNode::CodeSpan(s) => {
                // 不透明叶子：计入偏移，整体标记，不做内部切分
                let len = s.chars().count();
                let id = spans
                    .iter()
                    .find(|sp| sp.start < base + len.max(1) && base < sp.end)
                    .map(|sp| sp.annotation_id);
                consumed += len;
                rendered.push(RenderedInline::CodeSpan {
                    text: s.clone(),
                    annotation_id: id,
                });
            }
            InlineNode::Image { dest, alt } => {
                rendered.push(RenderedInline::Image {
                    dest: dest.clone(),
                    alt: alt.clone(),
                });
            }
        }
    }

    (rendered, consumed)
}
