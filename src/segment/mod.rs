//! 区块分割模块
//!
//! 将原始Markdown文档分割为有序的类型化区块序列（文本、代码、标题、空行）。
//! 分割是纯函数：相同输入永远产生相同的区块序列，不做任何I/O。
//!
//! 无损不变量：所有区块的 `raw` 按 `\n` 拼接后与原文档逐字节一致。
//! 调度器、缓存与标注锚定都依赖这一点。

// ============================================================================
// 核心类型
// ============================================================================

/// 区块类型（封闭和类型，新增类型时编译器强制各处穷尽匹配）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// 普通文本段落
    Text,
    /// 围栏代码块
    Code,
    /// 标题行
    Heading,
    /// 空行分隔符
    Separator,
}

/// 文档区块
///
/// 每次分割都会产生全新的区块；跨趟次的同一性只由内容决定，
/// 区块本身没有持久身份。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// 区块类型
    pub kind: BlockKind,
    /// 可翻译内容（不含标题井号、代码围栏等标记）
    pub content: String,
    /// 标题标记前缀（含尾随空格），仅 Heading 有值
    pub header_prefix: Option<String>,
    /// 代码语言标签，仅 Code 可能有值
    pub code_language: Option<String>,
    /// 原始子串（含全部标记），未修改时逐字重现
    pub raw: String,
}

impl Block {
    /// 区块内容是否应参与翻译
    ///
    /// 分隔符永不翻译；空内容的区块没有可译文本。
    pub fn is_translatable(&self) -> bool {
        match self.kind {
            BlockKind::Separator => false,
            BlockKind::Text | BlockKind::Heading | BlockKind::Code => {
                !self.content.trim().is_empty()
            }
        }
    }

    /// 内容的字符数（用于批次阈值判断）
    pub fn content_chars(&self) -> usize {
        self.content.chars().count()
    }
}

// ============================================================================
// 分割实现
// ============================================================================

/// 进行中的围栏代码块状态
struct FenceState<'a> {
    open_line: &'a str,
    language: Option<String>,
    body: Vec<&'a str>,
}

/// 将文档分割为有序区块序列
///
/// 单次前向逐行扫描，不做超出当前行的前瞻：
///
/// 1. 围栏外遇到 ```` ``` ```` 开启代码块，围栏边界不再匹配标题等模式；
/// 2. 围栏外的标题行结束当前文本累积，井号前缀与内容分开存放；
/// 3. 围栏外的空白行产生显式 Separator 区块；
/// 4. 其余行累积为文本，在任一边界或输入结束时冲刷为 Text 区块。
///
/// 边界情况：文档末尾未闭合的围栏视为代码直到文档结束，不自动补闭合。
pub fn segment(document: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut text_lines: Vec<&str> = Vec::new();
    let mut fence: Option<FenceState> = None;

    for line in document.split('\n') {
        // 围栏内：只识别闭合行，其余全部进入代码体
        if let Some(mut state) = fence.take() {
            if is_fence_line(line) {
                blocks.push(close_code_block(state, Some(line)));
            } else {
                state.body.push(line);
                fence = Some(state);
            }
            continue;
        }

        if is_fence_line(line) {
            flush_text(&mut blocks, &mut text_lines);
            fence = Some(FenceState {
                open_line: line,
                language: fence_language(line),
                body: Vec::new(),
            });
            continue;
        }

        if line.trim().is_empty() {
            flush_text(&mut blocks, &mut text_lines);
            blocks.push(Block {
                kind: BlockKind::Separator,
                content: String::new(),
                header_prefix: None,
                code_language: None,
                raw: line.to_string(),
            });
            continue;
        }

        if let Some((prefix, content)) = split_heading(line) {
            flush_text(&mut blocks, &mut text_lines);
            blocks.push(Block {
                kind: BlockKind::Heading,
                content: content.to_string(),
                header_prefix: Some(prefix.to_string()),
                code_language: None,
                raw: line.to_string(),
            });
            continue;
        }

        text_lines.push(line);
    }

    flush_text(&mut blocks, &mut text_lines);

    // 未闭合围栏：容忍，不算错误
    if let Some(state) = fence.take() {
        blocks.push(close_code_block(state, None));
    }

    blocks
}

/// 将区块序列重组为文档文本（无损不变量的另一半）
pub fn join_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|b| b.raw.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn flush_text(blocks: &mut Vec<Block>, text_lines: &mut Vec<&str>) {
    if text_lines.is_empty() {
        return;
    }
    let raw = text_lines.join("\n");
    text_lines.clear();
    blocks.push(Block {
        kind: BlockKind::Text,
        content: raw.clone(),
        header_prefix: None,
        code_language: None,
        raw,
    });
}

fn close_code_block(state: FenceState, close_line: Option<&str>) -> Block {
    let content = state.body.join("\n");
    let mut raw_lines: Vec<&str> = Vec::with_capacity(state.body.len() + 2);
    raw_lines.push(state.open_line);
    raw_lines.extend(&state.body);
    if let Some(close) = close_line {
        raw_lines.push(close);
    }
    Block {
        kind: BlockKind::Code,
        content,
        header_prefix: None,
        code_language: state.language,
        raw: raw_lines.join("\n"),
    }
}

fn is_fence_line(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

fn fence_language(line: &str) -> Option<String> {
    let tag = line.trim_start().trim_start_matches('`').trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_string())
    }
}

/// 拆分标题行为（前缀, 内容）
///
/// 前缀为1~6个井号加一个空格；不满足模式的行按普通文本处理。
fn split_heading(line: &str) -> Option<(&str, &str)> {
    let hashes = line.chars().take_while(|&c| c == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    Some((&line[..hashes + 1], &line[hashes + 1..]))
}
