//! 渲染契约模块
//!
//! 核心不负责Markdown到可视树的转换（外部协作方），只暴露两样东西：
//! 区块种类到样式描述符的映射表，以及每个渲染区块元素上稳定的
//! 内容哈希属性——标注层靠它在活动输出中定位区块。

use serde::{Deserialize, Serialize};

use crate::anchor::hash::{context_hash_attr, ContextHash};

/// 渲染协作方识别的区块/内联标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockTag {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Paragraph,
    Blockquote,
    ListItem,
    Code,
    Link,
    Image,
    Rule,
    Bold,
}

/// 样式描述符
///
/// 纯数据，渲染方自行解释；字段设计对应常见的文本样式轴。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockStyle {
    /// 相对正文的字号倍率
    pub font_scale: f32,
    /// 是否加粗
    pub bold: bool,
    /// 是否等宽
    pub monospace: bool,
    /// 是否斜体
    pub italic: bool,
    /// 垂直外边距（以行高为单位）
    pub margin: f32,
}

/// 区块标签到样式描述符的映射
pub fn style_for(tag: BlockTag) -> BlockStyle {
    match tag {
        BlockTag::Heading1 => BlockStyle {
            font_scale: 2.0,
            bold: true,
            monospace: false,
            italic: false,
            margin: 1.0,
        },
        BlockTag::Heading2 => BlockStyle {
            font_scale: 1.6,
            bold: true,
            monospace: false,
            italic: false,
            margin: 0.9,
        },
        BlockTag::Heading3 => BlockStyle {
            font_scale: 1.3,
            bold: true,
            monospace: false,
            italic: false,
            margin: 0.8,
        },
        BlockTag::Heading4 => BlockStyle {
            font_scale: 1.1,
            bold: true,
            monospace: false,
            italic: false,
            margin: 0.7,
        },
        BlockTag::Paragraph => BlockStyle {
            font_scale: 1.0,
            bold: false,
            monospace: false,
            italic: false,
            margin: 0.5,
        },
        BlockTag::Blockquote => BlockStyle {
            font_scale: 1.0,
            bold: false,
            monospace: false,
            italic: true,
            margin: 0.5,
        },
        BlockTag::ListItem => BlockStyle {
            font_scale: 1.0,
            bold: false,
            monospace: false,
            italic: false,
            margin: 0.2,
        },
        BlockTag::Code => BlockStyle {
            font_scale: 0.9,
            bold: false,
            monospace: true,
            italic: false,
            margin: 0.6,
        },
        BlockTag::Link => BlockStyle {
            font_scale: 1.0,
            bold: false,
            monospace: false,
            italic: false,
            margin: 0.0,
        },
        BlockTag::Image => BlockStyle {
            font_scale: 1.0,
            bold: false,
            monospace: false,
            italic: false,
            margin: 0.5,
        },
        BlockTag::Rule => BlockStyle {
            font_scale: 1.0,
            bold: false,
            monospace: false,
            italic: false,
            margin: 1.0,
        },
        BlockTag::Bold => BlockStyle {
            font_scale: 1.0,
            bold: true,
            monospace: false,
            italic: false,
            margin: 0.0,
        },
    }
}

/// 渲染区块元素携带的内容哈希属性 `(名称, 值)`
///
/// 标注层用该属性把用户选区定位回区块身份。
pub fn context_attr(hash: ContextHash) -> (&'static str, String) {
    ("data-context-hash", context_hash_attr(hash))
}
