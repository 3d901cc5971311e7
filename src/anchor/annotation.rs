//! 标注存储模块
//!
//! 标注是用户锚定在渲染输出上的自由文本备注。创建后不可变，
//! 只能被单独删除或整体清空。持久化由外部协作方负责，
//! 这里只提供序列化形态和进程内的有序集合。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::hash::ContextHash;

/// 一条标注
///
/// `context_hash` 将标注绑定到某个区块的归一化内容；
/// `start_offset`/`end_offset` 是相对该区块渲染后纯文本的字符偏移
/// （不是原始Markdown的偏移）。偏移在创建时刻被信任，之后不做校验：
/// 若当前没有任何区块的内容哈希与 `context_hash` 相等，
/// 标注处于"休眠"状态——不显示，但也不删除（软锚定）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    /// 唯一标识
    pub id: u64,
    /// 被选中的原文片段
    pub text: String,
    /// 用户备注
    pub note: String,
    /// 创建时间
    pub timestamp: DateTime<Utc>,
    /// 所属区块的内容哈希
    pub context_hash: ContextHash,
    /// 区块内起始字符偏移（含）
    pub start_offset: usize,
    /// 区块内结束字符偏移（不含）
    pub end_offset: usize,
    /// 文档级起始偏移（可选，外部渲染方使用）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_start_offset: Option<usize>,
    /// 文档级结束偏移（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_end_offset: Option<usize>,
}

/// 文档会话持有的标注集合（扁平有序）
#[derive(Debug, Default)]
pub struct AnnotationStore {
    items: Vec<Annotation>,
    next_id: u64,
}

impl AnnotationStore {
    /// 创建空集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建并追加一条标注
    ///
    /// 纯构造：不校验偏移是否落在当前内容范围内，
    /// 选择时刻的偏移被认为是正确的。
    pub fn create(
        &mut self,
        text: impl Into<String>,
        note: impl Into<String>,
        context_hash: ContextHash,
        start_offset: usize,
        end_offset: usize,
    ) -> &Annotation {
        self.next_id += 1;
        let annotation = Annotation {
            id: self.next_id,
            text: text.into(),
            note: note.into(),
            timestamp: Utc::now(),
            context_hash,
            start_offset,
            end_offset,
            global_start_offset: None,
            global_end_offset: None,
        };
        self.items.push(annotation);
        self.items.last().expect("刚刚插入的元素")
    }

    /// 按ID删除一条标注，返回是否删除成功
    pub fn remove(&mut self, id: u64) -> bool {
        let before = self.items.len();
        self.items.retain(|a| a.id != id);
        self.items.len() != before
    }

    /// 清空全部标注
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// 全部标注（创建顺序）
    pub fn all(&self) -> &[Annotation] {
        &self.items
    }

    /// 标注数量
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 集合是否为空
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 锚定在指定内容哈希上的标注
    pub fn for_hash(&self, context_hash: ContextHash) -> Vec<&Annotation> {
        self.items
            .iter()
            .filter(|a| a.context_hash == context_hash)
            .collect()
    }

    /// 导出为（原文, 备注, 时间戳）三元组的有序列表
    pub fn export(&self) -> Vec<(String, String, String)> {
        self.items
            .iter()
            .map(|a| (a.text.clone(), a.note.clone(), a.timestamp.to_rfc3339()))
            .collect()
    }

    /// 导出为制表符分隔的文本，每条标注一行
    pub fn export_delimited(&self) -> String {
        self.export()
            .into_iter()
            .map(|(text, note, ts)| format!("{}\t{}\t{}", text, note, ts))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
