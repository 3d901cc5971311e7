//! 文本转换服务契约
//!
//! 核心只消费一个抽象的流式文本转换接口：给定系统指令与输入文本，
//! 可选地通过增量通道推送部分结果，最终返回完整文本。
//! 不支持流式的提供方推送零次增量后直接返回完整结果即可，
//! 核心在两种情况下都必须正确工作。

use futures::future::BoxFuture;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::ProviderError;

pub mod deeplx;

pub use deeplx::DeepLxTransformer;

/// 增量推送通道的发送端
pub type DeltaSender = UnboundedSender<String>;

/// 一次转换请求
#[derive(Debug)]
pub struct TransformRequest {
    /// 系统指令（翻译要求、目标语言等）
    pub system: String,
    /// 待转换的输入文本
    pub input: String,
    /// 增量推送通道；`None` 表示调用方不关心流式输出
    pub deltas: Option<DeltaSender>,
}

impl TransformRequest {
    /// 构造非流式请求
    pub fn new(system: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            input: input.into(),
            deltas: None,
        }
    }

    /// 附加增量推送通道
    pub fn with_deltas(mut self, deltas: DeltaSender) -> Self {
        self.deltas = Some(deltas);
        self
    }
}

/// 文本转换服务契约
///
/// 实现方负责一次完整的远程转换调用；失败时返回携带人类可读信息的
/// [`ProviderError`]（网络、鉴权、模型不存在、响应异常）。
pub trait TextTransformer: Send + Sync {
    /// 执行一次转换，返回最终完整文本
    ///
    /// 若请求携带增量通道，实现可以在返回之前推送任意次部分文本；
    /// 通道关闭或接收端丢弃不应视为错误。
    fn transform(
        &self,
        request: TransformRequest,
    ) -> BoxFuture<'static, Result<String, ProviderError>>;
}
