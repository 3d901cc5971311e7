//! 统一错误处理模块
//!
//! 定义翻译流水线各阶段可能出现的错误类型。
//! 设计原则：单个任务的失败不会中断整个翻译趟次（pass），
//! 失败的区块以原文形式保留，进度照常推进。

use thiserror::Error;

/// 翻译错误的统一类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 上游转换服务错误
    #[error("转换服务错误: {0}")]
    Provider(#[from] ProviderError),

    /// 并发调度错误
    #[error("并发调度错误: {0}")]
    Concurrency(String),

    /// 趟次已被取消
    #[error("翻译趟次已取消")]
    Cancelled,

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),
}

/// 文本转换服务（翻译后端）错误
///
/// 对应外部转换契约的失败分类：网络、鉴权、模型不存在、响应格式异常。
/// 所有变体都携带人类可读的描述信息。
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// 网络错误
    #[error("网络错误: {0}")]
    Network(String),

    /// 鉴权失败
    #[error("鉴权失败: {0}")]
    Auth(String),

    /// 模型或接口不存在
    #[error("模型不存在: {0}")]
    ModelNotFound(String),

    /// 响应格式异常
    #[error("响应格式异常: {0}")]
    Malformed(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Provider(e) => e.is_retryable(),
            TranslationError::Concurrency(_) => true,
            TranslationError::Config(_) => false,
            TranslationError::Cancelled => false,
            TranslationError::Internal(_) => false,
        }
    }
}

impl ProviderError {
    /// 检查错误是否可重试
    ///
    /// 网络类错误通常是瞬时的；鉴权和模型错误重试没有意义。
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Network(_))
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_status() {
            match error.status().map(|s| s.as_u16()) {
                Some(401) | Some(403) => ProviderError::Auth(error.to_string()),
                Some(404) => ProviderError::ModelNotFound(error.to_string()),
                _ => ProviderError::Network(error.to_string()),
            }
        } else if error.is_decode() {
            ProviderError::Malformed(error.to_string())
        } else {
            ProviderError::Network(error.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(error: serde_json::Error) -> Self {
        ProviderError::Malformed(format!("JSON解析失败: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::Config(format!("TOML解析错误: {}", error))
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::Internal(format!("IO错误: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;
