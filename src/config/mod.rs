//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持配置文件、环境变量和默认值。
//!
//! 配置标识（[`TranslatorConfig::fingerprint`]）用于缓存失效判定：
//! 任何影响翻译结果的字段（服务端点、密钥、模型、目标语言）发生变化时，
//! 会话必须在调度新任务之前同步清空翻译缓存。

use serde::{Deserialize, Serialize};

use crate::error::{TranslationError, TranslationResult};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 调度相关
    pub const DEFAULT_CONCURRENCY: usize = 3;
    pub const DEFAULT_BATCH_SIZE: usize = 10;
    pub const DEFAULT_MAX_BLOCK_CHARS: usize = 1000;

    // 流式输出相关
    pub const DEFAULT_STREAM_INTERVAL: Duration = Duration::from_millis(100);

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "http://localhost:1188/translate";
    pub const DEFAULT_PROVIDER: &str = "deeplx";
    pub const DEFAULT_SOURCE_LANG: &str = "auto";
    pub const DEFAULT_TARGET_LANG: &str = "zh";

    // 批次拼接用的私有分隔符，必须足够独特以避免与正文冲突
    pub const BATCH_DELIMITER: &str = "\n@@XLAT-SEG@@\n";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "markflow.toml",
        ".markflow.toml",
        "~/.config/markflow/config.toml",
    ];

    // 环境变量前缀
    pub const ENV_API_URL: &str = "MARKFLOW_API_URL";
    pub const ENV_API_KEY: &str = "MARKFLOW_API_KEY";
    pub const ENV_TARGET_LANG: &str = "MARKFLOW_TARGET_LANG";
}

/// 翻译器配置
///
/// 核心消费的配置面，见趟次调度与缓存失效约束。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslatorConfig {
    /// 转换服务提供方标识
    pub provider: String,
    /// 转换服务端点
    pub api_url: String,
    /// API密钥（可选，取决于提供方）
    pub api_key: Option<String>,
    /// 模型名称（可选，生成式后端使用）
    pub model: Option<String>,
    /// 源语言代码
    pub source_lang: String,
    /// 目标语言代码
    pub target_lang: String,
    /// 最大并发任务数（>= 1）
    pub concurrency: usize,
    /// 单个批次的最大条目数（>= 1）
    pub batch_size: usize,
    /// 区块进入批次的长度上限（字符数），超出即单发处理
    pub max_block_chars: usize,
    /// 流式快照发布的最小间隔（毫秒）
    pub stream_interval_ms: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            provider: constants::DEFAULT_PROVIDER.to_string(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            api_key: None,
            model: None,
            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),
            concurrency: constants::DEFAULT_CONCURRENCY,
            batch_size: constants::DEFAULT_BATCH_SIZE,
            max_block_chars: constants::DEFAULT_MAX_BLOCK_CHARS,
            stream_interval_ms: constants::DEFAULT_STREAM_INTERVAL.as_millis() as u64,
        }
    }
}

impl TranslatorConfig {
    /// 使用指定目标语言创建默认配置
    pub fn default_with_lang(target_lang: &str, api_url: Option<&str>) -> Self {
        let mut config = Self::default();
        config.target_lang = target_lang.to_string();
        if let Some(url) = api_url {
            config.api_url = url.to_string();
        }
        config
    }

    /// 从TOML文本解析配置
    pub fn from_toml(text: &str) -> TranslationResult<Self> {
        let mut config: TranslatorConfig = toml::from_str(text)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 从标准搜索路径加载配置，找不到时回退到默认值
    pub fn load() -> Self {
        for path in constants::CONFIG_PATHS {
            if let Ok(text) = std::fs::read_to_string(path) {
                match Self::from_toml(&text) {
                    Ok(config) => {
                        tracing::info!("已加载配置文件: {}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("配置文件 {} 解析失败，跳过: {}", path, e);
                    }
                }
            }
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// 应用环境变量覆盖
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(constants::ENV_API_URL) {
            self.api_url = url;
        }
        if let Ok(key) = std::env::var(constants::ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Ok(lang) = std::env::var(constants::ENV_TARGET_LANG) {
            self.target_lang = lang;
        }
    }

    /// 校验配置合法性
    pub fn validate(&self) -> TranslationResult<()> {
        if self.concurrency < 1 {
            return Err(TranslationError::Config(
                "concurrency 必须 >= 1".to_string(),
            ));
        }
        if self.batch_size < 1 {
            return Err(TranslationError::Config(
                "batch_size 必须 >= 1".to_string(),
            ));
        }
        if self.max_block_chars < 1 {
            return Err(TranslationError::Config(
                "max_block_chars 必须 >= 1".to_string(),
            ));
        }
        if self.api_url.is_empty() {
            return Err(TranslationError::Config("api_url 不能为空".to_string()));
        }
        Ok(())
    }

    /// 计算配置标识
    ///
    /// 只包含影响翻译结果的字段。两份配置的标识不同时，
    /// 旧缓存中的译文不再可信，必须整体清空。
    pub fn fingerprint(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}",
            self.provider,
            self.api_url,
            self.api_key.as_deref().unwrap_or(""),
            self.model.as_deref().unwrap_or(""),
            self.source_lang,
            self.target_lang,
        )
    }

    /// 流式快照发布间隔
    pub fn stream_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.stream_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TranslatorConfig::default();
        assert_eq!(config.concurrency, 3);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_block_chars, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = TranslatorConfig::from_toml(
            r#"
            target_lang = "ja"
            concurrency = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.target_lang, "ja");
        assert_eq!(config.concurrency, 5);
        // 未指定的字段取默认值
        assert_eq!(config.batch_size, 10);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = TranslatorConfig::default();
        config.concurrency = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_fingerprint_tracks_provider_fields() {
        let base = TranslatorConfig::default();

        let mut changed = base.clone();
        changed.target_lang = "ja".to_string();
        assert_ne!(base.fingerprint(), changed.fingerprint());

        let mut changed = base.clone();
        changed.api_key = Some("secret".to_string());
        assert_ne!(base.fingerprint(), changed.fingerprint());

        // 调度参数不影响译文，不参与标识
        let mut changed = base.clone();
        changed.concurrency = 8;
        changed.batch_size = 2;
        assert_eq!(base.fingerprint(), changed.fingerprint());
    }
}
