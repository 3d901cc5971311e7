//! DeepLX 翻译服务提供方
//!
//! 对接 DeepLX 风格的HTTP翻译端点（默认 `http://localhost:1188/translate`）。
//! 该接口不支持增量输出，属于"推送零次增量"的非流式提供方。

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::TranslatorConfig;
use crate::error::ProviderError;

use super::{TextTransformer, TransformRequest};

/// DeepLX HTTP 提供方
#[derive(Debug, Clone)]
pub struct DeepLxTransformer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    source_lang: String,
    target_lang: String,
}

#[derive(Serialize)]
struct DeepLxRequest<'a> {
    text: &'a str,
    source_lang: &'a str,
    target_lang: &'a str,
}

#[derive(Deserialize)]
struct DeepLxResponse {
    code: i64,
    #[serde(default)]
    data: Option<String>,
}

impl DeepLxTransformer {
    /// 从翻译配置创建提供方
    pub fn from_config(config: &TranslatorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
        }
    }

    async fn call(
        client: reqwest::Client,
        api_url: String,
        api_key: Option<String>,
        source_lang: String,
        target_lang: String,
        input: String,
    ) -> Result<String, ProviderError> {
        let mut request = client.post(&api_url).json(&DeepLxRequest {
            text: &input,
            source_lang: &source_lang,
            target_lang: &target_lang,
        });
        if let Some(key) = &api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(ProviderError::from)?;
        let status = response.status();
        match status.as_u16() {
            401 | 403 => {
                return Err(ProviderError::Auth(format!(
                    "翻译端点拒绝访问: HTTP {}",
                    status
                )))
            }
            404 => {
                return Err(ProviderError::ModelNotFound(format!(
                    "翻译端点不存在: {}",
                    api_url
                )))
            }
            code if code >= 400 => {
                return Err(ProviderError::Network(format!(
                    "翻译端点返回错误: HTTP {}",
                    status
                )))
            }
            _ => {}
        }

        let body: DeepLxResponse = response.json().await.map_err(ProviderError::from)?;
        if body.code != 200 {
            return Err(ProviderError::Malformed(format!(
                "翻译端点返回异常状态码: {}",
                body.code
            )));
        }
        body.data
            .filter(|data| !data.is_empty())
            .ok_or_else(|| ProviderError::Malformed("响应缺少 data 字段".to_string()))
    }
}

impl TextTransformer for DeepLxTransformer {
    fn transform(
        &self,
        request: TransformRequest,
    ) -> BoxFuture<'static, Result<String, ProviderError>> {
        // DeepLX 无流式能力：忽略增量通道，直接返回完整结果
        let client = self.client.clone();
        let api_url = self.api_url.clone();
        let api_key = self.api_key.clone();
        let source_lang = self.source_lang.clone();
        let target_lang = self.target_lang.clone();

        Box::pin(Self::call(
            client,
            api_url,
            api_key,
            source_lang,
            target_lang,
            request.input,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_carries_endpoint_and_langs() {
        let config = TranslatorConfig::default_with_lang("ja", Some("http://example.test/t"));
        let provider = DeepLxTransformer::from_config(&config);
        assert_eq!(provider.api_url, "http://example.test/t");
        assert_eq!(provider.target_lang, "ja");
        assert_eq!(provider.source_lang, "auto");
    }
}
