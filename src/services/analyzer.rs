//! 分析请求适配器 - 业务能力层
//!
//! 只负责"一个文件 + 凭证 → 分析结果"这一能力，不关心队列和流程。
//! 真正的定价判断由外部模型完成，这里只做请求构造和响应解析。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::config::{Backend, Config};
use crate::error::AnalysisError;
use crate::models::{AnalysisResult, MediaFile};
use crate::services::gemini::GeminiAnalyzer;
use crate::services::openai_compat::OpenAiCompatAnalyzer;

/// 媒体分析能力
///
/// 实现者不重试；任何失败都以 `AnalysisError` 返回
#[async_trait]
pub trait MediaAnalyzer: Send + Sync {
    /// 分析单个文件
    async fn analyze(&self, file: &MediaFile, api_key: &str) -> Result<AnalysisResult, AnalysisError>;

    /// 模型名称（仅用于日志）
    fn model_name(&self) -> &str;
}

/// 根据配置创建分析后端
pub fn build_analyzer(config: &Config) -> Result<Arc<dyn MediaAnalyzer>, AnalysisError> {
    let timeout = Duration::from_secs(config.request_timeout_secs);
    let analyzer: Arc<dyn MediaAnalyzer> = match config.backend {
        Backend::Gemini => Arc::new(GeminiAnalyzer::new(
            config.api_base_url(),
            &config.model_name,
            timeout,
        )?),
        Backend::OpenAi => Arc::new(OpenAiCompatAnalyzer::new(
            config.api_base_url(),
            &config.model_name,
            timeout,
        )),
    };
    Ok(analyzer)
}

/// 校验凭证，空字符串视为缺失
pub(crate) fn require_credential(api_key: &str) -> Result<&str, AnalysisError> {
    let key = api_key.trim();
    if key.is_empty() {
        Err(AnalysisError::MissingCredential)
    } else {
        Ok(key)
    }
}

/// 把模型返回的文本解析为分析结果
///
/// 兼容被 ``` 代码块包裹的 JSON
pub fn parse_analysis_result(text: &str, model: &str) -> Result<AnalysisResult, AnalysisError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AnalysisError::EmptyResponse {
            model: model.to_string(),
        });
    }

    let body = strip_code_fence(trimmed);
    debug!("解析模型响应，长度: {} 字符", body.len());

    serde_json::from_str(body).map_err(|source| AnalysisError::MalformedResponse { source })
}

fn strip_code_fence(text: &str) -> &str {
    let fence = Regex::new(r"(?s)^```(?:json|JSON)?\s*(.*?)\s*```$");
    match fence {
        Ok(re) => re
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or(text),
        Err(_) => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"estimatedDuration":"10s","screenCoverage":"全屏","transitionCount":2,
        "suggestedLevel":4,"suggestedPriceUsd":7,"suggestedDiamonds":70000,"reasoning":"..."}"#;

    #[test]
    fn test_parse_plain_json() {
        let result = parse_analysis_result(BODY, "m").unwrap();
        assert_eq!(result.suggested_diamonds, 70000);
        assert_eq!(result.transition_count, 2);
    }

    #[test]
    fn test_parse_fenced_json() {
        let fenced = format!("```json\n{}\n```", BODY);
        let result = parse_analysis_result(&fenced, "m").unwrap();
        assert_eq!(result.suggested_level, Some(4));
    }

    #[test]
    fn test_empty_response() {
        assert!(matches!(
            parse_analysis_result("  \n", "m"),
            Err(AnalysisError::EmptyResponse { .. })
        ));
    }

    #[test]
    fn test_malformed_response() {
        assert!(matches!(
            parse_analysis_result("价格大约 7 美元", "m"),
            Err(AnalysisError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_analysis_result(r#"{"estimatedDuration":"10s"}"#, "m"),
            Err(AnalysisError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn test_require_credential() {
        assert!(matches!(
            require_credential("   "),
            Err(AnalysisError::MissingCredential)
        ));
        assert_eq!(require_credential(" key ").unwrap(), "key");
    }

    #[test]
    fn test_build_analyzer_follows_backend() {
        let mut config = Config::default();
        assert_eq!(build_analyzer(&config).unwrap().model_name(), "gemini-3-flash-preview");

        config.backend = Backend::OpenAi;
        config.model_name = "gpt-4o".to_string();
        assert_eq!(build_analyzer(&config).unwrap().model_name(), "gpt-4o");
    }
}
