//! Gemini 原生接口
//!
//! `POST {base}/models/{model}:generateContent`，媒体以 base64 内联发送，
//! 通过 `responseSchema` 要求模型返回结构化 JSON。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::models::{AnalysisResult, MediaFile};
use crate::services::analyzer::{parse_analysis_result, require_credential, MediaAnalyzer};
use crate::services::encoding::encode_media;
use crate::services::prompt::{response_schema, SYSTEM_PROMPT, TASK_PROMPT};
use crate::utils::logging::truncate_text;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// 第一个候选的全部文本
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Gemini 分析后端
pub struct GeminiAnalyzer {
    http: Client,
    api_base_url: String,
    model_name: String,
}

impl GeminiAnalyzer {
    /// 创建后端；HTTP 客户端构建失败时返回错误，不会退回到无超时的默认客户端
    pub fn new(api_base_url: &str, model_name: &str, timeout: Duration) -> Result<Self, AnalysisError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnalysisError::RequestBuild(format!("HTTP 客户端创建失败: {}", e)))?;

        Ok(Self {
            http,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base_url, self.model_name)
    }

    fn build_request<'a>(&self, file: &'a MediaFile) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: Some(SYSTEM_PROMPT),
                    inline_data: None,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: file.mime_type(),
                            data: encode_media(file.bytes()),
                        }),
                    },
                    Part {
                        text: Some(TASK_PROMPT),
                        inline_data: None,
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        }
    }
}

#[async_trait]
impl MediaAnalyzer for GeminiAnalyzer {
    async fn analyze(&self, file: &MediaFile, api_key: &str) -> Result<AnalysisResult, AnalysisError> {
        let key = require_credential(api_key)?;

        debug!(
            "调用 Gemini，模型: {}，文件: {} ({}, {} 字节)",
            self.model_name,
            file.name(),
            file.mime_type(),
            file.size()
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&self.build_request(file))
            .send()
            .await
            .map_err(|e| {
                warn!("Gemini 请求失败: {}", e);
                AnalysisError::transport(&self.model_name, e)
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AnalysisError::transport(&self.model_name, e))?;

        if !status.is_success() {
            warn!("Gemini 返回错误状态 {}: {}", status, truncate_text(&body, 200));
            return Err(AnalysisError::transport(
                &self.model_name,
                format!("HTTP {}: {}", status, truncate_text(&body, 200)),
            ));
        }

        let payload: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|source| AnalysisError::MalformedResponse { source })?;

        debug!("Gemini 调用成功");
        parse_analysis_result(&payload.text(), &self.model_name)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
