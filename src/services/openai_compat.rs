//! 兼容 OpenAI 的分析后端
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型（Azure, Gemini 代理, Doubao 等）
//! - 媒体以 data URL 形式放入用户消息，输出结构写在提示词里

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
        ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
        ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ImageDetail, ImageUrl,
    },
    Client,
};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::AnalysisError;
use crate::models::{AnalysisResult, MediaFile};
use crate::services::analyzer::{parse_analysis_result, require_credential, MediaAnalyzer};
use crate::services::encoding::data_url;
use crate::services::prompt::{task_prompt_with_schema, SYSTEM_PROMPT};

/// OpenAI 兼容分析后端
///
/// 凭证在每次调用时传入，因此客户端按调用创建
pub struct OpenAiCompatAnalyzer {
    api_base_url: String,
    model_name: String,
    /// 单次请求的总时长上限
    timeout: Duration,
}

impl OpenAiCompatAnalyzer {
    pub fn new(api_base_url: &str, model_name: &str, timeout: Duration) -> Self {
        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            model_name: model_name.to_string(),
            timeout,
        }
    }

    fn build_request(&self, file: &MediaFile) -> Result<CreateChatCompletionRequest, AnalysisError> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(SYSTEM_PROMPT)
            .build()
            .map_err(|e| AnalysisError::RequestBuild(e.to_string()))?;

        let content_parts = vec![
            ChatCompletionRequestUserMessageContentPart::ImageUrl(
                ChatCompletionRequestMessageContentPartImage {
                    image_url: ImageUrl {
                        url: data_url(file.mime_type(), file.bytes()),
                        detail: Some(ImageDetail::Auto),
                    },
                },
            ),
            ChatCompletionRequestUserMessageContentPart::Text(
                ChatCompletionRequestMessageContentPartText {
                    text: task_prompt_with_schema(),
                },
            ),
        ];

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(ChatCompletionRequestUserMessageContent::Array(content_parts))
            .build()
            .map_err(|e| AnalysisError::RequestBuild(e.to_string()))?;

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .temperature(0.2)
            .build()
            .map_err(|e| AnalysisError::RequestBuild(e.to_string()))
    }
}

#[async_trait]
impl MediaAnalyzer for OpenAiCompatAnalyzer {
    async fn analyze(&self, file: &MediaFile, api_key: &str) -> Result<AnalysisResult, AnalysisError> {
        let key = require_credential(api_key)?;

        debug!(
            "调用 OpenAI 兼容接口，模型: {}，文件: {} ({})",
            self.model_name,
            file.name(),
            file.mime_type()
        );

        let openai_config = OpenAIConfig::new()
            .with_api_key(key)
            .with_api_base(&self.api_base_url);
        let client = Client::with_config(openai_config);

        let request = self.build_request(file)?;

        let response = tokio::time::timeout(self.timeout, client.chat().create(request))
            .await
            .map_err(|_| {
                warn!("LLM API 调用超时 ({}s)", self.timeout.as_secs());
                AnalysisError::transport(
                    &self.model_name,
                    format!("请求超时 ({}s)", self.timeout.as_secs()),
                )
            })?
            .map_err(|e| {
                warn!("LLM API 调用失败: {}", e);
                AnalysisError::transport(&self.model_name, e)
            })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| AnalysisError::EmptyResponse {
                model: self.model_name.clone(),
            })?;

        parse_analysis_result(&content, &self.model_name)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> OpenAiCompatAnalyzer {
        OpenAiCompatAnalyzer::new("http://localhost:8080/v1/", "doubao-seed-1.6", Duration::from_secs(120))
    }

    #[test]
    fn test_request_carries_media_and_schema() {
        let file = MediaFile::new("heart.png", "image/png", b"png".to_vec());
        let request = analyzer().build_request(&file).unwrap();
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "doubao-seed-1.6");
        assert_eq!(body["messages"][0]["role"], "system");
        let parts = &body["messages"][1]["content"];
        assert_eq!(parts[0]["image_url"]["url"], "data:image/png;base64,cG5n");
        assert!(parts[1]["text"].as_str().unwrap().contains("suggestedPriceUsd"));
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let file = MediaFile::new("heart.png", "image/png", b"png".to_vec());
        let err = analyzer().analyze(&file, " ").await.unwrap_err();
        assert!(matches!(err, AnalysisError::MissingCredential));
    }

    #[tokio::test]
    async fn test_stalled_server_hits_timeout() {
        // 只接受连接、从不回复的服务端
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let analyzer = OpenAiCompatAnalyzer::new(
            &format!("http://{}/v1", addr),
            "doubao-seed-1.6",
            Duration::from_secs(1),
        );
        let file = MediaFile::new("heart.png", "image/png", b"png".to_vec());

        let outcome = tokio::time::timeout(Duration::from_secs(10), analyzer.analyze(&file, "key")).await;
        let err = outcome.expect("analyze should give up on its own").unwrap_err();
        assert!(matches!(err, AnalysisError::Transport { .. }));
        server.abort();
    }
}
