use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::ConfigError;

/// 分析服务后端
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Gemini 原生 generateContent 接口
    Gemini,
    /// 兼容 OpenAI 的 chat completions 接口
    #[serde(alias = "openai-compatible")]
    OpenAi,
}

impl Backend {
    /// 未显式配置地址时使用的默认接口地址
    pub fn default_base_url(self) -> &'static str {
        match self {
            Backend::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Backend::OpenAi => "https://generativelanguage.googleapis.com/v1beta/openai",
        }
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Backend::Gemini),
            "openai" | "openai-compatible" => Ok(Backend::OpenAi),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 模型配置 ---
    /// API 凭证，缺失时批量分析拒绝启动
    pub api_key: Option<String>,
    pub backend: Backend,
    /// 接口地址，未配置时按后端取默认值，见 `Config::api_base_url()`
    pub api_base_url: Option<String>,
    pub model_name: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 允许加入队列的最大文件大小（MB）
    pub max_file_size_mb: u64,
    // --- 日志配置 ---
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            backend: Backend::Gemini,
            api_base_url: None,
            model_name: "gemini-3-flash-preview".to_string(),
            request_timeout_secs: 120,
            max_file_size_mb: 20,
            verbose_logging: false,
            output_log_file: "pricing_log.txt".to_string(),
        }
    }
}

/// TOML 配置文件中的可选字段
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    api_key: Option<String>,
    backend: Option<Backend>,
    api_base_url: Option<String>,
    model_name: Option<String>,
    request_timeout_secs: Option<u64>,
    max_file_size_mb: Option<u64>,
    verbose_logging: Option<bool>,
    output_log_file: Option<String>,
}

impl Config {
    /// 加载配置：默认值 ← 配置文件 ← 环境变量
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = config_file {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::FileParseFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
            config.apply_toml(&content, &path.display().to_string())?;
        }
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// 只从环境变量加载
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    fn apply_toml(&mut self, content: &str, path: &str) -> Result<(), ConfigError> {
        let file: FileConfig = toml::from_str(content).map_err(|e| ConfigError::FileParseFailed {
            path: path.to_string(),
            message: e.to_string(),
        })?;

        if let Some(key) = file.api_key {
            self.api_key = non_empty(key);
        }
        if let Some(backend) = file.backend {
            self.backend = backend;
        }
        if let Some(url) = file.api_base_url {
            self.api_base_url = non_empty(url);
        }
        if let Some(model) = file.model_name {
            self.model_name = model;
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(mb) = file.max_file_size_mb {
            self.max_file_size_mb = mb;
        }
        if let Some(verbose) = file.verbose_logging {
            self.verbose_logging = verbose;
        }
        if let Some(log_file) = file.output_log_file {
            self.output_log_file = log_file;
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = ["GIFT_PRICER_API_KEY", "GEMINI_API_KEY", "API_KEY"]
            .iter()
            .find_map(|name| var(name).and_then(non_empty));
        if key.is_some() {
            self.api_key = key;
        }
        if let Some(backend) = var("GIFT_PRICER_BACKEND") {
            self.backend = backend.parse()?;
        }
        if let Some(url) = var("GIFT_PRICER_API_BASE_URL").and_then(non_empty) {
            self.api_base_url = Some(url);
        }
        if let Some(model) = var("GIFT_PRICER_MODEL") {
            self.model_name = model;
        }
        if let Some(v) = var("GIFT_PRICER_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_env("GIFT_PRICER_TIMEOUT_SECS", v, "u64")?;
        }
        if let Some(v) = var("GIFT_PRICER_MAX_FILE_MB") {
            self.max_file_size_mb = parse_env("GIFT_PRICER_MAX_FILE_MB", v, "u64")?;
        }
        if let Some(v) = var("VERBOSE_LOGGING") {
            self.verbose_logging = parse_env("VERBOSE_LOGGING", v, "bool")?;
        }
        if let Some(log_file) = var("OUTPUT_LOG_FILE") {
            self.output_log_file = log_file;
        }
        Ok(())
    }

    /// 实际使用的接口地址
    pub fn api_base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .unwrap_or_else(|| self.backend.default_base_url())
    }

    /// 当前可用的凭证（空字符串视为未配置）
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn parse_env<T: FromStr>(var_name: &str, value: String, expected_type: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value,
            expected_type: expected_type.to_string(),
        })
}
