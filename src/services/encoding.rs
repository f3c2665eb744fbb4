//! 媒体内容编码
//!
//! 请求中的内联媒体使用标准 base64（带填充），编码无损

use base64::{engine::general_purpose, Engine as _};

/// 把二进制内容编码为可放入 JSON 的文本
pub fn encode_media(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// 解码 `encode_media` 的输出
pub fn decode_media(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    general_purpose::STANDARD.decode(encoded)
}

/// `data:<mime>;base64,<data>` 形式的地址，用于兼容 OpenAI 的图片消息
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, encode_media(bytes))
}
