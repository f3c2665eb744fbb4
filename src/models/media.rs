//! 媒体文件
//!
//! 文件内容在加载后以 `Arc<[u8]>` 共享，队列条目独占其句柄

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use phf::phf_map;
use serde::Serialize;

use crate::error::FileError;

/// 无法识别时的默认类型
pub const OCTET_STREAM: &str = "application/octet-stream";

/// 扩展名 → 媒体类型
static MIME_BY_EXTENSION: phf::Map<&'static str, &'static str> = phf_map! {
    "mp4" => "video/mp4",
    "m4v" => "video/x-m4v",
    "webm" => "video/webm",
    "mov" => "video/quicktime",
    "avi" => "video/x-msvideo",
    "mkv" => "video/x-matroska",
    "png" => "image/png",
    "apng" => "image/apng",
    "jpg" => "image/jpeg",
    "jpeg" => "image/jpeg",
    "gif" => "image/gif",
    "webp" => "image/webp",
    "svg" => "image/svg+xml",
    // svga 没有注册的媒体类型，按未知处理
};

/// 媒体种类，加入队列时根据声明类型推导一次，之后不再改变
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Unknown,
}

impl MediaKind {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("video") {
            MediaKind::Video
        } else if mime_type.starts_with("image") {
            MediaKind::Image
        } else {
            MediaKind::Unknown
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MediaKind::Video => "视频",
            MediaKind::Image => "图片",
            MediaKind::Unknown => "未知",
        };
        f.write_str(label)
    }
}

/// 根据文件名推断媒体类型
pub fn mime_for_name(name: &str) -> &'static str {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| MIME_BY_EXTENSION.get(ext.to_ascii_lowercase().as_str()).copied())
        .unwrap_or(OCTET_STREAM)
}

/// 用户提交的一个文件：名称、声明类型、二进制内容
#[derive(Clone)]
pub struct MediaFile {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes: bytes.into(),
        }
    }

    /// 从磁盘读取文件，按扩展名推断类型
    ///
    /// 超过 `max_size_mb` 的文件直接拒绝
    pub async fn load(path: &Path, max_size_mb: u64) -> Result<Self, FileError> {
        let display = path.display().to_string();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| FileError::read_failed(&display, e))?;

        let limit = max_size_mb.saturating_mul(1024 * 1024);
        if metadata.len() > limit {
            return Err(FileError::TooLarge {
                path: display,
                size_mb: bytes_to_mb(metadata.len()),
                limit_mb: max_size_mb,
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FileError::read_failed(&display, e))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or(display);
        let mime_type = mime_for_name(&name);

        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// 以 MB 表示的大小
    pub fn size_mb(&self) -> f64 {
        bytes_to_mb(self.size())
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_mime(&self.mime_type)
    }
}

impl fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}
