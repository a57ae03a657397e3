//! Artifact decoding
//!
//! Transform endpoints return the resulting image as a base64 string. This module
//! turns that string into bytes that can be previewed (as a data URI) or written to
//! disk. Payloads that are not valid base64 are rejected here with
//! `ClientError::Decode` instead of surfacing later as a broken preview.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ClientError, ClientResult};
use crate::operation::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageMime {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageMime {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageMime::Jpeg => "image/jpeg",
            ImageMime::Png => "image/png",
            ImageMime::WebP => "image/webp",
            ImageMime::Gif => "image/gif",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageMime::Jpeg => "jpg",
            ImageMime::Png => "png",
            ImageMime::WebP => "webp",
            ImageMime::Gif => "gif",
        }
    }

    /// Detect the format from the leading magic bytes.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(ImageMime::Jpeg)
        } else if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            Some(ImageMime::Png)
        } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            Some(ImageMime::Gif)
        } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            Some(ImageMime::WebP)
        } else {
            None
        }
    }

    /// Guess from a file name, used to label uploads.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageMime::Jpeg),
            "png" => Some(ImageMime::Png),
            "webp" => Some(ImageMime::WebP),
            "gif" => Some(ImageMime::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for ImageMime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded artifact, ready for preview or download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    bytes: Bytes,
    encoded: String,
    mime: ImageMime,
}

/// Decode a base64 artifact. A leading `data:<mime>;base64,` header is tolerated.
///
/// The MIME type comes from the decoded bytes when they carry a known signature,
/// otherwise `mime_hint` is used.
pub fn decode(payload: &str, mime_hint: ImageMime) -> ClientResult<DecodedImage> {
    let body = match payload.find(";base64,") {
        Some(idx) if payload.starts_with("data:") => &payload[idx + ";base64,".len()..],
        _ => payload,
    };
    let encoded: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if encoded.is_empty() {
        return Err(ClientError::Decode("image payload is empty".to_string()));
    }

    let bytes = STANDARD
        .decode(encoded.as_bytes())
        .map_err(|e| ClientError::Decode(format!("image payload is not valid base64: {}", e)))?;

    let mime = ImageMime::sniff(&bytes).unwrap_or(mime_hint);

    Ok(DecodedImage {
        bytes: Bytes::from(bytes),
        encoded,
        mime,
    })
}

impl DecodedImage {
    /// Wrap raw image bytes, e.g. a local file, so they can be sent inline.
    pub fn from_bytes(bytes: impl Into<Bytes>, mime_hint: ImageMime) -> Self {
        let bytes = bytes.into();
        let mime = ImageMime::sniff(&bytes).unwrap_or(mime_hint);
        Self {
            encoded: STANDARD.encode(&bytes),
            bytes,
            mime,
        }
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn mime(&self) -> ImageMime {
        self.mime
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:` URI for immediate preview.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.encoded)
    }

    /// Write the bytes to `path` unchanged.
    pub async fn save_as(&self, path: &Path) -> ClientResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, &self.bytes).await?;
        tracing::debug!(path = %path.display(), bytes = self.bytes.len(), "Artifact saved");
        Ok(())
    }

    /// Write the bytes into `dir` under the operation's default download name.
    pub async fn save_to_dir(&self, dir: &Path, operation: Operation) -> ClientResult<PathBuf> {
        let path = dir.join(operation.default_download_name());
        self.save_as(&path).await?;
        Ok(path)
    }
}
