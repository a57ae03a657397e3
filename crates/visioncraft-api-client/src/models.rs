//! Request and response types for the transform endpoints.
//!
//! `UploadedAsset` can only be obtained from a successful upload, and every
//! `TransformRequest` constructor takes one, so a transform can never be issued for
//! an image that was not uploaded first.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use visioncraft_core::{
    decode, ClientError, ClientResult, DecodedImage, ImageMime, Operation, SizeReport,
};

pub const MIN_QUALITY: i64 = 1;
pub const MAX_QUALITY: i64 = 100;
pub const DEFAULT_QUALITY: u8 = 85;
pub const DEFAULT_WATERMARK_OPACITY: f64 = 0.5;

/// Server-side reference to an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UploadedAsset {
    filename: String,
}

impl UploadedAsset {
    pub(crate) fn new(filename: String) -> Self {
        Self { filename }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }
}

/// Body of a successful `POST /upload`.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    pub filename: String,
}

/// A local image, ready to be sent as the `image` field of the upload form.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Bytes,
    pub mime: Option<ImageMime>,
}

impl ImageFile {
    pub fn from_bytes(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let mime = ImageMime::from_path(Path::new(&file_name));
        Self {
            file_name,
            bytes: bytes.into(),
            mime,
        }
    }

    pub async fn from_path(path: &Path) -> ClientResult<Self> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                ClientError::InvalidParams(format!("Not a file path: {}", path.display()))
            })?
            .to_string();
        let bytes = tokio::fs::read(path).await?;

        Ok(Self::from_bytes(file_name, bytes))
    }

    pub(crate) fn into_form(self) -> ClientResult<reqwest::multipart::Form> {
        if self.file_name.trim().is_empty() {
            return Err(ClientError::InvalidParams(
                "file name must not be empty".to_string(),
            ));
        }

        let mut part =
            reqwest::multipart::Part::bytes(self.bytes.to_vec()).file_name(self.file_name);
        if let Some(mime) = self.mime {
            part = part
                .mime_str(mime.as_str())
                .map_err(|e| ClientError::InvalidParams(e.to_string()))?;
        }

        Ok(reqwest::multipart::Form::new().part("image", part))
    }
}

/// Interpolation used by the 2x upscale endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpscaleMethod {
    Nearest,
    Bilinear,
    Bicubic,
    #[default]
    Lanczos,
}

impl UpscaleMethod {
    pub fn parse(s: &str) -> ClientResult<Self> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(UpscaleMethod::Nearest),
            "bilinear" => Ok(UpscaleMethod::Bilinear),
            "bicubic" => Ok(UpscaleMethod::Bicubic),
            "lanczos" => Ok(UpscaleMethod::Lanczos),
            _ => Err(ClientError::InvalidParams(format!(
                "Invalid upscale method: {}",
                s
            ))),
        }
    }
}

/// Where and how a watermark is pasted onto the base image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkPlacement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub opacity: f64,
}

impl WatermarkPlacement {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
            opacity: DEFAULT_WATERMARK_OPACITY,
        }
    }

    pub fn at(mut self, x: i64, y: i64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Clamp a requested JPEG quality into `[1, 100]`. Out-of-range values are never rejected.
pub fn clamp_quality(quality: i64) -> u8 {
    quality.clamp(MIN_QUALITY, MAX_QUALITY) as u8
}

fn clamp_opacity(opacity: f64) -> f64 {
    if opacity.is_nan() {
        DEFAULT_WATERMARK_OPACITY
    } else {
        opacity.clamp(0.0, 1.0)
    }
}

/// Parameters of one transform invocation, serialized as the endpoint's JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransformRequest {
    Compress {
        filename: String,
        quality: u8,
    },
    Resize {
        filename: String,
        width: u32,
        height: u32,
    },
    Crop {
        filename: String,
        left: i64,
        top: i64,
        right: i64,
        bottom: i64,
    },
    ConvertToJpg {
        filename: String,
    },
    Upscale {
        filename: String,
        method: UpscaleMethod,
    },
    RemoveBackground {
        filename: String,
    },
    Watermark {
        filename: String,
        watermark_filename: String,
        x: i64,
        y: i64,
        width: u32,
        height: u32,
        opacity: f64,
    },
    BlurFace {
        filename: String,
    },
}

impl TransformRequest {
    pub fn compress(asset: &UploadedAsset, quality: i64) -> Self {
        TransformRequest::Compress {
            filename: asset.filename.clone(),
            quality: clamp_quality(quality),
        }
    }

    pub fn resize(asset: &UploadedAsset, width: u32, height: u32) -> ClientResult<Self> {
        if width == 0 || height == 0 {
            return Err(ClientError::InvalidParams(format!(
                "resize dimensions must be positive, got {}x{}",
                width, height
            )));
        }
        Ok(TransformRequest::Resize {
            filename: asset.filename.clone(),
            width,
            height,
        })
    }

    /// Crop box in pixel offsets. The box is forwarded as given; the service validates
    /// it against the real image dimensions.
    pub fn crop(asset: &UploadedAsset, left: i64, top: i64, right: i64, bottom: i64) -> Self {
        TransformRequest::Crop {
            filename: asset.filename.clone(),
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn convert_to_jpg(asset: &UploadedAsset) -> Self {
        TransformRequest::ConvertToJpg {
            filename: asset.filename.clone(),
        }
    }

    pub fn upscale(asset: &UploadedAsset, method: UpscaleMethod) -> Self {
        TransformRequest::Upscale {
            filename: asset.filename.clone(),
            method,
        }
    }

    pub fn remove_background(asset: &UploadedAsset) -> Self {
        TransformRequest::RemoveBackground {
            filename: asset.filename.clone(),
        }
    }

    pub fn blur_face(asset: &UploadedAsset) -> Self {
        TransformRequest::BlurFace {
            filename: asset.filename.clone(),
        }
    }

    pub fn watermark(
        asset: &UploadedAsset,
        watermark: &UploadedAsset,
        placement: WatermarkPlacement,
    ) -> ClientResult<Self> {
        if placement.width == 0 || placement.height == 0 {
            return Err(ClientError::InvalidParams(format!(
                "watermark dimensions must be positive, got {}x{}",
                placement.width, placement.height
            )));
        }
        Ok(TransformRequest::Watermark {
            filename: asset.filename.clone(),
            watermark_filename: watermark.filename.clone(),
            x: placement.x,
            y: placement.y,
            width: placement.width,
            height: placement.height,
            opacity: clamp_opacity(placement.opacity),
        })
    }

    pub fn operation(&self) -> Operation {
        match self {
            TransformRequest::Compress { .. } => Operation::Compress,
            TransformRequest::Resize { .. } => Operation::Resize,
            TransformRequest::Crop { .. } => Operation::Crop,
            TransformRequest::ConvertToJpg { .. } => Operation::ConvertToJpg,
            TransformRequest::Upscale { .. } => Operation::Upscale,
            TransformRequest::RemoveBackground { .. } => Operation::RemoveBackground,
            TransformRequest::Watermark { .. } => Operation::Watermark,
            TransformRequest::BlurFace { .. } => Operation::BlurFace,
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            TransformRequest::Compress { filename, .. }
            | TransformRequest::Resize { filename, .. }
            | TransformRequest::Crop { filename, .. }
            | TransformRequest::ConvertToJpg { filename }
            | TransformRequest::Upscale { filename, .. }
            | TransformRequest::RemoveBackground { filename }
            | TransformRequest::Watermark { filename, .. }
            | TransformRequest::BlurFace { filename } => filename,
        }
    }
}

/// Envelope returned by the transform endpoints.
///
/// The artifact arrives as `img` from most endpoints and as `image` from others.
/// When a body carries both, `img` wins.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TransformResult {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub original_size: Option<f64>,
    #[serde(default)]
    pub compressed_size: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TransformResult {
    /// Validate the envelope and decode its artifact.
    ///
    /// `success: false` becomes `ClientError::Application`; a success without an
    /// artifact, or with one that is not base64, becomes `ClientError::Decode`.
    pub fn into_outcome(self, operation: Operation) -> ClientResult<TransformOutcome> {
        if self.success == Some(false) {
            let message = self
                .error
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| operation.failure_message());
            return Err(ClientError::Application(message));
        }

        let payload = self.img.or(self.image).ok_or_else(|| {
            ClientError::Decode("response carried no image payload".to_string())
        })?;
        let image = decode(&payload, operation.mime_hint())?;

        let sizes = match (self.original_size, self.compressed_size) {
            (Some(original), Some(compressed)) => Some(SizeReport::new(original, compressed)),
            _ => None,
        };

        Ok(TransformOutcome {
            operation,
            image,
            sizes,
        })
    }
}

/// A successful transform: the decoded artifact plus any size metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutcome {
    pub operation: Operation,
    pub image: DecodedImage,
    pub sizes: Option<SizeReport>,
}

impl TransformOutcome {
    pub fn saved_percentage(&self) -> Option<i64> {
        self.sizes.map(|s| s.saved_percentage())
    }

    pub fn data_uri(&self) -> String {
        self.image.data_uri()
    }

    pub fn default_download_name(&self) -> &'static str {
        self.operation.default_download_name()
    }
}

/// One step of a `/process` pipeline: a filter name from the catalogue and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterStep {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl FilterStep {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: serde_json::Map::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

/// Body of `POST /process`. The image travels inline, so no upload is needed.
#[derive(Debug, Serialize)]
pub(crate) struct ProcessRequest<'a> {
    pub image: String,
    pub operations: &'a [FilterStep],
}

/// Envelope returned by `/process`: `status` plus either `image` or `message`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProcessResult {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ProcessResult {
    /// `status: "error"` becomes `ClientError::Application`; the artifact is always PNG.
    pub fn into_image(self) -> ClientResult<DecodedImage> {
        if self.status.as_deref() == Some("error") {
            let message = self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Processing failed".to_string());
            return Err(ClientError::Application(message));
        }

        let payload = self.image.ok_or_else(|| {
            ClientError::Decode("process response carried no image payload".to_string())
        })?;
        decode(&payload, ImageMime::Png)
    }
}
