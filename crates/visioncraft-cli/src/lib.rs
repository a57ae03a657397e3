use serde::Serialize;
use std::path::{Path, PathBuf};
use visioncraft_api_client::TransformOutcome;
use visioncraft_core::DecodedImage;

const PREVIEW_LEN: usize = 64;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// What the CLI prints after a transform.
#[derive(Debug, Serialize)]
pub struct TransformSummary {
    pub operation: String,
    pub mime: &'static str,
    pub bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_kb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_kb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_percentage: Option<i64>,
    pub preview: String,
}

impl TransformSummary {
    pub fn new(outcome: &TransformOutcome, saved_to: Option<&Path>) -> Self {
        Self {
            original_kb: outcome.sizes.map(|s| s.original_kb),
            compressed_kb: outcome.sizes.map(|s| s.compressed_kb),
            saved_percentage: outcome.saved_percentage(),
            ..Self::for_image(outcome.operation.name(), &outcome.image, saved_to)
        }
    }

    /// Summary of an artifact that carries no size metrics, such as a filter pipeline result.
    pub fn for_image(operation: &str, image: &DecodedImage, saved_to: Option<&Path>) -> Self {
        Self {
            operation: operation.to_string(),
            mime: image.mime().as_str(),
            bytes: image.len(),
            saved_to: saved_to.map(Path::to_path_buf),
            original_kb: None,
            compressed_kb: None,
            saved_percentage: None,
            preview: truncate_string(&image.data_uri(), PREVIEW_LEN),
        }
    }
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use visioncraft_core::ImageMime;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_counts_chars() {
        assert_eq!(truncate_string("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn pipeline_summary_has_no_sizes() {
        let image = DecodedImage::from_bytes(b"filtered".to_vec(), ImageMime::Png);
        let summary = TransformSummary::for_image("process", &image, None);
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["operation"], "process");
        assert_eq!(value["mime"], "image/png");
        assert_eq!(value["bytes"], 8);
        assert!(value.get("saved_percentage").is_none());
        assert!(value.get("saved_to").is_none());
    }

    #[test]
    fn data_uri_preview_is_bounded() {
        let uri = format!("data:image/jpeg;base64,{}", "A".repeat(500));
        let preview = truncate_string(&uri, PREVIEW_LEN);
        assert_eq!(preview.chars().count(), PREVIEW_LEN);
        assert!(preview.starts_with("data:image/jpeg;base64,"));
    }
}
