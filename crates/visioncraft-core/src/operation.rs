use serde::Serialize;
use std::fmt;

use crate::artifact::ImageMime;

/// Every server-side transform the client knows how to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Compress,
    Resize,
    Crop,
    ConvertToJpg,
    Upscale,
    RemoveBackground,
    Watermark,
    BlurFace,
}

impl Operation {
    pub const ALL: [Operation; 8] = [
        Operation::Compress,
        Operation::Resize,
        Operation::Crop,
        Operation::ConvertToJpg,
        Operation::Upscale,
        Operation::RemoveBackground,
        Operation::Watermark,
        Operation::BlurFace,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::Compress => "compress",
            Operation::Resize => "resize",
            Operation::Crop => "crop",
            Operation::ConvertToJpg => "convert-to-jpg",
            Operation::Upscale => "upscale",
            Operation::RemoveBackground => "remove-background",
            Operation::Watermark => "watermark",
            Operation::BlurFace => "blur-face",
        }
    }

    /// Endpoint path relative to the API prefix.
    pub fn endpoint(self) -> String {
        format!("/{}", self.name())
    }

    /// File name used when the artifact is downloaded without an explicit path.
    pub fn default_download_name(self) -> &'static str {
        match self {
            Operation::Compress => "compressed_image.jpg",
            Operation::Resize => "resized_image.jpg",
            Operation::Crop => "cropped_image.jpg",
            Operation::ConvertToJpg => "converted_image.jpg",
            Operation::Upscale => "upscaled_image.png",
            Operation::RemoveBackground => "no_background.png",
            Operation::Watermark => "watermarked_image.png",
            Operation::BlurFace => "blurred_image.jpg",
        }
    }

    /// MIME type assumed for the artifact when its bytes carry no recognisable signature.
    pub fn mime_hint(self) -> ImageMime {
        match self {
            Operation::Upscale | Operation::RemoveBackground | Operation::Watermark => {
                ImageMime::Png
            }
            _ => ImageMime::Jpeg,
        }
    }

    /// Message shown when the service answers `success: false` without an `error` field.
    pub fn failure_message(self) -> String {
        let verb = match self {
            Operation::Compress => "Compression",
            Operation::Resize => "Resize",
            Operation::Crop => "Crop",
            Operation::ConvertToJpg => "Conversion",
            Operation::Upscale => "Upscale",
            Operation::RemoveBackground => "Background removal",
            Operation::Watermark => "Watermark",
            Operation::BlurFace => "Face blur",
        };
        format!("{} failed", verb)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_match_service_routes() {
        assert_eq!(Operation::Compress.endpoint(), "/compress");
        assert_eq!(Operation::ConvertToJpg.endpoint(), "/convert-to-jpg");
        assert_eq!(Operation::RemoveBackground.endpoint(), "/remove-background");
        assert_eq!(Operation::BlurFace.endpoint(), "/blur-face");
    }

    #[test]
    fn download_names_are_unique() {
        let mut names: Vec<_> = Operation::ALL
            .iter()
            .map(|op| op.default_download_name())
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), Operation::ALL.len());
        assert_eq!(
            Operation::Compress.default_download_name(),
            "compressed_image.jpg"
        );
    }

    #[test]
    fn failure_message() {
        assert_eq!(Operation::Compress.failure_message(), "Compression failed");
    }
}
