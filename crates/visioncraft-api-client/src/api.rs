//! Domain methods for the VisionCraft API client.

use serde::Deserialize;
use std::collections::BTreeMap;
use visioncraft_core::{ClientError, ClientResult, DecodedImage};

use crate::models::{
    FilterStep, ImageFile, ProcessRequest, ProcessResult, TransformOutcome, TransformRequest,
    TransformResult, UploadResponse, UploadedAsset, UpscaleMethod, WatermarkPlacement,
};
use crate::ApiClient;

pub const UPLOAD_ENDPOINT: &str = "/upload";
pub const HEALTH_ENDPOINT: &str = "/test";
pub const FILTERS_ENDPOINT: &str = "/filters";
pub const PROCESS_ENDPOINT: &str = "/process";

/// Download name for a `/process` artifact, which is always PNG.
pub const PROCESSED_DOWNLOAD_NAME: &str = "processed_image.png";

/// Health-check response (`GET /test`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Filter catalogue: filter name to its methods and parameter ranges.
pub type FilterCatalog = BTreeMap<String, serde_json::Value>;

impl ApiClient {
    /// Upload one image as the `image` multipart field and return its server reference.
    pub async fn upload(&self, file: ImageFile) -> ClientResult<UploadedAsset> {
        let file_name = file.file_name.clone();
        let size = file.bytes.len();
        let form = file.into_form()?;

        let response: UploadResponse = self.post_multipart(UPLOAD_ENDPOINT, form).await?;
        if response.filename.trim().is_empty() {
            return Err(ClientError::Decode(
                "upload response carried an empty filename".to_string(),
            ));
        }

        tracing::info!(
            file_name = %file_name,
            size,
            filename = %response.filename,
            "Image uploaded"
        );
        Ok(UploadedAsset::new(response.filename))
    }

    /// Run one transform and decode its artifact. Every call reaches the service.
    pub async fn transform(&self, request: &TransformRequest) -> ClientResult<TransformOutcome> {
        let operation = request.operation();
        let result: TransformResult = self.post_json(&operation.endpoint(), request).await?;

        let outcome = result.into_outcome(operation).inspect_err(|err| {
            tracing::warn!(
                operation = %operation,
                code = err.error_code(),
                error = %err,
                "Transform rejected"
            );
        })?;

        tracing::debug!(
            operation = %operation,
            bytes = outcome.image.len(),
            saved_percentage = ?outcome.saved_percentage(),
            "Transform completed"
        );
        Ok(outcome)
    }

    pub async fn compress(
        &self,
        asset: &UploadedAsset,
        quality: i64,
    ) -> ClientResult<TransformOutcome> {
        self.transform(&TransformRequest::compress(asset, quality))
            .await
    }

    pub async fn resize(
        &self,
        asset: &UploadedAsset,
        width: u32,
        height: u32,
    ) -> ClientResult<TransformOutcome> {
        self.transform(&TransformRequest::resize(asset, width, height)?)
            .await
    }

    pub async fn crop(
        &self,
        asset: &UploadedAsset,
        left: i64,
        top: i64,
        right: i64,
        bottom: i64,
    ) -> ClientResult<TransformOutcome> {
        self.transform(&TransformRequest::crop(asset, left, top, right, bottom))
            .await
    }

    pub async fn convert_to_jpg(&self, asset: &UploadedAsset) -> ClientResult<TransformOutcome> {
        self.transform(&TransformRequest::convert_to_jpg(asset))
            .await
    }

    pub async fn upscale(
        &self,
        asset: &UploadedAsset,
        method: UpscaleMethod,
    ) -> ClientResult<TransformOutcome> {
        self.transform(&TransformRequest::upscale(asset, method))
            .await
    }

    pub async fn remove_background(
        &self,
        asset: &UploadedAsset,
    ) -> ClientResult<TransformOutcome> {
        self.transform(&TransformRequest::remove_background(asset))
            .await
    }

    pub async fn watermark(
        &self,
        asset: &UploadedAsset,
        watermark: &UploadedAsset,
        placement: WatermarkPlacement,
    ) -> ClientResult<TransformOutcome> {
        self.transform(&TransformRequest::watermark(asset, watermark, placement)?)
            .await
    }

    pub async fn blur_face(&self, asset: &UploadedAsset) -> ClientResult<TransformOutcome> {
        self.transform(&TransformRequest::blur_face(asset)).await
    }

    /// Run a filter pipeline over an inline image. Steps are applied in order.
    ///
    /// Unlike the transforms this needs no prior upload; the image is sent as a data URI.
    pub async fn process(
        &self,
        image: &DecodedImage,
        steps: &[FilterStep],
    ) -> ClientResult<DecodedImage> {
        let request = ProcessRequest {
            image: image.data_uri(),
            operations: steps,
        };
        let result: ProcessResult = self.post_json(PROCESS_ENDPOINT, &request).await?;

        let processed = result.into_image().inspect_err(|err| {
            tracing::warn!(
                steps = steps.len(),
                code = err.error_code(),
                error = %err,
                "Filter pipeline rejected"
            );
        })?;

        tracing::debug!(
            steps = steps.len(),
            bytes = processed.len(),
            "Filter pipeline completed"
        );
        Ok(processed)
    }

    /// Check that the service is reachable.
    pub async fn ping(&self) -> ClientResult<ServiceStatus> {
        self.get(HEALTH_ENDPOINT).await
    }

    /// Filters the service can apply, with their parameter ranges.
    pub async fn filters(&self) -> ClientResult<FilterCatalog> {
        self.get(FILTERS_ENDPOINT).await
    }
}
