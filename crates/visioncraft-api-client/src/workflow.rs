//! Stateful workflow instances
//!
//! An `UploadWorkflow` turns a local file into an `UploadedAsset`; a
//! `TransformWorkflow` runs one kind of transform. Each owns an
//! `OperationTracker`, so its progress is published as `Idle | InFlight |
//! Succeeded | Failed` and a slow response never overwrites a newer one.
//! `EditorSession` ties them together the way an editing screen uses them:
//! one uploaded image, one workflow per operation.

use tokio::sync::watch;
use visioncraft_core::{
    Applied, ClientError, ClientResult, Operation, OperationState, OperationTracker,
};

use crate::models::{
    ImageFile, TransformOutcome, TransformRequest, UploadedAsset, UpscaleMethod,
    WatermarkPlacement,
};
use crate::ApiClient;

pub type UploadState = OperationState<UploadedAsset>;
pub type TransformState = OperationState<TransformOutcome>;

/// `idle -> uploading -> uploaded | failed`. A failed upload can be retried with another file.
pub struct UploadWorkflow {
    client: ApiClient,
    tracker: OperationTracker<UploadedAsset>,
}

impl UploadWorkflow {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            tracker: OperationTracker::new(),
        }
    }

    pub async fn upload(&self, file: ImageFile) -> ClientResult<UploadedAsset> {
        let ticket = self.tracker.begin();
        let result = self.client.upload(file).await;

        let applied = match &result {
            Ok(asset) => self.tracker.succeed(ticket, asset.clone()),
            Err(err) => self.tracker.fail(ticket, err),
        };
        if applied == Applied::Stale {
            tracing::debug!(seq = ticket.seq(), "Upload superseded by a newer upload");
        }
        result
    }

    /// The asset of the latest completed upload, if it succeeded.
    pub fn asset(&self) -> Option<UploadedAsset> {
        self.tracker.current().succeeded().cloned()
    }

    pub fn state(&self) -> UploadState {
        self.tracker.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.tracker.subscribe()
    }

    pub fn reset(&self) {
        self.tracker.reset();
    }
}

/// One transform kind's invocation state. Re-invoking discards the previous result.
pub struct TransformWorkflow {
    client: ApiClient,
    operation: Operation,
    tracker: OperationTracker<TransformOutcome>,
}

impl TransformWorkflow {
    pub fn new(client: ApiClient, operation: Operation) -> Self {
        Self {
            client,
            operation,
            tracker: OperationTracker::new(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub async fn invoke(&self, request: TransformRequest) -> ClientResult<TransformOutcome> {
        if request.operation() != self.operation {
            return Err(ClientError::InvalidParams(format!(
                "{} request sent to the {} workflow",
                request.operation(),
                self.operation
            )));
        }

        let ticket = self.tracker.begin();
        tracing::debug!(operation = %self.operation, seq = ticket.seq(), "Transform started");
        let result = self.client.transform(&request).await;

        let applied = match &result {
            Ok(outcome) => self.tracker.succeed(ticket, outcome.clone()),
            Err(err) => self.tracker.fail(ticket, err),
        };
        if applied == Applied::Stale {
            tracing::debug!(
                operation = %self.operation,
                seq = ticket.seq(),
                "Transform result superseded by a newer invocation"
            );
        }
        result
    }

    pub fn state(&self) -> TransformState {
        self.tracker.current()
    }

    pub fn is_loading(&self) -> bool {
        self.tracker.is_in_flight()
    }

    pub fn subscribe(&self) -> watch::Receiver<TransformState> {
        self.tracker.subscribe()
    }

    pub fn reset(&self) {
        self.tracker.reset();
    }
}

/// An editing session over one uploaded image.
///
/// Transforms fail fast with `ClientError::NoAsset` until an upload has succeeded.
pub struct EditorSession {
    upload: UploadWorkflow,
    overlay: UploadWorkflow,
    transforms: Vec<TransformWorkflow>,
}

impl EditorSession {
    pub fn new(client: ApiClient) -> Self {
        let transforms = Operation::ALL
            .iter()
            .map(|&operation| TransformWorkflow::new(client.clone(), operation))
            .collect();

        Self {
            upload: UploadWorkflow::new(client.clone()),
            overlay: UploadWorkflow::new(client),
            transforms,
        }
    }

    pub async fn upload(&self, file: ImageFile) -> ClientResult<UploadedAsset> {
        self.upload.upload(file).await
    }

    /// Upload the image used as the watermark overlay.
    pub async fn upload_watermark(&self, file: ImageFile) -> ClientResult<UploadedAsset> {
        self.overlay.upload(file).await
    }

    pub fn asset(&self) -> Option<UploadedAsset> {
        self.upload.asset()
    }

    pub fn upload_state(&self) -> UploadState {
        self.upload.state()
    }

    pub fn workflow(&self, operation: Operation) -> &TransformWorkflow {
        &self.transforms[operation as usize]
    }

    pub fn state(&self, operation: Operation) -> TransformState {
        self.workflow(operation).state()
    }

    pub fn subscribe(&self, operation: Operation) -> watch::Receiver<TransformState> {
        self.workflow(operation).subscribe()
    }

    /// Forget the uploaded image and every transform result.
    pub fn reset(&self) {
        self.upload.reset();
        self.overlay.reset();
        for workflow in &self.transforms {
            workflow.reset();
        }
    }

    fn require_asset(&self, operation: Operation) -> ClientResult<UploadedAsset> {
        self.upload.asset().ok_or_else(|| {
            tracing::debug!(operation = %operation, "Transform requested before upload");
            ClientError::NoAsset(operation.name())
        })
    }

    async fn run(&self, request: TransformRequest) -> ClientResult<TransformOutcome> {
        self.workflow(request.operation()).invoke(request).await
    }

    pub async fn compress(&self, quality: i64) -> ClientResult<TransformOutcome> {
        let asset = self.require_asset(Operation::Compress)?;
        self.run(TransformRequest::compress(&asset, quality)).await
    }

    pub async fn resize(&self, width: u32, height: u32) -> ClientResult<TransformOutcome> {
        let asset = self.require_asset(Operation::Resize)?;
        self.run(TransformRequest::resize(&asset, width, height)?)
            .await
    }

    pub async fn crop(
        &self,
        left: i64,
        top: i64,
        right: i64,
        bottom: i64,
    ) -> ClientResult<TransformOutcome> {
        let asset = self.require_asset(Operation::Crop)?;
        self.run(TransformRequest::crop(&asset, left, top, right, bottom))
            .await
    }

    pub async fn convert_to_jpg(&self) -> ClientResult<TransformOutcome> {
        let asset = self.require_asset(Operation::ConvertToJpg)?;
        self.run(TransformRequest::convert_to_jpg(&asset)).await
    }

    pub async fn upscale(&self, method: UpscaleMethod) -> ClientResult<TransformOutcome> {
        let asset = self.require_asset(Operation::Upscale)?;
        self.run(TransformRequest::upscale(&asset, method)).await
    }

    pub async fn remove_background(&self) -> ClientResult<TransformOutcome> {
        let asset = self.require_asset(Operation::RemoveBackground)?;
        self.run(TransformRequest::remove_background(&asset)).await
    }

    pub async fn blur_face(&self) -> ClientResult<TransformOutcome> {
        let asset = self.require_asset(Operation::BlurFace)?;
        self.run(TransformRequest::blur_face(&asset)).await
    }

    pub async fn watermark(&self, placement: WatermarkPlacement) -> ClientResult<TransformOutcome> {
        let asset = self.require_asset(Operation::Watermark)?;
        let overlay = self
            .overlay
            .asset()
            .ok_or(ClientError::NoAsset(Operation::Watermark.name()))?;
        self.run(TransformRequest::watermark(&asset, &overlay, placement)?)
            .await
    }
}
