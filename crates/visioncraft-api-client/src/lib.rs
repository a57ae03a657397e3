//! HTTP client for the VisionCraft image service.
//!
//! Every request goes through [`ApiClient::dispatch`], which sends one request,
//! decodes the body exactly once, and turns every non-2xx answer into a
//! [`ClientError::HttpStatus`] carrying the server's `error` text when present.
//! Domain methods (upload and the transforms) live in [`api`]; stateful
//! workflow instances for UIs live in [`workflow`].

pub mod api;
pub mod models;
pub mod workflow;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use visioncraft_core::{ClientConfig, ClientError, ClientResult, LogLevel};

/// Request body accepted by the dispatcher.
#[derive(Debug)]
pub enum RequestBody {
    Empty,
    /// Serialized as JSON with `Content-Type: application/json`.
    Json(serde_json::Value),
    /// Multipart form; reqwest sets the content type and boundary.
    Multipart(reqwest::multipart::Form),
}

impl RequestBody {
    pub fn json<B: Serialize>(body: &B) -> ClientResult<Self> {
        serde_json::to_value(body)
            .map(RequestBody::Json)
            .map_err(|e| ClientError::InvalidParams(format!("Failed to serialize body: {}", e)))
    }
}

/// HTTP client for the VisionCraft API.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_prefix: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.normalized_base_url(),
            api_prefix: config.normalized_api_prefix(),
        })
    }

    /// Create client from VISIONCRAFT_* environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(&ClientConfig::from_env()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint path such as `/compress`.
    pub fn build_url(&self, endpoint: &str) -> String {
        format!("{}{}{}", self.base_url, self.api_prefix, endpoint)
    }

    /// Send one request and decode its JSON body into `T`.
    ///
    /// Failures are logged once here and returned unchanged.
    pub async fn dispatch<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
    ) -> ClientResult<T> {
        tracing::debug!(%method, endpoint, "Dispatching request");

        let result = self.execute(method.clone(), endpoint, body).await;
        if let Err(ref err) = result {
            log_failure(&method, endpoint, err);
        }
        result
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: RequestBody,
    ) -> ClientResult<T> {
        let url = self.build_url(endpoint);
        let request = self.client.request(method, &url);
        let request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(&value),
            RequestBody::Multipart(form) => request.multipart(form),
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        let payload = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(ClientError::from_status(
                status.as_u16(),
                server_error_message(&payload),
            ));
        }

        serde_json::from_slice(&payload)
            .map_err(|e| ClientError::Decode(format!("Failed to parse response as JSON: {}", e)))
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ClientResult<T> {
        self.dispatch(Method::GET, endpoint, RequestBody::Empty)
            .await
    }

    /// POST JSON body and deserialize response.
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.dispatch(Method::POST, endpoint, RequestBody::json(body)?)
            .await
    }

    /// POST multipart form and deserialize response.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: reqwest::multipart::Form,
    ) -> ClientResult<T> {
        self.dispatch(Method::POST, endpoint, RequestBody::Multipart(form))
            .await
    }
}

/// Error text of an error body: its `error` field, or the `message` of a
/// `{"status": "error"}` body.
fn server_error_message(payload: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(payload).ok()?;
    if let Some(error) = value.get("error") {
        return error.as_str().map(str::to_string);
    }
    if value.get("status")?.as_str()? != "error" {
        return None;
    }
    value.get("message")?.as_str().map(str::to_string)
}

fn transport_error(err: reqwest::Error) -> ClientError {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    ClientError::Transport(message)
}

fn log_failure(method: &Method, endpoint: &str, err: &ClientError) {
    let status = err.status();
    let code = err.error_code();
    match err.log_level() {
        LogLevel::Debug => {
            tracing::debug!(%method, endpoint, ?status, code, error = %err, "API request failed")
        }
        LogLevel::Warn => {
            tracing::warn!(%method, endpoint, ?status, code, error = %err, "API request failed")
        }
        LogLevel::Error => {
            tracing::error!(%method, endpoint, ?status, code, error = %err, "API request failed")
        }
    }
}

// Re-export domain types for convenience.
pub use models::{
    FilterStep, ImageFile, ProcessResult, TransformOutcome, TransformRequest, TransformResult,
    UploadedAsset, UpscaleMethod, WatermarkPlacement,
};
pub use workflow::{EditorSession, TransformWorkflow, UploadWorkflow};
