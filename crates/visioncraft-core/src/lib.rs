//! VisionCraft Core Library
//!
//! This crate provides the error taxonomy, configuration, artifact decoding,
//! compression metrics, and per-invocation state tracking shared by the
//! VisionCraft API client and CLI. It performs no network I/O.

pub mod artifact;
pub mod config;
pub mod error;
pub mod metrics;
pub mod operation;
pub mod state;

// Re-export commonly used types
pub use artifact::{decode, DecodedImage, ImageMime};
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult, ErrorKind, LogLevel};
pub use metrics::{saved_percentage, SizeReport};
pub use operation::Operation;
pub use state::{Applied, Failure, OperationState, OperationTracker, Ticket};
