//! Extraction core: configuration, transport decoding, validation, format
//! detection and the orchestrating pipeline.

pub mod config;
pub mod format;
pub mod outcome;
pub mod pipeline;
pub mod transport;
pub mod validation;

pub use config::{ServerConfig, ServiceConfig, UploadPolicy, VisionConfig};
pub use format::{DetectedFormat, sniff_image_format};
pub use outcome::resolve_outcome;
pub use pipeline::{ExtractionPipeline, Stage, extract_file};
pub use transport::{DecodedPayload, decode_base64, decode_payload};
pub use validation::validate_upload;
