//! Receiptly - receipt and invoice field extraction
//!
//! Receiptly takes an uploaded receipt image, sends it to a vision-capable
//! language model and returns the extracted fields as an ordered key/value map.
//! Without a model credential it serves a fixed demo record instead, so the
//! pipeline can be exercised end to end with no external service.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use receiptly::{ExtractionPipeline, ExtractionInput, ServiceConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> receiptly::Result<()> {
//! let config = ServiceConfig::load(None)?;
//! let pipeline = ExtractionPipeline::new(&config);
//!
//! let bytes = std::fs::read("receipt.jpg")?;
//! let result = pipeline.run(ExtractionInput::upload(bytes, "receipt.jpg", None)).await?;
//! for (key, value) in &result.extracted_data {
//!     println!("{key}: {value}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core Module** (`core`): transport decoding, upload validation, format sniffing and the pipeline
//! - **Vision** (`vision`): prompt, model client, reply parser and mock record
//! - **Credentials** (`credentials`): API key resolution from config or a secret store
//! - **Function face** (`function`): gateway proxy events in, gateway responses out
//! - **API face** (`api`, feature `api`): Axum HTTP server

#![deny(unsafe_code)]

pub mod core;
pub mod credentials;
pub mod error;
pub mod function;
pub mod types;
pub mod vision;

#[cfg(feature = "api")]
pub mod api;

pub use error::{ReceiptlyError, Result, UploadRejection};
pub use types::*;

pub use core::config::{CONFIG_FILE_NAME, ServerConfig, ServiceConfig, UploadPolicy, VisionConfig};
pub use core::format::{DetectedFormat, sniff_image_format};
pub use core::outcome::resolve_outcome;
pub use core::pipeline::{ExtractionPipeline, extract_file};
pub use credentials::{CredentialSource, EnvSecretSource, SecretSource, StaticSecretSource};
pub use function::{FunctionHandler, GatewayRequest, GatewayResponse};
pub use vision::{OpenAiVisionClient, VisionClient};
