//! REST API server for receipt extraction.
//!
//! # Endpoints
//!
//! - `POST /api/receipt/extract` - Extract fields from an uploaded image (multipart field `file`)
//! - `GET /health` - Health check endpoint
//! - `GET /info` - Version, model and whether mock data is served
//!
//! # Examples
//!
//! ```no_run
//! use receiptly::api::serve;
//!
//! #[tokio::main]
//! async fn main() -> receiptly::Result<()> {
//!     serve("0.0.0.0", 8000).await?;
//!     Ok(())
//! }
//! ```
//!
//! # cURL Examples
//!
//! ```bash
//! curl -F "file=@receipt.jpg" http://localhost:8000/api/receipt/extract
//! curl http://localhost:8000/health
//! curl http://localhost:8000/info
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use handlers::FILE_FIELD;
pub use server::{create_router, create_router_with_limits, create_router_with_state, serve, serve_with_config};
pub use types::{ApiSizeLimits, ApiState, ExtractResponse, HealthResponse, InfoResponse};
