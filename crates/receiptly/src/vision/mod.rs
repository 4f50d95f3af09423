//! Everything that talks to, or stands in for, the vision model.

pub mod client;
pub mod mock;
pub mod parser;
pub mod prompt;

pub use client::{OpenAiVisionClient, VisionClient};
pub use mock::{MOCK_NOTE, mock_receipt, mock_result};
pub use parser::{ParsedResponse, RAW_RESPONSE_KEY, parse_model_response};
pub use prompt::{EXTRACTION_PROMPT, extraction_prompt};
