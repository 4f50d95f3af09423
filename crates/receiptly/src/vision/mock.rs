//! Demo record returned when no model credential is configured.

use crate::types::{ExtractedData, ExtractionResult};
use chrono::{DateTime, Local};

/// Note attached to every mock record.
pub const MOCK_NOTE: &str = "Mock data - configure OpenAI API key for real extraction";

/// Fixed receipt used in mock mode. Date and time are taken from `now`.
pub fn mock_receipt(now: DateTime<Local>) -> ExtractedData {
    let fields = [
        ("business_name", "Demo Coffee Shop".to_string()),
        ("date", now.format("%Y-%m-%d").to_string()),
        ("time", now.format("%H:%M").to_string()),
        ("total", "15.47".to_string()),
        ("item_1", "Large Coffee - $4.50".to_string()),
        ("item_2", "Blueberry Muffin - $3.25".to_string()),
        ("item_3", "Sandwich - $7.72".to_string()),
        ("subtotal", "15.47".to_string()),
        ("tax", "0.00".to_string()),
        ("payment_method", "Credit Card".to_string()),
        ("receipt_number", "12345".to_string()),
        ("note", MOCK_NOTE.to_string()),
    ];

    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.into()))
        .collect()
}

/// Successful result carrying the mock record for the current moment.
pub fn mock_result() -> ExtractionResult {
    ExtractionResult::success(mock_receipt(Local::now()))
}
