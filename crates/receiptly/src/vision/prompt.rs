//! Extraction prompt sent alongside every image.

/// Fixed instruction for the vision model. Identical for every request so the
/// reply format stays stable.
pub const EXTRACTION_PROMPT: &str = r#"You are an expert at analyzing receipts and invoices. Please carefully examine this image and extract ALL visible text and data into a structured JSON format.

Extract the following information if available:
- Business information: name, address, phone number, website
- Transaction details: date, time, receipt/invoice number, order number
- All line items: product names, quantities, individual prices
- Financial details: subtotal, tax amounts, discounts, tips, final total
- Payment information: payment method, card details (if safe to include)
- Any additional text, numbers, or codes visible on the receipt

Guidelines:
1. For unclear or partially visible text, choose the most probable interpretation
2. Use descriptive keys (e.g., "item_1_name", "item_1_price", "item_1_quantity")
3. Keep all values as strings, including numbers and monetary amounts (keep currency symbols if present)
4. Include dates in ISO format (YYYY-MM-DD) when possible
5. If you see multiple similar items, number them sequentially
6. Extract any barcodes, QR codes, or reference numbers you can see

Return ONLY one flat, valid JSON object with descriptive string keys. Example format:
{
  "business_name": "Coffee Corner",
  "business_address": "123 Main Street, City, State 12345",
  "business_phone": "(555) 123-4567",
  "transaction_date": "2024-12-28",
  "transaction_time": "14:35",
  "receipt_number": "R12345",
  "item_1_name": "Large Cappuccino",
  "item_1_quantity": "1",
  "item_1_price": "$4.50",
  "item_2_name": "Blueberry Muffin",
  "item_2_quantity": "1",
  "item_2_price": "$3.25",
  "subtotal": "$7.75",
  "tax": "$0.62",
  "total": "$8.37",
  "payment_method": "Credit Card",
  "card_last_four": "1234"
}"#;

/// The extraction prompt.
pub fn extraction_prompt() -> &'static str {
    EXTRACTION_PROMPT
}
