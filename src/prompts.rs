//! The extraction prompt sent with every page.
//!
//! Centralising the prompt here serves two purposes:
//!
//! 1. **Single source of truth** — tweaking the requested JSON shape or the
//!    page-type vocabulary happens in exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompt directly without
//!    a live model call, so accidental shape regressions are caught cheaply.
//!
//! Callers can override via [`crate::config::ExtractionConfig::prompt`]; the
//! constant here is used only when no override is provided.

/// Default per-page extraction prompt.
///
/// Fixes the expected top-level shape (`pagewise_line_items` list) and the
/// closed page-type vocabulary. `page_no` in the example is deliberately a
/// throwaway — for PDFs the processor overwrites it with the physical page
/// index regardless of what the model answers.
pub const DEFAULT_EXTRACTION_PROMPT: &str = r#"Analyze this SINGLE page of an invoice.
Extract all line items visible on this page.

EXTRACT TO JSON:
{
  "pagewise_line_items": [
    {
      "page_no": "1",
      "page_type": "Bill Detail",
      "bill_items": [
        {
          "item_name": "Item Name",
          "item_amount": 0.0,
          "item_rate": 0.0,
          "item_quantity": 0.0
        }
      ]
    }
  ]
}

RULES:
1. 'page_type' MUST be exactly: "Bill Detail", "Final Bill", "Pharmacy".
2. If a value is missing, put 0.0.
3. Do not markdown."#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_pins_the_expected_shape() {
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("pagewise_line_items"));
        assert!(DEFAULT_EXTRACTION_PROMPT.contains("bill_items"));
        for key in ["item_name", "item_amount", "item_rate", "item_quantity"] {
            assert!(DEFAULT_EXTRACTION_PROMPT.contains(key), "missing {key}");
        }
    }

    #[test]
    fn prompt_pins_the_page_type_vocabulary() {
        for pt in ["Bill Detail", "Final Bill", "Pharmacy"] {
            assert!(DEFAULT_EXTRACTION_PROMPT.contains(pt), "missing {pt}");
        }
    }
}
