//! Canonical output entities produced by an extraction run.
//!
//! The model's raw JSON is untyped until the normalization pass; these
//! structs are the only typed shape the rest of the system (and the HTTP
//! layer) ever sees.

use serde::{Deserialize, Serialize};

/// One billed line item on a page.
///
/// After normalization every numeric field is a finite float (absent or
/// unparsable values become `0.0`) and `item_name` is never empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    pub item_name: String,
    pub item_amount: f64,
    pub item_rate: f64,
    pub item_quantity: f64,
}

/// Classification of a billing-document page, used downstream for
/// adjudication. The set is closed: anything the model returns is coerced
/// into one of these three via [`PageType::coerce`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageType {
    #[default]
    #[serde(rename = "Bill Detail")]
    BillDetail,
    #[serde(rename = "Final Bill")]
    FinalBill,
    #[serde(rename = "Pharmacy")]
    Pharmacy,
}

impl PageType {
    /// Coerce a raw model-provided string into the closed page-type set.
    ///
    /// Substring match, in priority order: "Pharmacy", then "Final Bill",
    /// else the default "Bill Detail" (which also absorbs arbitrary junk).
    pub fn coerce(raw: &str) -> Self {
        if raw.contains("Pharmacy") {
            PageType::Pharmacy
        } else if raw.contains("Final Bill") {
            PageType::FinalBill
        } else {
            PageType::BillDetail
        }
    }

    /// The canonical wire string for this page type.
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::BillDetail => "Bill Detail",
            PageType::FinalBill => "Final Bill",
            PageType::Pharmacy => "Pharmacy",
        }
    }
}

/// All line items extracted from one physical page.
///
/// For PDF inputs `page_no` is always the 1-based physical page index,
/// stamped by the processor — the model's own page-number guess is never
/// trusted. For single-image inputs it is whatever the model returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub page_no: String,
    pub page_type: PageType,
    pub bill_items: Vec<BillItem>,
}

/// Token counts accumulated across every model call of one extraction run.
///
/// `total_tokens` is always `input_tokens + output_tokens`; calls that fail
/// or return no usage metadata contribute zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub total_tokens: u64,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Fold one call's prompt/candidate counts into the running totals.
    pub fn add(&mut self, input: u64, output: u64) {
        self.input_tokens += input;
        self.output_tokens += output;
        self.total_tokens = self.input_tokens + self.output_tokens;
    }
}

/// The full result of processing one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutcome {
    /// Normalized page records, in physical page order for PDFs.
    pub pages: Vec<PageRecord>,
    /// Accumulated token usage across all model calls.
    pub usage: TokenUsage,
    /// 1-based indices of PDF pages whose model calls exhausted every retry.
    /// Such pages contribute no records; the HTTP payload does not carry this
    /// field, it exists for logging and for callers of the library API.
    pub failed_pages: Vec<usize>,
}

impl ExtractionOutcome {
    /// Sum of `bill_items` lengths across all pages. Derived, never stored.
    pub fn total_item_count(&self) -> usize {
        self.pages.iter().map(|p| p.bill_items.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_type_coercion() {
        assert_eq!(PageType::coerce("Pharmacy"), PageType::Pharmacy);
        assert_eq!(PageType::coerce("Pharmacy Bill Page"), PageType::Pharmacy);
        assert_eq!(PageType::coerce("Final Bill"), PageType::FinalBill);
        assert_eq!(PageType::coerce("Hospital Final Bill"), PageType::FinalBill);
        assert_eq!(PageType::coerce("Bill Detail"), PageType::BillDetail);
        assert_eq!(PageType::coerce("something else"), PageType::BillDetail);
        assert_eq!(PageType::coerce(""), PageType::BillDetail);
    }

    #[test]
    fn page_type_pharmacy_wins_over_final_bill() {
        // Pharmacy is checked before Final Bill.
        assert_eq!(
            PageType::coerce("Final Bill Pharmacy"),
            PageType::Pharmacy
        );
    }

    #[test]
    fn page_type_serializes_with_spaces() {
        let json = serde_json::to_string(&PageType::FinalBill).unwrap();
        assert_eq!(json, "\"Final Bill\"");
        let back: PageType = serde_json::from_str("\"Pharmacy\"").unwrap();
        assert_eq!(back, PageType::Pharmacy);
    }

    #[test]
    fn token_usage_accumulates() {
        let mut usage = TokenUsage::default();
        usage.add(100, 40);
        usage.add(50, 10);
        assert_eq!(usage.input_tokens, 150);
        assert_eq!(usage.output_tokens, 50);
        assert_eq!(usage.total_tokens, 200);
    }

    #[test]
    fn total_item_count_sums_pages() {
        let item = BillItem {
            item_name: "Paracetamol".into(),
            item_amount: 20.0,
            item_rate: 10.0,
            item_quantity: 2.0,
        };
        let outcome = ExtractionOutcome {
            pages: vec![
                PageRecord {
                    page_no: "1".into(),
                    page_type: PageType::BillDetail,
                    bill_items: vec![item.clone(), item.clone()],
                },
                PageRecord {
                    page_no: "2".into(),
                    page_type: PageType::Pharmacy,
                    bill_items: vec![item],
                },
            ],
            usage: TokenUsage::default(),
            failed_pages: vec![],
        };
        assert_eq!(outcome.total_item_count(), 3);
    }
}
