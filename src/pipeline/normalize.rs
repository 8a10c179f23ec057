//! Field normalization: coerce untyped model output into canonical records.
//!
//! ## Why is normalization necessary?
//!
//! The model's JSON has no enforced schema beyond prompt instruction. In
//! practice it misspells page types ("Pharmacy Bill"), omits numeric fields,
//! returns amounts as strings ("1,200.00" style junk included), and
//! occasionally puts non-objects inside `bill_items`. This stage applies the
//! deterministic rules that turn whatever arrived into [`PageRecord`]s whose
//! invariants hold:
//!
//! - `page_type` is always one of the three closed values
//! - the three numeric fields are always present and finite (0.0 fallback)
//! - `item_name` always exists ("Unknown Item" fallback)
//! - non-object `bill_items` entries are dropped silently
//! - a missing or non-list `bill_items` becomes an empty list

use crate::output::{BillItem, PageRecord, PageType};
use serde_json::Value;

/// Placeholder for items the model returned without a name.
const UNKNOWN_ITEM: &str = "Unknown Item";

/// Pull the raw page list out of a combined extraction value.
///
/// Missing or non-array `pagewise_line_items` yields an empty list — the
/// shape is never assumed.
pub fn raw_pages(combined: &Value) -> Vec<Value> {
    combined
        .get("pagewise_line_items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Normalize one raw page object into a typed [`PageRecord`].
pub fn normalize_page(raw: &Value) -> PageRecord {
    let page_no = raw
        .get("page_no")
        .map(value_to_string)
        .unwrap_or_default();

    let page_type = raw
        .get("page_type")
        .and_then(Value::as_str)
        .map(PageType::coerce)
        .unwrap_or_default();

    let bill_items = raw
        .get("bill_items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(normalize_item).collect())
        .unwrap_or_default();

    PageRecord {
        page_no,
        page_type,
        bill_items,
    }
}

/// Normalize one raw bill-item entry; `None` drops non-object entries.
fn normalize_item(raw: &Value) -> Option<BillItem> {
    let obj = raw.as_object()?;

    let item_name = match obj.get("item_name") {
        Some(v) => value_to_string(v),
        None => UNKNOWN_ITEM.to_string(),
    };

    Some(BillItem {
        item_name,
        item_amount: coerce_number(obj.get("item_amount")),
        item_rate: coerce_number(obj.get("item_rate")),
        item_quantity: coerce_number(obj.get("item_quantity")),
    })
}

/// Coerce a raw field into a finite float, defaulting to 0.0.
///
/// Accepts JSON numbers and numeric strings; everything else (missing,
/// null, objects, unparsable text, non-finite values) maps to exactly 0.0.
fn coerce_number(raw: Option<&Value>) -> f64 {
    let v = match raw {
        Some(v) => v,
        None => return 0.0,
    };
    let n = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if n.is_finite() { n } else { 0.0 }
}

/// Render a raw scalar as the string the record carries; the model sometimes
/// answers `page_no` as a bare number.
fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
