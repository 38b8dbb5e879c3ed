//! Bill input validation and totals calculation.
//!
//! Both functions work on raw JSON values because clients send quantities and
//! prices as numbers, numeric strings or worse. Validation reports every
//! problem it finds. Calculation assumes validation passed and never fails.

use serde::Serialize;
use serde_json::Value;

use crate::models::{normalize_text, BillDraft, BillItem};

/// One field-level problem with a submitted bill.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
    pub message: &'static str,
    /// The offending input echoed back to the caller.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl ValidationIssue {
    fn bill(message: &'static str) -> Self {
        Self {
            item_index: None,
            field: None,
            message,
            input: None,
        }
    }

    fn item(
        index: usize,
        field: &'static str,
        message: &'static str,
        input: Option<Value>,
    ) -> Self {
        Self {
            item_index: Some(index),
            field: Some(field),
            message,
            input,
        }
    }
}

pub const CUSTOMER_NAME_REQUIRED: &str = "Customer Name is required";
pub const ITEMS_REQUIRED: &str = "Item is required";
pub const ITEM_NAME_REQUIRED: &str = "Item name is required";
pub const QUANTITY_INVALID: &str = "Quantity is required and must be a number >= 1";
pub const PRICE_INVALID: &str = "Price is required and must be a number > 0";
pub const DISCOUNT_INVALID: &str = "Discount must be a number between 0 and 100";

/// Result of [`calculate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub calculated_items: Vec<BillItem>,
    pub total_amount: f64,
    pub total_items: f64,
    /// Undiscounted total, `Σ quantity * price`.
    pub original_amount: f64,
    pub total_savings: f64,
}

impl Calculation {
    /// Normalizes names for storage and attaches the customer.
    pub fn into_draft(self, customer_name: &str) -> BillDraft {
        BillDraft {
            customer_name: normalize_text(customer_name),
            items: self
                .calculated_items
                .into_iter()
                .map(|item| BillItem {
                    name: normalize_text(&item.name),
                    ..item
                })
                .collect(),
            total_amount: self.total_amount,
            total_items: self.total_items,
            original_amount: self.original_amount,
            total_savings: self.total_savings,
        }
    }
}

/// Checks a submitted bill, returning every problem found.
///
/// An empty result means the input may be passed to [`calculate`].
pub fn validate(customer_name: Option<&Value>, items: Option<&Value>) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if customer_name.map_or(true, is_falsy) {
        issues.push(ValidationIssue::bill(CUSTOMER_NAME_REQUIRED));
    }

    let items = match items {
        Some(Value::Array(items)) if !items.is_empty() => items.as_slice(),
        _ => {
            issues.push(ValidationIssue::bill(ITEMS_REQUIRED));
            return issues;
        }
    };

    for (index, item) in items.iter().enumerate() {
        let name = field(item, "name");
        let quantity = field(item, "quantity");
        let price = field(item, "price");

        if name.and_then(coerce_text).map_or(true, |n| n.trim().is_empty()) {
            issues.push(ValidationIssue::item(index, "name", ITEM_NAME_REQUIRED, None));
        }

        let q = quantity.map_or(f64::NAN, coerce_number);
        if !q.is_finite() || q < 1.0 {
            issues.push(ValidationIssue::item(
                index,
                "quantity",
                QUANTITY_INVALID,
                Some(echo(quantity)),
            ));
        }

        let p = price.map_or(f64::NAN, coerce_number);
        if !p.is_finite() || p <= 0.0 {
            issues.push(ValidationIssue::item(
                index,
                "price",
                PRICE_INVALID,
                Some(echo(price)),
            ));
        }

        if let Some(raw) = field(item, "discount").filter(|v| !v.is_null()) {
            let d = coerce_number(raw);
            if !d.is_finite() || !(0.0..=100.0).contains(&d) {
                issues.push(ValidationIssue::item(
                    index,
                    "discount",
                    DISCOUNT_INVALID,
                    Some(number_value(d)),
                ));
            }
        }
    }

    issues
}

/// Derives per-item selling prices and bill totals.
///
/// Items are processed in order. Every emitted item carries the undiscounted
/// amount accumulated so far in `original_amount`; the final running value is
/// also returned as the bill-level `original_amount`.
pub fn calculate(items: &[Value]) -> Calculation {
    let mut total_amount = 0.0;
    let mut total_items = 0.0;
    let mut original_amount = 0.0;

    let calculated_items = items
        .iter()
        .map(|item| {
            let name = field(item, "name").and_then(coerce_text).unwrap_or_default();
            let quantity = field(item, "quantity").map_or(0.0, number_or_zero);
            let price = field(item, "price").map_or(0.0, number_or_zero);
            let discount = resolve_discount(field(item, "discount"));

            let selling_price = quantity * price * (1.0 - discount / 100.0);
            total_amount += selling_price;
            total_items += quantity;
            original_amount += quantity * price;

            BillItem {
                name,
                quantity,
                price,
                discount,
                selling_price,
                original_amount,
            }
        })
        .collect();

    Calculation {
        calculated_items,
        total_amount,
        total_items,
        original_amount,
        total_savings: original_amount - total_amount,
    }
}

/// Absent, `null`, negative or non-numeric discounts count as no discount.
/// Values above 100 are not clamped; [`validate`] rejects them.
fn resolve_discount(raw: Option<&Value>) -> f64 {
    match raw {
        None | Some(Value::Null) => 0.0,
        Some(value) => {
            let d = coerce_number(value);
            if d.is_finite() && d > 0.0 {
                d
            } else {
                0.0
            }
        }
    }
}

fn field<'a>(item: &'a Value, key: &str) -> Option<&'a Value> {
    item.as_object().and_then(|obj| obj.get(key))
}

/// Numeric reading of a JSON value. Strings are trimmed and parsed, an empty
/// string is zero, booleans are 1/0, `null` is zero. Arrays and objects are
/// never numbers.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

fn number_or_zero(value: &Value) -> f64 {
    let n = coerce_number(value);
    if n.is_nan() {
        0.0
    } else {
        n
    }
}

/// Textual reading of a JSON value; `None` for values that carry no text
/// (`null`, `false`, arrays and objects).
pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Bool(false) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Raw quantity/price echoed in an issue: missing or falsy input becomes
/// `"empty"`, except a literal numeric zero which is echoed as `0`.
fn echo(raw: Option<&Value>) -> Value {
    match raw {
        Some(value @ Value::Number(_)) => value.clone(),
        Some(value) if !is_falsy(value) => value.clone(),
        _ => Value::String("empty".to_string()),
    }
}

fn number_value(n: f64) -> Value {
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}
