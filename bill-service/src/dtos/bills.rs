use crate::models::{Bill, BillItem, BillSort};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Create/update body. Fields stay raw JSON so validation can report on
/// whatever the client actually sent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillInput {
    #[serde(default)]
    pub customer_name: Option<Value>,
    #[serde(default)]
    pub items: Option<Value>,
}

impl From<Value> for BillInput {
    /// Any JSON value other than an object carries neither field.
    fn from(body: Value) -> Self {
        match body {
            Value::Object(mut fields) => Self {
                customer_name: fields.remove("customerName").filter(|v| !v.is_null()),
                items: fields.remove("items").filter(|v| !v.is_null()),
            },
            _ => Self::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillResponse {
    pub id: String,
    pub customer_name: String,
    pub items: Vec<BillItem>,
    pub total_amount: f64,
    pub total_items: f64,
    pub original_amount: f64,
    pub total_savings: f64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Bill> for BillResponse {
    fn from(bill: Bill) -> Self {
        Self {
            id: bill.id.to_hex(),
            customer_name: bill.customer_name,
            items: bill.items,
            total_amount: bill.total_amount,
            total_items: bill.total_items,
            original_amount: bill.original_amount,
            total_savings: bill.total_savings,
            created_at: bill.created_at.to_rfc3339(),
            updated_at: bill.updated_at.to_rfc3339(),
        }
    }
}

/// Query string for `GET /api/all`. Values are kept as text so a bad
/// `page` or `limit` falls back to its default instead of rejecting the
/// request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListBillsParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
}

impl ListBillsParams {
    pub fn page(&self) -> u64 {
        positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> u64 {
        positive(self.limit.as_deref())
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT)
    }

    pub fn sort(&self) -> BillSort {
        BillSort::from_query(self.sort.as_deref())
    }

    pub fn skip(&self) -> u64 {
        (self.page() - 1).saturating_mul(self.limit())
    }
}

fn positive(raw: Option<&str>) -> Option<u64> {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v >= 1)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: u64,
    pub page: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(total: u64, page: u64, limit: u64) -> Self {
        Self {
            total,
            limit,
            page,
            total_pages: total.div_ceil(limit.max(1)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillListResponse {
    pub bills: Vec<BillResponse>,
    pub pagination: Pagination,
}
