//! Bill document stored in the `bills` collection.
//!
//! Field names are camelCase on the wire and in MongoDB so documents written
//! by earlier deployments of the service remain readable.

use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One computed line of a bill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    #[validate(length(min = 1, message = "Item Name is required"))]
    pub name: String,
    #[validate(range(min = 1.0, message = "Quantity must be at least 1"))]
    pub quantity: f64,
    #[validate(range(min = 0.0, message = "Price must be positive"))]
    pub price: f64,
    #[validate(range(min = 0.0, max = 100.0, message = "Discount must be between 0 and 100%"))]
    pub discount: f64,
    #[validate(range(min = 0.0, message = "Selling Price must be positive"))]
    pub selling_price: f64,
    /// Running `Σ quantity * price` over this item and every item before it.
    pub original_amount: f64,
}

/// Bill contents as they are about to be written, before the store assigns
/// an id and timestamps. This is the shape the storage-level checks run on.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct BillDraft {
    #[validate(length(min = 1, message = "Customer Name is required"))]
    pub customer_name: String,
    #[validate(length(min = 1, message = "Item is required"), nested)]
    pub items: Vec<BillItem>,
    pub total_amount: f64,
    pub total_items: f64,
    pub original_amount: f64,
    pub total_savings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub customer_name: String,
    pub items: Vec<BillItem>,
    pub total_amount: f64,
    pub total_items: f64,
    #[serde(default)]
    pub original_amount: f64,
    #[serde(default)]
    pub total_savings: f64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    pub fn new(draft: BillDraft) -> Self {
        let now = timestamp();
        Self::from_draft(ObjectId::new(), draft, now, now)
    }

    pub fn from_draft(
        id: ObjectId,
        draft: BillDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            customer_name: draft.customer_name,
            items: draft.items,
            total_amount: draft.total_amount,
            total_items: draft.total_items,
            original_amount: draft.original_amount,
            total_savings: draft.total_savings,
            created_at,
            updated_at,
        }
    }

    /// Replaces contents and totals, keeping identity and `created_at`.
    pub fn apply(&mut self, draft: BillDraft) {
        let id = self.id;
        let created_at = self.created_at;
        *self = Self::from_draft(id, draft, created_at, timestamp());
    }
}

impl BillDraft {
    /// `$set` document for a full replacement of a stored bill.
    pub fn to_update_document(&self) -> Result<Document, mongodb::bson::ser::Error> {
        Ok(doc! {
            "$set": {
                "customerName": self.customer_name.clone(),
                "items": mongodb::bson::to_bson(&self.items)?,
                "totalAmount": self.total_amount,
                "totalItems": self.total_items,
                "originalAmount": self.original_amount,
                "totalSavings": self.total_savings,
                "updatedAt": mongodb::bson::DateTime::from_chrono(timestamp()),
            }
        })
    }
}

/// Stored text is trimmed and upper-cased.
pub fn normalize_text(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Current time at the millisecond precision BSON dates keep, so a bill
/// compares equal before and after a round trip through MongoDB.
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Listing order for `find_page`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BillSort {
    #[default]
    Newest,
    HighestAmount,
    LowestAmount,
}

impl BillSort {
    /// Maps the `sort` query value. Unknown values list newest first.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
            Some("highestamount") | Some("higestamount") => BillSort::HighestAmount,
            Some("lowestamount") => BillSort::LowestAmount,
            _ => BillSort::Newest,
        }
    }

    /// Sort document for MongoDB. Ties fall back to insertion order,
    /// newest first.
    pub fn to_document(self) -> Document {
        match self {
            BillSort::Newest => doc! { "createdAt": -1, "_id": -1 },
            BillSort::HighestAmount => doc! { "totalAmount": -1, "_id": -1 },
            BillSort::LowestAmount => doc! { "totalAmount": 1, "_id": -1 },
        }
    }

    /// Same ordering as [`BillSort::to_document`], for bills held in memory.
    pub fn compare(self, a: &Bill, b: &Bill) -> std::cmp::Ordering {
        let primary = match self {
            BillSort::Newest => b.created_at.cmp(&a.created_at),
            BillSort::HighestAmount => b.total_amount.total_cmp(&a.total_amount),
            BillSort::LowestAmount => a.total_amount.total_cmp(&b.total_amount),
        };
        primary.then_with(|| b.id.cmp(&a.id))
    }
}
