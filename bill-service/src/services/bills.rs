//! Bill use cases: validate, calculate and persist; fetch, list, replace,
//! delete; render receipts. Handlers call into [`BillService`] and turn
//! [`BillError`] into the response envelope.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{json, Value};
use service_core::response::{ApiResponse, Payload};
use thiserror::Error;
use tracing::{instrument, Span};

use super::calculator::{self, ValidationIssue};
use super::metrics::{
    BILLS_CREATED, BILLS_DELETED, BILLS_UPDATED, RECEIPT_RENDER_DURATION, VALIDATION_FAILURES,
};
use super::receipt::{self, ReceiptError, ReceiptOptions};
use super::store::{BillStore, StoreError};
use crate::dtos::{BillInput, BillListResponse, BillResponse, ListBillsParams, Pagination};
use crate::models::{Bill, BillDraft};

#[derive(Debug, Error)]
pub enum BillError {
    #[error("Input validation failed: {} issue(s)", .0.len())]
    InvalidInput(Vec<ValidationIssue>),

    #[error("Malformed JSON body: {0}")]
    MalformedBody(String),

    #[error("Storage validation failed: {0:?}")]
    SchemaRejected(Vec<String>),

    #[error("Invalid bill ID: {0}")]
    InvalidId(String),

    #[error("Bill not found")]
    NotFound,

    #[error("Failed to generate receipt: {0}")]
    Render(#[from] ReceiptError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for BillError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidId(id) => BillError::InvalidId(id),
            StoreError::Validation(messages) => BillError::SchemaRejected(messages),
            StoreError::Database(e) => BillError::Internal(e),
        }
    }
}

impl From<JsonRejection> for BillError {
    fn from(rejection: JsonRejection) -> Self {
        BillError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for BillError {
    fn into_response(self) -> Response {
        let body = match &self {
            BillError::InvalidInput(issues) => {
                tracing::warn!(issues = issues.len(), "Bill input rejected");
                ApiResponse::failure(StatusCode::BAD_REQUEST, "Input validation failed")
                    .with_errors(issues.iter().map(issue_value).collect())
            }
            BillError::MalformedBody(message) => {
                tracing::warn!(error = %message, "Malformed JSON body");
                ApiResponse::failure(StatusCode::BAD_REQUEST, "JSON body error")
                    .with_errors(vec![json!({ "message": message })])
            }
            BillError::SchemaRejected(messages) => {
                tracing::warn!(?messages, "Bill rejected by storage validation");
                ApiResponse::failure(StatusCode::BAD_REQUEST, "Storage validation failed")
                    .with_errors(messages.iter().cloned().map(Value::String).collect())
            }
            BillError::InvalidId(id) => {
                tracing::warn!(bill_id = %id, "Invalid bill ID");
                let mut body = ApiResponse::failure(StatusCode::BAD_REQUEST, "Invalid bill ID");
                body.data = Payload::Value(Some(json!({ "input": id })));
                body
            }
            BillError::NotFound => {
                let mut body = ApiResponse::failure(StatusCode::NOT_FOUND, "Bill not found");
                body.data = Payload::Value(None);
                body
            }
            BillError::Render(err) => {
                tracing::error!(error = ?err, "Receipt generation failed");
                ApiResponse::failure(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate receipt",
                )
            }
            BillError::Internal(err) => {
                tracing::error!(error = ?err, "Unhandled server error");
                ApiResponse::failure(StatusCode::INTERNAL_SERVER_ERROR, "Server error")
            }
        };
        body.into_response()
    }
}

fn issue_value(issue: &ValidationIssue) -> Value {
    serde_json::to_value(issue).unwrap_or_else(|_| json!({ "message": issue.message }))
}

/// A generated receipt and the bill it was generated from.
pub struct Receipt {
    pub bill_id: String,
    pub pdf: Vec<u8>,
}

#[derive(Clone)]
pub struct BillService {
    store: Arc<dyn BillStore>,
    receipt: ReceiptOptions,
}

impl BillService {
    pub fn new(store: Arc<dyn BillStore>, receipt: ReceiptOptions) -> Self {
        Self { store, receipt }
    }

    pub fn store(&self) -> &Arc<dyn BillStore> {
        &self.store
    }

    /// Runs validation and calculation, producing what gets stored.
    fn prepare(&self, input: &BillInput) -> Result<BillDraft, BillError> {
        let issues = calculator::validate(input.customer_name.as_ref(), input.items.as_ref());
        if !issues.is_empty() {
            metrics::counter!(VALIDATION_FAILURES).increment(1);
            return Err(BillError::InvalidInput(issues));
        }

        let items: &[Value] = match &input.items {
            Some(Value::Array(items)) => items.as_slice(),
            _ => &[],
        };
        let customer_name = input
            .customer_name
            .as_ref()
            .and_then(calculator::coerce_text)
            .unwrap_or_default();

        Ok(calculator::calculate(items).into_draft(&customer_name))
    }

    #[instrument(skip(self, input), fields(bill_id))]
    pub async fn create(&self, input: BillInput) -> Result<Bill, BillError> {
        let draft = self.prepare(&input)?;
        let bill = self.store.create(draft).await?;

        Span::current().record("bill_id", bill.id.to_hex());
        metrics::counter!(BILLS_CREATED).increment(1);
        tracing::info!(
            total_amount = bill.total_amount,
            items = bill.items.len(),
            "Bill created"
        );
        Ok(bill)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, bill_id: &str) -> Result<Bill, BillError> {
        self.store
            .find_by_id(bill_id)
            .await?
            .ok_or(BillError::NotFound)
    }

    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &ListBillsParams) -> Result<BillListResponse, BillError> {
        let page = params.page();
        let limit = params.limit();
        let limit_i64 = i64::try_from(limit).map_err(anyhow::Error::new)?;

        let result = self
            .store
            .find_page(params.sort(), params.skip(), limit_i64)
            .await?;

        tracing::debug!(page, limit, total = result.total, "Listed bills");
        Ok(BillListResponse {
            bills: result.bills.into_iter().map(BillResponse::from).collect(),
            pagination: Pagination::new(result.total, page, limit),
        })
    }

    /// Full replacement: items and totals are recomputed from `input`.
    #[instrument(skip(self, input))]
    pub async fn update(&self, bill_id: &str, input: BillInput) -> Result<Bill, BillError> {
        let draft = self.prepare(&input)?;
        let bill = self
            .store
            .update_by_id(bill_id, draft)
            .await?
            .ok_or(BillError::NotFound)?;

        metrics::counter!(BILLS_UPDATED).increment(1);
        tracing::info!(total_amount = bill.total_amount, "Bill updated");
        Ok(bill)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, bill_id: &str) -> Result<Bill, BillError> {
        let bill = self
            .store
            .delete_by_id(bill_id)
            .await?
            .ok_or(BillError::NotFound)?;

        metrics::counter!(BILLS_DELETED).increment(1);
        tracing::info!("Bill deleted");
        Ok(bill)
    }

    #[instrument(skip(self))]
    pub async fn receipt(&self, bill_id: &str) -> Result<Receipt, BillError> {
        let bill = self.get(bill_id).await?;
        let bill_id = bill.id.to_hex();

        let start = Instant::now();
        let pdf = receipt::render_async(bill, self.receipt.clone()).await?;
        metrics::histogram!(RECEIPT_RENDER_DURATION).record(start.elapsed().as_secs_f64());

        tracing::info!(bytes = pdf.len(), "Receipt generated");
        Ok(Receipt { bill_id, pdf })
    }
}
