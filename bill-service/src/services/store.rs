//! Bill persistence.
//!
//! [`BillStore`] is implemented by [`MongoDb`] for deployments and by
//! [`InMemoryBillStore`] for tests and `BILL_STORE=memory` runs. Both run
//! the storage shape-check on [`BillDraft`] before writing anything.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use thiserror::Error;
use validator::Validate;

use super::database::MongoDb;
use crate::models::{Bill, BillDraft, BillSort};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid bill id: {0}")]
    InvalidId(String),

    #[error("Bill failed storage validation: {0:?}")]
    Validation(Vec<String>),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Database(anyhow::Error::new(err))
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Database(anyhow::Error::new(err))
    }
}

/// One page of a listing plus the size of the whole collection.
#[derive(Debug, Clone, PartialEq)]
pub struct BillPage {
    pub bills: Vec<Bill>,
    pub total: u64,
}

#[async_trait]
pub trait BillStore: Send + Sync {
    async fn create(&self, draft: BillDraft) -> Result<Bill, StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Bill>, StoreError>;
    async fn find_page(&self, sort: BillSort, skip: u64, limit: i64)
        -> Result<BillPage, StoreError>;
    /// Replaces the contents of an existing bill. `created_at` is kept.
    async fn update_by_id(&self, id: &str, draft: BillDraft) -> Result<Option<Bill>, StoreError>;
    async fn delete_by_id(&self, id: &str) -> Result<Option<Bill>, StoreError>;
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Accepts exactly the 24-hex-digit ObjectId form.
pub fn parse_bill_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(id).map_err(|_| StoreError::InvalidId(id.to_string()))
}

fn shape_check(draft: &BillDraft) -> Result<(), StoreError> {
    draft
        .validate()
        .map_err(|e| StoreError::Validation(service_core::error::validation_messages(&e)))
}

#[async_trait]
impl BillStore for MongoDb {
    async fn create(&self, draft: BillDraft) -> Result<Bill, StoreError> {
        shape_check(&draft)?;
        let bill = Bill::new(draft);
        self.bills().insert_one(&bill, None).await?;
        Ok(bill)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Bill>, StoreError> {
        let id = parse_bill_id(id)?;
        Ok(self.bills().find_one(doc! { "_id": id }, None).await?)
    }

    async fn find_page(
        &self,
        sort: BillSort,
        skip: u64,
        limit: i64,
    ) -> Result<BillPage, StoreError> {
        let options = FindOptions::builder()
            .sort(sort.to_document())
            .skip(skip)
            .limit(limit)
            .build();

        let bills: Vec<Bill> = self
            .bills()
            .find(doc! {}, options)
            .await?
            .try_collect()
            .await?;
        let total = self.bills().count_documents(doc! {}, None).await?;

        Ok(BillPage { bills, total })
    }

    async fn update_by_id(&self, id: &str, draft: BillDraft) -> Result<Option<Bill>, StoreError> {
        let id = parse_bill_id(id)?;
        shape_check(&draft)?;

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .bills()
            .find_one_and_update(doc! { "_id": id }, draft.to_update_document()?, options)
            .await?)
    }

    async fn delete_by_id(&self, id: &str) -> Result<Option<Bill>, StoreError> {
        let id = parse_bill_id(id)?;
        Ok(self
            .bills()
            .find_one_and_delete(doc! { "_id": id }, None)
            .await?)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        MongoDb::health_check(self)
            .await
            .map_err(|e| StoreError::Database(anyhow::anyhow!("{}", e)))
    }
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryBillStore {
    bills: RwLock<HashMap<ObjectId, Bill>>,
}

impl InMemoryBillStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Database(anyhow::anyhow!("Bill store lock poisoned: {}", err))
}

#[async_trait]
impl BillStore for InMemoryBillStore {
    async fn create(&self, draft: BillDraft) -> Result<Bill, StoreError> {
        shape_check(&draft)?;
        let bill = Bill::new(draft);
        self.bills
            .write()
            .map_err(poisoned)?
            .insert(bill.id, bill.clone());
        Ok(bill)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Bill>, StoreError> {
        let id = parse_bill_id(id)?;
        Ok(self.bills.read().map_err(poisoned)?.get(&id).cloned())
    }

    async fn find_page(
        &self,
        sort: BillSort,
        skip: u64,
        limit: i64,
    ) -> Result<BillPage, StoreError> {
        let bills = self.bills.read().map_err(poisoned)?;
        let mut all: Vec<&Bill> = bills.values().collect();
        all.sort_by(|a, b| sort.compare(a, b));

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(BillPage {
            bills: all.into_iter().skip(skip).take(limit).cloned().collect(),
            total: bills.len() as u64,
        })
    }

    async fn update_by_id(&self, id: &str, draft: BillDraft) -> Result<Option<Bill>, StoreError> {
        let id = parse_bill_id(id)?;
        shape_check(&draft)?;

        let mut bills = self.bills.write().map_err(poisoned)?;
        Ok(bills.get_mut(&id).map(|bill| {
            bill.apply(draft);
            bill.clone()
        }))
    }

    async fn delete_by_id(&self, id: &str) -> Result<Option<Bill>, StoreError> {
        let id = parse_bill_id(id)?;
        Ok(self.bills.write().map_err(poisoned)?.remove(&id))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
