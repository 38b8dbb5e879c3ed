use crate::models::Bill;
use mongodb::{
    bson::doc, options::IndexOptions, Client as MongoClient, Collection, Database, IndexModel,
};
use service_core::error::AppError;

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for bill-service");

        let bills = self.bills();

        // Default listing order
        let created_at_index = IndexModel::builder()
            .keys(doc! { "createdAt": -1 })
            .options(
                IndexOptions::builder()
                    .name("created_at_desc".to_string())
                    .build(),
            )
            .build();

        bills.create_index(created_at_index, None).await.map_err(|e| {
            tracing::error!("Failed to create createdAt index on bills collection: {}", e);
            AppError::from(e)
        })?;
        tracing::info!("Created index on bills.createdAt");

        // Amount sorts
        let total_amount_index = IndexModel::builder()
            .keys(doc! { "totalAmount": 1 })
            .options(
                IndexOptions::builder()
                    .name("total_amount".to_string())
                    .build(),
            )
            .build();

        bills
            .create_index(total_amount_index, None)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to create totalAmount index on bills collection: {}",
                    e
                );
                AppError::from(e)
            })?;
        tracing::info!("Created index on bills.totalAmount");

        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    pub fn bills(&self) -> Collection<Bill> {
        self.db.collection("bills")
    }

    pub fn client(&self) -> &MongoClient {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}
