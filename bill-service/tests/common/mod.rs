#![allow(dead_code)]

use bill_service::config::{BillConfig, MongoConfig, ReceiptConfig, StoreBackend};
use bill_service::services::MongoDb;
use bill_service::startup::Application;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub client: reqwest::Client,
    pub db: Option<(MongoDb, String)>,
}

pub fn test_config() -> BillConfig {
    BillConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            ..CoreConfig::default()
        },
        store: StoreBackend::Memory,
        mongodb: MongoConfig {
            uri: std::env::var("MONGODB_URI")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database: format!("bill_test_{}", Uuid::new_v4().simple()),
        },
        receipt: ReceiptConfig {
            title: "Bill Receipt".to_string(),
            currency_symbol: "Rs.".to_string(),
        },
        otlp_endpoint: None,
        allowed_origins: vec!["*".to_string()],
    }
}

impl TestApp {
    /// Serves the full router over the in-memory store selected by config.
    pub async fn spawn() -> Self {
        let app = Application::build(test_config())
            .await
            .expect("Failed to build test application");
        Self::start(app, None).await
    }

    /// Serves the full router over a fresh MongoDB database.
    pub async fn spawn_with_mongo() -> Self {
        let config = BillConfig {
            store: StoreBackend::Mongo,
            ..test_config()
        };
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .expect("Failed to connect to MongoDB");
        db.initialize_indexes()
            .await
            .expect("Failed to create indexes");
        let db_name = config.mongodb.database.clone();

        let app = Application::build_with_store(config, Arc::new(db.clone()))
            .await
            .expect("Failed to build test application");
        Self::start(app, Some((db, db_name))).await
    }

    async fn start(app: Application, db: Option<(MongoDb, String)>) -> Self {
        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            client,
            db,
        }
    }

    pub async fn post_bill(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/api/create", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates a bill and returns its id, failing the test otherwise.
    pub async fn create_bill(&self, body: &Value) -> String {
        let response = self.post_bill(body).await;
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["data"]["id"]
            .as_str()
            .expect("created bill has an id")
            .to_string()
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Drops the MongoDB test database, if any.
    pub async fn cleanup(&self) {
        if let Some((db, name)) = &self.db {
            let _ = db.client().database(name).drop(None).await;
        }
    }
}

pub fn sample_bill() -> Value {
    serde_json::json!({
        "customerName": "asha rao",
        "items": [
            { "name": "pen", "quantity": 2, "price": 10, "discount": 10 },
            { "name": "notebook", "quantity": 1, "price": 50 }
        ]
    })
}
