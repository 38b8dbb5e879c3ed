use crate::config::{BillConfig, StoreBackend};
use crate::services::{BillService, BillStore, InMemoryBillStore, MongoDb, ReceiptOptions};
use crate::{build_router, AppState};
use service_core::error::AppError;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use tokio::net::TcpListener;

type Server = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    /// Opens the configured store and binds the listener. For MongoDB this
    /// connects and ensures indexes first.
    pub async fn build(config: BillConfig) -> Result<Self, AppError> {
        if config.store == StoreBackend::Memory {
            tracing::warn!("Using in-memory bill store, bills are lost on restart");
            return Self::build_with_store(config, Arc::new(InMemoryBillStore::new())).await;
        }

        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        Self::build_with_store(config, Arc::new(db)).await
    }

    /// Same as [`Application::build`] with a caller-supplied store.
    pub async fn build_with_store(
        config: BillConfig,
        store: Arc<dyn BillStore>,
    ) -> Result<Self, AppError> {
        let bills = BillService::new(store, ReceiptOptions::from(&config.receipt));
        let state = AppState {
            config: config.clone(),
            bills,
        };
        let app = build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(port, "Listening");

        let server = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .into_future();

        Ok(Self {
            port,
            server: Box::pin(server),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
