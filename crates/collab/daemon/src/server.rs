//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::{DaemonConfig, StorageConfig};
use crate::error::{DaemonError, DaemonResult};
use collab_service::{BroadcastNotifier, CollaborationService};
use collab_storage::{CollabStorage, InMemoryCollabStorage};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Collaboration daemon server
pub struct Server {
    config: DaemonConfig,
    service: Arc<CollaborationService>,
    notifier: BroadcastNotifier,
}

impl Server {
    /// Create a new server with the given configuration
    pub async fn new(config: DaemonConfig) -> DaemonResult<Self> {
        let storage = open_storage(&config.storage).await?;

        for admin in &config.admins {
            storage.upsert_admin(admin.clone()).await?;
        }
        if !config.admins.is_empty() {
            tracing::info!(count = config.admins.len(), "seeded admin directory");
        }

        let notifier = BroadcastNotifier::new(config.workflow.notification_buffer);
        let service = Arc::new(CollaborationService::new(
            storage,
            Arc::new(notifier.clone()),
            config.workflow.clone(),
        ));

        Ok(Self {
            config,
            service,
            notifier,
        })
    }

    /// Run the server
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;

        let state = AppState::new(self.service.clone(), self.notifier.sender());
        let app = create_router(state, self.config.server.enable_cors);

        let listener = TcpListener::bind(addr).await?;

        tracing::info!("collab daemon listening on {}", addr);

        // Run server with graceful shutdown
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("collab daemon shutting down");
        Ok(())
    }
}

async fn open_storage(config: &StorageConfig) -> DaemonResult<Arc<dyn CollabStorage>> {
    match config {
        StorageConfig::Memory => {
            tracing::warn!("using in-memory storage; state is lost on restart");
            Ok(Arc::new(InMemoryCollabStorage::new()))
        }
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres {
            url,
            max_connections,
            connect_timeout_secs,
        } => {
            let storage = collab_storage::PostgresCollabStorage::connect_with_options(
                url,
                *max_connections,
                *connect_timeout_secs,
            )
            .await?;
            tracing::info!("connected to postgres storage");
            Ok(Arc::new(storage))
        }
        #[cfg(not(feature = "postgres"))]
        StorageConfig::Postgres { .. } => Err(DaemonError::Config(
            "postgres storage requires the `postgres` feature".to_string(),
        )),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
