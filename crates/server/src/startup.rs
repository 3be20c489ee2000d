use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::Router;
use configs::{AppConfig, StorageBackend};
use dotenvy::dotenv;
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, ServerState};
use service::{
    auth::JwtCredentialVerifier,
    blob::{BlobStore, FilesystemBlobStore, HttpBlobStore},
    catalog::{CatalogService, Requirements, SeaOrmCarRepository},
    runtime,
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Wire the catalog service from configuration. Missing collaborator
/// settings do not fail startup; the requests that need them are refused.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<ServerState> {
    let requirements = Requirements::from_config(cfg);
    for setting in cfg.missing_settings() {
        warn!(service = "server", event = "setting_missing", setting, "dependent requests will answer ServiceMisconfigured");
    }

    let db = if requirements.database {
        models::db::connect_with_config(&cfg.database).await?
    } else {
        DatabaseConnection::Disconnected
    };

    let (blobs, blob_dir): (Arc<dyn BlobStore>, Option<PathBuf>) = match cfg.storage.backend {
        StorageBackend::Filesystem => {
            let store = FilesystemBlobStore::new(&cfg.storage.root, &cfg.storage.public_base_url).await?;
            let dir = store.root().to_path_buf();
            (Arc::new(store), Some(dir))
        }
        StorageBackend::Http => (Arc::new(HttpBlobStore::new(&cfg.storage.api_url, &cfg.storage.write_token)), None),
    };

    let catalog = CatalogService::new(
        Arc::new(SeaOrmCarRepository::new(db)),
        blobs,
        Arc::new(JwtCredentialVerifier::new(cfg.auth.token_secret.clone())),
    )
    .with_requirements(requirements);

    Ok(ServerState {
        catalog: Arc::new(catalog),
        cookie_name: cfg.auth.cookie_name.clone(),
        max_body_bytes: cfg.server.max_body_bytes,
        blob_dir,
    })
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();

    let cfg = AppConfig::load_or_env().map_err(|e| StartupError::InvalidConfig(format!("{e:#}")))?;
    runtime::ensure_storage(&cfg.storage)
        .await
        .map_err(|e| StartupError::Runtime(e.to_string()))?;

    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!(%addr, backend = ?cfg.storage.backend, "starting car catalog server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
