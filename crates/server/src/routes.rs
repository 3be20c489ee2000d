use std::path::PathBuf;
use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::catalog::CatalogService;

use crate::openapi::ApiDoc;

pub mod cars;

/// Mount point of the filesystem blob backend.
pub const BLOBS_PATH: &str = "/blobs";

#[derive(Clone)]
pub struct ServerState {
    pub catalog: Arc<CatalogService>,
    /// Cookie carrying the session token.
    pub cookie_name: String,
    pub max_body_bytes: usize,
    /// Served under `/blobs` when the filesystem backend is active.
    pub blob_dir: Option<PathBuf>,
}

impl ServerState {
    pub fn new(catalog: Arc<CatalogService>) -> Self {
        Self { catalog, cookie_name: "token".into(), max_body_bytes: 32 * 1024 * 1024, blob_dir: None }
    }
}

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: health, catalog, docs and blobs.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new().route("/health", get(health));

    let catalog = Router::new()
        .route("/cars", get(cars::list).post(cars::create))
        .route("/cars/:id", get(cars::get).patch(cars::update).delete(cars::delete))
        // 封面上限 10 MiB，超限应由校验报告而非传输层拒绝
        .layer(DefaultBodyLimit::max(state.max_body_bytes));

    let mut app = public
        .merge(catalog)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    if let Some(dir) = &state.blob_dir {
        app = app.nest_service(BLOBS_PATH, ServeDir::new(dir));
    }

    app.with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 失败（5xx 等）时以 ERROR 记录
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
