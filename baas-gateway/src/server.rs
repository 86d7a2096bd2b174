use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use baas_core::analytics::AnalyticsAdapter;
use baas_core::config::ServerConfig;
use baas_core::files::FilesController;
use baas_core::{AccessPipeline, FunctionRegistry, PushDispatcher, TriggerRegistry};
use baas_storage::ObjectStorage;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tracing::{info, warn};

use crate::api::{cors_layer, handlers, trace_layer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub storage: Arc<dyn ObjectStorage>,
    pub pipeline: Arc<AccessPipeline>,
    pub push: Arc<PushDispatcher>,
    pub functions: Arc<FunctionRegistry>,
    pub files: Arc<FilesController>,
    pub analytics: Arc<dyn AnalyticsAdapter>,
}

impl AppState {
    pub fn triggers(&self) -> &Arc<TriggerRegistry> {
        self.pipeline.triggers()
    }
}

pub struct ApiServer {
    app: Router,
    state: AppState,
}

impl ApiServer {
    pub fn new(state: AppState) -> Self {
        let app = Router::new()
            .route("/v1/health", get(health_check))
            // Objects
            .route(
                "/v1/classes/{class_name}",
                get(handlers::find_objects).post(handlers::create_object),
            )
            .route(
                "/v1/classes/{class_name}/{object_id}",
                get(handlers::get_object)
                    .put(handlers::update_object)
                    .delete(handlers::delete_object),
            )
            // Push, functions, files
            .route("/v1/push", post(handlers::send_push))
            .route(
                "/v1/functions/{name}",
                post(handlers::call_function).get(handlers::call_function),
            )
            .route(
                "/v1/files/{filename}",
                post(handlers::upload_file)
                    .get(handlers::get_file)
                    .delete(handlers::delete_file),
            )
            // Config, sessions, analytics
            .route(
                "/v1/config",
                get(handlers::get_config).put(handlers::update_config),
            )
            .route("/v1/logout", post(handlers::logout))
            .route("/v1/events/{event_name}", post(handlers::track_event))
            .layer(ServiceBuilder::new().layer(trace_layer()).layer(cors_layer()))
            .with_state(state.clone());

        Self { app, state }
    }

    /// Shared services, e.g. to register hooks and functions before serving.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub async fn serve(self) -> anyhow::Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("BaaS gateway listening on {}", addr);
        info!("Health check available at: http://{}/v1/health", addr);

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    pub fn into_router(self) -> Router {
        self.app
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (status, healthy) = match state.storage.health().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(e) => {
            warn!(error = %e, "storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
        }
    };
    let body = json!({
        "status": healthy,
        "service": state.config.app_id,
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    (status, Json(body))
}
