use std::sync::Arc;

use anyhow::Result;
use baas_core::files::FilesController;
use baas_core::{
    AccessPipeline, Adapters, AppConfig, FunctionRegistry, LiveQueryServer,
    PushDispatcher, TriggerRegistry,
};
use baas_storage::create_object_storage;
use tracing::info;

use crate::server::{ApiServer, AppState};

/// Wire storage, registries, adapters, and the pipeline from `config`.
pub fn build_state(config: &AppConfig) -> Result<AppState> {
    let storage = create_object_storage(&config.storage())?;
    let adapters = Adapters::from_config(&config.adapters())?;
    let server = config.server();

    let triggers = Arc::new(TriggerRegistry::new());
    let live_query = Arc::new(LiveQueryServer::new());
    let pipeline = Arc::new(AccessPipeline::with_storage(
        storage.clone(),
        triggers.clone(),
        live_query,
        server.server_url.clone(),
    ));
    let push = Arc::new(PushDispatcher::new(
        pipeline.clone(),
        adapters.push.clone(),
        storage.clone(),
    ));
    let files = Arc::new(FilesController::new(adapters.files.clone(), triggers));

    info!(app_id = %server.app_id, "application state ready");
    Ok(AppState {
        config: Arc::new(server),
        storage,
        pipeline,
        push,
        functions: Arc::new(FunctionRegistry::new()),
        files,
        analytics: adapters.analytics,
    })
}

pub fn build_api_server(config: &AppConfig) -> Result<ApiServer> {
    Ok(ApiServer::new(build_state(config)?))
}

/// Build a fully wired server from environment variables.
pub fn build_api_server_from_env() -> Result<ApiServer> {
    let config = AppConfig::load_from_env()?;
    build_api_server(&config)
}
