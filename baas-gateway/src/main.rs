use anyhow::Result;
use baas_core::AppConfig;
use baas_gateway::build_api_server;
use baas_observability::{TracingConfig, setup_tracing};
use clap::Command;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let _matches = Command::new("baas-gateway")
        .about("BaaS object store gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .get_matches();

    let config = AppConfig::load_from_env()?;
    setup_tracing(TracingConfig::from_env(
        "baas-gateway",
        &config.log_level,
        config.json_logs(),
    ))?;

    info!(
        storage = %config.storage_type,
        push = %config.push_adapter,
        files = %config.file_adapter,
        "starting gateway"
    );
    let server = build_api_server(&config)?;
    if let Err(e) = server.serve().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
