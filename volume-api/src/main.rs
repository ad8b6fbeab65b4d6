use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use volume_api::config::VolumeServiceConfig;
use volume_api::kubernetes::K8sClient;
use volume_api::logging::LoggingSetup;
use volume_api::shutdown::{GracefulShutdown, ShutdownCoordinator};
use volume_api::tenant::HttpTenantRegistry;
use volume_api::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().nth(1).as_deref() == Some("--print-config") {
        println!("{}", VolumeServiceConfig::generate_sample());
        return Ok(());
    }

    // Load configuration
    let config = VolumeServiceConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    // Logging stays active until the guard drops at the end of main
    let _log_guard = LoggingSetup::from_config(&config).init()?;
    info!("Configuration loaded successfully");
    for warning in &config.warnings {
        warn!("{}", warning);
    }

    if config.tenant_registry.shared_key.is_empty() {
        warn!("No tenant registry shared key configured");
    }

    let k8s = K8sClient::from_config(&config.kubernetes)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;
    info!(api_server = k8s.api_server(), "Kubernetes client ready");

    let tenants = HttpTenantRegistry::new(&config.tenant_registry)
        .map_err(|e| anyhow::anyhow!("Failed to create tenant registry client: {}", e))?;
    info!(url = %config.tenant_registry.url, "Tenant registry configured");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, Arc::new(tenants), Arc::new(k8s)));
    let app = build_router(state);

    let coordinator = ShutdownCoordinator::new();
    let graceful = GracefulShutdown::new(coordinator.clone());
    tokio::spawn(async move { coordinator.wait_for_signal().await });

    let listener = TcpListener::bind(&addr).await?;
    info!("Volume API listening on {}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(graceful.signal());

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e.into());
            }
        }
        _ = graceful.deadline() => {
            warn!("In-flight requests did not finish in time, exiting");
        }
    }

    info!("Shutdown complete");
    Ok(())
}
