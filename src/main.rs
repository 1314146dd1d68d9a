use fcs_gateway::broker::adapter::Adapter;
use fcs_gateway::broker::memory::MemoryBus;
use fcs_gateway::config::Settings;
use fcs_gateway::corpus::ResourceRegistry;
use fcs_gateway::protocol::handlers::{handle_fcs, handle_health};
use fcs_gateway::protocol::Gateway;

use axum::routing::get;
use axum::{Extension, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("fcs-gateway.toml");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                config_path = PathBuf::from(&args[i + 1]);
                i += 2;
            }
            "--help" | "-h" => {
                eprintln!("Usage: {} [--config <path>]", args[0]);
                eprintln!("Example: {} --config /etc/fcs-gateway.toml", args[0]);
                return Ok(());
            }
            _ => {
                i += 1;
            }
        }
    }

    // 1. Configuration:
    let settings = match Settings::load(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(
                path = %config_path.display(),
                error = %e,
                "failed to load configuration"
            );
            std::process::exit(1);
        }
    };
    tracing::info!(
        path = %config_path.display(),
        resources = settings.resources.len(),
        "configuration loaded"
    );

    let cancel = CancellationToken::new();

    // 2. Work broker:
    let bus = Arc::new(MemoryBus::new());
    let adapter = Arc::new(Adapter::new(
        bus,
        settings.broker.adapter_config(),
        cancel.clone(),
    ));
    if let Err(e) = adapter
        .test_connection(Duration::from_secs(20), Duration::from_secs(2))
        .await
    {
        tracing::error!(error = %e, "message bus did not answer the startup probe");
        std::process::exit(1);
    }

    // 3. Gateway state + HTTP router:
    let gateway = Arc::new(Gateway::new(
        settings.general_info(),
        ResourceRegistry::new(settings.resources.clone()),
        adapter,
    ));

    let app = Router::new()
        .route("/", get(handle_fcs))
        .route("/health", get(handle_health))
        .layer(Extension(gateway));

    // 4. Shutdown propagation:
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            shutdown.cancel();
        }
    });

    // 5. Serve:
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
    tracing::info!("HTTP server listening on {}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    Ok(())
}
