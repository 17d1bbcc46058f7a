//! Claim relay binary

use clap::Parser;
use drop_claim::logging::{init_logging, LogFormat, LoggingConfig};
use drop_claim::{router, ClaimConfig, ClaimService, EvmClaimClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

/// Claim relay CLI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file path (TOML, YAML or JSON); environment variables override it
    #[arg(short, long)]
    config: Option<String>,

    /// Server address
    #[arg(long)]
    server_addr: Option<String>,

    /// RPC URL
    #[arg(long)]
    rpc_url: Option<String>,

    /// Log format: pretty, compact or json
    #[arg(long, default_value = "pretty")]
    log_format: String,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    init_logging(&LoggingConfig {
        level: if args.debug { "debug".to_string() } else { "info".to_string() },
        format: LogFormat::from(args.log_format.as_str()),
        ..Default::default()
    })?;

    info!("Starting Drop Claim Relay v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = match args.config {
        Some(path) => ClaimConfig::from_file(&path)?.with_env_overrides(),
        None => ClaimConfig::from_env(),
    };

    // Override with CLI arguments
    if let Some(addr) = args.server_addr {
        config.server_addr = addr;
    }

    if let Some(rpc_url) = args.rpc_url {
        config.rpc_url = rpc_url;
    }

    info!("Configuration:");
    info!("  Server address: {}", config.server_addr);
    info!("  RPC URL: {}", config.rpc_url);
    info!("  Chain ID: {}", config.chain_id);
    info!("  Drop address: {}", config.drop_address);
    info!("  Token decimals: {}", config.token_decimals);
    info!("  Value per unit: {} wei", config.claim_value_wei_per_unit);
    info!("  Auth required: {}", config.auth_required());

    if config.private_key.is_none() {
        warn!("PRIVATE_KEY is not set; claims will fail until it is configured");
    }
    if !config.auth_required() {
        warn!("SIGNER_SECRET is not set; the claim endpoint is open");
    }

    let addr: SocketAddr = config.server_addr.parse()?;
    let cors_enabled = config.cors_enabled;

    let service = Arc::new(ClaimService::new(config, Arc::new(EvmClaimClient::new())));
    if let Some(signer) = service.get_status().signer {
        info!("  Signer: {}", signer);
    }

    let mut app = router(service);

    if cors_enabled {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        app = app.layer(cors);
        info!("CORS enabled");
    }

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down gracefully");
    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }
}
