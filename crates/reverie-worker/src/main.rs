//! Media export worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use reverie_media::Encoder;
use reverie_storage::{S3Client, S3Publisher};
use reverie_store::RestStore;
use reverie_worker::{ExportCoordinator, ExportExecutor, WorkerConfig};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Failed to install rustls crypto provider");
        std::process::exit(1);
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("reverie=info".parse().expect("valid directive"))
        .add_directive("aws_config=warn".parse().expect("valid directive"))
        .add_directive("hyper=warn".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting reverie-worker");

    // Load configuration
    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    // Job store (REST-backed)
    let store = match RestStore::from_env() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to create job store: {}", e);
            std::process::exit(1);
        }
    };

    // Object storage and publisher
    let storage = match S3Client::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create storage client: {}", e);
            std::process::exit(1);
        }
    };
    let publisher = Arc::new(S3Publisher::new(storage, config.result_url_ttl));

    let encoder = Encoder::new(config.encode_timeout);

    let coordinator = match ExportCoordinator::new(
        store.clone() as Arc<dyn reverie_store::JobStore>,
        publisher,
        encoder,
        config.clone(),
    ) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Failed to create coordinator: {}", e);
            std::process::exit(1);
        }
    };

    let executor = Arc::new(ExportExecutor::new(
        config,
        store as Arc<dyn reverie_store::JobStore>,
        coordinator,
    ));

    // Setup signal handler: first Ctrl-C starts a graceful drain
    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        signal_executor.shutdown();
    });

    // Run executor
    if let Err(e) = executor.run().await {
        error!("Executor error: {}", e);
        std::process::exit(1);
    }

    info!("Worker shutdown complete");
}
