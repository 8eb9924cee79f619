//! Address book service entry point

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};

use addressbook::{
    auth::Argon2Hasher,
    config::Args,
    db::MongoClient,
    logging,
    server::{self, AppState},
    store::{DocumentUserStore, MemoryBackend, MongoBackend, UserStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Address Book");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    if !args.dev_mode {
        info!("MongoDB: {} / {}", args.mongodb_uri, args.mongodb_db);
        info!("User collection: {}", args.user_collection);
    }
    info!(
        "Argon2: {} KiB, {} iterations, {} lanes",
        args.hash_memory_kib, args.hash_iterations, args.hash_parallelism
    );
    info!("Request timeout: {} ms", args.request_timeout_ms);
    info!("======================================");

    let hasher = Arc::new(Argon2Hasher::new(args.hash_params())?);
    let codec = args.session_codec()?;

    let store: Arc<dyn UserStore> = if args.dev_mode {
        warn!("Development mode enabled - in-memory store, built-in token secret");
        Arc::new(DocumentUserStore::new(MemoryBackend::new(), hasher))
    } else {
        let mongo = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
        let backend = MongoBackend::new(&mongo, &args.user_collection).await?;
        Arc::new(DocumentUserStore::new(backend, hasher))
    };

    let state = Arc::new(AppState::new(store, codec, args.request_timeout()));

    tokio::select! {
        result = server::run(state, args.listen) => {
            if let Err(e) = result {
                error!("HTTP server error: {}", e);
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {}
    }

    info!("Address book stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutting down...");
}
