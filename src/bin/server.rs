//! AtlasLog Server Binary
//!
//! Starts the TCP server for AtlasLog.

use std::sync::Arc;

use atlaslog::network::Server;
use atlaslog::{AppendLog, Config};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// AtlasLog Server
#[derive(Parser, Debug)]
#[command(name = "atlaslog-server")]
#[command(about = "Durable append-only commit log")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./atlaslog_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Number of connection worker threads
    #[arg(short, long, default_value = "8")]
    workers: usize,

    /// Largest accepted record in KB
    #[arg(short = 'r', long, default_value = "16384")]
    max_record_kb: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atlaslog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("AtlasLog Server v{}", atlaslog::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .worker_threads(args.workers)
        .max_record_size(args.max_record_kb * 1024)
        .build();

    // Open log
    let log = match AppendLog::open(&config) {
        Ok(log) => Arc::new(log),
        Err(e) => {
            tracing::error!("Failed to open log: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Log initialized with {} records", log.len());

    // Start server
    let server = match Server::bind(config, Arc::clone(&log)) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    // Ctrl+C stops the accept loop; run() returns once workers drain
    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Received Ctrl+C, initiating shutdown...");
        shutdown.shutdown();
    }) {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
    drop(server);

    // Workers have exited, so this is the last reference
    match Arc::try_unwrap(log) {
        Ok(log) => {
            if let Err(e) = log.close() {
                tracing::error!("Failed to close log: {}", e);
                std::process::exit(1);
            }
        }
        Err(_) => tracing::warn!("Log still shared at shutdown; skipping close"),
    }

    tracing::info!("Server stopped");
}
