//! LHC Server Binary
//!
//! Runs one device server until a client sends STOP.

use clap::Parser;
use lhc_server::{DeviceKind, Payload, Server, ServerConfig};
use tracing_subscriber::{fmt, EnvFilter};

/// LHC device server
#[derive(Parser, Debug)]
#[command(name = "lhc-server")]
#[command(about = "Command-and-control server for a laboratory device")]
#[command(version)]
struct Args {
    /// Server name, echoed in every reply
    #[arg(short, long, default_value = "lhc-server")]
    name: String,

    /// Endpoint to bind (tcp://host:port, '*' for every interface)
    #[arg(short, long, default_value = "tcp://*:5555")]
    address: String,

    /// Degrees of freedom of the device
    #[arg(short, long, default_value = "0")]
    freedom: u32,

    /// Device kind (motor, camera)
    #[arg(short, long, default_value = "motor")]
    device: String,

    /// Initial data snapshot as a JSON object
    #[arg(long)]
    data: Option<String>,

    /// Clear the data snapshot after each GET
    #[arg(long)]
    empty_after_get: bool,

    /// Receive poll interval in milliseconds
    #[arg(long, default_value = "100")]
    poll_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lhc_server=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!(
        "LHC Server v{} (protocol {})",
        lhc_server::VERSION,
        lhc_server::PROTOCOL_VERSION
    );

    let device: DeviceKind = match args.device.parse() {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(2);
        }
    };

    let initial_data = match args.data.as_deref().map(serde_json::from_str::<Payload>) {
        None => Payload::new(),
        Some(Ok(data)) => data,
        Some(Err(e)) => {
            tracing::error!("--data must be a JSON object: {}", e);
            std::process::exit(2);
        }
    };

    // Build config from args
    let config = ServerConfig::builder()
        .name(&args.name)
        .address(&args.address)
        .freedom(args.freedom)
        .device(device)
        .initial_data(initial_data)
        .empty_data_after_get(args.empty_after_get)
        .poll_interval_ms(args.poll_ms)
        .build();

    let server = match Server::new(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = server.start() {
        tracing::error!("Failed to start server: {}", e);
        std::process::exit(1);
    }

    // Runs until a client sends STOP
    if let Err(e) = server.wait() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
