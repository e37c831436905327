//! LHC CLI Client
//!
//! Sends one command to a server and prints the reply.

use clap::{Parser, Subcommand};
use lhc_server::Client;
use serde_json::Value;

/// LHC CLI
#[derive(Parser, Debug)]
#[command(name = "lhc-cli")]
#[command(about = "CLI for LHC device servers")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "tcp://127.0.0.1:5555")]
    server: String,

    /// Sender identifier
    #[arg(short, long, default_value = "lhc-cli")]
    from: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Device identity and capabilities
    Info,

    /// Liveness check
    Ping,

    /// Fetch the data snapshot
    Get,

    /// Send new positions
    Set {
        /// Positions as JSON (e.g. "[1.5, 2.0]")
        positions: String,
    },

    /// Send a saving path
    Save {
        /// The path to save to
        path: String,
    },

    /// Send device options
    Opt {
        /// Options as JSON
        data: String,
    },

    /// Stop the server
    Stop,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> lhc_server::Result<()> {
    let mut client = Client::connect(&args.server, args.from)?;

    let reply = match args.command {
        Commands::Info => client.info()?,
        Commands::Ping => client.ping()?,
        Commands::Get => client.get()?,
        Commands::Set { positions } => client.set_positions(parse_json(&positions)?)?,
        Commands::Save { path } => client.save(&path)?,
        Commands::Opt { data } => client.opt(parse_json(&data)?)?,
        Commands::Stop => client.stop()?,
    };

    println!("{}", serde_json::to_string_pretty(&reply)?);

    if reply.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_json(raw: &str) -> lhc_server::Result<Value> {
    Ok(serde_json::from_str(raw)?)
}
