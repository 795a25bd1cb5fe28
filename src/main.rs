//! Room server (default binary).
//!
//! Settings come from `BLOCKFALL_*` environment variables; flags override them.
//! Log verbosity follows `RUST_LOG` (default `info`).

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blockfall::server::{run_server, ServerConfig};

#[derive(Parser)]
#[command(name = "blockfall-server")]
#[command(about = "Multiplayer falling-block room server")]
struct Cli {
    /// Address to bind
    #[arg(long)]
    host: Option<String>,
    /// Port to bind (0 picks a free port)
    #[arg(long)]
    port: Option<u16>,
    /// Maximum players per room
    #[arg(long)]
    room_limit: Option<usize>,
    /// Pieces generated per sequence batch
    #[arg(long)]
    piece_batch: Option<usize>,
    /// Longest accepted message line in bytes
    #[arg(long)]
    max_line_bytes: Option<usize>,
    /// Fixed seed for piece generation
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let env = ServerConfig::from_env();
        ServerConfig {
            host: self.host.unwrap_or(env.host),
            port: self.port.unwrap_or(env.port),
            room_limit: self.room_limit.unwrap_or(env.room_limit),
            piece_batch: self.piece_batch.unwrap_or(env.piece_batch),
            max_line_bytes: self.max_line_bytes.unwrap_or(env.max_line_bytes),
            seed: self.seed.or(env.seed),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Cli::parse().into_config();
    tracing::info!(
        room_limit = config.room_limit,
        piece_batch = config.piece_batch,
        "starting room server"
    );
    run_server(config, None).await
}
