use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use pocket_engine::MockEngine;
use pocket_server::{run_server, AppState, ServerConfig};
use pocket_store::MemoryStore;
use tracing_subscriber::EnvFilter;

/// PocketLLM streaming inference server
#[derive(Parser)]
#[command(name = "pocket-server")]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "POCKET_ADDR", default_value = "127.0.0.1:8000")]
    addr: SocketAddr,

    /// Simulated latency per generated fragment, in milliseconds.
    #[arg(long, env = "POCKET_TOKEN_DELAY_MS", default_value_t = 100)]
    token_delay_ms: u64,

    /// Maximum number of engine streams running at once.
    #[arg(long, env = "POCKET_MAX_CONCURRENT_STREAMS", default_value_t = 64)]
    max_concurrent_streams: usize,

    /// Save prompt and replayed answer to history on cache hits too.
    #[arg(long, env = "POCKET_PERSIST_CACHE_HITS")]
    persist_cache_hits: bool,

    /// Tracing filter directive.
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    log_filter: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_filter)?)
        .init();

    let engine = Arc::new(MockEngine::with_delay(Duration::from_millis(
        cli.token_delay_ms,
    )));
    let store = Arc::new(MemoryStore::new());

    let config = ServerConfig::new()
        .with_max_concurrent_streams(cli.max_concurrent_streams)
        .with_persist_cache_hits(cli.persist_cache_hits);

    let state = AppState::new(engine, store, config);

    tracing::info!(
        token_delay_ms = cli.token_delay_ms,
        max_concurrent_streams = cli.max_concurrent_streams,
        persist_cache_hits = cli.persist_cache_hits,
        "starting pocket-server on {}",
        cli.addr
    );
    run_server(state, cli.addr).await?;
    Ok(())
}
