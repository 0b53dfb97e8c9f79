mod api;
mod constants;

use api::{create_router, mine_and_insert, AppState};
use clap::Parser;
use constants::{DEFAULT_HOST, DEFAULT_PORT};
use ledger_core::{
    constants::POW_TARGET_DIFFICULTY, ensure_reachable, CancelToken, Ledger, LedgerConfig,
};
use std::net::SocketAddr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ledger-node")]
#[command(about = "Single-node proof-of-work ledger over HTTP")]
struct Args {
    /// Port to listen on
    #[arg(default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Interface to bind, e.g. 127.0.0.1
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Leading zero hex characters required of a block's proof hash
    #[arg(long, default_value_t = POW_TARGET_DIFFICULTY, value_parser = parse_difficulty)]
    difficulty: usize,

    /// Reject blocks whose stored hash does not match their contents
    #[arg(long)]
    verify_identity: bool,

    /// Mine a genesis block carrying this value before serving
    #[arg(long)]
    genesis: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = LedgerConfig {
        difficulty: args.difficulty,
        verify_identity: args.verify_identity,
        ..LedgerConfig::default()
    };
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let self_address = format!("http://{addr}");
    info!("registered self address {self_address}");

    let state = AppState::new(Ledger::with_config(config), self_address);

    if let Some(value) = args.genesis {
        let genesis = mine_and_insert(&state, None, value).await?;
        info!("genesis block {} ready", genesis.hash);
    }

    let app = create_router(state.clone());
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal(state.cancel.clone()))
        .await?;
    Ok(())
}

fn parse_difficulty(s: &str) -> Result<usize, String> {
    let difficulty: usize = s.parse().map_err(|e| format!("{e}"))?;
    ensure_reachable(difficulty).map_err(|e| e.to_string())?;
    Ok(difficulty)
}

async fn shutdown_signal(cancel: CancelToken) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for ctrl-c: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested, cancelling mining");
    cancel.cancel();
}
