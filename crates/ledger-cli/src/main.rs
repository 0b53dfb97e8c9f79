use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use ledger_core::{
    constants::POW_TARGET_DIFFICULTY, ensure_reachable, Block, CancelToken, Ledger, LedgerConfig,
    RestoreReport, SystemClock,
};
use serde::Serialize;
use std::{
    io::Read,
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the proof-of-work ledger node")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build and mine a block locally, printing its canonical JSON
    Mine {
        #[arg(long)]
        height: u32,
        /// Parent block hash ("0" for genesis)
        #[arg(long)]
        parent: String,
        #[arg(long, default_value = "")]
        value: String,
        #[arg(long, default_value_t = POW_TARGET_DIFFICULTY, value_parser = parse_difficulty)]
        difficulty: usize,
    },
    /// Replay a snapshot file into a fresh ledger and report what was dropped
    Verify {
        file: PathBuf,
        #[arg(long, default_value_t = POW_TARGET_DIFFICULTY, value_parser = parse_difficulty)]
        difficulty: usize,
        /// Also check every stored hash against the block contents
        #[arg(long)]
        strict: bool,
    },
    /// Print the node's ledger snapshot
    Chain {
        /// Node base URL (e.g. http://127.0.0.1:6689)
        #[arg(long, default_value = "http://127.0.0.1:6689")]
        node: String,
    },
    /// Submit a mined block (file path, or `-` for stdin)
    Submit {
        #[arg(long, default_value = "http://127.0.0.1:6689")]
        node: String,
        block: PathBuf,
    },
    /// Ask the node to mine a block on its tip, or on `--parent`
    MineRemote {
        #[arg(long, default_value = "http://127.0.0.1:6689")]
        node: String,
        #[arg(long)]
        value: String,
        #[arg(long)]
        parent: Option<String>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MineRequest {
    value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_hash: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .pretty()
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Mine {
            height,
            parent,
            value,
            difficulty,
        } => {
            let block = tokio::task::spawn_blocking(move || {
                mine_local(height, &parent, &value, difficulty, &CancelToken::new())
            })
            .await??;
            println!("{}", block.to_json()?);
        }
        Command::Verify {
            file,
            difficulty,
            strict,
        } => {
            let config = LedgerConfig {
                difficulty,
                verify_identity: strict,
                ..LedgerConfig::default()
            };
            let (ledger, report) = verify_snapshot(&file, config)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            println!("length: {}, blocks: {}", ledger.length(), ledger.block_count());
            if !report.is_complete() {
                bail!("{} block(s) dropped on replay", report.rejected.len());
            }
        }
        Command::Chain { node } => {
            let body = reqwest::get(format!("{node}/chain")).await?.text().await?;
            println!("{body}");
        }
        Command::Submit { node, block } => {
            let json = read_input(&block)?;
            // fail early on anything that is not a block
            let parsed = Block::from_json(&json)?;
            info!("submitting block {} at height {}", parsed.hash, parsed.height);
            let res = reqwest::Client::new()
                .post(format!("{node}/blocks"))
                .header("content-type", "application/json")
                .body(json)
                .send()
                .await?;
            println!("status: {}", res.status());
            println!("{}", res.text().await?);
        }
        Command::MineRemote {
            node,
            value,
            parent,
        } => {
            let req = MineRequest {
                value,
                parent_hash: parent,
            };
            let res = reqwest::Client::new()
                .post(format!("{node}/mine"))
                .json(&req)
                .send()
                .await?;
            println!("status: {}", res.status());
            println!("{}", res.text().await?);
        }
    }
    Ok(())
}

fn parse_difficulty(s: &str) -> Result<usize, String> {
    let difficulty: usize = s.parse().map_err(|e| format!("{e}"))?;
    ensure_reachable(difficulty).map_err(|e| e.to_string())?;
    Ok(difficulty)
}

fn mine_local(
    height: u32,
    parent: &str,
    value: &str,
    difficulty: usize,
    cancel: &CancelToken,
) -> Result<Block> {
    let mut block = Block::new(height, parent, value, &SystemClock);
    block.mine(difficulty, &mut rand::thread_rng(), cancel)?;
    Ok(block)
}

fn verify_snapshot(path: &Path, config: LedgerConfig) -> Result<(Ledger, RestoreReport)> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    let (ledger, report) = Ledger::from_snapshot(&json, config)
        .with_context(|| format!("decoding snapshot {}", path.display()))?;
    info!(
        "replayed {}: {} admitted, {} rejected",
        path.display(),
        report.admitted,
        report.rejected.len()
    );
    Ok((ledger, report))
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}
