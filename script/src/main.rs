use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use arb_genesis_primitives::genesis::{state_and_block_root_with_observer, Genesis, GenesisRoots};
use arb_genesis_primitives::observer::TracingObserver;
use arb_genesis_primitives::GenesisError;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// The version message for the genesis root calculator.
const VERSION_MESSAGE: &str = concat!(
    "arb-genesis",
    " (",
    env!("VERGEN_GIT_SHA"),
    " ",
    env!("VERGEN_BUILD_TIMESTAMP"),
    ")"
);

/// Computes the genesis state root and block hash of a rollup chain.
#[derive(Parser, Debug)]
#[command(version = VERSION_MESSAGE, about, long_about = None)]
pub struct GenesisArgs {
    /// Path to the genesis.json file.
    #[arg(short, long, env = "GENESIS_PATH")]
    genesis: PathBuf,

    /// Print the roots as a JSON object.
    #[arg(long)]
    json: bool,
}

fn read_genesis(path: &Path) -> Result<Genesis> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read genesis file {}", path.display()))?;
    info!(bytes = contents.len(), path = %path.display(), "read genesis file");
    serde_json::from_str(&contents).context("failed to parse genesis JSON")
}

fn run(args: &GenesisArgs) -> Result<GenesisRoots> {
    let genesis = read_genesis(&args.genesis)?;
    let roots = state_and_block_root_with_observer(&genesis, TracingObserver)?;
    Ok(roots)
}

fn render(roots: &GenesisRoots, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(roots)?);
    }
    Ok(format!(
        "State Root: {}\nBlock Hash: {}",
        roots.state_root, roots.block_hash
    ))
}

/// Fatal build failures exit with 2, everything else with 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<GenesisError>() {
        Some(err) if err.is_fatal() => 2,
        _ => 1,
    }
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout only carries the result.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse arguments.
    let args = GenesisArgs::parse();

    match run(&args).and_then(|roots| render(&roots, args.json)) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
