//! Reads a genesis descriptor from stdin and writes the bridge response to stdout.

use std::io::{self, Read};
use std::process::ExitCode;

use arb_genesis_program::{calculate_state_root, BridgeResponse};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    // Read the input.
    let mut input = String::new();
    let response = match io::stdin().read_to_string(&mut input) {
        Ok(_) => calculate_state_root(&input),
        Err(err) => BridgeResponse::Error {
            error: format!("failed to read stdin: {err}"),
            fatal: false,
        },
    };

    // Print the response.
    match serde_json::to_string(&response) {
        Ok(json) => println!("{json}"),
        Err(err) => {
            error!(%err, "failed to encode response");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::from(response.exit_code())
}
