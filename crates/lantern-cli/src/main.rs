//! Command-line verifier for Lantern proof artifacts.
//!
//! Reads an SSZ artifact from a file (or stdin with `-`) and verifies it.
//! When a 0x-prefixed 32-byte block hash is supplied, it is used as the
//! claimed data (union variant 1). Exits 0 when the proof is valid, 1
//! otherwise.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;

use lantern_core::{verify_request, verify_with_blockhash, FileStorage, SyncStore, Verification};

#[derive(Parser)]
#[command(name = "lantern-verify", about = "Verify a Lantern proof artifact")]
struct Args {
    /// Path of the SSZ artifact, or `-` for stdin.
    artifact: String,

    /// Claimed block hash (0x-prefixed, 32 bytes).
    blockhash: Option<String>,

    /// Chain the artifact belongs to.
    #[arg(long, default_value_t = 1)]
    chain_id: u64,

    /// Directory of the persisted sync-committee state.
    #[arg(long)]
    states_dir: Option<PathBuf>,

    /// How many sync-committee periods to retain.
    #[arg(long, default_value_t = 3)]
    max_sync_states: u32,
}

fn read_artifact(path: &str) -> Result<Vec<u8>> {
    if path == "-" {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .context("reading artifact from stdin")?;
        Ok(data)
    } else {
        std::fs::read(path).with_context(|| format!("reading artifact from {path}"))
    }
}

fn parse_blockhash(input: &str) -> Result<[u8; 32]> {
    let Some(stripped) = input.strip_prefix("0x") else {
        bail!("invalid blockhash: missing 0x prefix");
    };
    let bytes = hex::decode(stripped).context("invalid blockhash")?;
    bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("invalid blockhash: expected 32 bytes"))
}

fn run(args: &Args) -> Result<Verification> {
    let artifact = read_artifact(&args.artifact)?;
    let storage = FileStorage::new(args.states_dir.clone()).context("opening state storage")?;
    let mut store = SyncStore::new(Box::new(storage), args.max_sync_states);

    let verification = match &args.blockhash {
        Some(hash) => {
            let blockhash = parse_blockhash(hash)?;
            verify_with_blockhash(&mut store, &artifact, blockhash, args.chain_id)
        }
        None => verify_request(
            &mut store,
            &artifact,
            "",
            &serde_json::Value::Null,
            None,
            args.chain_id,
        ),
    };
    Ok(verification)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let verification = match run(&args) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    if verification.success {
        println!("proof is valid");
        ExitCode::SUCCESS
    } else {
        let reason = verification
            .error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string());
        println!("proof is invalid: {reason}");
        if let Some(first) = verification.first_missing_period {
            println!("first missing period: {first}");
        }
        if let Some(last) = verification.last_missing_period {
            println!("last missing period: {last}");
        }
        ExitCode::FAILURE
    }
}
