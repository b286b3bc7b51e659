//! `jsbind` — one request in on stdin, one JSON response out on stdout.
//!
//! This is the process entrypoint. Built natively it is the command-line
//! fallback; built for `wasm32-wasip1` it is the WASM module hosts drive over
//! stdio (only the in-process OXC engine exists there).
//!
//! ## Usage
//!
//! ```sh
//! # Transform TypeScript
//! echo '{"command":"transform","input":"let n: number = 1","options":{"loader":"ts"}}' | jsbind
//!
//! # Bundle an entry point to disk
//! echo '{"command":"build","options":{"entryPoints":["src/index.ts"],"outfile":"dist/out.js"}}' | jsbind
//!
//! # Force the in-process engine, read the request from a file
//! jsbind --engine oxc -i request.json
//!
//! # WASM build
//! cargo build -p jsbind-cli --target wasm32-wasip1 --release
//! ```
//!
//! Exit status is 0 whenever a response was written, including responses
//! that carry errors. Unreadable input or a request that is not a JSON object
//! prints to stderr and exits 1 with nothing on stdout.

use anyhow::{Context, Result};
use clap::Parser;
use jsbind_core::{api, Config, EngineKind};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "jsbind",
    version,
    about = "Run one JavaScript/TypeScript transform or build request from stdin"
)]
struct Cli {
    /// Engine to run: auto, oxc, or esbuild (overrides JSBIND_ENGINE)
    #[arg(long)]
    engine: Option<EngineKind>,

    /// Path to the esbuild executable (overrides JSBIND_ESBUILD)
    #[arg(long)]
    esbuild_path: Option<PathBuf>,

    /// Read the request from a file instead of stdin
    #[arg(short, long)]
    input: Option<String>,
}

fn main() -> Result<()> {
    // stdout carries the response, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    let engine = config.engine();
    tracing::debug!(engine = engine.name(), "engine selected");

    let raw = read_input(cli.input.as_deref())?;
    let response =
        api::handle_request(engine.as_ref(), &raw).context("Failed to handle request")?;
    let json = response
        .to_json()
        .context("Failed to write response JSON")?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(json.as_bytes())
        .context("Failed to write to stdout")?;
    stdout.flush().context("Failed to write to stdout")?;

    Ok(())
}

/// Environment first, then command-line flags on top.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::from_env().context("Invalid engine configuration")?;
    if let Some(engine) = cli.engine {
        config.engine = engine;
    }
    if let Some(path) = &cli.esbuild_path {
        config.esbuild_path = Some(path.clone());
    }
    Ok(config)
}

fn read_input(path: Option<&str>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path).with_context(|| format!("Failed to read file: {}", path)),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}
