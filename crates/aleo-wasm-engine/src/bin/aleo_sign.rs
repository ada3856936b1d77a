//! aleo-sign: exercise the Aleo signer guest module end to end.
//!
//! Loads a guest WASM binary, generates a key pair, formats a random
//! payload, hashes it, signs the hash, recovers the payload, and writes a
//! report file.
//!
//! # Usage
//!
//! ```bash
//! aleo-sign aleo_guest.wasm --output report.txt
//! ```

use aleo_wasm_engine::{AleoRuntime, MAX_FORMAT_MESSAGE_CHUNKS};
use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;
use rand::RngCore;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Sign a randomly generated payload with the Aleo signer guest module.
#[derive(Parser, Debug)]
#[command(name = "aleo-sign")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the guest WASM binary
    #[arg(value_name = "GUEST_WASM")]
    guest: PathBuf,

    /// Payload size in bytes
    #[arg(short, long, default_value = "16384")]
    payload_size: usize,

    /// Report output path
    #[arg(short, long, default_value = "output.txt")]
    output: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_millis()
        .init();

    let mut payload = vec![0u8; args.payload_size];
    rand::thread_rng().fill_bytes(&mut payload);

    info!("loading guest module: {}", args.guest.display());
    let runtime = AleoRuntime::from_file(&args.guest)
        .with_context(|| format!("failed to load guest module {}", args.guest.display()))?;
    let mut session = runtime.new_session().context("failed to create session")?;

    let (key, address) = session.new_private_key().context("key generation failed")?;
    info!("generated address {address}");

    // Signed payloads always use the maximum encoding, so the message size
    // on the wire does not vary with the payload size.
    let message = session
        .format_message(&payload, MAX_FORMAT_MESSAGE_CHUNKS)
        .context("failed to format payload")?;
    let hash = session
        .hash_message(&message)
        .context("failed to hash payload")?;
    let hash_field = session
        .hash_message_to_string(&message)
        .context("failed to hash payload to a field literal")?;
    let signature = session
        .sign(&key, &hash)
        .context("failed to sign payload hash")?;
    let recovered = session
        .recover_message(&message)
        .context("failed to recover payload")?;

    let mut report = String::new();
    writeln!(report, "Private key = \"{key}\"")?;
    writeln!(report, "Address = \"{address}\"")?;
    writeln!(report, "Payload = \"{}\"", hex::encode(&payload))?;
    writeln!(
        report,
        "Formatted payload = \"{}\"",
        String::from_utf8_lossy(&message)
    )?;
    writeln!(report, "Payload hash = \"{}\"", hex::encode(&hash))?;
    writeln!(report, "Payload hash as field = \"{hash_field}\"")?;
    writeln!(
        report,
        "Recovered payload matches = {}",
        recovered.starts_with(&payload)
    )?;
    writeln!(report, "Signature = \"{signature}\"")?;

    std::fs::write(&args.output, report)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!("report written to {}", args.output.display());

    session.close();
    runtime.close();

    Ok(())
}
