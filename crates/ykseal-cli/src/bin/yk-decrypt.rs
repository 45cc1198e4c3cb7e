//! yk-decrypt: open an envelope with the private key held on a token
//!
//! Usage:
//!   yk-decrypt <encrypted_input> <decrypted_output> [--config PATH]
//!
//! The backend (YubiKey PIV or a software key) and the slot come from the
//! `[token]` section of the config file.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use ykseal_cli::{bootstrap, build_backend, finish, parse_args, resolve_pin, CommonArgs};
use ykseal_crypto::{decrypt_file, DecryptRequest};

#[derive(Parser, Debug)]
#[command(
    name = "yk-decrypt",
    version,
    about = "Decrypt an envelope using the private key on a token"
)]
struct Cli {
    /// Envelope produced by yk-encrypt
    encrypted_input: PathBuf,

    /// Where to write the recovered plaintext
    decrypted_output: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let cli: Cli = parse_args();
    finish(run(cli))
}

fn run(cli: Cli) -> Result<()> {
    let config = bootstrap(&cli.common)?;
    config
        .token
        .validate()
        .with_context(|| format!("checking [token] in {}", cli.common.config.display()))?;
    let backend = build_backend(&config.token)?;
    let pin = resolve_pin(&config.token)?;

    let report = decrypt_file(
        &DecryptRequest {
            input: &cli.encrypted_input,
            output: &cli.decrypted_output,
            algorithm: config.token.algorithm,
            slot: config.token.slot,
            pin: pin.as_ref(),
        },
        backend.as_ref(),
    )?;

    info!(
        output = %cli.decrypted_output.display(),
        token = %backend.describe(),
        bytes_in = report.bytes_in,
        bytes_out = report.bytes_out,
        wrapped_key_len = report.wrapped_key_len,
        "decrypted"
    );
    Ok(())
}
