//! yk-encrypt: seal a file for the holder of a token-resident RSA key
//!
//! Usage:
//!   yk-encrypt <plaintext_input> <public_key_file> <encrypted_output> [--config PATH]

use anyhow::Result;
use clap::Parser;
use rand::rngs::OsRng;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use ykseal_cli::{bootstrap, finish, parse_args, CommonArgs};
use ykseal_crypto::{encrypt_file, EncryptRequest};

#[derive(Parser, Debug)]
#[command(
    name = "yk-encrypt",
    version,
    about = "Encrypt a file to an envelope only the token holder can open"
)]
struct Cli {
    /// File to encrypt
    plaintext_input: PathBuf,

    /// Recipient RSA public key (PEM)
    public_key_file: PathBuf,

    /// Where to write the envelope
    encrypted_output: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let cli: Cli = parse_args();
    finish(run(cli))
}

fn run(cli: Cli) -> Result<()> {
    let config = bootstrap(&cli.common)?;

    let report = encrypt_file(
        &EncryptRequest {
            input: &cli.plaintext_input,
            public_key: &cli.public_key_file,
            output: &cli.encrypted_output,
            algorithm: config.token.algorithm,
        },
        &mut OsRng,
    )?;

    info!(
        output = %cli.encrypted_output.display(),
        bytes_in = report.bytes_in,
        bytes_out = report.bytes_out,
        wrapped_key_len = report.wrapped_key_len,
        "encrypted"
    );
    Ok(())
}
