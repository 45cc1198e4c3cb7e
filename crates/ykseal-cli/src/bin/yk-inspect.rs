//! yk-inspect: print the parameters of an RSA public key
//!
//! Usage:
//!   yk-inspect <public_key_file> [--json] [--config PATH]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use ykseal_cli::{bootstrap, finish, parse_args, CommonArgs};
use ykseal_crypto::{inspect_public_key, load_public_key};

#[derive(Parser, Debug)]
#[command(
    name = "yk-inspect",
    version,
    about = "Show modulus, exponent, size and fingerprint of an RSA public key"
)]
struct Cli {
    /// RSA public key (PEM, SPKI or PKCS#1)
    public_key_file: PathBuf,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let cli: Cli = parse_args();
    finish(run(cli))
}

fn run(cli: Cli) -> Result<()> {
    let config = bootstrap(&cli.common)?;

    let pem = std::fs::read(&cli.public_key_file)
        .with_context(|| format!("reading {}", cli.public_key_file.display()))?;
    let public_key = load_public_key(&pem)?;
    let summary = inspect_public_key(&public_key)?;

    if summary.bits != config.token.algorithm.modulus_bits() {
        tracing::warn!(
            bits = summary.bits,
            algorithm = %config.token.algorithm,
            "key size does not match the configured token algorithm"
        );
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Modulus:     {}", summary.modulus);
        println!("Exponent:    {}", summary.exponent);
        println!("Bits:        {}", summary.bits);
        println!("Bytes:       {}", summary.bytes);
        println!("Fingerprint: SHA256:{}", summary.fingerprint);
    }
    Ok(())
}
