//! Shared plumbing for the ykseal binaries: argument parsing, config
//! loading, logging setup, PIN resolution and token backend selection.

use anyhow::{Context, Result};
use clap::{Args, Parser};
use secrecy::SecretString;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, warn};

use ykseal_core::config::{BackendKind, TokenConfig, YksealConfig};
use ykseal_core::SealError;
use ykseal_crypto::{SoftwareToken, TokenBackend};

/// Flags every ykseal binary accepts.
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Path to ykseal config.toml
    #[arg(
        long,
        short = 'c',
        env = "YKSEAL_CONFIG",
        default_value = "/etc/ykseal/config.toml"
    )]
    pub config: PathBuf,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(long, env = "YKSEAL_LOG")]
    pub log: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    pub fn from_config(value: &str) -> Result<Self> {
        match value {
            "json" => Ok(Self::Json),
            "text" => Ok(Self::Text),
            other => Err(SealError::Config(format!(
                "log.format must be \"text\" or \"json\", got {other:?}"
            ))
            .into()),
        }
    }
}

/// Parse arguments, exiting with status 1 on any usage error.
///
/// `--help` and `--version` still exit 0.
pub fn parse_args<P: Parser>() -> P {
    match P::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(1);
        }
        Err(e) => e.exit(),
    }
}

/// Load the config file and install the tracing subscriber.
///
/// `[token]` is not validated here; only `yk-decrypt` needs a usable token.
pub fn bootstrap(common: &CommonArgs) -> Result<YksealConfig> {
    let config = YksealConfig::load(&common.config)
        .with_context(|| format!("loading config {}", common.config.display()))?;
    let level = common.log.as_deref().unwrap_or(&config.log.level);
    init_logging(level, LogFormat::from_config(&config.log.format)?);

    // The loader's own warning fires before any subscriber exists.
    if !common.config.exists() {
        warn!(
            "config file not found: {}  (using defaults)",
            common.config.display()
        );
    }
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        config = %common.config.display(),
        backend = ?config.token.backend,
        algorithm = %config.token.algorithm,
        slot = %config.token.slot,
        "configuration loaded"
    );
    Ok(config)
}

pub fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let ansi = std::io::stderr().is_terminal();

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(ansi).with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Turn the outcome of a binary's `run` into its exit status.
pub fn finish(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(seal) = e.downcast_ref::<SealError>() {
                debug!(kind = seal.kind(), "invocation failed");
            }
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

/// PIN from the configured environment variable, else a terminal prompt
/// when `prompt_pin` is set, else none.
pub fn resolve_pin(token: &TokenConfig) -> Result<Option<SecretString>> {
    if let Ok(pin) = std::env::var(&token.pin_env) {
        debug!(source = %token.pin_env, "PIN taken from environment");
        return Ok(Some(SecretString::from(pin)));
    }
    if token.prompt_pin {
        let pin = rpassword::prompt_password(format!("PIN for slot {}: ", token.slot))
            .context("reading PIN from terminal")?;
        return Ok(Some(SecretString::from(pin)));
    }
    Ok(None)
}

/// Construct the private-key backend named by `[token].backend`.
pub fn build_backend(token: &TokenConfig) -> Result<Box<dyn TokenBackend>> {
    match token.backend {
        BackendKind::Software => {
            let path = token.software_key.as_deref().ok_or_else(|| {
                SealError::Config("token.backend = \"software\" requires token.software_key".into())
            })?;
            let backend = SoftwareToken::from_pem_file(path, token.slot)
                .with_context(|| format!("loading software key {}", path.display()))?;
            Ok(Box::new(backend))
        }
        BackendKind::Piv => piv_backend(),
    }
}

#[cfg(feature = "piv")]
fn piv_backend() -> Result<Box<dyn TokenBackend>> {
    Ok(Box::new(ykseal_crypto::token::PivToken::new()))
}

#[cfg(not(feature = "piv"))]
fn piv_backend() -> Result<Box<dyn TokenBackend>> {
    Err(SealError::Config(
        "token.backend = \"piv\" needs a build with the `piv` feature".into(),
    )
    .into())
}
