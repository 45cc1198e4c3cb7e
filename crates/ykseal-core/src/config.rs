use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SealError, SealResult};
use crate::types::{Algorithm, KeySlot};

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct YksealConfig {
    pub log: LogConfig,
    pub token: TokenConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level / EnvFilter directive (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

/// Which private-key backend `yk-decrypt` talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// PIV hardware token (requires the `piv` feature)
    #[default]
    Piv,
    /// PEM private key on disk, for testing without a device
    Software,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub backend: BackendKind,
    /// Algorithm of the token-resident key (default: rsa2048)
    pub algorithm: Algorithm,
    /// PIV slot holding the key (default: 9a)
    pub slot: KeySlot,
    /// Environment variable holding the PIN (default: YKSEAL_PIN)
    pub pin_env: String,
    /// Prompt for the PIN on the terminal if `pin_env` is unset
    pub prompt_pin: bool,
    /// Private key PEM used by the software backend
    pub software_key: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Piv,
            algorithm: Algorithm::Rsa2048,
            slot: KeySlot::Authentication,
            pin_env: "YKSEAL_PIN".into(),
            prompt_pin: false,
            software_key: None,
        }
    }
}

impl TokenConfig {
    pub fn validate(&self) -> SealResult<()> {
        if self.backend == BackendKind::Software && self.software_key.is_none() {
            return Err(SealError::Config(
                "token.backend = \"software\" requires token.software_key".into(),
            ));
        }
        if self.pin_env.is_empty() {
            return Err(SealError::Config("token.pin_env must not be empty".into()));
        }
        Ok(())
    }
}

impl YksealConfig {
    /// Load from `path`, falling back to defaults when the file does not exist.
    ///
    /// Only syntax is checked; call [`TokenConfig::validate`] before using the token.
    pub fn load(path: &Path) -> SealResult<Self> {
        if !path.exists() {
            tracing::warn!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| SealError::io(path, e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| SealError::Config(format!("parsing {}: {e}", path.display())))?;
        Ok(config)
    }
}
