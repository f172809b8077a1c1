use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors raised while loading a [`Config`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Kademlia-facing parameters for [`guarantor_dht`], defaulting to the values this codebase's
/// design settled on (§6/§8 of the design notes): `ksize=20`, `alpha=3`, a 3 second RPC timeout,
/// and up to 5 retries.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DhtConfig {
    pub ksize: usize,
    pub alpha: usize,
    pub max_entries: usize,
    pub rpc_timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for DhtConfig {
    fn default() -> Self {
        Self {
            ksize: 20,
            alpha: 3,
            max_entries: 10_000,
            rpc_timeout_secs: 3,
            max_retries: 5,
        }
    }
}

/// Everything a `guarantor` node needs at startup: where its change store and signing key live,
/// the proof-of-work difficulty floor it enforces, and its DHT parameters.
///
/// Deserializable from TOML (`Config::from_toml_str`/`from_file`), with a handful of fields
/// overridable from the environment via [`Config::apply_env_overrides`] — the same
/// serde-first, TOML-or-env approach this codebase's other config-carrying entry points use.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub store_dir: PathBuf,
    pub difficulty: u32,
    pub keypair_path: PathBuf,
    pub dht: DhtConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from("./guarantor-store"),
            difficulty: 12,
            keypair_path: PathBuf::from("./guarantor.key"),
            dht: DhtConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Overrides `store_dir`/`difficulty`/`keypair_path` from `GUARANTOR_STORE_DIR`,
    /// `GUARANTOR_DIFFICULTY` and `GUARANTOR_KEYPAIR_PATH`, if set. DHT parameters are
    /// config-file-only: they are shared network policy, not per-deployment environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("GUARANTOR_STORE_DIR") {
            self.store_dir = PathBuf::from(dir);
        }
        if let Ok(difficulty) = std::env::var("GUARANTOR_DIFFICULTY") {
            if let Ok(difficulty) = difficulty.parse() {
                self.difficulty = difficulty;
            }
        }
        if let Ok(path) = std::env::var("GUARANTOR_KEYPAIR_PATH") {
            self.keypair_path = PathBuf::from(path);
        }
    }
}
