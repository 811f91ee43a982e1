//! Codec configuration: file, environment and defaults.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// Spreading constant of the robust soliton distribution.
pub const DEFAULT_C: f64 = 0.12;
/// Admissible decode failure probability.
pub const DEFAULT_DELTA: f64 = 0.01;
/// Default number of source blocks.
pub const DEFAULT_K: usize = 1000;
/// Default block size in bytes.
pub const DEFAULT_BLOCK_SIZE: usize = 32;

/// Parameters shared by the encoder and decoder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CodecConfig {
    /// Number of source blocks.
    pub k: usize,
    /// Bytes per source block and per symbol payload.
    pub block_size: usize,
    /// Robust soliton spreading constant `c`.
    pub c: f64,
    /// Admissible decode failure probability `δ`, in `[0,1]`.
    pub delta: f64,
    /// Seeds the encoder's seed source. `None` draws from OS entropy.
    pub master_seed: Option<u64>,
    /// Upper bound on the decoder's drain wait. `None` waits indefinitely.
    pub drain_timeout_ms: Option<u64>,
    /// Default `tracing` filter when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_K,
            block_size: DEFAULT_BLOCK_SIZE,
            c: DEFAULT_C,
            delta: DEFAULT_DELTA,
            master_seed: None,
            drain_timeout_ms: None,
            log_level: "info".into(),
        }
    }
}

impl CodecConfig {
    /// Defaults with the given dimensions.
    pub fn new(k: usize, block_size: usize) -> Self {
        Self { k, block_size, ..Self::default() }
    }

    /// Read and validate a TOML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: Self =
            toml::from_str(&data).map_err(|e| Error::config(format!("toml parse error: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write as pretty TOML.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let s = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("toml serialize error: {e}")))?;
        fs::write(path, s)?;
        Ok(())
    }

    /// Defaults overridden by `LUBY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(v) = env_parse::<usize>("LUBY_K")? { cfg.k = v; }
        if let Some(v) = env_parse::<usize>("LUBY_BLOCK_SIZE")? { cfg.block_size = v; }
        if let Some(v) = env_parse::<f64>("LUBY_C")? { cfg.c = v; }
        if let Some(v) = env_parse::<f64>("LUBY_DELTA")? { cfg.delta = v; }
        if let Some(v) = env_parse::<u64>("LUBY_MASTER_SEED")? { cfg.master_seed = Some(v); }
        if let Some(v) = env_parse::<u64>("LUBY_DRAIN_TIMEOUT_MS")? { cfg.drain_timeout_ms = Some(v); }
        if let Ok(v) = std::env::var("LUBY_LOG_LEVEL") { cfg.log_level = v; }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject dimensions or distribution parameters the codec cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(Error::config("k must be positive"));
        }
        if self.block_size == 0 {
            return Err(Error::config("block_size must be positive"));
        }
        if !(self.c.is_finite() && self.c > 0.0) {
            return Err(Error::config(format!("c must be a positive real, got {}", self.c)));
        }
        if !(0.0..=1.0).contains(&self.delta) {
            return Err(Error::config(format!("delta must lie in [0,1], got {}", self.delta)));
        }
        let allowed = ["trace", "debug", "info", "warn", "error"];
        if !allowed.contains(&self.log_level.as_str()) {
            return Err(Error::config(format!("invalid log_level: {}", self.log_level)));
        }
        Ok(())
    }

    /// `drain_timeout_ms` as a [`Duration`].
    pub fn drain_timeout(&self) -> Option<Duration> {
        self.drain_timeout_ms.map(Duration::from_millis)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(v) => v
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::config(format!("{key}: cannot parse {v:?}"))),
        Err(_) => Ok(None),
    }
}
