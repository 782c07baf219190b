//! Core types and configuration for keyspace

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{KeyspaceError, Result};
use crate::space::ALPHANUMERIC;

/// Counters kept by a sampler
#[derive(Debug, Default)]
pub struct SamplerStats {
    bytes_served: AtomicU64,
    refills: AtomicU64,
    bypass_reads: AtomicU64,
    rejections: AtomicU64,
    draws: AtomicU64,
}

impl SamplerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_bytes_served(&self, bytes: u64) {
        self.bytes_served.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn increment_refills(&self) {
        self.refills.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_bypass_reads(&self) {
        self.bypass_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_rejections(&self) {
        self.rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_draws(&self, draws: u64) {
        self.draws.fetch_add(draws, Ordering::Relaxed);
    }

    /// Get a point-in-time copy of the counters
    pub fn snapshot(&self) -> SamplerSnapshot {
        SamplerSnapshot {
            bytes_served: self.bytes_served.load(Ordering::Relaxed),
            refills: self.refills.load(Ordering::Relaxed),
            bypass_reads: self.bypass_reads.load(Ordering::Relaxed),
            rejections: self.rejections.load(Ordering::Relaxed),
            draws: self.draws.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time sampler counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerSnapshot {
    pub bytes_served: u64,
    pub refills: u64,
    pub bypass_reads: u64,
    pub rejections: u64,
    pub draws: u64,
}

/// Configuration for random password generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub charset: String,
    pub length: usize,
    pub min_lower: usize,
    pub min_upper: usize,
    pub min_symbols: usize,
    pub max_symbols: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            charset: ALPHANUMERIC.to_string(),
            length: 12,
            min_lower: 0,
            min_upper: 0,
            min_symbols: 0,
            max_symbols: 0,
        }
    }
}

impl GeneratorConfig {
    /// Set the symbol count bounds, clamping `min` down to `max`
    pub fn with_symbols(mut self, min: usize, max: usize) -> Self {
        self.min_symbols = min.min(max);
        self.max_symbols = max;
        self
    }

    /// Default configuration overlaid with `KEYSPACE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(charset) = env_string("KEYSPACE_CHARSET") {
            config.charset = charset;
        }
        if let Some(length) = env_parse("KEYSPACE_LENGTH")? {
            config.length = length;
        }
        if let Some(min) = env_parse("KEYSPACE_MIN_LOWER")? {
            config.min_lower = min;
        }
        if let Some(min) = env_parse("KEYSPACE_MIN_UPPER")? {
            config.min_upper = min;
        }
        let min_symbols = env_parse("KEYSPACE_MIN_SYMBOLS")?.unwrap_or(config.min_symbols);
        let max_symbols = env_parse("KEYSPACE_MAX_SYMBOLS")?.unwrap_or(config.max_symbols);
        Ok(config.with_symbols(min_symbols, max_symbols.max(min_symbols)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }
}

/// Configuration for deterministic password sequencing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    pub charset: String,
    pub length: usize,
    pub rollover: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            charset: ALPHANUMERIC.to_string(),
            length: 8,
            rollover: false,
        }
    }
}

impl SequencerConfig {
    /// Default configuration overlaid with `KEYSPACE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(charset) = env_string("KEYSPACE_CHARSET") {
            config.charset = charset;
        }
        if let Some(length) = env_parse("KEYSPACE_LENGTH")? {
            config.length = length;
        }
        if let Some(rollover) = env_parse("KEYSPACE_ROLLOVER")? {
            config.rollover = rollover;
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }
}

/// Configuration for passphrase generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassphraseConfig {
    pub num_words: usize,
    pub word_len_min: usize,
    pub word_len_max: usize,
    pub separator: String,
    pub capitalize: bool,
    pub with_number: bool,
}

impl Default for PassphraseConfig {
    fn default() -> Self {
        Self {
            num_words: 3,
            word_len_min: 4,
            word_len_max: 7,
            separator: "-".to_string(),
            capitalize: true,
            with_number: true,
        }
    }
}

impl PassphraseConfig {
    /// Default configuration overlaid with `KEYSPACE_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Some(num_words) = env_parse("KEYSPACE_NUM_WORDS")? {
            config.num_words = num_words;
        }
        if let Ok(separator) = std::env::var("KEYSPACE_SEPARATOR") {
            config.separator = separator;
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        load_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(self, path)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>> {
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| crate::config_error!("{} has an invalid value: {}", key, raw)),
    }
}

fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        KeyspaceError::io(e.to_string(), Some(path.to_string_lossy().to_string()))
    })?;

    serde_json::from_str(&content).map_err(|e| KeyspaceError::parse(e.to_string(), Some(content)))
}

fn save_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                KeyspaceError::io(e.to_string(), Some(parent.to_string_lossy().to_string()))
            })?;
        }
    }

    let content = serde_json::to_string_pretty(value)?;

    std::fs::write(path, content).map_err(|e| {
        KeyspaceError::io(e.to_string(), Some(path.to_string_lossy().to_string()))
    })
}
