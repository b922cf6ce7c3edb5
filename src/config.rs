use crate::defaults;
use crate::error::{PeaksError, Result};
use crate::peaks::PeakConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub peaks: PeaksConfig,
    pub stream: StreamConfig,
}

/// Peak extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PeaksConfig {
    pub count: usize,
    pub quality: f64,
    pub step: usize,
    pub channels: usize,
    pub split: bool,
    pub anchor_zero: bool,
}

/// Byte stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StreamConfig {
    pub chunk_size: usize,
}

impl Default for PeaksConfig {
    fn default() -> Self {
        Self {
            count: defaults::BUCKET_COUNT,
            quality: defaults::QUALITY,
            step: defaults::STEP,
            channels: defaults::CHANNELS,
            split: true,
            anchor_zero: false,
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            chunk_size: defaults::CHUNK_SIZE,
        }
    }
}

impl PeaksConfig {
    /// Extraction parameters described by this section.
    pub fn to_peak_config(&self) -> PeakConfig {
        PeakConfig {
            channels: self.channels,
            count: self.count,
            step: self.step,
            split: self.split,
            anchor_zero: self.anchor_zero,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PeaksError::ConfigFileNotFound {
                path: path.display().to_string(),
            },
            _ => PeaksError::Io(e),
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(PeaksError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(PeaksError::ConfigParse {
                message: format!("{}: {}", path.display(), e),
            }),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - WAVEPEAKS_COUNT → peaks.count
    /// - WAVEPEAKS_QUALITY → peaks.quality
    /// - WAVEPEAKS_STEP → peaks.step
    /// - WAVEPEAKS_CHUNK_SIZE → stream.chunk_size
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(count) = env_value("WAVEPEAKS_COUNT") {
            self.peaks.count = count;
        }
        if let Some(quality) = env_value("WAVEPEAKS_QUALITY") {
            self.peaks.quality = quality;
        }
        if let Some(step) = env_value("WAVEPEAKS_STEP") {
            self.peaks.step = step;
        }
        if let Some(chunk_size) = env_value("WAVEPEAKS_CHUNK_SIZE") {
            self.stream.chunk_size = chunk_size;
        }
        self
    }

    /// Check values that TOML accepts but extraction cannot use.
    pub fn validate(&self) -> Result<()> {
        self.peaks.to_peak_config().validate()?;
        if !self.peaks.quality.is_finite() {
            return Err(PeaksError::invalid("peaks.quality", "must be a finite number"));
        }
        if self.stream.chunk_size == 0 {
            return Err(PeaksError::invalid("stream.chunk_size", "must be positive"));
        }
        Ok(())
    }

    /// Effective configuration as TOML, headed by the build version.
    pub fn to_display_toml(&self) -> Result<String> {
        let body = toml::to_string_pretty(self).map_err(|e| PeaksError::ConfigParse {
            message: e.to_string(),
        })?;
        Ok(format!("# wavepeaks {}\n{}", crate::version_string(), body))
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/wavepeaks/config.toml on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("wavepeaks").join("config.toml"))
    }
}

/// Parse a non-empty environment variable, warning on malformed values.
fn env_value<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok().filter(|v| !v.is_empty())?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}
