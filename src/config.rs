//! Generator configuration.
//!
//! Loaded from TOML. Constants that define the wallet itself (sample target,
//! pool size, network, derivation path) are not configurable, and neither is
//! the passphrase: it is only ever entered at run time.
//!
//! ```toml
//! word_count = 24
//!
//! [qr]
//! pixels = 520
//! error_correction = "M"
//! margin = 1
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mnemonic::WordCount;

/// Largest accepted QR bitmap side in pixels.
pub const MAX_QR_PIXELS: u32 = 4096;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Seed phrase length, 12 or 24.
    pub word_count: WordCount,

    /// QR rendering settings
    pub qr: QrSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QrSettings {
    /// Side of the square bitmap in pixels.
    pub pixels: u32,

    pub error_correction: ErrorCorrection,

    /// Quiet zone in modules.
    pub margin: u32,
}

impl Default for QrSettings {
    fn default() -> Self {
        Self {
            pixels: 520,
            error_correction: ErrorCorrection::default(),
            margin: 1,
        }
    }
}

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorCorrection {
    /// ~7% recovery
    L,
    /// ~15% recovery
    #[default]
    M,
    /// ~25% recovery
    Q,
    /// ~30% recovery
    H,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.qr.pixels == 0 {
            return Err(ConfigError::Invalid("qr.pixels must be greater than 0".into()));
        }
        if self.qr.pixels > MAX_QR_PIXELS {
            return Err(ConfigError::Invalid(format!(
                "qr.pixels {} is larger than {MAX_QR_PIXELS}",
                self.qr.pixels
            )));
        }
        if self.qr.margin > 16 {
            return Err(ConfigError::Invalid(format!(
                "qr.margin {} is larger than 16 modules",
                self.qr.margin
            )));
        }
        Ok(())
    }
}
