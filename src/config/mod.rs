//! Configuration module for SurfScan-RS
//!
//! This module handles the acquisition configuration:
//! - Surface generation (profile, grid size, noise, seed)
//! - Stream pacing (batch size, interval)
//! - Cross-section view row
//! - CSV export location
//!
//! # App Data Location
//!
//! Application data (default config file, logs, exports) lives in the
//! platform-appropriate location:
//! - **Linux**: `~/.local/share/dev.surfscan.surfscan-rs/`
//! - **macOS**: `~/Library/Application Support/dev.surfscan.surfscan-rs/`
//! - **Windows**: `%APPDATA%\dev.surfscan.surfscan-rs\`
//!
//! Setting `SURFSCAN_DATA_DIR` overrides the location.
//!
//! # Files
//!
//! - `surfscan.toml` - Acquisition configuration
//! - `logs/` - Daily rolling log files
//!
//! # Example
//!
//! ```no_run
//! use surfscan::config::AcquisitionConfig;
//!
//! let mut config = AcquisitionConfig::load_or_default("surfscan.toml");
//! config.surface.grid_size = 120;
//! config.save("surfscan.toml").unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, ScanError};
use crate::stream::{StreamParams, DEFAULT_BATCH_SIZE, DEFAULT_INTERVAL_MS};
use crate::surface::{SurfaceModel, SurfaceProfile};

/// Application identifier for data directories
pub const APP_ID: &str = "dev.surfscan.surfscan-rs";

/// Environment variable that overrides the app data directory
pub const DATA_DIR_ENV: &str = "SURFSCAN_DATA_DIR";

/// Configuration filename
pub const CONFIG_FILE: &str = "surfscan.toml";

/// Default grid edge length
pub const DEFAULT_GRID_SIZE: usize = 80;

/// Default noise amplitude
pub const DEFAULT_NOISE_AMPLITUDE: f64 = 0.03;

/// Default export filename
pub const DEFAULT_EXPORT_FILE: &str = "surface.csv";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        ScanError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            ScanError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the default configuration file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Surface Config ====================

/// Ground-truth generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Surface shape
    pub profile: SurfaceProfile,
    /// Grid edge length
    pub grid_size: usize,
    /// Peak-to-peak noise amplitude
    pub noise_amplitude: f64,
    /// Noise seed; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            profile: SurfaceProfile::default(),
            grid_size: DEFAULT_GRID_SIZE,
            noise_amplitude: DEFAULT_NOISE_AMPLITUDE,
            seed: None,
        }
    }
}

// ==================== Stream Config ====================

/// Stream pacing settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Points per batch
    pub batch_size: usize,
    /// Delay between batches in milliseconds
    pub interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl StreamConfig {
    /// Convert into engine parameters
    pub fn params(&self) -> StreamParams {
        StreamParams::new(self.batch_size, self.interval_ms)
    }
}

// ==================== View / Export Config ====================

/// Cross-section view settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Row to extract; `None` means the middle row
    pub cross_section_row: Option<usize>,
}

/// CSV export settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output filename
    pub file_name: String,
    /// Output directory; `None` means the app data directory
    pub directory: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_EXPORT_FILE.to_string(),
            directory: None,
        }
    }
}

// ==================== Acquisition Config ====================

/// Complete acquisition configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Ground-truth generation
    pub surface: SurfaceConfig,
    /// Stream pacing
    pub stream: StreamConfig,
    /// Cross-section view
    pub view: ViewConfig,
    /// CSV export
    pub export: ExportConfig,
}

impl AcquisitionConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScanError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            ScanError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        config.validate()?;
        tracing::debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Load a configuration file, returning defaults on any error
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Load from the app data directory, or defaults if no file exists there
    pub fn load_from_app_dir() -> Result<Self> {
        match config_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// Save the configuration as TOML
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                ScanError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ScanError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content).map_err(|e| {
            ScanError::Config(format!("Failed to write config file {:?}: {}", path, e))
        })
    }

    /// Check every value before anything is generated or started
    pub fn validate(&self) -> Result<()> {
        if self.surface.grid_size == 0 {
            return Err(ScanError::InvalidDimension {
                size: self.surface.grid_size,
            });
        }
        let amplitude = self.surface.noise_amplitude;
        if !amplitude.is_finite() || amplitude < 0.0 {
            return Err(ScanError::InvalidNoiseAmplitude(amplitude));
        }
        self.stream.params().validate()?;
        if let Some(row) = self.view.cross_section_row {
            if row >= self.surface.grid_size {
                return Err(ScanError::InvalidRowIndex {
                    row,
                    size: self.surface.grid_size,
                });
            }
        }
        if self.export.file_name.trim().is_empty() {
            return Err(ScanError::Config("Export file name is empty".to_string()));
        }
        Ok(())
    }

    /// Surface model for the configured profile and seed
    pub fn surface_model(&self) -> SurfaceModel {
        SurfaceModel::from_seed(self.surface.profile, self.surface.seed)
    }

    /// Engine parameters
    pub fn stream_params(&self) -> StreamParams {
        self.stream.params()
    }

    /// Row to show in the cross-section view
    pub fn cross_section_row(&self) -> usize {
        self.view
            .cross_section_row
            .unwrap_or(self.surface.grid_size / 2)
    }

    /// Where the CSV snapshot is written
    pub fn export_path(&self) -> PathBuf {
        let dir = self
            .export
            .directory
            .clone()
            .or_else(app_data_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        dir.join(&self.export.file_name)
    }
}

// ==================== Tests ====================
