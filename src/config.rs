//! Configuration management for CrabSnap
//!
//! Controls how streams are probed and opened, how photos are encoded,
//! how out-of-range zoom requests are treated and which camera a session
//! starts on.

use crate::errors::CameraError;
use crate::types::{FacingMode, PhotoFormat};
use crate::zoom::ZoomPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrabSnapConfig {
    pub probe: ProbeConfig,
    pub capture: CaptureConfig,
    pub zoom: ZoomConfig,
    pub session: SessionConfig,
}

/// Constraints used while probing and opening streams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Resolution requested for the throwaway probe stream
    pub probe_width: u32,
    pub probe_height: u32,
    /// Resolution requested when the stream is opened for real
    pub ideal_width: u32,
    pub ideal_height: u32,
    /// Request an audio track alongside video
    pub audio: bool,
}

/// Photo encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    pub format: PhotoFormat,
    /// JPEG quality (1-100), ignored for PNG
    pub jpeg_quality: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
    pub policy: ZoomPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Camera opened at startup when the device has both
    pub preferred_facing: FacingMode,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            probe_width: 160,
            probe_height: 120,
            ideal_width: 1920,
            ideal_height: 1080,
            audio: false,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            format: PhotoFormat::Jpeg,
            jpeg_quality: 92,
        }
    }
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            policy: ZoomPolicy::Reject,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preferred_facing: FacingMode::Back,
        }
    }
}

impl Default for CrabSnapConfig {
    fn default() -> Self {
        Self {
            probe: ProbeConfig::default(),
            capture: CaptureConfig::default(),
            zoom: ZoomConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl CrabSnapConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CameraError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CameraError::Config(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, CameraError> {
        let config: CrabSnapConfig = toml::from_str(contents)
            .map_err(|e| CameraError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CameraError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CameraError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CameraError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CameraError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), CameraError> {
        if self.probe.probe_width == 0 || self.probe.probe_height == 0 {
            return Err(CameraError::Config("Invalid probe resolution".to_string()));
        }
        if self.probe.ideal_width == 0 || self.probe.ideal_height == 0 {
            return Err(CameraError::Config("Invalid ideal resolution".to_string()));
        }
        if self.capture.jpeg_quality == 0 || self.capture.jpeg_quality > 100 {
            return Err(CameraError::Config(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }
        Ok(())
    }
}
