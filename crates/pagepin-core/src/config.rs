//! Editor configuration.
//!
//! Every field has a default, so a config file only needs the values it changes.

use crate::attachment::{FontFamily, TextAttachment};
use crate::interaction::DEFAULT_ACTIVATION_DISTANCE;
use crate::viewport::BASE_SCALE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Defaults for newly created text attachments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextDefaults {
    pub width: f64,
    pub height: f64,
    pub size: f64,
    pub line_height: f64,
    pub font: FontFamily,
    pub content: String,
}

impl Default for TextDefaults {
    fn default() -> Self {
        Self {
            width: TextAttachment::DEFAULT_WIDTH,
            height: TextAttachment::DEFAULT_HEIGHT,
            size: TextAttachment::DEFAULT_FONT_SIZE,
            line_height: TextAttachment::DEFAULT_LINE_HEIGHT,
            font: FontFamily::default(),
            content: "Enter Text Here".to_string(),
        }
    }
}

/// Tunables for an [`Editor`](crate::Editor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub initial_scale: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Pointer travel in visual pixels before a press becomes a drag.
    pub drag_activation_distance: f64,
    /// Longest side of a newly added image, in canonical units.
    pub image_max_size: f64,
    pub text: TextDefaults,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            initial_scale: BASE_SCALE,
            min_scale: 0.25,
            max_scale: 5.0,
            drag_activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            image_max_size: 80.0,
            text: TextDefaults::default(),
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("initial_scale", self.initial_scale),
            ("min_scale", self.min_scale),
            ("max_scale", self.max_scale),
            ("image_max_size", self.image_max_size),
            ("text.width", self.text.width),
            ("text.height", self.text.height),
            ("text.size", self.text.size),
            ("text.line_height", self.text.line_height),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!("{} must be positive, got {}", name, value)));
            }
        }
        if self.min_scale > self.max_scale {
            return Err(ConfigError::Invalid(format!(
                "min_scale {} exceeds max_scale {}",
                self.min_scale, self.max_scale
            )));
        }
        if !self.drag_activation_distance.is_finite() || self.drag_activation_distance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "drag_activation_distance must be non-negative, got {}",
                self.drag_activation_distance
            )));
        }
        Ok(())
    }
}
