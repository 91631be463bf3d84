use crate::fov::ViewCone;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub regression: RegressionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Viewer used by scenarios that do not name one
#[derive(Debug, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

#[derive(Debug, Deserialize)]
pub struct ViewConfig {
    /// 0 leaves the view unrestricted
    #[serde(default)]
    pub fov_degrees: f64,
    #[serde(default = "default_facing_x")]
    pub facing_x: i32,
    #[serde(default)]
    pub facing_y: i32,
}

#[derive(Debug, Deserialize)]
pub struct RegressionConfig {
    #[serde(default)]
    pub seed_start: u64,
    #[serde(default = "default_seed_end")]
    pub seed_end: u64,
    #[serde(default = "default_map_size")]
    pub width: i32,
    #[serde(default = "default_map_size")]
    pub height: i32,
    #[serde(default = "default_wall_chance")]
    pub wall_chance: f64,
    #[serde(default = "default_smoothing_passes")]
    pub smoothing_passes: u32,
}

#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values
fn default_facing_x() -> i32 { 1 }
fn default_seed_end() -> u64 { 255 }
fn default_map_size() -> i32 { 25 }
fn default_wall_chance() -> f64 { 0.4 }
fn default_smoothing_passes() -> u32 { 5 }
fn default_log_level() -> String { "info".to_string() }

impl Default for ViewerConfig {
    fn default() -> Self {
        Self { x: 0, y: 0 }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 0.0,
            facing_x: default_facing_x(),
            facing_y: 0,
        }
    }
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            seed_start: 0,
            seed_end: default_seed_end(),
            width: default_map_size(),
            height: default_map_size(),
            wall_chance: default_wall_chance(),
            smoothing_passes: default_smoothing_passes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            viewer: ViewerConfig::default(),
            view: ViewConfig::default(),
            regression: RegressionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ViewConfig {
    /// The configured view cone, if the view is restricted at all
    pub fn view_cone(&self) -> Option<ViewCone> {
        if self.fov_degrees == 0.0 {
            return None;
        }
        Some(ViewCone::new(
            (self.facing_x, self.facing_y),
            self.fov_degrees.to_radians(),
        ))
    }
}

/// How `Config::load_from` came by its values
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    File,
    Missing,
    /// The file exists but could not be parsed; defaults were used
    Invalid(String),
}

impl ConfigSource {
    /// Report the outcome once a subscriber is listening
    pub fn log(&self, path: &Path) {
        match self {
            ConfigSource::File => info!(path = %path.display(), "loaded configuration"),
            ConfigSource::Missing => {
                info!(path = %path.display(), "no configuration file, using defaults")
            }
            ConfigSource::Invalid(error) => {
                warn!(path = %path.display(), %error, "failed to parse configuration, using defaults")
            }
        }
    }
}

impl Config {
    pub const DEFAULT_PATH: &'static str = "config.toml";

    /// Load configuration from config.toml, or use defaults if it doesn't exist
    pub fn load() -> (Self, ConfigSource) {
        Self::load_from(Self::DEFAULT_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> (Self, ConfigSource) {
        match fs::read_to_string(path.as_ref()) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => (config, ConfigSource::File),
                Err(e) => (Config::default(), ConfigSource::Invalid(e.to_string())),
            },
            Err(_) => (Config::default(), ConfigSource::Missing),
        }
    }
}
