// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// This module handles loading and parsing configuration from config.toml.
// Provides sensible defaults if config file is missing or has errors.

use crate::backend::{QueueCapability, QueueFamilyRequirements};
use anyhow::{Context, Result};
use ash::vk;
use log::LevelFilter;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub engine: EngineConfig,
    pub graphics: GraphicsConfig,
    pub device: DeviceConfig,
    pub debug: DebugConfig,
}

/// Window settings
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Romulus".to_string(),
            width: 600,
            height: 400,
            resizable: false,
        }
    }
}

/// Engine identification reported to the driver
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "Primus Vulkan Engine".to_string(),
        }
    }
}

/// Graphics settings
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct GraphicsConfig {
    pub present_mode: String,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            present_mode: "fifo".to_string(),
        }
    }
}

/// What the GPU has to offer to be selected
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    pub require_present: bool,
    pub require_swapchain: bool,
    pub require_compute: bool,
    pub require_transfer: bool,
    pub required_extensions: Vec<String>,
    pub prefer_shared_queue_family: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            require_present: true,
            require_swapchain: true,
            require_compute: false,
            require_transfer: false,
            required_extensions: vec!["VK_KHR_swapchain".to_string()],
            prefer_shared_queue_family: false,
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    pub validation_layers: bool,
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: cfg!(debug_assertions),
            log_level: "info".to_string(),
        }
    }
}

/// Where the loaded configuration came from
#[derive(Debug)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file, defaults used
    Missing(PathBuf),
    /// File could not be read or parsed, defaults used
    Invalid(PathBuf, anyhow::Error),
}

impl ConfigSource {
    pub fn log(&self) {
        match self {
            Self::File(path) => log::info!("Loaded configuration from {:?}", path),
            Self::Missing(path) => {
                log::info!("Config file not found at {:?}, using defaults", path)
            }
            Self::Invalid(path, err) => {
                log::warn!("Failed to load {:?}: {:#}. Using defaults.", path, err)
            }
        }
    }
}

impl Config {
    /// Load config.toml, falling back to defaults if missing or broken.
    ///
    /// Runs before logging is set up, so nothing is logged here; call
    /// `ConfigSource::log` once the logger is installed.
    pub fn load() -> (Self, ConfigSource) {
        Self::load_or_default("config.toml")
    }

    /// Load configuration from `path`, falling back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> (Self, ConfigSource) {
        let path = path.as_ref();

        if !path.exists() {
            return (Config::default(), ConfigSource::Missing(path.to_path_buf()));
        }

        match Self::load_from_path(path) {
            Ok(config) => (config, ConfigSource::File(path.to_path_buf())),
            Err(err) => (
                Config::default(),
                ConfigSource::Invalid(path.to_path_buf(), err),
            ),
        }
    }

    /// Load configuration from a specific path. A missing file gives defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::parse(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Device requirements for the selector
    pub fn requirements(&self) -> QueueFamilyRequirements {
        let device = &self.device;
        let mut requirements = QueueFamilyRequirements::new()
            .require(QueueCapability::Graphics)
            .require_swapchain(device.require_swapchain)
            .prefer_shared_family(device.prefer_shared_queue_family);

        if device.require_present {
            requirements = requirements.require(QueueCapability::Present);
        }
        if device.require_compute {
            requirements = requirements.require(QueueCapability::Compute);
        }
        if device.require_transfer {
            requirements = requirements.require(QueueCapability::Transfer);
        }
        for name in &device.required_extensions {
            requirements = requirements.require_extension(name.as_str());
        }

        requirements
    }

    /// Get present mode as Vulkan enum
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        match self.graphics.present_mode.to_lowercase().as_str() {
            "immediate" => vk::PresentModeKHR::IMMEDIATE,
            "mailbox" => vk::PresentModeKHR::MAILBOX,
            "fifo" => vk::PresentModeKHR::FIFO,
            "fifo_relaxed" => vk::PresentModeKHR::FIFO_RELAXED,
            _ => {
                log::warn!(
                    "Unknown present mode '{}', defaulting to FIFO",
                    self.graphics.present_mode
                );
                vk::PresentModeKHR::FIFO
            }
        }
    }

    /// Get log level, `info` if unrecognised
    pub fn log_level(&self) -> LevelFilter {
        self.debug.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.window.title, "Romulus");
        assert!(!config.window.resizable);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [window]
            width = 1280

            [debug]
            validation_layers = false
            log_level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 400);
        assert!(!config.debug.validation_layers);
        assert_eq!(config.log_level(), LevelFilter::Debug);
        assert_eq!(config.device, DeviceConfig::default());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::parse("[window\nwidth = ").is_err());
        assert!(Config::parse("[window]\nwidth = \"wide\"").is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = Config::load_from_path("definitely/not/here/config.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    fn scratch_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("primus-{}-{}.toml", name, std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn broken_file_falls_back_to_defaults_and_keeps_the_error() {
        let path = scratch_file("broken", "[window]\nwidth = \"wide\"");
        let (config, source) = Config::load_or_default(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config, Config::default());
        match source {
            ConfigSource::Invalid(reported, err) => {
                assert_eq!(reported, path);
                assert!(format!("{:#}", err).contains("Failed to parse config file"));
            }
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn readable_file_is_reported_as_loaded() {
        let path = scratch_file("valid", "[window]\nwidth = 1024");
        let (config, source) = Config::load_or_default(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.window.width, 1024);
        assert!(matches!(source, ConfigSource::File(ref p) if *p == path));
    }

    #[test]
    fn absent_file_is_reported_as_missing() {
        let (config, source) = Config::load_or_default("definitely/not/here/config.toml");
        assert_eq!(config, Config::default());
        assert!(matches!(source, ConfigSource::Missing(_)));
    }

    #[test]
    fn default_requirements_ask_for_presentation() {
        let requirements = Config::default().requirements();
        assert_eq!(
            requirements.capabilities(),
            &[QueueCapability::Graphics, QueueCapability::Present]
        );
        assert_eq!(requirements.extensions(), &["VK_KHR_swapchain".to_string()]);
        assert!(requirements.needs_swapchain());
        assert!(!requirements.prefers_shared_family());
    }

    #[test]
    fn headless_requirements() {
        let config = Config::parse(
            r#"
            [device]
            require_present = false
            require_swapchain = false
            require_compute = true
            required_extensions = []
            prefer_shared_queue_family = true
            "#,
        )
        .unwrap();
        let requirements = config.requirements();
        assert_eq!(
            requirements.capabilities(),
            &[QueueCapability::Graphics, QueueCapability::Compute]
        );
        assert!(requirements.extensions().is_empty());
        assert!(!requirements.needs_swapchain());
        assert!(requirements.prefers_shared_family());
    }

    #[test]
    fn present_mode_names() {
        let mut config = Config::default();
        assert_eq!(config.present_mode(), vk::PresentModeKHR::FIFO);
        config.graphics.present_mode = "Mailbox".to_string();
        assert_eq!(config.present_mode(), vk::PresentModeKHR::MAILBOX);
        config.graphics.present_mode = "vsync-ish".to_string();
        assert_eq!(config.present_mode(), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn unknown_log_level_is_info() {
        let mut config = Config::default();
        config.debug.log_level = "chatty".to_string();
        assert_eq!(config.log_level(), LevelFilter::Info);
    }
}
