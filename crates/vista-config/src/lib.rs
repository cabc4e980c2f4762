//! Vista configuration system
//!
//! This crate provides centralized configuration for the reveal and counter
//! runtime, loading defaults from `vista.toml` with environment overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Default file name looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "vista.toml";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`VistaConfig`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VistaConfig {
    /// Viewport intersection settings
    pub visibility: VisibilityConfig,
    /// Animated counter settings
    pub counters: CounterConfig,
    /// One-shot reveal settings
    pub reveal: RevealConfig,
    /// Declarative percentage bar settings
    pub bars: BarConfig,
    /// Headline typewriter settings
    pub typewriter: TypewriterConfig,
    /// Headless demo driver settings
    pub demo: DemoConfig,
}

/// Viewport intersection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Fraction of a region that must be inside the viewport (0.0 - 1.0)
    pub threshold: f32,
}

/// Animated counter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterConfig {
    /// Shared duration of every counter in a group, in milliseconds
    pub duration_ms: f64,
    /// Truncate intermediate values to whole numbers
    pub discrete: bool,
}

/// Reveal configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Delay between the visibility signal and the reveal, in milliseconds
    pub delay_ms: f64,
    /// Presentation class applied once revealed (e.g. "animate-fade-in")
    pub animation: String,
}

/// Percentage bar configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BarConfig {
    /// Width transition handed to the renderer, in milliseconds
    pub transition_ms: f64,
    /// CSS timing function name for the width transition
    pub timing: String,
}

/// Typewriter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypewriterConfig {
    /// Delay between characters, in milliseconds
    pub interval_ms: f64,
}

/// Demo driver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Simulated viewport width in pixels
    pub viewport_width: f32,
    /// Simulated viewport height in pixels
    pub viewport_height: f32,
    /// Time between simulated display frames, in milliseconds
    pub frame_ms: f64,
    /// Pixels scrolled per frame
    pub scroll_step: f32,
    /// Number of frames to simulate
    pub frames: u32,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self { threshold: 0.1 }
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            duration_ms: 2000.0,
            discrete: true,
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            delay_ms: 0.0,
            animation: "animate-fade-in".to_string(),
        }
    }
}

impl Default for BarConfig {
    fn default() -> Self {
        Self {
            transition_ms: 1000.0,
            timing: "ease-out".to_string(),
        }
    }
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self { interval_ms: 100.0 }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 800.0,
            frame_ms: 1000.0 / 60.0,
            scroll_step: 24.0,
            frames: 900,
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

fn parse_number<T: std::str::FromStr>(name: &str, val: &str) -> Option<T> {
    match val.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(variable = name, value = val, "ignoring unparsable override");
            None
        }
    }
}

impl VistaConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load configuration from `vista.toml` in the current directory,
    /// or return the defaults if it is missing or invalid.
    pub fn load_or_default() -> Self {
        match Self::load_from_file(DEFAULT_CONFIG_FILE) {
            Ok(config) => config,
            Err(ConfigError::Read { .. }) => Self::default(),
            Err(err) => {
                warn!("{err}; falling back to defaults");
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("VISTA_THRESHOLD") {
            if let Some(threshold) = parse_number::<f32>("VISTA_THRESHOLD", &val) {
                self.visibility.threshold = threshold;
            }
        }

        if let Ok(val) = std::env::var("VISTA_COUNTER_DURATION_MS") {
            if let Some(ms) = parse_number::<f64>("VISTA_COUNTER_DURATION_MS", &val) {
                self.counters.duration_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("VISTA_COUNTER_DISCRETE") {
            self.counters.discrete = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("VISTA_REVEAL_DELAY_MS") {
            if let Some(ms) = parse_number::<f64>("VISTA_REVEAL_DELAY_MS", &val) {
                self.reveal.delay_ms = ms;
            }
        }
        if let Ok(animation) = std::env::var("VISTA_REVEAL_ANIMATION") {
            self.reveal.animation = animation;
        }

        if let Ok(val) = std::env::var("VISTA_BAR_TRANSITION_MS") {
            if let Some(ms) = parse_number::<f64>("VISTA_BAR_TRANSITION_MS", &val) {
                self.bars.transition_ms = ms;
            }
        }
        if let Ok(timing) = std::env::var("VISTA_BAR_TIMING") {
            self.bars.timing = timing;
        }

        if let Ok(val) = std::env::var("VISTA_TYPEWRITER_INTERVAL_MS") {
            if let Some(ms) = parse_number::<f64>("VISTA_TYPEWRITER_INTERVAL_MS", &val) {
                self.typewriter.interval_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("VISTA_FRAME_MS") {
            if let Some(ms) = parse_number::<f64>("VISTA_FRAME_MS", &val) {
                self.demo.frame_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("VISTA_SCROLL_STEP") {
            if let Some(step) = parse_number::<f32>("VISTA_SCROLL_STEP", &val) {
                self.demo.scroll_step = step;
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from vista.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        debug!(?config, "configuration loaded");
        config
    }
}
