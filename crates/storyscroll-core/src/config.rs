use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub assets: AssetConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path (log file, asset cache)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Smallest pinned extent, as a fraction of the viewport height
    #[serde(default = "default_min_extent_ratio")]
    pub min_extent_ratio: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            min_extent_ratio: default_min_extent_ratio(),
        }
    }
}

/// Easing curve applied to a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingType {
    /// Jump to the end value
    None,
    Linear,
    /// f(t) = 1 - (1-t)²
    Quadratic,
    /// f(t) = 1 - (1-t)³
    #[default]
    Cubic,
    /// f(t) = 1 - (1-t)⁵
    Quintic,
    /// f(t) = 1 - 2^(-10t)
    EaseOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Skip animated transitions and snap to the resting state
    #[serde(default)]
    pub reduced_motion: bool,
    /// Image crossfade duration in milliseconds
    #[serde(default = "default_crossfade_duration")]
    pub crossfade_duration_ms: u64,
    #[serde(default)]
    pub crossfade_easing: EasingType,
    /// Scale the incoming image starts from before settling at 1.0
    #[serde(default = "default_crossfade_scale_from")]
    pub crossfade_scale_from: f64,
    /// Text reveal duration in milliseconds
    #[serde(default = "default_reveal_duration")]
    pub reveal_duration_ms: u64,
    #[serde(default = "default_reveal_easing")]
    pub reveal_easing: EasingType,
    /// Vertical offset the text slides in from
    #[serde(default = "default_reveal_offset")]
    pub reveal_offset: f64,
    /// Delay between consecutive text elements in milliseconds
    #[serde(default = "default_reveal_stagger")]
    pub reveal_stagger_ms: u64,
    /// Fraction of a step's scroll range over which highlights fill up
    #[serde(default = "default_highlight_span")]
    pub highlight_span: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            reduced_motion: false,
            crossfade_duration_ms: default_crossfade_duration(),
            crossfade_easing: EasingType::default(),
            crossfade_scale_from: default_crossfade_scale_from(),
            reveal_duration_ms: default_reveal_duration(),
            reveal_easing: default_reveal_easing(),
            reveal_offset: default_reveal_offset(),
            reveal_stagger_ms: default_reveal_stagger(),
            highlight_span: default_highlight_span(),
        }
    }
}

impl MotionConfig {
    pub fn crossfade_duration(&self) -> Duration {
        Duration::from_millis(self.crossfade_duration_ms)
    }

    pub fn reveal_duration(&self) -> Duration {
        Duration::from_millis(self.reveal_duration_ms)
    }

    pub fn reveal_stagger(&self) -> Duration {
        Duration::from_millis(self.reveal_stagger_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Give up on a single asset load after this many milliseconds
    #[serde(default = "default_load_timeout")]
    pub load_timeout_ms: u64,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Keep downloaded assets on disk under the data directory
    #[serde(default = "default_true")]
    pub disk_cache: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: default_load_timeout(),
            request_timeout_secs: default_request_timeout(),
            disk_cache: default_true(),
        }
    }
}

impl AssetConfig {
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Tick rate in milliseconds while idle
    #[serde(default = "default_tick_rate")]
    pub tick_rate_ms: u64,
    /// Frame rate while a transition is running
    #[serde(default = "default_animation_fps")]
    pub animation_fps: u32,
    /// Rows scrolled per line step
    #[serde(default = "default_scroll_lines")]
    pub scroll_lines: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: default_tick_rate(),
            animation_fps: default_animation_fps(),
            scroll_lines: default_scroll_lines(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("storyscroll")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_min_extent_ratio() -> f64 {
    0.35
}

fn default_crossfade_duration() -> u64 {
    600
}

fn default_crossfade_scale_from() -> f64 {
    1.02
}

fn default_reveal_duration() -> u64 {
    400
}

fn default_reveal_easing() -> EasingType {
    EasingType::Quadratic
}

fn default_reveal_offset() -> f64 {
    20.0
}

fn default_reveal_stagger() -> u64 {
    120
}

fn default_highlight_span() -> f64 {
    0.5
}

fn default_load_timeout() -> u64 {
    5000
}

fn default_request_timeout() -> u64 {
    30
}

fn default_tick_rate() -> u64 {
    100
}

fn default_animation_fps() -> u32 {
    60
}

fn default_scroll_lines() -> u16 {
    1
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &std::path::Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from file or return defaults
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml_str(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> crate::Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/storyscroll/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("storyscroll")
            .join("config.toml")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("storyscroll.log")
    }

    pub fn asset_cache_dir(&self) -> PathBuf {
        self.data_dir().join("asset_cache")
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |msg: String| Err(crate::Error::InvalidConfiguration(msg));

        let ratio = self.layout.min_extent_ratio;
        if !ratio.is_finite() || ratio < 0.0 {
            return invalid(format!("layout.min_extent_ratio must be >= 0, got {ratio}"));
        }
        let scale = self.motion.crossfade_scale_from;
        if !scale.is_finite() || scale <= 0.0 {
            return invalid(format!("motion.crossfade_scale_from must be > 0, got {scale}"));
        }
        if !self.motion.reveal_offset.is_finite() {
            return invalid("motion.reveal_offset must be finite".to_string());
        }
        let span = self.motion.highlight_span;
        if !span.is_finite() || span <= 0.0 || span > 1.0 {
            return invalid(format!("motion.highlight_span must be in (0, 1], got {span}"));
        }
        if self.assets.load_timeout_ms == 0 {
            return invalid("assets.load_timeout_ms must be > 0".to_string());
        }
        if self.ui.animation_fps == 0 {
            return invalid("ui.animation_fps must be > 0".to_string());
        }
        Ok(())
    }
}
