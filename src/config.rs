//! Configuration types for the MoodNest client.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use moodnest_scene::{DEFAULT_LAMP_KEYWORDS, TARGET_SPAN};

use crate::error::{MoodError, Result};
use crate::service::AnalysisMode;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MoodNestConfig {
    /// Remote mood analysis service.
    pub service: ServiceConfig,
    /// Audio capture/playback settings.
    pub audio: AudioConfig,
    /// Voice session behaviour.
    pub voice: VoiceConfig,
    /// Passive ambient state polling.
    pub poller: PollerConfig,
    /// Scene asset and fixture detection.
    pub scene: SceneConfig,
    /// Transient result display.
    pub notices: NoticeConfig,
}

/// Remote analysis service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL the analysis and state endpoints are joined onto.
    pub base_url: String,
    /// Per-request timeout in seconds. Expiry fails the session.
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_owned(),
            request_timeout_secs: 20,
        }
    }
}

impl ServiceConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Audio I/O configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Sample rate of the uploaded recording in Hz.
    pub input_sample_rate: u32,
    /// Preferred output sample rate in Hz.
    pub output_sample_rate: u32,
    /// Input device name (None = system default).
    pub input_device: Option<String>,
    /// Output device name (None = system default).
    pub output_device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_sample_rate: 16_000,
            output_sample_rate: 24_000,
            input_device: None,
            output_device: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Endpoint family used for new sessions.
    pub mode: AnalysisMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub enabled: bool,
    /// Delay between `/state` fetches in milliseconds.
    pub interval_ms: u64,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 2_000,
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Scene asset and lamp detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// glTF / GLB asset loaded at startup.
    pub asset_path: PathBuf,
    /// Edge length the asset's largest dimension is fitted to.
    pub target_span: f32,
    /// Name keywords for the fallback lamp classifier.
    pub lamp_keywords: Vec<String>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            asset_path: PathBuf::from("apartment.glb"),
            target_span: TARGET_SPAN,
            lamp_keywords: DEFAULT_LAMP_KEYWORDS.iter().map(|k| (*k).to_owned()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// Auto-dismiss delay for result notices in milliseconds.
    pub dismiss_after_ms: u64,
}

impl Default for NoticeConfig {
    fn default() -> Self {
        Self {
            dismiss_after_ms: 5_000,
        }
    }
}

impl NoticeConfig {
    pub fn dismiss_after(&self) -> Duration {
        Duration::from_millis(self.dismiss_after_ms)
    }
}

impl MoodNestConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| MoodError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| MoodError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `<config dir>/moodnest/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("moodnest")
            .join("config.toml")
    }

    /// Checks values that would otherwise fail later at runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MoodError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.service.base_url)
            .map_err(|e| MoodError::Config(format!("service.base_url: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(MoodError::Config(format!(
                "service.base_url: unsupported scheme `{}`",
                url.scheme()
            )));
        }
        if self.service.request_timeout_secs == 0 {
            return Err(MoodError::Config(
                "service.request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.poller.interval_ms == 0 {
            return Err(MoodError::Config(
                "poller.interval_ms must be greater than zero".into(),
            ));
        }
        if !(self.scene.target_span.is_finite() && self.scene.target_span > 0.0) {
            return Err(MoodError::Config(
                "scene.target_span must be a positive number".into(),
            ));
        }
        if self.scene.lamp_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(MoodError::Config(
                "scene.lamp_keywords must contain at least one keyword".into(),
            ));
        }
        Ok(())
    }
}
