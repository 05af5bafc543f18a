// Studio configuration - persisted as RON in the user config directory

use crate::error::ConfigError;
use crate::generation::payload::{DEFAULT_TEMPO, Key, MAX_TEMPO, MIN_TEMPO, Style};
use crate::piano_roll::PianoRollProjector;
use crate::timebase::{NtuMode, NtuRate, Seconds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

const CONFIG_DIR: &str = "lyric_studio";
const CONFIG_FILE: &str = "config.ron";

static GLOBAL_CONFIG: OnceLock<StudioConfig> = OnceLock::new();

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub backend_url: String,
    /// How note times are read (beats at the result's tempo, or seconds)
    pub ntu_mode: NtuMode,
    pub default_tempo: u32,
    pub default_key: Key,
    pub default_style: Style,
    pub piano_roll: PianoRollProjector,
    /// Seconds between the last note's end and session completion
    pub completion_slack: f64,
    /// Output gain of the preview synth (0.0 - 1.0)
    pub synth_gain: f32,
    /// Output gain of guide playback (0.0 - 1.0)
    pub guide_gain: f32,
    /// Height of one waveform lane in points
    pub lane_height: f32,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            ntu_mode: NtuMode::default(),
            default_tempo: DEFAULT_TEMPO,
            default_key: Key::default(),
            default_style: Style::default(),
            piano_roll: PianoRollProjector::default(),
            completion_slack: 0.1,
            synth_gain: 0.3,
            guide_gain: 0.8,
            lane_height: 84.0,
        }
    }
}

impl StudioConfig {
    /// `<config_dir>/lyric_studio/config.ron`, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Loads and validates `path`; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: StudioConfig = ron::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the default location, falling back to defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using default configuration", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend_url.trim().is_empty() {
            return Err(ConfigError::Invalid("backend_url is empty".to_string()));
        }
        if !(MIN_TEMPO..=MAX_TEMPO).contains(&self.default_tempo) {
            return Err(ConfigError::Invalid(format!(
                "default_tempo {} outside {}..={}",
                self.default_tempo, MIN_TEMPO, MAX_TEMPO
            )));
        }
        if !self.completion_slack.is_finite() || self.completion_slack < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "completion_slack {} must be a non-negative number",
                self.completion_slack
            )));
        }
        for (name, gain) in [("synth_gain", self.synth_gain), ("guide_gain", self.guide_gain)] {
            if !(0.0..=1.0).contains(&gain) {
                return Err(ConfigError::Invalid(format!(
                    "{} {} outside 0.0..=1.0",
                    name, gain
                )));
            }
        }
        Ok(())
    }

    pub fn completion_slack(&self) -> Seconds {
        Seconds(self.completion_slack)
    }

    /// Time-unit rate for a result generated at `tempo`
    pub fn ntu_rate(&self, tempo: u32) -> NtuRate {
        NtuRate::for_mode(self.ntu_mode, tempo as f64)
    }
}

/// Installs the process-wide configuration; false if one is already set
pub fn install(config: StudioConfig) -> bool {
    GLOBAL_CONFIG.set(config).is_ok()
}

/// Process-wide configuration, loaded from disk on first use
pub fn global() -> &'static StudioConfig {
    GLOBAL_CONFIG.get_or_init(StudioConfig::load_or_default)
}
