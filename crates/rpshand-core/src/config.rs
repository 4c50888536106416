//! RpsHand configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, RpsError};
use crate::types::DeviceConfig;

/// Smallest gap allowed between a finger command and its palm command.
pub const MIN_PALM_DELAY_MS: u64 = 10;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpsConfig {
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub hands: HandsConfig,
    #[serde(default)]
    pub scores: ScoresConfig,
    /// Per-(model, gesture) payload overrides on top of the built-in table.
    #[serde(default)]
    pub presets: Vec<PresetOverride>,
}

impl RpsConfig {
    /// Load config from the default path (~/.rpshand/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RpsError::Config(format!("Failed to read config: {e}")))?;
        Self::parse(&content)
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| RpsError::Config(format!("Failed to parse config: {e}")))?;
        config.game.validate()?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the RpsHand home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rpshand")
    }
}

/// Round timing and detection settings. One "time unit" is `tick_ms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    #[serde(default = "default_countdown_from")]
    pub countdown_from: u32,
    /// Delay after the "1" tick before the robot commits its gesture.
    #[serde(default = "default_robot_commit_delay_ms")]
    pub robot_commit_delay_ms: u64,
    /// Delay between the committal cue and the detection window.
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,
    #[serde(default = "default_detection_timeout_ms")]
    pub detection_timeout_ms: u64,
    #[serde(default = "default_next_round_delay_ms")]
    pub next_round_delay_ms: u64,
    /// Perception events must be strictly above this to count.
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

fn default_tick_ms() -> u64 { 1000 }
fn default_countdown_from() -> u32 { 3 }
fn default_robot_commit_delay_ms() -> u64 { 900 }
fn default_reveal_delay_ms() -> u64 { 500 }
fn default_detection_timeout_ms() -> u64 { 5000 }
fn default_next_round_delay_ms() -> u64 { 1000 }
fn default_confidence_threshold() -> f32 { 0.7 }

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            countdown_from: default_countdown_from(),
            robot_commit_delay_ms: default_robot_commit_delay_ms(),
            reveal_delay_ms: default_reveal_delay_ms(),
            detection_timeout_ms: default_detection_timeout_ms(),
            next_round_delay_ms: default_next_round_delay_ms(),
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

impl GameConfig {
    fn validate(&self) -> Result<()> {
        if self.tick_ms == 0 {
            return Err(RpsError::Config("game.tick_ms must be positive".into()));
        }
        if self.countdown_from == 0 {
            return Err(RpsError::Config("game.countdown_from must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(RpsError::Config(format!(
                "game.confidence_threshold {} is outside [0, 1]",
                self.confidence_threshold
            )));
        }
        Ok(())
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn robot_commit_delay(&self) -> Duration {
        Duration::from_millis(self.robot_commit_delay_ms)
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_millis(self.detection_timeout_ms)
    }

    pub fn next_round_delay(&self) -> Duration {
        Duration::from_millis(self.next_round_delay_ms)
    }
}

/// Where the hands are and how to talk to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandsConfig {
    /// Hands-config endpoint returning the connected device list.
    #[serde(default = "default_config_url")]
    pub config_url: String,
    /// CAN bridge endpoint accepting one command per POST.
    #[serde(default = "default_can_url")]
    pub can_url: String,
    #[serde(default = "default_palm_delay_ms")]
    pub palm_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Static device list; when non-empty the endpoint is not queried.
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

fn default_config_url() -> String { "http://localhost:1217/api/hand/handsconfig".into() }
fn default_can_url() -> String { "http://localhost:5260/api/can".into() }
fn default_palm_delay_ms() -> u64 { MIN_PALM_DELAY_MS }
fn default_request_timeout_secs() -> u64 { 5 }

impl Default for HandsConfig {
    fn default() -> Self {
        Self {
            config_url: default_config_url(),
            can_url: default_can_url(),
            palm_delay_ms: default_palm_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            devices: Vec::new(),
        }
    }
}

impl HandsConfig {
    /// Finger-to-palm gap, never below the actuator settle time.
    pub fn palm_delay(&self) -> Duration {
        Duration::from_millis(self.palm_delay_ms.max(MIN_PALM_DELAY_MS))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Score persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoresConfig {
    #[serde(default = "default_scores_path")]
    pub path: String,
}

fn default_scores_path() -> String { "~/.rpshand/scores.json".into() }

impl Default for ScoresConfig {
    fn default() -> Self {
        Self { path: default_scores_path() }
    }
}

impl ScoresConfig {
    /// Path with `~` expanded.
    pub fn resolved_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.path).to_string())
    }
}

/// One payload override, e.g.
/// `{ key = "O6/L6", gesture = "ROCK", finger = [1, 65, 170, 25, 25, 25, 25] }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetOverride {
    pub key: String,
    pub gesture: String,
    pub finger: Vec<u8>,
    #[serde(default)]
    pub palm: Option<Vec<u8>>,
}
