//! Domain types shared between the device layer and the game loop.
//!
//! Stringly-typed input (hands-config JSON, config TOML, perception JSON lines)
//! is parsed into closed enums here, at the boundary. Unknown values are
//! defaulted and warned about once, never carried further as strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Gestures ───────────────────────────────────────────────

/// One of the three playable hand shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GestureKind {
    Rock,
    Paper,
    Scissors,
}

impl GestureKind {
    pub const ALL: [GestureKind; 3] = [Self::Rock, Self::Paper, Self::Scissors];

    /// Key used in preset tables and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rock => "ROCK",
            Self::Paper => "PAPER",
            Self::Scissors => "SCISSORS",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Rock => "👊",
            Self::Paper => "✋",
            Self::Scissors => "✌️",
        }
    }

    /// Rock beats Scissors, Scissors beats Paper, Paper beats Rock.
    pub fn beats(&self, other: GestureKind) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissors) | (Self::Scissors, Self::Paper) | (Self::Paper, Self::Rock)
        )
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GestureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" | "石头" => Ok(Self::Rock),
            "paper" | "布" => Ok(Self::Paper),
            "scissors" | "剪刀" => Ok(Self::Scissors),
            other => Err(format!("unknown gesture '{other}'")),
        }
    }
}

/// What the player ended up showing in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerMove {
    Shown(GestureKind),
    /// No qualifying gesture arrived before the detection window closed.
    Timeout,
}

impl fmt::Display for PlayerMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shown(g) => write!(f, "{g}"),
            Self::Timeout => f.write_str("TIMEOUT"),
        }
    }
}

/// Who took the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Player,
    Robot,
    Draw,
}

// ── Devices ────────────────────────────────────────────────

/// Hand hardware model reported by the hands-config endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HandModel {
    L10,
    L6,
    O6,
    O7,
    /// Combined "O6/L6" report; both share one preset table.
    O6L6,
    Unknown(String),
}

impl HandModel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "L10" => Self::L10,
            "L6" => Self::L6,
            "O6" => Self::O6,
            "O7" => Self::O7,
            "O6/L6" => Self::O6L6,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::L10 => "L10",
            Self::L6 => "L6",
            Self::O6 => "O6",
            Self::O7 => "O7",
            Self::O6L6 => "O6/L6",
            Self::Unknown(s) => s,
        }
    }
}

impl fmt::Display for HandModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mechanical variant; only meaningful for L10 hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HandVariant {
    WormGear,
    BallJoint,
    #[default]
    Unspecified,
}

impl HandVariant {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "worm_gear" => Self::WormGear,
            "ball_joint" => Self::BallJoint,
            "" => Self::Unspecified,
            other => {
                tracing::warn!("⚠️ Unrecognized hand variant '{other}', treating as unspecified");
                Self::Unspecified
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WormGear => "worm_gear",
            Self::BallJoint => "ball_joint",
            Self::Unspecified => "",
        }
    }
}

/// Left actuator id on the CAN bus.
pub const LEFT_HAND_ACTUATOR_ID: u32 = 0x28;
/// Right actuator id on the CAN bus.
pub const RIGHT_HAND_ACTUATOR_ID: u32 = 0x27;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HandSide {
    Left,
    #[default]
    Right,
}

impl HandSide {
    /// Anything other than `left` is a right hand.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("left") {
            Self::Left
        } else {
            Self::Right
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn actuator_id(&self) -> u32 {
        match self {
            Self::Left => LEFT_HAND_ACTUATOR_ID,
            Self::Right => RIGHT_HAND_ACTUATOR_ID,
        }
    }
}

/// One connected hand, as loaded for the session. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawDeviceConfig", into = "RawDeviceConfig")]
pub struct DeviceConfig {
    pub interface_id: String,
    pub model: HandModel,
    pub variant: HandVariant,
    pub side: HandSide,
}

impl DeviceConfig {
    pub fn new(interface_id: &str, model: HandModel, variant: HandVariant, side: HandSide) -> Self {
        Self {
            interface_id: interface_id.to_string(),
            model,
            variant,
            side,
        }
    }
}

impl fmt::Display for DeviceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.model {
            HandModel::L10 => write!(
                f,
                "{} {} hand, variant '{}' on {}",
                self.model,
                self.side.as_str(),
                self.variant.as_str(),
                self.interface_id
            ),
            _ => write!(f, "{} {} hand on {}", self.model, self.side.as_str(), self.interface_id),
        }
    }
}

/// Wire shape of a device entry. Every field is optional on input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDeviceConfig {
    #[serde(default)]
    pub interface: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub variant: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
}

impl From<RawDeviceConfig> for DeviceConfig {
    fn from(raw: RawDeviceConfig) -> Self {
        let interface_id = raw
            .interface
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "can0".to_string());
        let model = match raw.model.as_deref() {
            Some(m) if !m.trim().is_empty() => HandModel::parse(m),
            _ => HandModel::Unknown("unknown".to_string()),
        };
        Self {
            interface_id,
            model,
            variant: HandVariant::parse(raw.variant.as_deref().unwrap_or("")),
            side: HandSide::parse(raw.side.as_deref().unwrap_or("right")),
        }
    }
}

impl From<DeviceConfig> for RawDeviceConfig {
    fn from(cfg: DeviceConfig) -> Self {
        Self {
            interface: Some(cfg.interface_id),
            model: Some(cfg.model.as_str().to_string()),
            variant: Some(cfg.variant.as_str().to_string()),
            side: Some(cfg.side.as_str().to_string()),
        }
    }
}

/// A single actuator message. Lives only for the duration of one send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceCommand {
    #[serde(rename = "interface")]
    pub interface_id: String,
    #[serde(rename = "id")]
    pub actuator_id: u32,
    #[serde(rename = "data")]
    pub payload: Vec<u8>,
}

impl DeviceCommand {
    pub fn for_device(device: &DeviceConfig, payload: &[u8]) -> Self {
        Self {
            interface_id: device.interface_id.clone(),
            actuator_id: device.side.actuator_id(),
            payload: payload.to_vec(),
        }
    }
}

// ── Perception ─────────────────────────────────────────────

/// Label emitted by the external gesture recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureLabel {
    Rock,
    Paper,
    Scissors,
    Unrecognized,
}

impl GestureLabel {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<GestureKind>() {
            Ok(kind) => kind.into(),
            Err(_) => Self::Unrecognized,
        }
    }

    pub fn gesture(&self) -> Option<GestureKind> {
        match self {
            Self::Rock => Some(GestureKind::Rock),
            Self::Paper => Some(GestureKind::Paper),
            Self::Scissors => Some(GestureKind::Scissors),
            Self::Unrecognized => None,
        }
    }
}

impl From<GestureKind> for GestureLabel {
    fn from(kind: GestureKind) -> Self {
        match kind {
            GestureKind::Rock => Self::Rock,
            GestureKind::Paper => Self::Paper,
            GestureKind::Scissors => Self::Scissors,
        }
    }
}

/// One recognized-hand result for one processed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPerceptionEvent")]
pub struct PerceptionEvent {
    pub label: GestureLabel,
    /// Clamped to `[0, 1]`.
    pub confidence: f32,
}

impl PerceptionEvent {
    pub fn new(label: GestureLabel, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) };
        Self { label, confidence }
    }

    /// A recognized label strictly above the confidence threshold.
    pub fn qualifying_gesture(&self, threshold: f32) -> Option<GestureKind> {
        if self.confidence > threshold {
            self.label.gesture()
        } else {
            None
        }
    }
}

#[derive(Deserialize)]
struct RawPerceptionEvent {
    #[serde(default)]
    label: String,
    #[serde(default)]
    confidence: f32,
}

impl From<RawPerceptionEvent> for PerceptionEvent {
    fn from(raw: RawPerceptionEvent) -> Self {
        Self::new(GestureLabel::parse(&raw.label), raw.confidence)
    }
}

// ── Scores ─────────────────────────────────────────────────

/// Running tally of rounds won by each side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreLedger {
    pub player_score: u32,
    pub robot_score: u32,
}

impl ScoreLedger {
    pub fn is_zero(&self) -> bool {
        self.player_score == 0 && self.robot_score == 0
    }
}

impl fmt::Display for ScoreLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {} : {} robot", self.player_score, self.robot_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beats_table() {
        assert!(GestureKind::Rock.beats(GestureKind::Scissors));
        assert!(GestureKind::Scissors.beats(GestureKind::Paper));
        assert!(GestureKind::Paper.beats(GestureKind::Rock));
        for g in GestureKind::ALL {
            assert!(!g.beats(g));
        }
        assert!(!GestureKind::Scissors.beats(GestureKind::Rock));
    }

    #[test]
    fn test_device_defaults_from_empty_entry() {
        let cfg: DeviceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.interface_id, "can0");
        assert!(matches!(cfg.model, HandModel::Unknown(_)));
        assert_eq!(cfg.variant, HandVariant::Unspecified);
        assert_eq!(cfg.side, HandSide::Right);
    }

    #[test]
    fn test_device_parse_l10_left() {
        let cfg: DeviceConfig = serde_json::from_str(
            r#"{"interface":"can1","model":"L10","variant":"ball_joint","side":"left"}"#,
        )
        .unwrap();
        assert_eq!(cfg.model, HandModel::L10);
        assert_eq!(cfg.variant, HandVariant::BallJoint);
        assert_eq!(cfg.side.actuator_id(), 0x28);
    }

    #[test]
    fn test_combined_model_string() {
        assert_eq!(HandModel::parse("O6/L6"), HandModel::O6L6);
        assert_eq!(HandModel::parse("X9"), HandModel::Unknown("X9".into()));
    }

    #[test]
    fn test_command_wire_shape() {
        let dev = DeviceConfig::new("can0", HandModel::O6, HandVariant::Unspecified, HandSide::Right);
        let cmd = DeviceCommand::for_device(&dev, &[1, 2, 3]);
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["interface"], "can0");
        assert_eq!(json["id"], 0x27);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_perception_event_parsing() {
        let ev: PerceptionEvent = serde_json::from_str(r#"{"label":"Rock","confidence":0.9}"#).unwrap();
        assert_eq!(ev.label, GestureLabel::Rock);
        assert_eq!(ev.qualifying_gesture(0.7), Some(GestureKind::Rock));

        let ev: PerceptionEvent = serde_json::from_str(r#"{"label":"wave","confidence":3.0}"#).unwrap();
        assert_eq!(ev.label, GestureLabel::Unrecognized);
        assert_eq!(ev.confidence, 1.0);
        assert_eq!(ev.qualifying_gesture(0.7), None);
    }

    #[test]
    fn test_threshold_is_strict() {
        let ev = PerceptionEvent::new(GestureLabel::Paper, 0.7);
        assert_eq!(ev.qualifying_gesture(0.7), None);
        let ev = PerceptionEvent::new(GestureLabel::Paper, 0.71);
        assert_eq!(ev.qualifying_gesture(0.7), Some(GestureKind::Paper));
    }
}
