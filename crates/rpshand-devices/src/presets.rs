//! Gesture Preset Registry: actuator payloads per (hand model, gesture).

use std::collections::HashMap;
use std::fmt;

use rpshand_core::config::PresetOverride;
use rpshand_core::error::{Result, RpsError};
use rpshand_core::types::{DeviceConfig, GestureKind, HandModel, HandVariant};

/// Which preset table a device uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetKey {
    L10WormGear,
    L10BallJoint,
    /// Shared by O6, L6 and anything we do not recognize.
    O6L6,
}

impl PresetKey {
    pub const ALL: [PresetKey; 3] = [Self::L10WormGear, Self::L10BallJoint, Self::O6L6];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::L10WormGear => "L10_worm_gear",
            Self::L10BallJoint => "L10_ball_joint",
            Self::O6L6 => "O6/L6",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == raw.trim())
    }
}

impl fmt::Display for PresetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payloads for one gesture on one preset table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GesturePreset {
    /// Finger pose, always sent first.
    pub finger: Vec<u8>,
    /// Palm pose, sent after the settle delay when present.
    pub palm: Option<Vec<u8>>,
}

impl GesturePreset {
    pub fn finger_only(finger: &[u8]) -> Self {
        Self { finger: finger.to_vec(), palm: None }
    }

    pub fn with_palm(finger: &[u8], palm: &[u8]) -> Self {
        Self {
            finger: finger.to_vec(),
            palm: Some(palm.to_vec()),
        }
    }
}

/// Pick the preset table for a device.
///
/// L10 hands go by variant (worm gear when unspecified); O6, L6 and
/// unknown models share the O6/L6 table.
pub fn resolve_preset_key(device: &DeviceConfig) -> PresetKey {
    match (&device.model, device.variant) {
        (HandModel::L10, HandVariant::WormGear) => PresetKey::L10WormGear,
        (HandModel::L10, HandVariant::BallJoint) => PresetKey::L10BallJoint,
        (HandModel::L10, HandVariant::Unspecified) => {
            tracing::warn!(
                "⚠️ L10 hand on {} has no variant, using worm_gear presets",
                device.interface_id
            );
            PresetKey::L10WormGear
        }
        (HandModel::O6 | HandModel::L6 | HandModel::O6L6, _) => PresetKey::O6L6,
        (other, _) => {
            tracing::warn!(
                "⚠️ Unknown hand model '{}' on {}, using O6/L6 presets",
                other,
                device.interface_id
            );
            PresetKey::O6L6
        }
    }
}

/// Static lookup table, loaded once and read-only afterwards.
pub struct PresetRegistry {
    presets: HashMap<(PresetKey, GestureKind), GesturePreset>,
}

impl PresetRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            presets: HashMap::new(),
        }
    }

    /// Create registry with the built-in tables.
    pub fn with_defaults() -> Self {
        let mut reg = Self::new();
        for (key, gesture, preset) in builtin_presets() {
            reg.register(key, gesture, preset);
        }
        reg
    }

    /// Built-in tables plus config overrides.
    pub fn from_overrides(overrides: &[PresetOverride]) -> Result<Self> {
        let mut reg = Self::with_defaults();
        reg.apply_overrides(overrides)?;
        Ok(reg)
    }

    pub fn register(&mut self, key: PresetKey, gesture: GestureKind, preset: GesturePreset) {
        self.presets.insert((key, gesture), preset);
    }

    /// Replace entries from config. Rejects unknown keys, unknown gestures
    /// and empty finger payloads.
    pub fn apply_overrides(&mut self, overrides: &[PresetOverride]) -> Result<()> {
        for ov in overrides {
            let key = PresetKey::parse(&ov.key)
                .ok_or_else(|| RpsError::Config(format!("unknown preset key '{}'", ov.key)))?;
            let gesture: GestureKind = ov.gesture.parse().map_err(RpsError::Config)?;
            if ov.finger.is_empty() {
                return Err(RpsError::Config(format!(
                    "preset {key}/{gesture} has an empty finger payload"
                )));
            }
            tracing::info!("🤚 Preset override: {key}/{gesture}");
            self.register(
                key,
                gesture,
                GesturePreset {
                    finger: ov.finger.clone(),
                    palm: ov.palm.clone(),
                },
            );
        }
        Ok(())
    }

    /// `PresetNotFound` means "skip this device", not a fatal error.
    pub fn lookup(&self, key: PresetKey, gesture: GestureKind) -> Result<&GesturePreset> {
        self.presets
            .get(&(key, gesture))
            .ok_or_else(|| RpsError::PresetNotFound {
                key: key.to_string(),
                gesture: gesture.to_string(),
            })
    }

    pub fn count(&self) -> usize {
        self.presets.len()
    }
}

impl Default for PresetRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn builtin_presets() -> Vec<(PresetKey, GestureKind, GesturePreset)> {
    const L10_ROCK: [u8; 7] = [1, 49, 128, 40, 36, 41, 46];
    const L10_PAPER: [u8; 7] = [1, 255, 255, 255, 255, 255, 255];
    const L10_SCISSORS: [u8; 7] = [1, 0, 103, 255, 255, 0, 0];
    const L10_PALM_NEUTRAL: [u8; 5] = [4, 128, 128, 128, 128];
    const L10_PALM_SPREAD: [u8; 5] = [4, 255, 128, 128, 128];

    let mut table = Vec::new();
    // L10 variants share poses for now.
    for key in [PresetKey::L10WormGear, PresetKey::L10BallJoint] {
        table.push((key, GestureKind::Rock, GesturePreset::with_palm(&L10_ROCK, &L10_PALM_NEUTRAL)));
        table.push((key, GestureKind::Paper, GesturePreset::with_palm(&L10_PAPER, &L10_PALM_NEUTRAL)));
        table.push((
            key,
            GestureKind::Scissors,
            GesturePreset::with_palm(&L10_SCISSORS, &L10_PALM_SPREAD),
        ));
    }

    table.push((
        PresetKey::O6L6,
        GestureKind::Rock,
        GesturePreset::finger_only(&[1, 65, 170, 25, 25, 25, 25]),
    ));
    table.push((
        PresetKey::O6L6,
        GestureKind::Paper,
        GesturePreset::finger_only(&[1, 255, 255, 255, 255, 255, 255]),
    ));
    table.push((
        PresetKey::O6L6,
        GestureKind::Scissors,
        GesturePreset::finger_only(&[1, 65, 180, 255, 255, 25, 25]),
    ));
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpshand_core::types::HandSide;

    fn device(model: HandModel, variant: HandVariant) -> DeviceConfig {
        DeviceConfig::new("can0", model, variant, HandSide::Right)
    }

    #[test]
    fn test_resolve_keys() {
        assert_eq!(
            resolve_preset_key(&device(HandModel::L10, HandVariant::BallJoint)),
            PresetKey::L10BallJoint
        );
        assert_eq!(
            resolve_preset_key(&device(HandModel::L10, HandVariant::WormGear)),
            PresetKey::L10WormGear
        );
        assert_eq!(
            resolve_preset_key(&device(HandModel::L10, HandVariant::Unspecified)),
            PresetKey::L10WormGear
        );
        for model in [HandModel::O6, HandModel::L6, HandModel::O6L6] {
            assert_eq!(resolve_preset_key(&device(model, HandVariant::Unspecified)), PresetKey::O6L6);
        }
        assert_eq!(
            resolve_preset_key(&device(HandModel::O7, HandVariant::Unspecified)),
            PresetKey::O6L6
        );
        assert_eq!(
            resolve_preset_key(&device(HandModel::Unknown("X".into()), HandVariant::BallJoint)),
            PresetKey::O6L6
        );
    }

    #[test]
    fn test_every_key_and_gesture_has_finger_payload() {
        let reg = PresetRegistry::with_defaults();
        assert_eq!(reg.count(), 9);
        for key in PresetKey::ALL {
            for gesture in GestureKind::ALL {
                let preset = reg.lookup(key, gesture).unwrap();
                assert!(!preset.finger.is_empty(), "{key}/{gesture}");
            }
        }
    }

    #[test]
    fn test_palm_only_on_l10() {
        let reg = PresetRegistry::with_defaults();
        assert!(reg.lookup(PresetKey::L10BallJoint, GestureKind::Rock).unwrap().palm.is_some());
        assert!(reg.lookup(PresetKey::O6L6, GestureKind::Rock).unwrap().palm.is_none());
    }

    #[test]
    fn test_missing_entry_is_not_found() {
        let reg = PresetRegistry::new();
        let err = reg.lookup(PresetKey::O6L6, GestureKind::Paper).unwrap_err();
        assert!(matches!(err, RpsError::PresetNotFound { .. }));
    }

    #[test]
    fn test_overrides() {
        let reg = PresetRegistry::from_overrides(&[PresetOverride {
            key: "O6/L6".into(),
            gesture: "rock".into(),
            finger: vec![9, 9],
            palm: Some(vec![4]),
        }])
        .unwrap();
        let preset = reg.lookup(PresetKey::O6L6, GestureKind::Rock).unwrap();
        assert_eq!(preset.finger, vec![9, 9]);
        assert_eq!(preset.palm, Some(vec![4]));

        let bad_key = PresetRegistry::from_overrides(&[PresetOverride {
            key: "Z1".into(),
            gesture: "rock".into(),
            finger: vec![1],
            palm: None,
        }]);
        assert!(matches!(bad_key, Err(RpsError::Config(_))));

        let empty = PresetRegistry::from_overrides(&[PresetOverride {
            key: "L10_worm_gear".into(),
            gesture: "paper".into(),
            finger: vec![],
            palm: None,
        }]);
        assert!(empty.is_err());
    }
}
