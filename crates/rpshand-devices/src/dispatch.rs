//! Device Command Dispatcher: drives every configured hand to a gesture.
//!
//! Each device gets its own future: resolve preset, send finger pose, wait
//! for the actuators to settle, send palm pose. All device futures run
//! concurrently and are joined before `dispatch_gesture` returns. A failure
//! on one device is logged and never touches its siblings.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use rpshand_core::config::{HandsConfig, MIN_PALM_DELAY_MS};
use rpshand_core::traits::{CommandChannel, HandActuator};
use rpshand_core::types::{DeviceCommand, DeviceConfig, GestureKind};

use crate::presets::{resolve_preset_key, PresetRegistry};

/// How one device fared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceOutcome {
    /// Every message was acknowledged.
    Sent,
    /// No preset for this device; nothing was sent.
    Skipped,
    /// At least one message failed.
    Failed,
}

/// Aggregate of one fan-out, for logs and tests only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DispatchSummary {
    fn tally(outcomes: &[DeviceOutcome]) -> Self {
        let mut s = Self::default();
        for o in outcomes {
            match o {
                DeviceOutcome::Sent => s.sent += 1,
                DeviceOutcome::Skipped => s.skipped += 1,
                DeviceOutcome::Failed => s.failed += 1,
            }
        }
        s
    }
}

/// Owns the session's read-only device list and the command channel.
/// Clones share the same list, registry and channel.
#[derive(Clone)]
pub struct GestureDispatcher {
    devices: Arc<Vec<DeviceConfig>>,
    registry: Arc<PresetRegistry>,
    channel: Arc<dyn CommandChannel>,
    palm_delay: Duration,
}

impl GestureDispatcher {
    pub fn new(
        devices: Vec<DeviceConfig>,
        registry: Arc<PresetRegistry>,
        channel: Arc<dyn CommandChannel>,
    ) -> Self {
        Self {
            devices: Arc::new(devices),
            registry,
            channel,
            palm_delay: Duration::from_millis(MIN_PALM_DELAY_MS),
        }
    }

    /// Build from config, using the configured (clamped) palm delay.
    pub fn from_config(
        hands: &HandsConfig,
        devices: Vec<DeviceConfig>,
        registry: Arc<PresetRegistry>,
        channel: Arc<dyn CommandChannel>,
    ) -> Self {
        Self::new(devices, registry, channel).with_palm_delay(hands.palm_delay())
    }

    /// Override the finger→palm gap. Never goes below the settle minimum.
    pub fn with_palm_delay(mut self, delay: Duration) -> Self {
        self.palm_delay = delay.max(Duration::from_millis(MIN_PALM_DELAY_MS));
        self
    }

    pub fn devices(&self) -> &[DeviceConfig] {
        &self.devices
    }

    pub fn palm_delay(&self) -> Duration {
        self.palm_delay
    }

    /// Send `gesture` to every device concurrently and wait for all of them.
    pub async fn dispatch_gesture(&self, gesture: GestureKind) -> DispatchSummary {
        if self.devices.is_empty() {
            tracing::error!("❌ No devices configured, cannot perform {gesture}");
            return DispatchSummary::default();
        }

        tracing::info!(
            "🤖 Performing {} on {} device(s) via {}",
            gesture,
            self.devices.len(),
            self.channel.name()
        );

        let outcomes = join_all(
            self.devices
                .iter()
                .enumerate()
                .map(|(i, device)| self.dispatch_one(i + 1, device, gesture)),
        )
        .await;

        let summary = DispatchSummary::tally(&outcomes);
        tracing::info!(
            "✅ {} done: {} sent, {} skipped, {} failed",
            gesture,
            summary.sent,
            summary.skipped,
            summary.failed
        );
        summary
    }

    async fn dispatch_one(&self, index: usize, device: &DeviceConfig, gesture: GestureKind) -> DeviceOutcome {
        let key = resolve_preset_key(device);
        let preset = match self.registry.lookup(key, gesture) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("❌ Device {} ({}): {e}, skipping", index, device.interface_id);
                return DeviceOutcome::Skipped;
            }
        };

        tracing::debug!(
            "Device {} ({}, {} hand): {} using {}",
            index,
            device.interface_id,
            device.side.as_str(),
            gesture,
            key
        );

        let mut ok = self.send_logged(index, &DeviceCommand::for_device(device, &preset.finger)).await;

        if let Some(palm) = &preset.palm {
            tokio::time::sleep(self.palm_delay).await;
            ok &= self.send_logged(index, &DeviceCommand::for_device(device, palm)).await;
        }

        if ok { DeviceOutcome::Sent } else { DeviceOutcome::Failed }
    }

    async fn send_logged(&self, index: usize, command: &DeviceCommand) -> bool {
        match self.channel.send(command).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("⚠️ Device {} ({}): send failed: {e}", index, command.interface_id);
                false
            }
        }
    }
}

/// Fire-and-forget for the round machine: the fan-out runs on its own tokio
/// task and the control loop never waits on the bus.
impl HandActuator for GestureDispatcher {
    fn perform(&self, gesture: GestureKind) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            dispatcher.dispatch_gesture(gesture).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{GesturePreset, PresetKey};
    use async_trait::async_trait;
    use rpshand_core::error::{Result, RpsError};
    use rpshand_core::types::{HandModel, HandSide, HandVariant, RIGHT_HAND_ACTUATOR_ID};
    use std::sync::Mutex;
    use tokio::time::Instant;

    /// Records every command with its send time; fails for listed interfaces.
    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<(Instant, DeviceCommand)>>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl CommandChannel for RecordingChannel {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, command: &DeviceCommand) -> Result<()> {
            if self.failing.contains(&command.interface_id) {
                return Err(RpsError::Transport("bus off".into()));
            }
            self.sent.lock().unwrap().push((Instant::now(), command.clone()));
            Ok(())
        }
    }

    fn dev(iface: &str, model: HandModel, variant: HandVariant, side: HandSide) -> DeviceConfig {
        DeviceConfig::new(iface, model, variant, side)
    }

    #[tokio::test(start_paused = true)]
    async fn test_l10_ball_joint_rock_sends_finger_then_palm() {
        let channel = Arc::new(RecordingChannel::default());
        let registry = Arc::new(PresetRegistry::with_defaults());
        let dispatcher = GestureDispatcher::new(
            vec![dev("can0", HandModel::L10, HandVariant::BallJoint, HandSide::Right)],
            registry.clone(),
            channel.clone(),
        );

        let summary = dispatcher.dispatch_gesture(GestureKind::Rock).await;
        assert_eq!(summary, DispatchSummary { sent: 1, skipped: 0, failed: 0 });

        let preset = registry.lookup(PresetKey::L10BallJoint, GestureKind::Rock).unwrap();
        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1.payload, preset.finger);
        assert_eq!(Some(&sent[1].1.payload), preset.palm.as_ref());
        for (_, cmd) in sent.iter() {
            assert_eq!(cmd.interface_id, "can0");
            assert_eq!(cmd.actuator_id, RIGHT_HAND_ACTUATOR_ID);
        }
        assert!(sent[1].0 - sent[0].0 >= Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finger_only_preset_sends_once() {
        let channel = Arc::new(RecordingChannel::default());
        let dispatcher = GestureDispatcher::new(
            vec![dev("can0", HandModel::O6, HandVariant::Unspecified, HandSide::Left)],
            Arc::new(PresetRegistry::with_defaults()),
            channel.clone(),
        );
        dispatcher.dispatch_gesture(GestureKind::Paper).await;
        let sent = channel.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1.actuator_id, 0x28);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolvable_devices_do_not_block_others() {
        // Registry without the O6/L6 table: unknown models fall back to it and get skipped.
        let mut registry = PresetRegistry::new();
        for g in GestureKind::ALL {
            registry.register(PresetKey::L10WormGear, g, GesturePreset::finger_only(&[1, 2]));
        }
        let channel = Arc::new(RecordingChannel::default());
        let dispatcher = GestureDispatcher::new(
            vec![
                dev("can0", HandModel::L10, HandVariant::WormGear, HandSide::Right),
                dev("can1", HandModel::Unknown("Z".into()), HandVariant::Unspecified, HandSide::Right),
                dev("can2", HandModel::L10, HandVariant::Unspecified, HandSide::Left),
                dev("can3", HandModel::O7, HandVariant::Unspecified, HandSide::Left),
            ],
            Arc::new(registry),
            channel.clone(),
        );

        let summary = dispatcher.dispatch_gesture(GestureKind::Scissors).await;
        assert_eq!(summary, DispatchSummary { sent: 2, skipped: 2, failed: 0 });
        let mut ifaces: Vec<_> = channel.sent.lock().unwrap().iter().map(|(_, c)| c.interface_id.clone()).collect();
        ifaces.sort();
        assert_eq!(ifaces, vec!["can0", "can2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_is_isolated() {
        let channel = Arc::new(RecordingChannel {
            failing: vec!["can1".into()],
            ..Default::default()
        });
        let dispatcher = GestureDispatcher::new(
            vec![
                dev("can0", HandModel::L10, HandVariant::WormGear, HandSide::Right),
                dev("can1", HandModel::L10, HandVariant::WormGear, HandSide::Left),
            ],
            Arc::new(PresetRegistry::with_defaults()),
            channel.clone(),
        );
        let summary = dispatcher.dispatch_gesture(GestureKind::Rock).await;
        assert_eq!(summary, DispatchSummary { sent: 1, skipped: 0, failed: 1 });
        assert_eq!(channel.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_devices_is_a_quiet_noop() {
        let channel = Arc::new(RecordingChannel::default());
        let dispatcher = GestureDispatcher::new(vec![], Arc::new(PresetRegistry::with_defaults()), channel.clone());
        assert_eq!(dispatcher.dispatch_gesture(GestureKind::Rock).await, DispatchSummary::default());
        assert!(channel.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_palm_delay_is_clamped() {
        let d = GestureDispatcher::new(
            vec![],
            Arc::new(PresetRegistry::with_defaults()),
            Arc::new(RecordingChannel::default()),
        )
        .with_palm_delay(Duration::from_millis(1));
        assert_eq!(d.palm_delay(), Duration::from_millis(10));
    }
}
