//! # RpsHand Devices
//!
//! Everything between "the robot shows ROCK" and bytes on the CAN bus.
//!
//! ## Architecture
//! ```text
//! discovery ── GET hands-config ──► Vec<DeviceConfig>
//!                                        │
//! GestureDispatcher::dispatch_gesture(ROCK)
//!   ├── device 1: resolve_preset_key → lookup → finger ─10ms─► palm
//!   ├── device 2: resolve_preset_key → lookup → finger
//!   └── device N: (no preset → skipped, logged)
//!        all joined, each failure isolated
//!                                        │
//!                          HttpCanChannel ── POST /api/can
//! ```

pub mod channel;
pub mod discovery;
pub mod dispatch;
pub mod presets;

pub use channel::HttpCanChannel;
pub use discovery::{fetch_devices, load_devices};
pub use dispatch::{DispatchSummary, GestureDispatcher};
pub use presets::{resolve_preset_key, GesturePreset, PresetKey, PresetRegistry};
