//! # RpsHand Core
//!
//! Shared vocabulary for the rock-paper-scissors robot hand: gesture and
//! device types, the error taxonomy, configuration, and the traits that
//! separate the round logic from transports and storage.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::RpsConfig;
pub use error::{Result, RpsError};
pub use traits::{CommandChannel, HandActuator, ScoreStore};
pub use types::{
    DeviceCommand, DeviceConfig, GestureKind, GestureLabel, HandModel, HandSide, HandVariant,
    PerceptionEvent, PlayerMove, ScoreLedger, Winner,
};
