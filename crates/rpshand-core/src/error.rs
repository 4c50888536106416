//! Error taxonomy shared by every RpsHand crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RpsError>;

#[derive(Debug, Error)]
pub enum RpsError {
    /// Configuration file could not be read, parsed or validated.
    #[error("config error: {0}")]
    Config(String),

    /// Device list could not be fetched or decoded.
    #[error("device config error: {0}")]
    DeviceConfig(String),

    /// No preset registered for this (preset key, gesture) pair.
    #[error("no preset for {key} / {gesture}")]
    PresetNotFound { key: String, gesture: String },

    /// A command could not be delivered to a device.
    #[error("transport error: {0}")]
    Transport(String),

    /// Score storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),

    /// An operation was requested while its precondition does not hold.
    #[error("{0}")]
    Precondition(String),

    /// The session control loop is gone.
    #[error("game session closed")]
    SessionClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl RpsError {
    /// Precondition failures are shown to the player; everything else is logged.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}
