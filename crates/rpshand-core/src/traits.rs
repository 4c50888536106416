//! Seams between the game loop and the outside world.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{DeviceCommand, GestureKind, ScoreLedger};

/// Request/response transport that delivers one actuator message.
#[async_trait]
pub trait CommandChannel: Send + Sync {
    /// Channel name for logs.
    fn name(&self) -> &str;

    /// Deliver one command. `Ok` means the far end acknowledged it.
    async fn send(&self, command: &DeviceCommand) -> Result<()>;
}

/// Something that can make the robot show a gesture.
///
/// Called from the round machine's control thread, so implementations must
/// return immediately and do their I/O elsewhere.
pub trait HandActuator: Send + Sync {
    fn perform(&self, gesture: GestureKind);
}

/// Durable key-value home of the score ledger.
pub trait ScoreStore: Send {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<ScoreLedger>>;

    fn save(&self, ledger: &ScoreLedger) -> Result<()>;
}
